//! void-assets - inspect virtual asset paths
//!
//! Run with: cargo run -p void_assetctl -- --root assets index
//!       or: void-assets --config assets.toml load textures://hero

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use void_asset::{Artifact, AssetConfig, NoHostLoader};
use void_asset_server::{AssetModule, FontAsset, JsonDocument, TextureAsset};

#[derive(Parser)]
#[command(name = "void-assets", author, version, about, long_about = None)]
struct Cli {
    /// Asset config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Content root; repeat for several, earlier roots win
    #[arg(short, long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered content-type prefixes
    Prefixes,
    /// Build the index and print every record
    Index {
        /// Only print records of this content type
        #[arg(short = 't', long = "type")]
        content_type: Option<String>,
    },
    /// Resolve a virtual path to its file
    Resolve {
        #[arg(value_name = "VPATH")]
        path: String,
    },
    /// Load a virtual path and summarize the result
    Load {
        #[arg(value_name = "VPATH")]
        path: String,
    },
}

fn load_config(cli: &Cli) -> Result<AssetConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let base = path.parent().map(PathBuf::from).unwrap_or_default();
            AssetConfig::load(path)?.rooted_at(&base)
        }
        None => AssetConfig::default(),
    };
    if !cli.roots.is_empty() {
        config.content_roots = cli.roots.clone();
    }
    Ok(config)
}

fn describe(artifact: &Artifact) -> String {
    if let Some(texture) = artifact.downcast_ref::<TextureAsset>() {
        format!(
            "texture {}x{} ({} bytes, srgb: {})",
            texture.width,
            texture.height,
            texture.data.len(),
            texture.srgb
        )
    } else if let Some(font) = artifact.downcast_ref::<FontAsset>() {
        format!(
            "font {:?} ({} face(s), {} tables, {} glyphs, {} bytes)",
            font.format,
            font.face_count,
            font.table_count,
            font.glyph_count.map_or("?".to_string(), |n| n.to_string()),
            font.data.len()
        )
    } else if let Some(doc) = artifact.downcast_ref::<JsonDocument>() {
        let shape = match &doc.value {
            v if v.is_object() => format!("object with {} keys", v.as_object().map_or(0, |o| o.len())),
            v if v.is_array() => format!("array of {}", v.as_array().map_or(0, |a| a.len())),
            v => format!("scalar {}", v),
        };
        format!("json {}", shape)
    } else {
        format!("{} ({:?})", artifact.type_name(), artifact.source())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli).map_err(|e| {
        log::error!("Failed to load asset config: {}", e);
        e
    })?;
    log::debug!("Content roots: {:?}", config.content_roots);

    let mut module = AssetModule::init(config, Arc::new(NoHostLoader)).map_err(|e| {
        log::error!("Failed to start asset module: {}", e);
        e
    })?;

    let result = run(&cli.command, &module);
    if let Err(e) = &result {
        log::error!("Command failed: {}", e);
    }
    module.shutdown();
    result
}

fn run(command: &Commands, module: &AssetModule) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Prefixes => {
            for entry in module.registry().entries() {
                println!(
                    "{:<12} dir: {:<12} extensions: [{}] decoder: {}",
                    entry.scheme(),
                    entry.dir(),
                    entry.extensions().join(", "),
                    entry.decoder().unwrap_or("-")
                );
            }
        }
        Commands::Index { content_type } => {
            let index = module.indexer().snapshot();
            let records = match content_type {
                Some(ty) => index.records_of(ty),
                None => index.records(),
            };
            for record in &records {
                println!("{:<40} {}", record.virtual_path, record.real_path.display());
            }
            println!("{} records (generation {})", records.len(), index.generation());
        }
        Commands::Resolve { path } => {
            let record = module.indexer().get_resource_path(path)?;
            println!("{} ({})", record.real_path.display(), record.content_type);
        }
        Commands::Load { path } => {
            let artifact = module.load(path)?;
            println!("{}: {}", path, describe(&artifact));
        }
    }
    Ok(())
}

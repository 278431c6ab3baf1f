//! Virtual path syntax: `<content-type>://<relative-identifier>`

use std::path::{Component, Path};

/// Separator between the content type and the identifier
pub const SCHEME_SEPARATOR: &str = "://";

/// A borrowed, syntactically valid virtual path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VirtualPath<'a> {
    content_type: &'a str,
    identifier: &'a str,
}

impl<'a> VirtualPath<'a> {
    /// Split a path into content type and identifier.
    ///
    /// Fails with a reason when there is no separator, either side is
    /// empty, or the identifier contains a second separator.
    pub fn parse(path: &'a str) -> Result<Self, &'static str> {
        let (content_type, identifier) = path
            .split_once(SCHEME_SEPARATOR)
            .ok_or("missing scheme separator")?;

        if content_type.is_empty() {
            return Err("empty content type");
        }
        if identifier.is_empty() {
            return Err("empty identifier");
        }
        if identifier.contains(SCHEME_SEPARATOR) {
            return Err("identifier contains a scheme separator");
        }

        Ok(Self { content_type, identifier })
    }

    /// Content type (scheme prefix)
    pub fn content_type(&self) -> &'a str {
        self.content_type
    }

    /// Everything after the separator
    pub fn identifier(&self) -> &'a str {
        self.identifier
    }
}

/// Build the canonical virtual path for a file found while scanning.
///
/// `relative` is the file path relative to the content-type directory.
/// Components are joined with `/` and the final extension is dropped.
/// Returns `None` for names that are not valid UTF-8 or paths that leave
/// the directory.
pub fn derive(content_type: &str, relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let file_name = parts.pop()?;
    let stem = match file_name.rfind('.') {
        // `.hidden` has no stem, keep it whole
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    };

    let mut identifier = parts.join("/");
    if !identifier.is_empty() {
        identifier.push('/');
    }
    identifier.push_str(stem);

    Some(format!("{}{}{}", content_type, SCHEME_SEPARATOR, identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse() {
        let vp = VirtualPath::parse("textures://ui/button").unwrap();
        assert_eq!(vp.content_type(), "textures");
        assert_eq!(vp.identifier(), "ui/button");

        assert!(VirtualPath::parse("textures/hero").is_err());
        assert!(VirtualPath::parse("://hero").is_err());
        assert!(VirtualPath::parse("textures://").is_err());
        assert!(VirtualPath::parse("textures://a://b").is_err());
    }

    #[test]
    fn test_derive() {
        assert_eq!(
            derive("textures", Path::new("hero.png")).as_deref(),
            Some("textures://hero")
        );

        let nested: PathBuf = ["ui", "icons", "gold.coin.png"].iter().collect();
        assert_eq!(
            derive("textures", &nested).as_deref(),
            Some("textures://ui/icons/gold.coin")
        );

        assert_eq!(derive("data", Path::new(".hidden")).as_deref(), Some("data://.hidden"));
        assert_eq!(derive("data", Path::new("README")).as_deref(), Some("data://README"));
        assert_eq!(derive("data", Path::new("../escape.json")), None);
    }
}

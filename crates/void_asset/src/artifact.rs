//! Artifact - shared handle to a loaded resource
//!
//! Decoders and the host loader produce values of unrelated types. An
//! artifact erases the type behind an `Arc` so it can be cached and
//! returned through one load contract, and callers downcast it back.

use std::any::Any;
use std::sync::Arc;

/// Who produced an artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Returned by the host's native resource loader
    Host,
    /// Produced by the named decoder
    Decoder(&'static str),
}

/// Type-erased, cheaply clonable loaded resource
#[derive(Clone)]
pub struct Artifact {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    source: ArtifactSource,
}

impl Artifact {
    /// Wrap a value produced by a decoder
    pub fn new<T: Any + Send + Sync>(value: T, decoder: &'static str) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            source: ArtifactSource::Decoder(decoder),
        }
    }

    /// Wrap a value returned by the host loader
    pub fn from_host<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            source: ArtifactSource::Host,
        }
    }

    /// Borrow the value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Shared pointer to the value as `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// True if the value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Producer of the value
    pub fn source(&self) -> ArtifactSource {
        self.source
    }

    /// True if both artifacts share the same allocation
    pub fn ptr_eq(&self, other: &Artifact) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("type", &self.type_name)
            .field("source", &self.source)
            .finish()
    }
}

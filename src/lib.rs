mod cache;
mod error;
mod key;
mod producer;
mod resource;

pub use anyhow::{anyhow, Result};
pub use async_trait::async_trait;
pub use cache::*;
pub use error::*;
pub use key::*;
pub use producer::*;
pub use resource::*;

/// Shared handle to a cache, passed explicitly to every call site that needs it.
pub type CacheContext<T> = std::sync::Arc<ResourceCache<T>>;

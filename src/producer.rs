use crate::key::ResourceKey;
use anyhow::Result;
use async_trait::async_trait;
use std::any::Any;

pub trait ResourceReqs: Any + Sized + Send + Sync + 'static {}
impl<T: Any + Sized + Send + Sync + 'static> ResourceReqs for T {}

/// Source of values for a cache: given a normalized key, produces the value
/// asynchronously.
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    type Output: ResourceReqs;

    async fn produce(&self, key: &ResourceKey) -> Result<Self::Output>;

    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

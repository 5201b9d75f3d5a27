use crate::key::ResourceKey;
use std::sync::Arc;

/// Failure recorded by a resource whose operation did not produce a value.
///
/// The cause is captured once and shared, so every reader of the same resource
/// observes the identical error.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("loading `{key}` failed: {cause:#}")]
    OperationFailed {
        key: ResourceKey,
        cause: Arc<anyhow::Error>,
    },
}

impl ResourceError {
    pub(crate) fn operation_failed(key: &ResourceKey, cause: anyhow::Error) -> Self {
        Self::OperationFailed {
            key: key.clone(),
            cause: Arc::new(cause),
        }
    }

    pub fn key(&self) -> &ResourceKey {
        match self {
            Self::OperationFailed { key, .. } => key,
        }
    }

    pub fn cause(&self) -> &anyhow::Error {
        match self {
            Self::OperationFailed { cause, .. } => cause,
        }
    }

    /// True if both errors carry the very same captured cause.
    pub fn same_failure(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::OperationFailed { cause: a, .. }, Self::OperationFailed { cause: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
        }
    }
}

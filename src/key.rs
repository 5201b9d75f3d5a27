use std::{borrow::Borrow, fmt, hash::BuildHasher};
use wyhash::WyHash;

/// A cache key after case folding.
///
/// Different spellings of the same name (`"Pikachu"`, `"PIKACHU"`) normalize to
/// the same key and therefore share one cache slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ResourceKey {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&String> for ResourceKey {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl From<&ResourceKey> for ResourceKey {
    fn from(key: &ResourceKey) -> Self {
        key.clone()
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Only sound because `Hash`/`Eq` are derived from the inner string.
impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map hasher for resource keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyHasher {
    seed: u64,
}

impl KeyHasher {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl BuildHasher for KeyHasher {
    type Hasher = WyHash;

    fn build_hasher(&self) -> WyHash {
        WyHash::with_seed(self.seed)
    }
}

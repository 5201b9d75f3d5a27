#![allow(dead_code)]

use keyed_resource::*;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pokemon {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no pokemon named `{0}`")]
pub struct NotFoundError(pub String);

/// In-memory pokédex counting how many lookups it served.
pub struct Pokedex {
    entries: HashMap<&'static str, u32>,
    pub lookups: AtomicUsize,
}

impl Pokedex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: vec![("bulbasaur", 1), ("charmander", 4), ("pikachu", 25), ("ditto", 132)]
                .into_iter()
                .collect(),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Producer for Pokedex {
    type Output = Pokemon;

    async fn produce(&self, key: &ResourceKey) -> Result<Pokemon> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        match self.entries.get(key.as_str()) {
            Some(&number) => Ok(Pokemon {
                name: key.to_string(),
                number,
            }),
            None => Err(NotFoundError(key.to_string()).into()),
        }
    }
}

pub fn pokemon(name: &str, number: u32) -> Pokemon {
    Pokemon {
        name: name.to_owned(),
        number,
    }
}

use keyed_resource::*;
use std::{collections::HashMap, sync::Arc, time::Duration};

#[derive(Debug)]
struct Pokemon {
    name: String,
    number: u32,
    kind: &'static str,
}

// Stands in for a remote API: every lookup takes a while.
struct SlowPokedex {
    entries: HashMap<&'static str, (u32, &'static str)>,
    latency: Duration,
}

#[async_trait]
impl Producer for SlowPokedex {
    type Output = Pokemon;

    async fn produce(&self, key: &ResourceKey) -> Result<Pokemon> {
        println!("    Fetching {} from the pokédex", key);
        tokio::time::sleep(self.latency).await;

        let (number, kind) = self
            .entries
            .get(key.as_str())
            .ok_or_else(|| anyhow!("no pokemon named {:?}", key.as_str()))?;

        Ok(Pokemon {
            name: key.to_string(),
            number: *number,
            kind: *kind,
        })
    }
}

/// Reads the resource the way a suspending renderer would: show a fallback
/// while pending, then retry once notified.
async fn render(resource: &Arc<LazyResource<Pokemon>>) -> std::result::Result<String, ResourceError> {
    loop {
        match resource.read() {
            Read::Ready(pokemon) => {
                return Ok(format!(
                    "#{:03} {} ({})",
                    pokemon.number, pokemon.name, pokemon.kind
                ))
            }
            Read::Failed(err) => return Err(err),
            Read::Pending => {
                println!("    Loading {}...", resource.key());
                // Wait for the settle notification, then read again.
                let _ = resource.settled().await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let names: Vec<String> = std::env::args().skip(1).collect();
    let names = if names.is_empty() {
        ["Pikachu", "PIKACHU", "ditto", "MissingNo", "pikachu"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    } else {
        names
    };

    let pokedex = Arc::new(SlowPokedex {
        entries: vec![
            ("bulbasaur", (1, "grass")),
            ("charmander", (4, "fire")),
            ("pikachu", (25, "electric")),
            ("ditto", (132, "normal")),
        ]
        .into_iter()
        .collect(),
        latency: Duration::from_millis(200),
    });

    // Lives for as long as this scope does; every lookup goes through it.
    let cache: CacheContext<Pokemon> = Arc::new(ResourceCache::new()?);

    for name in &names {
        println!("Requesting {:?}", name);
        let resource = cache.get_or_fetch(name, &pokedex);

        match render(&resource).await {
            Ok(card) => println!("  {}", card),
            Err(err) => {
                println!("  Error: {}", err);

                // Reading again gives the same failure; only a replacement
                // under the same key starts over.
                let cached = cache.get(resource.key());
                println!(
                    "  Still cached: {}",
                    cached.map_or(false, |cached| Arc::ptr_eq(&cached, &resource))
                );

                let fallback = cache.replace(resource.key(), |key| {
                    let name = key.to_string();
                    async move {
                        Ok(Pokemon {
                            name,
                            number: 0,
                            kind: "glitch",
                        })
                    }
                });
                if let Ok(card) = render(&fallback).await {
                    println!("  Recovered: {}", card);
                }
            }
        }
    }

    println!("Cached keys: {:?}", cache.keys());
    Ok(())
}

//! Read-through cache of shoes, keyed by shoe id.
//!
//! Orders only carry a `SHOE_ID`; the orders page joins each one onto the
//! shoe's name, brand and price through this cache. Listing the catalog
//! refreshes every entry, deleting a shoe invalidates its entry.

use std::collections::HashMap;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

use ys_shoe_core::ShoeId;

use super::{ApiSession, Shoe, ShoeStoreApi};

/// Upper bound on cached shoes.
const MAX_CAPACITY: u64 = 10_000;

/// Shared cache of [`Shoe`] records.
#[derive(Clone)]
pub struct ProductCache {
    cache: Cache<ShoeId, Shoe>,
}

impl ProductCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Store freshly fetched shoes.
    pub async fn prime(&self, shoes: &[Shoe]) {
        for shoe in shoes {
            self.cache.insert(shoe.id, shoe.clone()).await;
        }
    }

    /// A cached shoe, if present and not expired.
    pub async fn get(&self, id: ShoeId) -> Option<Shoe> {
        self.cache.get(&id).await
    }

    /// Drop a shoe that no longer exists.
    pub async fn invalidate(&self, id: ShoeId) {
        self.cache.invalidate(&id).await;
    }

    /// Resolve every id in `ids`, fetching the catalog once if any are missing.
    ///
    /// A failed catalog fetch is logged and the ids stay unresolved; callers
    /// render their placeholders for those.
    pub async fn lookup_many(
        &self,
        api: &dyn ShoeStoreApi,
        session: &ApiSession,
        ids: &[ShoeId],
    ) -> HashMap<ShoeId, Shoe> {
        let mut found = HashMap::new();
        let mut missing = Vec::new();

        for &id in ids {
            if found.contains_key(&id) || missing.contains(&id) {
                continue;
            }
            match self.get(id).await {
                Some(shoe) => {
                    found.insert(id, shoe);
                }
                None => missing.push(id),
            }
        }

        if missing.is_empty() {
            debug!(hits = found.len(), "Product cache hit for all shoes");
            return found;
        }

        match api.list_shoes(session).await {
            Ok(shoes) => {
                self.prime(&shoes).await;
                found.extend(
                    shoes
                        .into_iter()
                        .filter(|shoe| missing.contains(&shoe.id))
                        .map(|shoe| (shoe.id, shoe)),
                );
            }
            Err(e) => {
                warn!(error = %e, missing = missing.len(), "Failed to refresh product cache");
            }
        }

        found
    }
}

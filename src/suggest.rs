//! Pick an unseen catalog word, uniformly at random.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::XueziError;

/// Holds the catalog and the RNG. Keeps no other state between calls,
/// so the candidate set is always derived from the caller's known set.
pub struct Suggester {
    catalog: Arc<Catalog>,
    rng: Mutex<StdRng>,
}

impl Suggester {
    /// `seed` makes picks reproducible; `None` seeds from the thread RNG.
    pub fn new(catalog: Arc<Catalog>, seed: Option<u64>) -> Self {
        let rng = StdRng::seed_from_u64(seed.unwrap_or_else(rand::random));
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn suggest(&self, known: &HashSet<String>) -> Result<CatalogEntry, XueziError> {
        let candidates = candidates(&self.catalog, known);
        let mut rng = self.rng.lock();
        candidates
            .choose(&mut *rng)
            .map(|e| (*e).clone())
            .ok_or(XueziError::NoCandidates)
    }

    /// How many catalog entries are still unknown.
    pub fn remaining(&self, known: &HashSet<String>) -> usize {
        self.catalog
            .iter()
            .filter(|e| !known.contains(&e.character))
            .count()
    }
}

fn candidates<'a>(catalog: &'a Catalog, known: &HashSet<String>) -> Vec<&'a CatalogEntry> {
    catalog
        .iter()
        .filter(|e| !known.contains(&e.character))
        .collect()
}

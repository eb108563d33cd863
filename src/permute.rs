/*
 *  permute.rs
 *
 *  wxpanel - minute-true weather panel
 *	(c) 2020-26 Stuart Hunter
 *
 *	Stable pseudo-random permutations, cached per limit
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const PERMUTE_SEED: u64 = 0;

/// Shuffled `0..limit` tables, built lazily and reused.
///
/// Every table is shuffled from a fresh rng seeded with the same fixed seed,
/// so output is identical across runs and independent of lookup order.
#[derive(Debug, Default)]
pub struct PermutationCache {
    tables: HashMap<usize, Vec<usize>>,
}

impl PermutationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&mut self, limit: usize) -> &[usize] {
        self.tables.entry(limit).or_insert_with(|| {
            let mut table: Vec<usize> = (0..limit).collect();
            let mut rng = StdRng::seed_from_u64(PERMUTE_SEED);
            table.shuffle(&mut rng);
            table
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_a_permutation() {
        let mut cache = PermutationCache::new();
        let mut seen = cache.table(20).to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_stable_across_instances() {
        let mut a = PermutationCache::new();
        let mut b = PermutationCache::new();
        // warm b with another limit first, order must not matter
        b.table(7);
        assert_eq!(a.table(33).to_vec(), b.table(33).to_vec());
    }

    #[test]
    fn test_empty_limit() {
        let mut cache = PermutationCache::new();
        assert!(cache.table(0).is_empty());
    }
}

// src/services/selection.rs

//! Repeat-avoiding random selection.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::{Candidate, RotationRecords};

/// Outcome of one draw.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub picks: Vec<Candidate>,
    /// Size of the pool the picks were drawn from
    pub pool_size: usize,
    /// True when every candidate was posted recently and the full set was used
    pub fell_back: bool,
}

/// Draw up to `sample_size` distinct candidates uniformly at random.
///
/// Candidates with a live rotation record are skipped, unless that would
/// leave nothing, in which case all candidates are eligible again.
/// Repeated ids count once (first occurrence). `records` must already be
/// pruned.
pub fn select<R: Rng + ?Sized>(
    candidates: &[Candidate],
    records: &RotationRecords,
    sample_size: usize,
    rng: &mut R,
) -> Selection {
    let mut seen = HashSet::new();
    let unique: Vec<&Candidate> = candidates.iter().filter(|c| seen.insert(c.id)).collect();

    let fresh: Vec<&Candidate> = unique
        .iter()
        .copied()
        .filter(|c| !records.contains(c.id))
        .collect();

    let fell_back = fresh.is_empty() && !unique.is_empty();
    let pool: Vec<&Candidate> = if fell_back {
        unique
    } else {
        fresh
    };

    let count = sample_size.min(pool.len());
    let picks = pool
        .choose_multiple(rng, count)
        .map(|c| (*c).clone())
        .collect();

    Selection {
        picks,
        pool_size: pool.len(),
        fell_back,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn candidates(ids: &[u64]) -> Vec<Candidate> {
        ids.iter()
            .map(|&id| Candidate::new(id, format!("Item {id}"), format!("https://booth.pm/ja/items/{id}")))
            .collect()
    }

    fn posted(ids: &[u64]) -> RotationRecords {
        ids.iter().map(|&id| (id, 1_760_000_000)).collect()
    }

    #[test]
    fn empty_candidates_yield_empty_selection() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = select(&[], &posted(&[1]), 3, &mut rng);

        assert!(selection.picks.is_empty());
        assert_eq!(selection.pool_size, 0);
        assert!(!selection.fell_back);
    }

    #[test]
    fn skips_recently_posted() {
        let pool = candidates(&[1, 2, 3]);
        let records = posted(&[1]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = select(&pool, &records, 1, &mut rng);

            assert_eq!(selection.picks.len(), 1);
            assert_ne!(selection.picks[0].id, 1);
            assert_eq!(selection.pool_size, 2);
        }
    }

    #[test]
    fn falls_back_to_all_candidates() {
        let pool = candidates(&[1, 2, 3]);
        let records = posted(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(7);

        let selection = select(&pool, &records, 2, &mut rng);

        assert!(selection.fell_back);
        assert_eq!(selection.pool_size, 3);
        assert_eq!(selection.picks.len(), 2);
    }

    #[test]
    fn never_exceeds_sample_size_or_repeats() {
        let pool = candidates(&[10, 11, 12, 13, 14]);
        let records = RotationRecords::new();

        for (seed, size) in (0..40).zip([0, 1, 3, 5, 9].into_iter().cycle()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = select(&pool, &records, size, &mut rng);

            assert_eq!(selection.picks.len(), size.min(pool.len()));
            let unique: HashSet<_> = selection.picks.iter().map(|c| c.id).collect();
            assert_eq!(unique.len(), selection.picks.len());
        }
    }

    #[test]
    fn repeated_ids_are_drawn_once() {
        let mut pool = candidates(&[7, 8]);
        pool.extend(candidates(&[7, 7, 8]));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = select(&pool, &RotationRecords::new(), 5, &mut rng);

            assert_eq!(selection.pool_size, 2);
            let mut ids: Vec<_> = selection.picks.iter().map(|c| c.id).collect();
            ids.sort();
            assert_eq!(ids, vec![7, 8]);
        }
    }

    #[test]
    fn same_seed_same_draw() {
        let pool = candidates(&[1, 2, 3, 4, 5, 6]);
        let records = posted(&[2]);

        let first = select(&pool, &records, 2, &mut StdRng::seed_from_u64(99));
        let second = select(&pool, &records, 2, &mut StdRng::seed_from_u64(99));

        assert_eq!(first.picks, second.picks);
    }

    #[test]
    fn draws_cover_whole_pool() {
        let pool = candidates(&[1, 2, 3, 4]);
        let records = posted(&[4]);
        let mut seen = HashSet::new();

        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..200 {
            let selection = select(&pool, &records, 1, &mut rng);
            seen.insert(selection.picks[0].id);
        }

        assert_eq!(seen, HashSet::from([1, 2, 3]));
    }
}

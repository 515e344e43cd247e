//! Unbiased random permutation.

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle `items` in place with the Fisher–Yates algorithm.
///
/// `SliceRandom::shuffle` walks from the last index down to 1, swapping each
/// element with one drawn uniformly from `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Return a shuffled copy of `items`.
pub fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    fisher_yates(&mut items, rng);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn test_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(1);

        let mut empty: [u8; 0] = [];
        fisher_yates(&mut empty, &mut rng);

        assert_eq!(shuffled(vec!["only"], &mut rng), vec!["only"]);
    }

    #[test]
    fn test_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let input: Vec<u32> = (0..50).collect();

        let mut output = shuffled(input.clone(), &mut rng);
        output.sort_unstable();
        assert_eq!(output, input);
    }

    #[test]
    fn test_uniform_over_three() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<Vec<char>, usize> = HashMap::new();
        let trials = 6_000;

        for _ in 0..trials {
            *counts.entry(shuffled(vec!['a', 'b', 'c'], &mut rng)).or_default() += 1;
        }

        // 3! orderings, ~1000 each; sd is about 29
        assert_eq!(counts.len(), 6);
        for (perm, count) in &counts {
            assert!((850..=1150).contains(count), "{perm:?} seen {count} times");
        }
    }
}

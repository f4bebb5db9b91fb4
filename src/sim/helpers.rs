//! Small shared helpers: probability draws and stable ordering.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

/// One Bernoulli draw: true with probability `p`.
pub fn roll(rng: &mut dyn RngCore, p: f64) -> bool {
    rng.random::<f64>() < p
}

/// Uniformly pick one element, or `None` if the slice is empty.
pub fn pick<T: Copy>(rng: &mut dyn RngCore, items: &[T]) -> Option<T> {
    items.choose(rng).copied()
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// The first element with the greatest key. Ties go to the earliest element.
pub fn first_max_by_key<T: Copy, K: Ord>(items: &[T], key: impl Fn(T) -> K) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for &item in items {
        let k = key(item);
        match &best {
            Some((_, bk)) if k <= *bk => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}

/// The first element with the smallest key. Ties go to the earliest element.
pub fn first_min_by_key<T: Copy, K: Ord>(items: &[T], key: impl Fn(T) -> K) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for &item in items {
        let k = key(item);
        match &best {
            Some((_, bk)) if k >= *bk => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}

// Copyright © 2024 blitzbeaver contributors

use std::collections::HashMap;

use itertools::Itertools as _;
use log::debug;
use rayon::prelude::*;

use crate::engine::value::Word;

/// Precomputed distances between pairs of words.
///
/// The distance is symmetric, so a pair is stored once under its
/// lexicographically ordered key.
#[derive(Debug, Default)]
pub struct DistanceCache {
    values: HashMap<String, HashMap<String, f32>>,
    size: usize,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.size = 0;
    }

    pub fn get(&self, a: &Word, b: &Word) -> Option<f32> {
        let (a, b) = ordered(a.raw(), b.raw());
        self.values.get(a).and_then(|row| row.get(b)).copied()
    }

    pub fn set(&mut self, a: &Word, b: &Word, dist: f32) {
        let (a, b) = ordered(a.raw(), b.raw());
        let previous = self
            .values
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), dist);
        if previous.is_none() {
            self.size += 1;
        }
    }

    /// Computes the distance of every pair whose occurrence counts multiply to
    /// at least `threshold`. Only those pairs are frequent enough to be worth
    /// storing.
    pub fn precompute<'a>(
        &mut self,
        left: impl IntoIterator<Item = &'a Word>,
        right: impl IntoIterator<Item = &'a Word>,
        threshold: u32,
        distance: impl Fn(&Word, &Word) -> f32 + Sync,
    ) {
        let left = left.into_iter().counts();
        let right = right.into_iter().counts();

        let pairs: Vec<(&Word, &Word)> = left
            .iter()
            .cartesian_product(right.iter())
            .filter(|((_, c1), (_, c2))| c1.saturating_mul(**c2) >= threshold as usize)
            .map(|((w1, _), (w2, _))| (*w1, *w2))
            .filter(|(w1, w2)| self.get(w1, w2).is_none())
            .collect();

        let computed: Vec<f32> = pairs.par_iter().map(|(w1, w2)| distance(*w1, *w2)).collect();
        for ((w1, w2), dist) in pairs.into_iter().zip(computed) {
            self.set(w1, w2, dist);
        }
        debug!("Distance cache holds {} pairs", self.size);
    }
}

fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

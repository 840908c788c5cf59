// Copyright © 2024 blitzbeaver contributors

//! Per field summaries of the values a tracker has matched.

use std::collections::VecDeque;
use std::hash::Hash;

use indexmap::IndexMap;

use super::assignment::min_cost_assignment;
use super::config::{MemoryKind, MemoryStrategy};
use super::distance::DistanceMetric;
use super::median::{compute_median_word, medoid_element};
use super::value::{Element, ElementKind, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stats {
    count: usize,
    last_seen: usize,
}

/// Distinct values in first seen order with their frequency and recency.
#[derive(Debug, Clone)]
struct ValueTable<K> {
    entries: IndexMap<K, Stats>,
}

impl<K: Hash + Eq + Clone> ValueTable<K> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    fn observe(&mut self, key: K, tick: usize) {
        let stats = self.entries.entry(key).or_insert(Stats {
            count: 0,
            last_seen: tick,
        });
        stats.count += 1;
        stats.last_seen = stats.last_seen.max(tick);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn distinct(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Most frequent value, the most recent one on ties.
    fn most_frequent(&self) -> Option<&K> {
        self.entries
            .iter()
            .max_by_key(|(_, stats)| (stats.count, stats.last_seen))
            .map(|(key, _)| key)
    }

    fn most_recent(&self) -> Option<&K> {
        self.entries
            .iter()
            .max_by_key(|(_, stats)| stats.last_seen)
            .map(|(key, _)| key)
    }

    /// Distinct values, most recent first.
    fn by_recency(&self) -> Vec<&K> {
        let mut keys: Vec<(&K, usize)> = self
            .entries
            .iter()
            .map(|(key, stats)| (key, stats.last_seen))
            .collect();
        keys.sort_by(|(_, a), (_, b)| b.cmp(a));
        keys.into_iter().map(|(key, _)| key).collect()
    }

    /// Every observation, repeated as many times as it was seen, with its
    /// recency.
    fn occurrences(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries
            .iter()
            .flat_map(|(key, stats)| std::iter::repeat_n((key, stats.last_seen), stats.count))
    }
}

/// Tokens of a multiword field that were aligned with each other over time.
#[derive(Debug, Clone)]
struct TokenSlot {
    table: ValueTable<Word>,
    representative: Word,
}

impl TokenSlot {
    fn new(token: Word, tick: usize) -> Self {
        let mut table = ValueTable::new();
        table.observe(token.clone(), tick);
        Self {
            table,
            representative: token,
        }
    }

    fn refresh(&mut self, kind: MemoryKind) {
        let representative = match kind {
            MemoryKind::BruteForce => self.table.most_recent().cloned(),
            MemoryKind::MostFrequent => self.table.most_frequent().cloned(),
            MemoryKind::Median => {
                let words: Vec<Word> = self.table.occurrences().map(|(w, _)| w.clone()).collect();
                compute_median_word(&words)
            }
        };
        if let Some(representative) = representative {
            self.representative = representative;
        }
    }
}

/// Summary of the values one tracker matched for one field.
///
/// The comparison set is rebuilt on every update and is what incoming values
/// are compared against; the distance to the memory is the smallest distance
/// to any element of the set.
#[derive(Debug, Clone)]
pub struct FieldMemory {
    strategy: MemoryStrategy,
    window: Option<usize>,
    slot_threshold: Option<f32>,
    tick: usize,
    recent: VecDeque<(Element, usize)>,
    table: ValueTable<Element>,
    slots: Vec<TokenSlot>,
    comparison: Vec<Element>,
}

impl FieldMemory {
    pub fn new(
        strategy: MemoryStrategy,
        field_kind: ElementKind,
        window: usize,
        slot_threshold: f32,
    ) -> Self {
        let per_token = strategy.is_per_token() && field_kind == ElementKind::MultiStrings;
        Self {
            strategy,
            window: strategy.is_windowed().then_some(window),
            slot_threshold: per_token.then_some(slot_threshold),
            tick: 0,
            recent: VecDeque::new(),
            table: ValueTable::new(),
            slots: Vec::new(),
            comparison: Vec::new(),
        }
    }

    pub fn strategy(&self) -> MemoryStrategy {
        self.strategy
    }

    /// Records a matched value, absent values leave the memory untouched.
    pub fn update(&mut self, value: &Element) {
        if value.is_none() {
            return;
        }
        self.tick += 1;
        let tick = self.tick;

        if let Some(threshold) = self.slot_threshold {
            self.update_slots(value.words(), threshold, tick);
            self.comparison = self.slot_comparison();
            return;
        }

        match self.window {
            Some(window) => {
                self.recent.push_back((value.clone(), tick));
                while self.recent.len() > window {
                    self.recent.pop_front();
                }
                self.table = ValueTable::new();
                for (element, seen) in &self.recent {
                    self.table.observe(element.clone(), *seen);
                }
            }
            None => self.table.observe(value.clone(), tick),
        }
        self.comparison = self.table_comparison();
    }

    /// Values incoming elements are compared against, empty before the
    /// first update.
    pub fn comparison_set(&self) -> &[Element] {
        &self.comparison
    }

    /// Main comparison value, the single element of the set for every
    /// strategy but the brute force ones.
    pub fn comparison_value(&self) -> Option<&Element> {
        self.comparison.first()
    }

    pub fn is_empty(&self) -> bool {
        self.comparison.is_empty()
    }

    fn table_comparison(&self) -> Vec<Element> {
        if self.table.is_empty() {
            return Vec::new();
        }
        match self.strategy.kind() {
            MemoryKind::BruteForce => self.table.distinct().cloned().collect(),
            MemoryKind::MostFrequent => self.table.most_frequent().cloned().into_iter().collect(),
            MemoryKind::Median => self.median().into_iter().collect(),
        }
    }

    fn median(&self) -> Option<Element> {
        let (values, recency): (Vec<Element>, Vec<usize>) = self
            .table
            .occurrences()
            .map(|(element, seen)| (element.clone(), seen))
            .unzip();
        if values.iter().all(|value| matches!(value, Element::Word(_))) {
            let words: Vec<Word> = values
                .iter()
                .flat_map(|value| value.words().iter().cloned())
                .collect();
            compute_median_word(&words).map(Element::Word)
        } else {
            medoid_element(&values, &recency, |a, b| {
                DistanceMetric::LvMultiword.element_distance(a, b)
            })
        }
    }

    fn update_slots(&mut self, tokens: &[Word], threshold: f32, tick: usize) {
        let costs: Vec<Vec<f64>> = tokens
            .iter()
            .map(|token| {
                self.slots
                    .iter()
                    .map(|slot| {
                        f64::from(DistanceMetric::Lv.word_distance(token, &slot.representative))
                    })
                    .collect()
            })
            .collect();
        let assignment = if self.slots.is_empty() {
            vec![None; tokens.len()]
        } else {
            min_cost_assignment(&costs)
        };

        let kind = self.strategy.kind();
        let mut fresh = Vec::new();
        for (token_idx, (token, slot_idx)) in tokens.iter().zip(assignment).enumerate() {
            match slot_idx {
                Some(slot_idx) if costs[token_idx][slot_idx] <= f64::from(threshold) => {
                    let slot = &mut self.slots[slot_idx];
                    slot.table.observe(token.clone(), tick);
                    slot.refresh(kind);
                }
                _ => fresh.push(TokenSlot::new(token.clone(), tick)),
            }
        }
        self.slots.extend(fresh);
    }

    fn slot_comparison(&self) -> Vec<Element> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        match self.strategy.kind() {
            MemoryKind::BruteForce => {
                let by_recency: Vec<Vec<&Word>> =
                    self.slots.iter().map(|slot| slot.table.by_recency()).collect();
                let depth = by_recency.iter().map(Vec::len).max().unwrap_or(0);
                (0..depth)
                    .map(|layer| {
                        Element::MultiWords(
                            by_recency
                                .iter()
                                .filter_map(|tokens| tokens.get(layer).copied().cloned())
                                .collect(),
                        )
                    })
                    .collect()
            }
            MemoryKind::MostFrequent | MemoryKind::Median => {
                vec![Element::MultiWords(
                    self.slots
                        .iter()
                        .map(|slot| slot.representative.clone())
                        .collect(),
                )]
            }
        }
    }
}

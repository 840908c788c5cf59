// Copyright © 2024 blitzbeaver contributors

//! Approximate Levenshtein median of a set of words.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

use super::distance::levenshtein::edits;
use super::value::{Element, Word};

const MAX_ITERATIONS: usize = 32;

/// Word minimizing the summed edit distance to every input word.
///
/// The search starts from the best input word and then moves to the best
/// single grapheme deletion, substitution or insertion for as long as that
/// strictly lowers the total. Graphemes are drawn from the inputs. Ties are
/// broken by lexicographic order, so the result only depends on the multiset
/// of inputs. Returns `None` for an empty input.
pub fn compute_median_word(words: &[Word]) -> Option<Word> {
    let mut current = medoid(words)?;
    let mut current_cost = total_edits(&current, words);

    let alphabet: BTreeSet<&str> = words
        .iter()
        .flat_map(|word| word.raw().graphemes(true))
        .collect();

    for _ in 0..MAX_ITERATIONS {
        if current_cost == 0 {
            break;
        }
        let mut best: Option<(usize, Word)> = None;
        for candidate in neighbours(&current, &alphabet) {
            let cost = total_edits(&candidate, words);
            let better = match &best {
                None => cost < current_cost,
                Some((best_cost, best_word)) => {
                    cost < *best_cost || (cost == *best_cost && candidate < *best_word)
                }
            };
            if better {
                best = Some((cost, candidate));
            }
        }
        match best {
            Some((cost, word)) => {
                current = word;
                current_cost = cost;
            }
            None => break,
        }
    }
    Some(current)
}

/// Input word with the smallest summed edit distance to the others.
pub fn medoid(words: &[Word]) -> Option<Word> {
    let distinct: BTreeSet<&Word> = words.iter().collect();
    distinct
        .into_iter()
        .map(|word| (total_edits(word, words), word))
        .min_by(|(ca, wa), (cb, wb)| ca.cmp(cb).then_with(|| wa.cmp(wb)))
        .map(|(_, word)| word.clone())
}

/// Medoid of token lists, by summed token alignment distance.
///
/// `recency` ranks each list, higher is more recent, and breaks ties.
pub fn medoid_element(
    values: &[Element],
    recency: &[usize],
    distance: impl Fn(&Element, &Element) -> f32,
) -> Option<Element> {
    values
        .iter()
        .zip(recency)
        .map(|(candidate, rank)| {
            let total: f32 = values.iter().map(|other| distance(candidate, other)).sum();
            (total, *rank, candidate)
        })
        .min_by(|(ta, ra, _), (tb, rb, _)| ta.total_cmp(tb).then_with(|| rb.cmp(ra)))
        .map(|(_, _, element)| element.clone())
}

fn total_edits(candidate: &Word, words: &[Word]) -> usize {
    words
        .iter()
        .map(|word| edits(candidate.graphemes(), word.graphemes()))
        .sum()
}

fn neighbours<'a>(word: &'a Word, alphabet: &'a BTreeSet<&'a str>) -> impl Iterator<Item = Word> + 'a {
    let graphemes: Vec<&str> = word.raw().graphemes(true).collect();
    let len = graphemes.len();
    let rebuild = move |skip: Option<usize>, put: Option<(usize, &str, bool)>| {
        let mut raw = String::with_capacity(word.raw().len() + 4);
        for (pos, grapheme) in graphemes.iter().enumerate() {
            if let Some((at, g, insert)) = put {
                if at == pos {
                    raw.push_str(g);
                    if !insert {
                        continue;
                    }
                }
            }
            if skip == Some(pos) {
                continue;
            }
            raw.push_str(grapheme);
        }
        if let Some((at, g, true)) = put {
            if at == graphemes.len() {
                raw.push_str(g);
            }
        }
        Word::new(raw)
    };

    let deletions = (0..len).map(move |pos| (Some(pos), None));
    let substitutions = (0..len).flat_map(move |pos| {
        alphabet
            .iter()
            .map(move |g| (None, Some((pos, *g, false))))
    });
    let insertions = (0..=len).flat_map(move |pos| {
        alphabet
            .iter()
            .map(move |g| (None, Some((pos, *g, true))))
    });
    deletions
        .chain(substitutions)
        .chain(insertions)
        .map(move |(skip, put)| rebuild(skip, put))
        .filter(move |candidate| candidate != word)
}

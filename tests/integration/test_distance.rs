// Copyright © 2024 blitzbeaver contributors

use super::helpers::assert_close;

use blitzbeaver_engine::engine::distance::levenshtein::{
    bounded_edits, edits, edits_and_longest_common_substring,
};
use blitzbeaver_engine::engine::{
    AbsentPolicy, DistanceCalculator, DistanceMetric, DistanceMetricConfig, DistanceMetricKind,
    EditWeights, Element, Word,
};

fn word(raw: &str) -> Word {
    Word::new(raw)
}

fn all_metrics() -> Vec<DistanceMetric> {
    DistanceMetricKind::ALL
        .iter()
        .map(|kind| DistanceMetric::from_config(&DistanceMetricConfig::new(*kind)))
        .collect()
}

#[test]
fn test_edits() {
    let cases = [
        ("hello", "hallo", 1),
        ("hello", "helloworld", 5),
        ("Hello", "hello", 1),
        ("Bernard", "bBeernard", 2),
        ("hello", "", 5),
        ("", "", 0),
    ];
    for (a, b, expected) in cases {
        assert_eq!(edits(word(a).graphemes(), word(b).graphemes()), expected, "{a} / {b}");
        assert_eq!(edits(word(b).graphemes(), word(a).graphemes()), expected, "{b} / {a}");
    }
}

#[test]
fn test_bounded_edits() {
    let (hello, world) = (word("hello"), word("world"));
    assert_eq!(bounded_edits(hello.graphemes(), world.graphemes(), 4), Some(4));
    assert_eq!(bounded_edits(hello.graphemes(), world.graphemes(), 3), None);
    assert_eq!(bounded_edits(hello.graphemes(), word("hello!!!").graphemes(), 2), None);
}

#[test]
fn test_longest_common_substring() {
    let (a, b) = (word("bernart"), word("jeanbernard"));
    assert_eq!(edits_and_longest_common_substring(a.graphemes(), b.graphemes()), (5, 6));
}

#[test]
fn test_graphemes_count_as_one() {
    let combined = word("noe\u{308}l");
    assert_eq!(combined.len(), 4);
    assert_close(
        DistanceMetric::Lv.word_distance(&combined, &word("noel")),
        0.25,
    );
}

#[test]
fn test_lv() {
    let lv = DistanceMetric::Lv;
    assert_close(lv.word_distance(&word("hello"), &word("hallo")), 0.2);
    assert_close(lv.word_distance(&word("hello"), &word("helloworld")), 0.5);
    assert_close(lv.word_distance(&word("hello"), &word("")), 1.0);
    assert_close(lv.word_distance(&word(""), &word("")), 0.0);
}

#[test]
fn test_lv_opti_cutoff() {
    let lv_opti = DistanceMetric::LvOpti { cutoff: 0.5 };
    assert_close(lv_opti.word_distance(&word("hello"), &word("hallo")), 0.2);
    assert_close(lv_opti.word_distance(&word("hello"), &word("world")), 1.0);
    assert_close(
        DistanceMetric::Lv.word_distance(&word("hello"), &word("world")),
        0.8,
    );
}

#[test]
fn test_lv_edit_weights() {
    let unit = DistanceMetric::LvEdit {
        weights: EditWeights::default(),
    };
    assert_close(unit.word_distance(&word("hello"), &word("hallo")), 0.2);

    let skewed = DistanceMetric::LvEdit {
        weights: EditWeights {
            insertion: 0.5,
            deletion: 2.0,
            substitution: 1.0,
        },
    };
    let (abc, abcd) = (word("abc"), word("abcd"));
    assert_close(skewed.word_distance(&abc, &abcd), 0.5 / 3.5);
    assert_eq!(
        skewed.word_distance(&abc, &abcd),
        skewed.word_distance(&abcd, &abc)
    );
}

#[test]
fn test_lv_substring() {
    let lv_substring = DistanceMetric::LvSubstring { weight: 0.5 };
    let (a, b) = (word("bernart"), word("jeanbernard"));
    assert_close(lv_substring.word_distance(&a, &b), 2.0 / 11.0);
    assert!(lv_substring.word_distance(&a, &b) < DistanceMetric::Lv.word_distance(&a, &b));
}

#[test]
fn test_lv_multiword() {
    let lv_multiword = DistanceMetric::LvMultiword;
    let jean_pierre = Element::from(vec!["jean", "pierre"]);
    assert_close(
        lv_multiword.element_distance(&jean_pierre, &Element::from(vec!["pierre", "jean"])),
        0.0,
    );
    assert_close(
        lv_multiword.element_distance(&jean_pierre, &Element::from(vec!["jean"])),
        0.5,
    );
    assert_close(
        lv_multiword.element_distance(&jean_pierre, &Element::from(vec!["jan", "pierre"])),
        0.125,
    );
    let empty = Element::MultiWords(Vec::new());
    assert_close(lv_multiword.element_distance(&empty, &empty), 0.0);
    assert_close(lv_multiword.element_distance(&empty, &jean_pierre), 1.0);
}

#[test]
fn test_symmetry_and_identity() {
    let words = [
        "", "a", "alice", "alicee", "bob", "rob", "bernard", "Bernard", "bBeernard", "jean",
        "jeanbernard", "noe\u{308}l",
    ];
    for metric in all_metrics() {
        for a in words {
            assert_eq!(metric.word_distance(&word(a), &word(a)), 0.0, "{metric:?} {a}");
            for b in words {
                let ab = metric.word_distance(&word(a), &word(b));
                let ba = metric.word_distance(&word(b), &word(a));
                assert_eq!(ab, ba, "{metric:?} {a} / {b}");
                assert!((0.0..=1.0).contains(&ab), "{metric:?} {a} / {b}: {ab}");
            }
        }
    }

    let lists = [
        vec!["jean"],
        vec!["jean", "pierre"],
        vec!["pierre", "jan"],
        vec!["marie", "jeanne", "louise"],
        vec![],
    ];
    for a in &lists {
        let a = Element::from(a.clone());
        assert_eq!(DistanceMetric::LvMultiword.element_distance(&a, &a), 0.0);
        for b in &lists {
            let b = Element::from(b.clone());
            assert_eq!(
                DistanceMetric::LvMultiword.element_distance(&a, &b),
                DistanceMetric::LvMultiword.element_distance(&b, &a),
            );
        }
    }
}

#[test]
fn test_absent_policy() {
    let config = DistanceMetricConfig::new(DistanceMetricKind::Lv);
    let alice = Element::from("alice");

    let excluding = DistanceCalculator::new(&config, AbsentPolicy::Exclude);
    assert_eq!(excluding.distance(&alice, &Element::None), None);
    assert_eq!(excluding.distance(&Element::None, &Element::None), None);

    let fixed = DistanceCalculator::new(&config, AbsentPolicy::Fixed(0.7));
    assert_eq!(fixed.distance(&Element::None, &alice), Some(0.7));
    assert_eq!(fixed.distance(&alice, &Element::None), Some(0.7));
    assert_eq!(fixed.distance(&Element::None, &Element::None), Some(0.0));
}

#[test]
fn test_distance_to_set() {
    let config = DistanceMetricConfig::new(DistanceMetricKind::Lv);
    let calculator = DistanceCalculator::new(&config, AbsentPolicy::Exclude);
    let set = [Element::from("hello"), Element::from("world")];
    assert_eq!(
        calculator.distance_to_set(&set, &Element::from("hallo")),
        Some(DistanceMetric::Lv.word_distance(&word("hello"), &word("hallo")))
    );
    assert_eq!(calculator.distance_to_set(&[], &Element::from("hallo")), None);
}

#[test]
fn test_cache_does_not_change_distances() {
    let config = DistanceMetricConfig::new(DistanceMetricKind::LvSubstring);
    let mut calculator = DistanceCalculator::new(&config, AbsentPolicy::Exclude);
    let memory = [Element::from("bernart"), Element::from("bernart")];
    let frame = [
        Element::from("jeanbernard"),
        Element::from("jeanbernard"),
        Element::from("paul"),
    ];

    let before: Vec<_> = frame
        .iter()
        .map(|value| calculator.distance(&memory[0], value))
        .collect();
    calculator.prepare(&memory, &frame);
    assert_eq!(calculator.cache().len(), 1);
    let after: Vec<_> = frame
        .iter()
        .map(|value| calculator.distance(&memory[0], value))
        .collect();
    assert_eq!(before, after);
}

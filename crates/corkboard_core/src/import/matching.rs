//! Fuzzy name matching and dense slot planning.

use std::collections::HashMap;

/// Minimum Dice coefficient for two names to be considered the same.
pub const DEFAULT_NAME_MATCH_MIN_CONFIDENCE: f64 = 0.7;

/// Dice coefficient over character bigrams, ignoring whitespace.
///
/// Identical strings score `1.0`; strings shorter than two characters
/// (after whitespace removal) score `0.0` unless identical.
pub fn dice_coefficient(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.chars().filter(|ch| !ch.is_whitespace()).collect();
    let right: Vec<char> = right.chars().filter(|ch| !ch.is_whitespace()).collect();

    if left == right {
        return 1.0;
    }
    if left.len() < 2 || right.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in left.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in right.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (left.len() + right.len() - 2) as f64
}

pub fn names_match(left: &str, right: &str, min_confidence: f64) -> bool {
    dice_coefficient(left, right) >= min_confidence
}

/// Pairs extracted names with existing names.
///
/// Existing records are visited in order; each claims the first still
/// unclaimed extracted name it matches. Returns, per extracted index, the
/// matched existing index.
pub fn match_by_name(
    existing: &[&str],
    extracted: &[&str],
    min_confidence: f64,
) -> Vec<Option<usize>> {
    let mut matches = vec![None; extracted.len()];
    for (existing_index, existing_name) in existing.iter().enumerate() {
        let claimed = extracted
            .iter()
            .enumerate()
            .find(|(index, name)| {
                matches[*index].is_none() && names_match(name, existing_name, min_confidence)
            })
            .map(|(index, _)| index);
        if let Some(index) = claimed {
            matches[index] = Some(existing_index);
        }
    }
    matches
}

/// One position of a planned group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Existing record, by index into the existing slice.
    Existing(usize),
    /// New record, by index into the extracted slice.
    New(usize),
}

/// Dense layout for one group: extracted entries in their order (matched
/// ones reuse the existing record), then unmatched `leftovers` in the
/// given order. A slot's index is its target position.
pub fn plan_slots(
    matches: &[Option<usize>],
    leftovers: impl IntoIterator<Item = usize>,
) -> Vec<Slot> {
    let mut slots: Vec<Slot> = matches
        .iter()
        .enumerate()
        .map(|(index, matched)| match matched {
            Some(existing) => Slot::Existing(*existing),
            None => Slot::New(index),
        })
        .collect();
    slots.extend(leftovers.into_iter().map(Slot::Existing));
    slots
}

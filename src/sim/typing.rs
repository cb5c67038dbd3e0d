//! Keyboard-mode matching against live entities

use super::state::FallingEntity;
use crate::consts::MIN_MATCH_LEN;

/// The single entity whose text starts with `input`, ignoring case.
///
/// Input is trimmed and must be at least `MIN_MATCH_LEN` characters;
/// ambiguous input matches nothing.
pub fn unique_prefix_match(entities: &[FallingEntity], input: &str) -> Option<u32> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < MIN_MATCH_LEN {
        return None;
    }

    let mut matches = entities
        .iter()
        .filter(|e| e.text.to_lowercase().starts_with(&needle));
    let first = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(first.id),
    }
}

/// Entities containing `input` anywhere (hint highlighting), any length
pub fn highlight_matches(entities: &[FallingEntity], input: &str) -> Vec<u32> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    entities
        .iter()
        .filter(|e| e.text.to_lowercase().contains(&needle))
        .map(|e| e.id)
        .collect()
}

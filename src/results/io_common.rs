// Helpers shared by the ballot readers.

use std::collections::BTreeMap;

use crate::results::*;

/// Keeps only the last ballot of each voter, in the order of the input.
pub fn keep_last_ballots(ballots: Vec<Ballot>) -> Vec<Ballot> {
    let mut last_idx: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, b) in ballots.iter().enumerate() {
        if last_idx.insert(b.voter.clone(), idx).is_some() {
            warn!(
                "keep_last_ballots: several ballots from {}, keeping the last one",
                b.voter
            );
        }
    }
    ballots
        .into_iter()
        .enumerate()
        .filter(|(idx, b)| last_idx.get(&b.voter) == Some(idx))
        .map(|(_, b)| b)
        .collect()
}

/// The string form of a score, as stored by the website: numbers and
/// strings are both accepted, null is no vote.
pub fn score_to_string(js: &JSValue) -> Option<String> {
    match js {
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        JSValue::Null => Some(String::new()),
        _ => None,
    }
}

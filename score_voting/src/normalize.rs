use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;

/// The votes of one event, one row per voter and one column per participant.
///
/// Invariant: the columns are the participant handles in ascending order and
/// every row has exactly one cell per column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteMatrix {
    recipients: Vec<String>,
    rows: BTreeMap<String, Vec<Cell>>,
}

impl VoteMatrix {
    /// The participant handles, in column order.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// The rows, sorted by voter handle.
    pub fn rows(&self) -> impl Iterator<Item = (&String, &Vec<Cell>)> {
        self.rows.iter()
    }

    pub fn row(&self, voter: &str) -> Option<&[Cell]> {
        self.rows.get(voter).map(|r| r.as_slice())
    }

    pub fn column(&self, handle: &str) -> Option<usize> {
        self.recipients
            .binary_search_by(|r| r.as_str().cmp(handle))
            .ok()
    }

    pub fn is_participant(&self, handle: &str) -> bool {
        self.column(handle).is_some()
    }

    pub fn num_voters(&self) -> usize {
        self.rows.len()
    }

    /// Returns a copy in which every cell of the given voters is replaced by
    /// `Cell::Disqualified`.
    pub fn disqualify(&self, disqualified: &BTreeSet<String>) -> VoteMatrix {
        let rows = self
            .rows
            .iter()
            .map(|(voter, cells)| {
                if disqualified.contains(voter) {
                    (voter.clone(), vec![Cell::Disqualified; cells.len()])
                } else {
                    (voter.clone(), cells.clone())
                }
            })
            .collect();
        VoteMatrix {
            recipients: self.recipients.clone(),
            rows,
        }
    }
}

/// The output of the normalization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Normalized {
    pub matrix: VoteMatrix,
    /// The self-votes of all the participants, taken before neutralization.
    pub self_votes: BTreeMap<String, SelfVote>,
    /// (voter, key) pairs for the votes that target nobody in this event.
    pub unknown_recipients: Vec<(String, String)>,
}

/// Builds the vote matrix from records that have been resolved to handles.
///
/// Arguments:
/// * `records` the ballots, with the voters and the targets as handles
/// * `participants` the handles of the participants of this event, who are
///   both the recipients of the votes and expected voters.
///
/// Every participant gets a row, even without a ballot. Voters who are not
/// participants get a row only if they submitted a ballot.
pub fn normalize(records: &[VoteRecord], participants: &[String]) -> Result<Normalized, VotingErrors> {
    let recipients: Vec<String> = participants
        .iter()
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    if recipients.is_empty() {
        return Err(VotingErrors::EmptyEvent);
    }
    debug!("normalize: {} records, recipients: {:?}", records.len(), recipients);

    // Several submissions from the same voter: the last one wins.
    let mut ballots: BTreeMap<String, &VoteRecord> = BTreeMap::new();
    for r in records.iter() {
        if ballots.insert(r.voter.clone(), r).is_some() {
            warn!("normalize: several ballots for {}, keeping the last one", r.voter);
        }
    }

    let mut rows: BTreeMap<String, Vec<Cell>> = BTreeMap::new();
    let mut self_votes: BTreeMap<String, SelfVote> = BTreeMap::new();
    let mut unknown_recipients: Vec<(String, String)> = Vec::new();

    for p in recipients.iter() {
        rows.insert(p.clone(), vec![Cell::Missing; recipients.len()]);
        self_votes.insert(p.clone(), SelfVote::Missing);
    }

    for (voter, record) in ballots.iter() {
        let row = rows
            .entry(voter.clone())
            .or_insert_with(|| vec![Cell::Missing; recipients.len()]);
        // The keys of a BTreeMap are already sorted, like the recipients.
        for (target, score) in record.votes.iter() {
            match recipients.binary_search(target) {
                Ok(idx) if target == voter => {
                    self_votes.insert(voter.clone(), SelfVote::Cast(*score));
                    row[idx] = Cell::SelfNeutral;
                }
                Ok(idx) => {
                    row[idx] = Cell::Real(*score);
                }
                Err(_) => {
                    warn!(
                        "normalize: voter {}: {:?} is not a participant of this event, skipping vote",
                        voter, target
                    );
                    unknown_recipients.push((voter.clone(), target.clone()));
                }
            }
        }
    }

    // The self cell is neutral whether the participant voted for itself or not.
    for (idx, p) in recipients.iter().enumerate() {
        if let Some(row) = rows.get_mut(p) {
            row[idx] = Cell::SelfNeutral;
        }
    }

    Ok(Normalized {
        matrix: VoteMatrix { recipients, rows },
        self_votes,
        unknown_recipients,
    })
}

use log::{debug, info};

use crate::config::*;
use crate::normalize::VoteMatrix;

/// Finds the voters who did not score every entry they were expected to.
///
/// A participant is expected to score all the other participants; its own
/// entry is optional. A voter who is not a participant is expected to score
/// everyone, but only for information: such a voter never blocks the
/// tabulation.
pub fn check_completeness(matrix: &VoteMatrix) -> CompletenessReport {
    let num_recipients = matrix.recipients().len();
    let mut report = CompletenessReport::default();
    for (voter, cells) in matrix.rows() {
        let own_column = matrix.column(voter);
        let covered = cells
            .iter()
            .enumerate()
            .filter(|(idx, c)| Some(*idx) != own_column && c.score().is_some())
            .count();
        let expected = match own_column {
            Some(_) => num_recipients - 1,
            None => num_recipients,
        };
        debug!(
            "check_completeness: {}: {}/{} votes",
            voter, covered, expected
        );
        if covered < expected {
            if own_column.is_some() {
                report.incomplete.push(voter.clone());
            } else {
                report.incomplete_non_participants.push(voter.clone());
            }
        }
    }
    if !report.incomplete_non_participants.is_empty() {
        info!(
            "check_completeness: voters outside of the event with partial ballots: {:?}",
            report.incomplete_non_participants
        );
    }
    report
}

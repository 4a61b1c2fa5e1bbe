use std::collections::BTreeMap;

use crate::aggregate::Aggregates;
use crate::config::*;
use crate::normalize::VoteMatrix;

/// A value in the votes sheet.
#[derive(PartialEq, Debug, Clone)]
pub enum ExportCell {
    Empty,
    Int(u32),
    Decimal(f64),
    Disqualified,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ExportRow {
    pub label: String,
    pub cells: Vec<ExportCell>,
    /// Sum of the votes given by the voter of this row, non-participants
    /// included. Empty for the summary rows.
    pub total_given: ExportCell,
}

/// The votes sheet: who gave what to whom, followed by summary rows.
///
/// The summary rows are, in order: total score, total given, a blank
/// separator, average and self vote. Each summary value is aligned with the
/// participant of its column.
#[derive(PartialEq, Debug, Clone)]
pub struct VotesMatrixExport {
    pub columns: Vec<String>,
    pub voter_rows: Vec<ExportRow>,
    pub summary_rows: Vec<ExportRow>,
}

pub const TOTAL_SCORE: &str = "total score";
pub const TOTAL_GIVEN: &str = "total given";
pub const AVERAGE: &str = "average";
pub const SELF_VOTE: &str = "self vote";

/// Builds the votes sheet from a matrix where the disqualified rows have
/// already been replaced.
pub fn votes_matrix_export(
    matrix: &VoteMatrix,
    aggregates: &Aggregates,
    self_votes: &BTreeMap<String, SelfVote>,
) -> VotesMatrixExport {
    let columns: Vec<String> = matrix.recipients().to_vec();

    // Only real scores are shown, like the empty cells of the legacy sheet.
    let voter_rows: Vec<ExportRow> = matrix
        .rows()
        .map(|(voter, cells)| ExportRow {
            label: voter.clone(),
            cells: cells
                .iter()
                .map(|c| match c {
                    Cell::Real(s) => ExportCell::Int(s.value() as u32),
                    Cell::Disqualified => ExportCell::Disqualified,
                    Cell::SelfNeutral | Cell::Missing => ExportCell::Empty,
                })
                .collect(),
            total_given: match aggregates.generosity.get(voter) {
                Some(g) => ExportCell::Int(g.total_given),
                None => ExportCell::Disqualified,
            },
        })
        .collect();

    let total_score: Vec<ExportCell> = columns
        .iter()
        .map(|h| match aggregates.participant_stats.get(h) {
            Some(st) => ExportCell::Int(st.score),
            None => ExportCell::Empty,
        })
        .collect();
    let total_given: Vec<ExportCell> = columns
        .iter()
        .map(|h| match aggregates.generosity.get(h) {
            Some(g) => ExportCell::Int(g.total_given),
            None => ExportCell::Disqualified,
        })
        .collect();
    let average: Vec<ExportCell> = columns
        .iter()
        .map(|h| {
            match aggregates.participant_stats.get(h).and_then(|st| st.average) {
                Some(avg) => ExportCell::Decimal(avg),
                None => ExportCell::Empty,
            }
        })
        .collect();
    let self_vote: Vec<ExportCell> = columns
        .iter()
        .map(|h| match self_votes.get(h) {
            Some(SelfVote::Cast(s)) => ExportCell::Int(s.value() as u32),
            Some(SelfVote::Disqualified) => ExportCell::Disqualified,
            Some(SelfVote::Missing) | None => ExportCell::Empty,
        })
        .collect();

    let summary_rows = vec![
        ExportRow {
            label: TOTAL_SCORE.to_string(),
            cells: total_score,
            total_given: ExportCell::Empty,
        },
        ExportRow {
            label: TOTAL_GIVEN.to_string(),
            cells: total_given,
            total_given: ExportCell::Empty,
        },
        ExportRow {
            label: String::new(),
            cells: vec![ExportCell::Empty; columns.len()],
            total_given: ExportCell::Empty,
        },
        ExportRow {
            label: AVERAGE.to_string(),
            cells: average,
            total_given: ExportCell::Empty,
        },
        ExportRow {
            label: SELF_VOTE.to_string(),
            cells: self_vote,
            total_given: ExportCell::Empty,
        },
    ];

    VotesMatrixExport {
        columns,
        voter_rows,
        summary_rows,
    }
}

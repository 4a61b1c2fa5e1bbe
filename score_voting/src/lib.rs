/*!
Aggregation of the votes of a community music-voting event.

Every participant submits a track, and every registered user scores every
participant from 1 to 5. This crate turns the ballots of one event into a
scoreboard, a generosity index, a distribution of the votes and an audit of
the self-votes.

The computation has two steps, because an event with incomplete ballots needs
a decision from the operator:

```
use score_voting::builder::EventBuilder;
use std::collections::BTreeSet;
# use score_voting::VotingErrors;

let mut builder = EventBuilder::new()
    .participant("anna", "Anna Banana")
    .participant("bob", "DJ Bob");
builder.add_ballot_simple("anna", &[("DJ Bob", 4)]);
builder.add_ballot_simple("bob", &[("Anna Banana", 5), ("DJ Bob", 5)]);

let event = builder.prepare()?;
assert!(event.completeness().is_complete());
let results = event.tabulate(&BTreeSet::new())?;
assert_eq!(results.scoreboard[0].name, "Anna Banana");
# Ok::<(), VotingErrors>(())
```
*/
mod aggregate;
pub mod builder;
mod completeness;
mod config;
mod export;
mod identity;
pub mod manual;
mod normalize;
mod scoreboard;

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

pub use crate::aggregate::{aggregate, Aggregates};
pub use crate::completeness::check_completeness;
pub use crate::config::*;
pub use crate::export::*;
pub use crate::identity::{resolve, IdentityMap};
pub use crate::normalize::{normalize, Normalized, VoteMatrix};
pub use crate::scoreboard::build_scoreboard;

/// An event whose ballots have been validated, normalized and checked.
///
/// Nothing has been decided about the incomplete ballots yet: see
/// [`PreparedEvent::completeness`] and [`PreparedEvent::tabulate`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PreparedEvent {
    identities: IdentityMap,
    participants: Vec<String>,
    normalized: Normalized,
    completeness: CompletenessReport,
}

/// Everything computed for one event.
#[derive(PartialEq, Debug, Clone)]
pub struct EventResults {
    pub scoreboard: Vec<ScoreboardEntry>,
    pub participant_stats: BTreeMap<String, ParticipantStats>,
    pub generosity: BTreeMap<String, GenerosityStats>,
    pub distribution: Distribution,
    pub self_votes: BTreeMap<String, SelfVote>,
    pub votes: VotesMatrixExport,
    pub disqualified: Vec<String>,
}

/// Validates the ballots of an event and finds the incomplete ones.
///
/// Arguments:
/// * `ballots` the ballots as persisted, keyed by artist names or handles
/// * `identities` the handles and artist names of all the registered users
/// * `participants` the participants of this event, as handles or artist names
pub fn prepare_event(
    ballots: &[Ballot],
    identities: &IdentityMap,
    participants: &[String],
) -> Result<PreparedEvent, VotingErrors> {
    info!(
        "prepare_event: {} ballots, {} participants, {} registered users",
        ballots.len(),
        participants.len(),
        identities.len()
    );

    let mut participant_handles: Vec<String> = Vec::new();
    for p in participants.iter() {
        participant_handles.push(identities.resolve_identity(p)?);
    }

    let records = parse_ballots(ballots)?;
    let resolved = resolve(&records, identities)?;
    let normalized = normalize(&resolved, &participant_handles)?;
    let completeness = check_completeness(&normalized.matrix);
    if !completeness.is_complete() {
        info!(
            "prepare_event: incomplete ballots from {:?}",
            completeness.incomplete
        );
    }

    Ok(PreparedEvent {
        identities: identities.clone(),
        participants: normalized.matrix.recipients().to_vec(),
        normalized,
        completeness,
    })
}

fn parse_ballots(ballots: &[Ballot]) -> Result<Vec<VoteRecord>, VotingErrors> {
    let mut res: Vec<VoteRecord> = Vec::new();
    for b in ballots.iter() {
        let mut votes: BTreeMap<String, Score> = BTreeMap::new();
        for (recipient, raw) in b.votes.iter() {
            if let Some(score) = Score::parse(&b.voter, recipient, raw)? {
                votes.insert(recipient.clone(), score);
            } else {
                debug!("parse_ballots: {}: no vote for {}", b.voter, recipient);
            }
        }
        res.push(VoteRecord {
            voter: b.voter.clone(),
            votes,
        });
    }
    Ok(res)
}

impl PreparedEvent {
    /// The handles of the participants, sorted.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn completeness(&self) -> &CompletenessReport {
        &self.completeness
    }

    pub fn matrix(&self) -> &VoteMatrix {
        &self.normalized.matrix
    }

    pub fn self_votes(&self) -> &BTreeMap<String, SelfVote> {
        &self.normalized.self_votes
    }

    pub fn unknown_recipients(&self) -> &[(String, String)] {
        &self.normalized.unknown_recipients
    }

    /// Computes the results, with the given voters disqualified.
    ///
    /// Every incomplete participant must be disqualified, otherwise this
    /// fails with `IncompleteVoting`. The disqualified voters are given as
    /// handles and must have a row in the matrix.
    pub fn tabulate(&self, disqualified: &BTreeSet<String>) -> Result<EventResults, VotingErrors> {
        for h in disqualified.iter() {
            if self.matrix().row(h).is_none() {
                return Err(VotingErrors::UnknownIdentity(h.clone()));
            }
        }
        let missing: Vec<String> = self
            .completeness
            .incomplete
            .iter()
            .filter(|h| !disqualified.contains(*h))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(VotingErrors::IncompleteVoting(missing));
        }
        info!("tabulate: disqualified voters: {:?}", disqualified);

        let aggregates = aggregate(self.matrix(), disqualified);
        let scoreboard =
            build_scoreboard(&aggregates.participant_stats, disqualified, &self.identities)?;

        let self_votes: BTreeMap<String, SelfVote> = self
            .self_votes()
            .iter()
            .map(|(h, sv)| {
                if disqualified.contains(h) {
                    (h.clone(), SelfVote::Disqualified)
                } else {
                    (h.clone(), *sv)
                }
            })
            .collect();
        let votes = votes_matrix_export(
            &self.matrix().disqualify(disqualified),
            &aggregates,
            &self_votes,
        );

        Ok(EventResults {
            scoreboard,
            participant_stats: aggregates.participant_stats,
            generosity: aggregates.generosity,
            distribution: aggregates.distribution,
            self_votes,
            votes,
            disqualified: disqualified.iter().cloned().collect(),
        })
    }
}

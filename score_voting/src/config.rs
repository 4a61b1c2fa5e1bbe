// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A score given by one voter to one entry, between 1 and 5.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Score, VotingErrors> {
        if (Score::MIN..=Score::MAX).contains(&value) {
            Ok(Score(value))
        } else {
            Err(VotingErrors::ScoreOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All the scores, from the highest to the lowest.
    pub fn descending() -> impl Iterator<Item = Score> {
        (Score::MIN..=Score::MAX).rev().map(Score)
    }

    /// Parses a score as it is stored by the submission form.
    ///
    /// An empty string is a field that was left unselected and is not a vote.
    pub(crate) fn parse(voter: &str, recipient: &str, raw: &str) -> Result<Option<Score>, VotingErrors> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<u8>() {
            Ok(x) if (Score::MIN..=Score::MAX).contains(&x) => Ok(Some(Score(x))),
            _ => Err(VotingErrors::InvalidScore {
                voter: voter.to_string(),
                recipient: recipient.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

/// A registered user: a login handle and the public artist name.
///
/// The participants of an event are the users who submitted an entry.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Participant {
    pub handle: String,
    pub artist: String,
}

/// A ballot, as persisted by the submission layer.
///
/// The keys of `votes` may be artist names or handles, and the scores are
/// still string-encoded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    pub votes: BTreeMap<String, String>,
}

/// A ballot with validated scores.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub voter: String,
    pub votes: BTreeMap<String, Score>,
}

// ******** Intermediate structures *********

/// The content of one position of the vote matrix.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Cell {
    /// A score cast by the voter.
    Real(Score),
    /// The voter's own entry. Never counted, the actual self-vote is kept aside.
    SelfNeutral,
    /// The voter did not score this entry.
    Missing,
    /// The voter has been disqualified: nothing in this row counts.
    Disqualified,
}

impl Cell {
    pub fn score(&self) -> Option<Score> {
        match self {
            Cell::Real(s) => Some(*s),
            _ => None,
        }
    }
}

/// What a participant gave to their own entry.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SelfVote {
    Cast(Score),
    Missing,
    Disqualified,
}

/// Participants who have not voted for everyone.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CompletenessReport {
    /// Participants with a missing or partial ballot. They block the
    /// tabulation until they are disqualified.
    pub incomplete: Vec<String>,
    /// Voters who are not participants and did not score every entry.
    /// Informational only.
    pub incomplete_non_participants: Vec<String>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

// ******** Output data structures *********

/// Statistics of the votes received by one participant.
#[derive(PartialEq, Debug, Clone)]
pub struct ParticipantStats {
    /// Sum of the received votes.
    pub score: u32,
    /// Mean of the received votes, rounded to one decimal.
    /// None if this participant did not receive any vote.
    pub average: Option<f64>,
    /// counts[i] is the number of times the score i + 1 was received.
    pub counts: [u32; 5],
}

impl ParticipantStats {
    pub fn count(&self, score: Score) -> u32 {
        self.counts[(score.value() - Score::MIN) as usize]
    }
}

/// How generous one voter has been compared to everyone else.
#[derive(PartialEq, Debug, Clone)]
pub struct GenerosityStats {
    /// Mean of the votes given, self-vote excluded.
    pub given: Option<f64>,
    pub total_given: u32,
    /// Percentage of deviation from the mean of all the `given` values.
    pub generosity: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DistributionBucket {
    pub score: Score,
    pub count: u32,
    /// Share of all the valid votes, in percent with one decimal.
    pub percent: f64,
}

/// Histogram of all the valid votes, from 5 down to 1.
#[derive(PartialEq, Debug, Clone)]
pub struct Distribution {
    pub buckets: Vec<DistributionBucket>,
    pub total_valid_votes: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Placement {
    Rank(u32),
    Disqualified,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScoreboardEntry {
    pub placement: Placement,
    pub handle: String,
    /// The public artist name.
    pub name: String,
    pub stats: ParticipantStats,
}

/// Errors that prevent the aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// A voter, participant or disqualified entry is neither a known handle
    /// nor a known artist name.
    UnknownIdentity(String),
    /// The identity table is not a bijection.
    DuplicateIdentity(String),
    /// Some participants did not complete their ballot and were not
    /// disqualified.
    IncompleteVoting(Vec<String>),
    InvalidScore {
        voter: String,
        recipient: String,
        value: String,
    },
    /// A score built from a number outside 1..5.
    ScoreOutOfRange(u8),
    /// No participant in this event.
    EmptyEvent,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::UnknownIdentity(name) => {
                write!(f, "unknown handle or artist name: {}", name)
            }
            VotingErrors::DuplicateIdentity(name) => {
                write!(f, "identity used by more than one user: {}", name)
            }
            VotingErrors::IncompleteVoting(handles) => {
                write!(f, "incomplete voting for: {}", handles.join(", "))
            }
            VotingErrors::InvalidScore {
                voter,
                recipient,
                value,
            } => write!(
                f,
                "invalid score {:?} from {} for {}",
                value, voter, recipient
            ),
            VotingErrors::ScoreOutOfRange(value) => write!(
                f,
                "score {} is not between {} and {}",
                value,
                Score::MIN,
                Score::MAX
            ),
            VotingErrors::EmptyEvent => write!(f, "no participant in this event"),
        }
    }
}

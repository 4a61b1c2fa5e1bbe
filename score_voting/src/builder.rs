use std::collections::BTreeMap;

pub use crate::config::*;
use crate::identity::IdentityMap;
use crate::{prepare_event, PreparedEvent};

/// A builder for assembling an event in memory.
///
/// ```
/// use score_voting::builder::EventBuilder;
/// # use score_voting::VotingErrors;
///
/// let mut builder = EventBuilder::new()
///     .participant("anna", "Anna Banana")
///     .participant("bob", "DJ Bob")
///     .user("carol", "Carol");
///
/// builder.add_ballot_simple("carol", &[("Anna Banana", 4), ("bob", 3)]);
///
/// let event = builder.prepare()?;
/// assert_eq!(event.completeness().incomplete, vec!["anna", "bob"]);
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    pub(crate) _users: Vec<Participant>,
    pub(crate) _participants: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl EventBuilder {
    pub fn new() -> EventBuilder {
        EventBuilder::default()
    }

    /// Registers a user who takes part in this event.
    pub fn participant(self, handle: &str, artist: &str) -> EventBuilder {
        let mut b = self.user(handle, artist);
        b._participants.push(handle.to_string());
        b
    }

    /// Registers a user who may vote but does not take part in this event.
    pub fn user(mut self, handle: &str, artist: &str) -> EventBuilder {
        self._users.push(Participant {
            handle: handle.to_string(),
            artist: artist.to_string(),
        });
        self
    }

    /// Adds a ballot.
    ///
    /// votes: pairs of (artist name or handle, score). The scores are only
    /// checked when the event is prepared.
    pub fn add_ballot_simple(&mut self, voter: &str, votes: &[(&str, u8)]) {
        let votes: BTreeMap<String, String> = votes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.add_ballot(&Ballot {
            voter: voter.to_string(),
            votes,
        })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) {
        self._ballots.push(ballot.clone());
    }

    pub fn prepare(&self) -> Result<PreparedEvent, VotingErrors> {
        let identities = IdentityMap::from_participants(&self._users)?;
        prepare_event(&self._ballots, &identities, &self._participants)
    }
}

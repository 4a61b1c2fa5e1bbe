use log::{debug, warn};
use std::collections::BTreeMap;

use crate::config::*;

/// The bijection between login handles and artist names for one event.
///
/// It is immutable once built and passed explicitly to every stage.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct IdentityMap {
    artist_by_handle: BTreeMap<String, String>,
    handle_by_artist: BTreeMap<String, String>,
}

impl IdentityMap {
    /// Builds the map from (handle, artist name) pairs.
    ///
    /// Fails if a handle or an artist name is used twice, or if an artist
    /// name is the handle of another user. The latter would make the
    /// translation of the votes ambiguous.
    pub fn new(pairs: &[(String, String)]) -> Result<IdentityMap, VotingErrors> {
        let mut artist_by_handle: BTreeMap<String, String> = BTreeMap::new();
        let mut handle_by_artist: BTreeMap<String, String> = BTreeMap::new();
        for (handle, artist) in pairs.iter() {
            if artist_by_handle
                .insert(handle.clone(), artist.clone())
                .is_some()
            {
                return Err(VotingErrors::DuplicateIdentity(handle.clone()));
            }
            if handle_by_artist
                .insert(artist.clone(), handle.clone())
                .is_some()
            {
                return Err(VotingErrors::DuplicateIdentity(artist.clone()));
            }
        }
        for (artist, handle) in handle_by_artist.iter() {
            if artist != handle && artist_by_handle.contains_key(artist) {
                return Err(VotingErrors::DuplicateIdentity(artist.clone()));
            }
        }
        Ok(IdentityMap {
            artist_by_handle,
            handle_by_artist,
        })
    }

    pub fn from_participants(participants: &[Participant]) -> Result<IdentityMap, VotingErrors> {
        let pairs: Vec<(String, String)> = participants
            .iter()
            .map(|p| (p.handle.clone(), p.artist.clone()))
            .collect();
        IdentityMap::new(&pairs)
    }

    pub fn artist(&self, handle: &str) -> Option<&str> {
        self.artist_by_handle.get(handle).map(|s| s.as_str())
    }

    pub fn handle(&self, artist: &str) -> Option<&str> {
        self.handle_by_artist.get(artist).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.artist_by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artist_by_handle.is_empty()
    }

    /// Finds the handle of a user, given either its handle or its artist name.
    pub fn resolve_identity(&self, key: &str) -> Result<String, VotingErrors> {
        if self.artist_by_handle.contains_key(key) {
            return Ok(key.to_string());
        }
        self.handle(key)
            .map(|h| h.to_string())
            .ok_or_else(|| VotingErrors::UnknownIdentity(key.to_string()))
    }

    /// Rewrites an artist name into its handle. Anything else is returned as is.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.handle(key).unwrap_or(key)
    }
}

/// Moves all the vote records into the handle space.
///
/// The voter of each record must be known. The targets of the votes are
/// translated when they are known artist names and kept untouched otherwise,
/// so that a single stray key does not discard a whole ballot.
pub fn resolve(
    records: &[VoteRecord],
    identities: &IdentityMap,
) -> Result<Vec<VoteRecord>, VotingErrors> {
    let mut res: Vec<VoteRecord> = Vec::new();
    for record in records.iter() {
        let voter = identities.resolve_identity(&record.voter)?;

        // Keys already in the handle space take precedence over translated ones.
        let mut votes: BTreeMap<String, Score> = BTreeMap::new();
        for (key, score) in record.votes.iter() {
            if identities.handle(key).is_none() || identities.translate(key) == key {
                votes.insert(key.clone(), *score);
            }
        }
        for (key, score) in record.votes.iter() {
            let target = identities.translate(key);
            if target == key {
                continue;
            }
            if votes.contains_key(target) {
                warn!(
                    "resolve: voter {}: vote for {:?} is also recorded as {:?}, keeping the latter",
                    voter, key, target
                );
            } else {
                debug!("resolve: voter {}: {:?} -> {:?}", voter, key, target);
                votes.insert(target.to_string(), *score);
            }
        }
        res.push(VoteRecord { voter, votes });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: u8) -> Score {
        Score::new(x).unwrap()
    }

    fn identities() -> IdentityMap {
        IdentityMap::new(&[
            ("anna".to_string(), "Anna Banana".to_string()),
            ("bob".to_string(), "DJ Bob".to_string()),
            ("carl".to_string(), "carl".to_string()),
        ])
        .unwrap()
    }

    fn record(voter: &str, votes: &[(&str, u8)]) -> VoteRecord {
        VoteRecord {
            voter: voter.to_string(),
            votes: votes.iter().map(|(k, v)| (k.to_string(), s(*v))).collect(),
        }
    }

    #[test]
    fn translates_artist_names() {
        let ids = identities();
        let res = resolve(&[record("DJ Bob", &[("Anna Banana", 4), ("carl", 2)])], &ids).unwrap();
        assert_eq!(res, vec![record("bob", &[("anna", 4), ("carl", 2)])]);
    }

    #[test]
    fn unknown_targets_pass_through() {
        let ids = identities();
        let res = resolve(&[record("anna", &[("Somebody", 3)])], &ids).unwrap();
        assert_eq!(res, vec![record("anna", &[("Somebody", 3)])]);
    }

    #[test]
    fn unknown_voter_is_fatal() {
        let ids = identities();
        let res = resolve(&[record("zoe", &[("anna", 3)])], &ids);
        assert_eq!(res, Err(VotingErrors::UnknownIdentity("zoe".to_string())));
    }

    #[test]
    fn resolving_twice_changes_nothing() {
        let ids = identities();
        let input = vec![
            record("anna", &[("DJ Bob", 5), ("carl", 1)]),
            record("Anna Banana", &[("bob", 2), ("Unknown", 4)]),
        ];
        let once = resolve(&input, &ids).unwrap();
        let twice = resolve(&once, &ids).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn handle_key_wins_over_artist_key() {
        let ids = identities();
        let res = resolve(&[record("carl", &[("DJ Bob", 5), ("bob", 2)])], &ids).unwrap();
        assert_eq!(res, vec![record("carl", &[("bob", 2)])]);
    }

    #[test]
    fn rejects_non_bijections() {
        let dup_artist = IdentityMap::new(&[
            ("anna".to_string(), "Same".to_string()),
            ("bob".to_string(), "Same".to_string()),
        ]);
        assert_eq!(
            dup_artist,
            Err(VotingErrors::DuplicateIdentity("Same".to_string()))
        );
        let crossed = IdentityMap::new(&[
            ("anna".to_string(), "bob".to_string()),
            ("bob".to_string(), "Bobby".to_string()),
        ]);
        assert_eq!(crossed, Err(VotingErrors::DuplicateIdentity("bob".to_string())));
    }

    #[test]
    fn from_registered_users() {
        let users = vec![
            Participant {
                handle: "anna".to_string(),
                artist: "Anna Banana".to_string(),
            },
            Participant {
                handle: "bob".to_string(),
                artist: "DJ Bob".to_string(),
            },
        ];
        let ids = IdentityMap::from_participants(&users).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.handle("DJ Bob"), Some("bob"));
        assert_eq!(ids.artist("anna"), Some("Anna Banana"));

        let twice = vec![users[0].clone(), users[0].clone()];
        assert!(IdentityMap::from_participants(&twice).is_err());
    }
}

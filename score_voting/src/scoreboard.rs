use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;
use crate::identity::IdentityMap;

// Disqualified entries first compare greater, then the higher score wins,
// then the higher number of 5s, 4s, 3s and 2s.
type RankKey = (bool, Reverse<u32>, Reverse<u32>, Reverse<u32>, Reverse<u32>, Reverse<u32>);

fn rank_key(stats: &ParticipantStats, is_disqualified: bool) -> RankKey {
    let c = |x: u8| Reverse(stats.counts[(x - Score::MIN) as usize]);
    (
        is_disqualified,
        Reverse(stats.score),
        c(5),
        c(4),
        c(3),
        c(2),
    )
}

/// Orders the participants and assigns their placements.
///
/// The ranked participants get the placements 1..K without gaps. The
/// disqualified participants come after them and have no placement.
///
/// Participants with exactly the same key stay in the order of their handles,
/// and still get distinct placements.
pub fn build_scoreboard(
    participant_stats: &BTreeMap<String, ParticipantStats>,
    disqualified: &BTreeSet<String>,
    identities: &IdentityMap,
) -> Result<Vec<ScoreboardEntry>, VotingErrors> {
    let mut keyed: Vec<(RankKey, &String, &ParticipantStats)> = participant_stats
        .iter()
        .map(|(handle, stats)| (rank_key(stats, disqualified.contains(handle)), handle, stats))
        .collect();
    keyed.sort_by_key(|p| p.0);

    let mut res: Vec<ScoreboardEntry> = Vec::new();
    let mut next_rank: u32 = 1;
    for (key, handle, stats) in keyed {
        let name = identities
            .artist(handle)
            .ok_or_else(|| VotingErrors::UnknownIdentity(handle.clone()))?;
        let placement = if key.0 {
            Placement::Disqualified
        } else {
            next_rank += 1;
            Placement::Rank(next_rank - 1)
        };
        debug!("build_scoreboard: {:?} {} {:?}", placement, handle, key);
        res.push(ScoreboardEntry {
            placement,
            handle: handle.clone(),
            name: name.to_string(),
            stats: stats.clone(),
        });
    }
    Ok(res)
}

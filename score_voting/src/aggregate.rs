use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;
use crate::normalize::VoteMatrix;

/// All the statistics computed from a vote matrix.
#[derive(PartialEq, Debug, Clone)]
pub struct Aggregates {
    /// Votes received, for every participant.
    pub participant_stats: BTreeMap<String, ParticipantStats>,
    /// Votes given, for every voter who has not been disqualified.
    pub generosity: BTreeMap<String, GenerosityStats>,
    pub distribution: Distribution,
}

/// Rounds to one decimal place.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn mean(scores: &[Score]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        let total: u32 = scores.iter().map(|s| s.value() as u32).sum();
        Some(total as f64 / scores.len() as f64)
    }
}

/// Computes the statistics of an event.
///
/// The rows of the disqualified voters are turned into sentinel rows first and
/// do not contribute to any sum, average or count. Only real votes are
/// counted: the self-votes and the missing votes never are.
pub fn aggregate(matrix: &VoteMatrix, disqualified: &BTreeSet<String>) -> Aggregates {
    let matrix = matrix.disqualify(disqualified);
    let recipients = matrix.recipients();

    // Received votes, column by column.
    let mut received: Vec<Vec<Score>> = vec![Vec::new(); recipients.len()];
    // Given votes, row by row.
    let mut given: BTreeMap<String, Vec<Score>> = BTreeMap::new();
    for (voter, cells) in matrix.rows() {
        if cells.iter().any(|c| *c == Cell::Disqualified) {
            debug!("aggregate: skipping disqualified voter {}", voter);
            continue;
        }
        let scores: Vec<Score> = cells.iter().filter_map(|c| c.score()).collect();
        for (idx, c) in cells.iter().enumerate() {
            if let Some(s) = c.score() {
                received[idx].push(s);
            }
        }
        given.insert(voter.clone(), scores);
    }

    let participant_stats: BTreeMap<String, ParticipantStats> = recipients
        .iter()
        .zip(received.iter())
        .map(|(handle, scores)| (handle.clone(), participant_stats(scores)))
        .collect();

    let generosity = generosity_stats(&given);
    let distribution = distribution(&received);
    info!(
        "aggregate: {} participants, {} voters counted, {} valid votes",
        participant_stats.len(),
        generosity.len(),
        distribution.total_valid_votes
    );

    Aggregates {
        participant_stats,
        generosity,
        distribution,
    }
}

fn participant_stats(scores: &[Score]) -> ParticipantStats {
    let mut counts = [0u32; 5];
    for s in scores.iter() {
        counts[(s.value() - Score::MIN) as usize] += 1;
    }
    ParticipantStats {
        score: scores.iter().map(|s| s.value() as u32).sum(),
        average: mean(scores).map(round1),
        counts,
    }
}

fn generosity_stats(given: &BTreeMap<String, Vec<Score>>) -> BTreeMap<String, GenerosityStats> {
    let means: BTreeMap<&String, Option<f64>> =
        given.iter().map(|(voter, scores)| (voter, mean(scores))).collect();

    // Voters who did not give any vote have no mean and are left out.
    let defined: Vec<f64> = means.values().filter_map(|m| *m).collect();
    let mean_of_all = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };
    debug!("generosity_stats: mean of all given votes: {:?}", mean_of_all);

    given
        .iter()
        .map(|(voter, scores)| {
            let given_mean = means.get(voter).cloned().flatten();
            let generosity = match (given_mean, mean_of_all) {
                (Some(g), Some(m)) if m > 0.0 => Some(round1((g - m) / m * 100.0)),
                _ => None,
            };
            (
                voter.clone(),
                GenerosityStats {
                    given: given_mean,
                    total_given: scores.iter().map(|s| s.value() as u32).sum(),
                    generosity,
                },
            )
        })
        .collect()
}

fn distribution(received: &[Vec<Score>]) -> Distribution {
    let mut counts: BTreeMap<Score, u32> = Score::descending().map(|s| (s, 0)).collect();
    for s in received.iter().flatten() {
        if let Some(c) = counts.get_mut(s) {
            *c += 1;
        }
    }
    let total_valid_votes: u32 = counts.values().sum();
    let buckets = Score::descending()
        .map(|score| {
            let count = counts.get(&score).cloned().unwrap_or(0);
            let percent = if total_valid_votes == 0 {
                0.0
            } else {
                round1(count as f64 / total_valid_votes as f64 * 100.0)
            };
            DistributionBucket {
                score,
                count,
                percent,
            }
        })
        .collect();
    Distribution {
        buckets,
        total_valid_votes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn s(x: u8) -> Score {
        Score::new(x).unwrap()
    }

    fn record(voter: &str, votes: &[(&str, u8)]) -> VoteRecord {
        VoteRecord {
            voter: voter.to_string(),
            votes: votes.iter().map(|(k, v)| (k.to_string(), s(*v))).collect(),
        }
    }

    fn handles(hs: &[&str]) -> Vec<String> {
        hs.iter().map(|h| h.to_string()).collect()
    }

    fn dq(hs: &[&str]) -> BTreeSet<String> {
        hs.iter().map(|h| h.to_string()).collect()
    }

    fn four_participants() -> VoteMatrix {
        normalize(
            &[
                record("a", &[("a", 5), ("b", 1), ("c", 1), ("d", 1)]),
                record("b", &[("a", 4), ("c", 5), ("d", 3)]),
                record("c", &[("a", 2), ("b", 5), ("d", 4)]),
                record("d", &[("a", 3), ("b", 2), ("c", 2)]),
                record("guest", &[("a", 5), ("b", 5), ("c", 4), ("d", 1)]),
            ],
            &handles(&["a", "b", "c", "d"]),
        )
        .unwrap()
        .matrix
    }

    #[test]
    fn received_votes() {
        let agg = aggregate(&four_participants(), &BTreeSet::new());
        let a = agg.participant_stats.get("a").unwrap();
        // The self-vote of 5 is not counted.
        assert_eq!(a.score, 4 + 2 + 3 + 5);
        assert_eq!(a.average, Some(3.5));
        assert_eq!(a.counts, [0, 1, 1, 1, 1]);
        let c = agg.participant_stats.get("c").unwrap();
        assert_eq!(c.score, 1 + 5 + 2 + 4);
        assert_eq!(c.count(s(5)), 1);
        assert_eq!(c.count(s(1)), 1);
    }

    #[test]
    fn average_has_one_decimal() {
        let m = normalize(
            &[
                record("b", &[("a", 5)]),
                record("x", &[("a", 4)]),
                record("y", &[("a", 4)]),
            ],
            &handles(&["a", "b"]),
        )
        .unwrap()
        .matrix;
        let agg = aggregate(&m, &BTreeSet::new());
        let a = agg.participant_stats.get("a").unwrap();
        assert_eq!(a.score, 13);
        assert_eq!(a.average, Some(4.3));
        assert_eq!(agg.generosity.get("x").unwrap().given, Some(4.0));
        assert_eq!(agg.participant_stats.get("b").unwrap().average, None);
    }

    #[test]
    fn histogram_matches_received_votes() {
        let agg = aggregate(&four_participants(), &BTreeSet::new());
        for stats in agg.participant_stats.values() {
            let n: u32 = stats.counts.iter().sum();
            let total: u32 = Score::descending()
                .map(|sc| stats.count(sc) * sc.value() as u32)
                .sum();
            assert_eq!(n, 4);
            assert_eq!(total, stats.score);
        }
    }

    #[test]
    fn self_vote_does_not_change_given_mean() {
        let agg = aggregate(&four_participants(), &BTreeSet::new());
        let a = agg.generosity.get("a").unwrap();
        assert_eq!(a.given, Some(1.0));
        assert_eq!(a.total_given, 3);
        let guest = agg.generosity.get("guest").unwrap();
        assert_eq!(guest.given, Some(3.75));
        assert_eq!(guest.total_given, 15);
    }

    #[test]
    fn generosity_relative_to_mean() {
        let agg = aggregate(&four_participants(), &BTreeSet::new());
        // given: a 1.0, b 4.0, c 11/3, d 7/3, guest 3.75 -> mean 2.95
        let g = |h: &str| agg.generosity.get(h).unwrap().generosity.unwrap();
        assert_eq!(g("a"), round1((1.0 - 2.95) / 2.95 * 100.0));
        assert_eq!(g("b"), 35.6);
        assert!(g("a") < 0.0);
        assert!(g("guest") > 0.0);
    }

    #[test]
    fn distribution_sums_to_hundred() {
        let agg = aggregate(&four_participants(), &BTreeSet::new());
        let d = &agg.distribution;
        assert_eq!(d.total_valid_votes, 16);
        assert_eq!(d.buckets.iter().map(|b| b.count).sum::<u32>(), 16);
        let pct: f64 = d.buckets.iter().map(|b| b.percent).sum();
        assert!((pct - 100.0).abs() <= 0.5);
        let scores: Vec<u8> = d.buckets.iter().map(|b| b.score.value()).collect();
        assert_eq!(scores, vec![5, 4, 3, 2, 1]);
        assert_eq!(d.buckets[0].count, 4);
        assert_eq!(d.buckets[0].percent, 25.0);
    }

    #[test]
    fn disqualified_rows_are_excluded() {
        let m = four_participants();
        let full = aggregate(&m, &BTreeSet::new());
        let without_guest = aggregate(&m, &dq(&["guest"]));
        assert!(!without_guest.generosity.contains_key("guest"));
        let a = without_guest.participant_stats.get("a").unwrap();
        assert_eq!(a.score, 4 + 2 + 3);
        assert_eq!(a.average, Some(3.0));
        assert_eq!(without_guest.distribution.total_valid_votes, 12);
        // Other voters are not affected as givers.
        assert_eq!(
            full.generosity.get("b").unwrap().given,
            without_guest.generosity.get("b").unwrap().given
        );
    }

    #[test]
    fn removing_a_disqualified_row_changes_nothing() {
        let with_guest = aggregate(&four_participants(), &dq(&["guest"]));
        let no_guest_matrix = normalize(
            &[
                record("a", &[("a", 5), ("b", 1), ("c", 1), ("d", 1)]),
                record("b", &[("a", 4), ("c", 5), ("d", 3)]),
                record("c", &[("a", 2), ("b", 5), ("d", 4)]),
                record("d", &[("a", 3), ("b", 2), ("c", 2)]),
            ],
            &handles(&["a", "b", "c", "d"]),
        )
        .unwrap()
        .matrix;
        let without = aggregate(&no_guest_matrix, &BTreeSet::new());
        assert_eq!(with_guest, without);
    }

    #[test]
    fn no_votes_received_means_no_average() {
        let m = normalize(&[record("a", &[("a", 5)])], &handles(&["a", "b"]))
            .unwrap()
            .matrix;
        let agg = aggregate(&m, &BTreeSet::new());
        let a = agg.participant_stats.get("a").unwrap();
        assert_eq!(a.average, None);
        assert_eq!(a.score, 0);
        assert_eq!(agg.generosity.get("a").unwrap().given, None);
        assert_eq!(agg.generosity.get("a").unwrap().generosity, None);
        for b in agg.distribution.buckets.iter() {
            assert_eq!(b.percent, 0.0);
        }
    }
}

// Reads the ballots from the database of the voting website.
//
// The file is a JSON object with one table per event:
// {"21": {"1": {"user": "anna", "votes": {"DJ Bob": "4"}}, "2": ...}}

use std::collections::BTreeMap;

use crate::results::io_common::score_to_string;
use crate::results::*;

fn read_doc(path: &str, docid: &str, doc: &JSValue) -> LmcResult<Ballot> {
    let malformed = || MalformedBallotSnafu {
        docid: docid.to_string(),
        path: path.to_string(),
    };
    let voter = doc
        .get("user")
        .and_then(|u| u.as_str())
        .with_context(malformed)?;
    let votes_js = doc
        .get("votes")
        .and_then(|v| v.as_object())
        .with_context(malformed)?;
    let mut votes: BTreeMap<String, String> = BTreeMap::new();
    for (recipient, score_js) in votes_js.iter() {
        let score = score_to_string(score_js).with_context(malformed)?;
        votes.insert(recipient.clone(), score);
    }
    Ok(Ballot {
        voter: voter.to_string(),
        votes,
    })
}

pub fn read_tinydb_ballots(path: &str, event: u32) -> LmcResult<Vec<Ballot>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu {
        path: path.to_string(),
    })?;
    let db: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;

    let table = match db.get(event.to_string()).and_then(|t| t.as_object()) {
        Some(t) => t,
        None => {
            warn!("read_tinydb_ballots: no table for event {} in {}", event, path);
            return Ok(vec![]);
        }
    };

    // The documents are numbered in the order of submission.
    let mut docs: Vec<(&String, &JSValue)> = table.iter().collect();
    docs.sort_by_key(|(docid, _)| (docid.parse::<u64>().unwrap_or(u64::MAX), docid.to_string()));

    let mut res: Vec<Ballot> = Vec::new();
    for (docid, doc) in docs {
        let ballot = read_doc(path, docid, doc)?;
        debug!("read_tinydb_ballots: {}: {:?}", docid, ballot);
        res.push(ballot);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/lmc21/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn reads_event_table() {
        let ballots = read_tinydb_ballots(&data_path("votes.json"), 21).unwrap();
        assert_eq!(ballots.len(), 5);
        assert_eq!(ballots[0].voter, "anna");
        assert_eq!(ballots[0].votes.get("DJ Bob"), Some(&"4".to_string()));
        // Scores stored as numbers
        assert_eq!(ballots[1].votes.get("Carl"), Some(&"5".to_string()));
        assert_eq!(
            ballots[3].votes.get("Dora the Composer"),
            Some(&String::new())
        );
    }

    #[test]
    fn missing_event_table() {
        let ballots = read_tinydb_ballots(&data_path("votes.json"), 19).unwrap();
        assert!(ballots.is_empty());
    }

    #[test]
    fn malformed_doc() {
        let doc = json!({"user": "anna", "votes": ["DJ Bob"]});
        assert!(matches!(
            read_doc("votes.json", "3", &doc),
            Err(LmcError::MalformedBallot { .. })
        ));
    }
}

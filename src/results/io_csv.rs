// Reads the ballots from a CSV file with one vote per line:
// voter,recipient,score

use std::collections::BTreeMap;

use crate::results::*;

pub fn read_csv_ballots(path: &str) -> LmcResult<Vec<Ballot>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.to_string(),
        })?;

    // Voters in the order of their first line.
    let mut order: Vec<String> = Vec::new();
    let mut by_voter: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_ballots: {:?} {:?}", lineno, line);
        let voter = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let recipient = line.get(1).context(CsvLineTooShortSnafu { lineno })?;
        // A missing score is no vote.
        let score = line.get(2).unwrap_or("");
        if voter.is_empty() && recipient.is_empty() {
            continue;
        }
        if !by_voter.contains_key(voter) {
            order.push(voter.to_string());
        }
        by_voter
            .entry(voter.to_string())
            .or_default()
            .insert(recipient.to_string(), score.to_string());
    }

    let res: Vec<Ballot> = order
        .into_iter()
        .map(|voter| {
            let votes = by_voter.remove(&voter).unwrap_or_default();
            Ballot { voter, votes }
        })
        .collect();
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/lmc21/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn reads_votes() {
        let ballots = read_csv_ballots(&data_path("votes.csv")).unwrap();
        let voters: Vec<&str> = ballots.iter().map(|b| b.voter.as_str()).collect();
        assert_eq!(voters, vec!["anna", "bob", "carl", "dora", "eve"]);
        assert_eq!(ballots[4].votes.len(), 2);
        assert_eq!(ballots[3].votes.get("Dora the Composer"), Some(&String::new()));
    }
}

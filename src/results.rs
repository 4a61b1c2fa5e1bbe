use log::{debug, info, warn};

use score_voting::*;
use snafu::{prelude::*, Snafu};

use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::results::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_tinydb;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LmcError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error parsing YAML file {path}"))]
    ParsingYaml {
        source: serde_yaml::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of a CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Malformed ballot {docid} in {path}"))]
    MalformedBallot { docid: String, path: String },
    #[snafu(display("Event {event} is not in the range of the recorded events (from {first})"))]
    EventOutOfRange { event: u32, first: u32 },
    #[snafu(display("No participants for event {event} in {path}"))]
    MissingParticipants { event: u32, path: String },
    #[snafu(display("Error while computing the results: {source}"))]
    Voting { source: VotingErrors },
    #[snafu(display("Stopped: incomplete ballots from {:?}", handles))]
    Aborted { handles: Vec<String> },
    #[snafu(display("Error while asking the operator"))]
    Prompt { source: std::io::Error },
    #[snafu(display("Error writing the results to {path}"))]
    WritingResults {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type LmcResult<T> = Result<T, LmcError>;

/// What to do with the participants who did not complete their ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum IncompleteDecision {
    Ask,
    Disqualify,
    Abort,
}

/// Everything needed to tabulate one event, once the command line and the
/// configuration file have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
struct EventSettings {
    event: u32,
    event_name: String,
    users_path: String,
    participants_path: String,
    sources: Vec<BallotSource>,
    // None writes to the standard output.
    out: Option<String>,
    decision: IncompleteDecision,
}

fn join_path(root: &Path, p: &str) -> String {
    let res: PathBuf = root.join(p);
    res.to_string_lossy().to_string()
}

fn resolve_settings(args: &Args) -> LmcResult<EventSettings> {
    let config: Option<(EventConfig, PathBuf)> = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p).parent().context(MissingParentDirSnafu {})?;
            Some((config, root.to_path_buf()))
        }
        None => None,
    };

    let event = match (args.event, config.as_ref().and_then(|(c, _)| c.event_id)) {
        (Some(e), _) => e,
        (None, Some(e)) => e,
        (None, None) => whatever!("No event given: use --event or set eventId in the configuration"),
    };

    let first = config
        .as_ref()
        .and_then(|(c, _)| c.first_event)
        .unwrap_or(DEFAULT_FIRST_EVENT);
    let current = config.as_ref().and_then(|(c, _)| c.current_event);
    ensure!(
        event >= first && current.map_or(true, |c| event <= c),
        EventOutOfRangeSnafu { event, first }
    );

    let users_path = match (&args.users, &config) {
        (Some(p), _) => p.clone(),
        (None, Some((c, root))) => join_path(root, &c.users_file),
        (None, None) => whatever!("No users file: use --users or a configuration"),
    };
    let participants_path = match (&args.participants, &config) {
        (Some(p), _) => p.clone(),
        (None, Some((c, root))) => join_path(root, &c.participants_file),
        (None, None) => whatever!("No participants file: use --participants or a configuration"),
    };

    let sources: Vec<BallotSource> = match (&args.input, &config) {
        (Some(p), _) => vec![BallotSource {
            provider: args
                .input_type
                .clone()
                .unwrap_or_else(|| "tinydb".to_string()),
            file_path: p.clone(),
        }],
        (None, Some((c, root))) => c
            .ballot_sources
            .iter()
            .map(|s| BallotSource {
                provider: s.provider.clone(),
                file_path: join_path(root, &s.file_path),
            })
            .collect(),
        (None, None) => vec![],
    };
    if sources.is_empty() {
        whatever!("No ballot source: use --input or ballotSources in the configuration");
    }

    let output_settings = config.as_ref().and_then(|(c, _)| c.output_settings.clone());
    let out = match &args.out {
        Some(p) if p.is_empty() || p == "stdout" => None,
        Some(p) => Some(p.clone()),
        None => match (&output_settings, &config) {
            (
                Some(OutputSettings {
                    output_directory: Some(dir),
                    ..
                }),
                Some((_, root)),
            ) => {
                let dir_p = root.join(dir);
                Some(join_path(&dir_p, &format!("lmc{}-results.json", event)))
            }
            _ => None,
        },
    };

    let event_name = output_settings
        .and_then(|o| o.event_name)
        .unwrap_or_else(|| format!("LMC {}", event));

    let decision = match (args.disqualify_incomplete, args.abort_incomplete) {
        (true, true) => {
            whatever!("--disqualify-incomplete and --abort-incomplete cannot be used together")
        }
        (true, false) => IncompleteDecision::Disqualify,
        (false, true) => IncompleteDecision::Abort,
        (false, false) => IncompleteDecision::Ask,
    };

    Ok(EventSettings {
        event,
        event_name,
        users_path,
        participants_path,
        sources,
        out,
        decision,
    })
}

fn read_ballots(sources: &[BallotSource], event: u32) -> LmcResult<Vec<Ballot>> {
    let mut data: Vec<Ballot> = Vec::new();
    for source in sources.iter() {
        let mut file_data = match source.provider.as_str() {
            "tinydb" => io_tinydb::read_tinydb_ballots(&source.file_path, event)?,
            "csv" => io_csv::read_csv_ballots(&source.file_path)?,
            x => whatever!("Provider not implemented {:?}", x),
        };
        info!(
            "read_ballots: {} ballots from {}",
            file_data.len(),
            source.file_path
        );
        data.append(&mut file_data);
    }
    Ok(io_common::keep_last_ballots(data))
}

/// Asks a yes/no question until a clear answer is given.
///
/// The end of the input counts as a no.
pub(crate) fn ask_yes_no<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> LmcResult<bool> {
    loop {
        write!(output, "{} [yes/no] ", question).context(PromptSnafu {})?;
        output.flush().context(PromptSnafu {})?;
        let mut line = String::new();
        let num_read = input.read_line(&mut line).context(PromptSnafu {})?;
        if num_read == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer yes or no.").context(PromptSnafu {})?,
        }
    }
}

/// Decides which participants get disqualified, asking the operator if needed.
fn decide_disqualified<R: BufRead, W: Write>(
    event: &PreparedEvent,
    decision: IncompleteDecision,
    input: &mut R,
    output: &mut W,
) -> LmcResult<BTreeSet<String>> {
    let report = event.completeness();
    if report.is_complete() {
        return Ok(BTreeSet::new());
    }
    let handles = report.incomplete.clone();
    warn!("Incomplete ballots from the participants {:?}", handles);
    let proceed = match decision {
        IncompleteDecision::Disqualify => true,
        IncompleteDecision::Abort => false,
        IncompleteDecision::Ask => {
            writeln!(output, "These participants did not vote for everyone:")
                .context(PromptSnafu {})?;
            for h in handles.iter() {
                writeln!(output, "  {}", h).context(PromptSnafu {})?;
            }
            ask_yes_no("Disqualify them and continue?", input, output)?
        }
    };
    if !proceed {
        return AbortedSnafu { handles }.fail();
    }
    Ok(handles.into_iter().collect())
}

fn export_cell_to_json(c: &ExportCell) -> JSValue {
    match c {
        ExportCell::Empty => JSValue::Null,
        ExportCell::Int(x) => json!(x),
        ExportCell::Decimal(x) => json!(x),
        ExportCell::Disqualified => json!("disqualified"),
    }
}

fn votes_to_json(votes: &VotesMatrixExport) -> JSValue {
    let rows: Vec<JSValue> = votes
        .voter_rows
        .iter()
        .chain(votes.summary_rows.iter())
        .map(|r| {
            let cells: Vec<JSValue> = r.cells.iter().map(export_cell_to_json).collect();
            json!({
                "label": r.label,
                "cells": cells,
                "totalGiven": export_cell_to_json(&r.total_given),
            })
        })
        .collect();
    json!({"columns": votes.columns, "rows": rows})
}

fn scoreboard_to_json(scoreboard: &[ScoreboardEntry]) -> JSValue {
    let mut res: JSMap<String, JSValue> = JSMap::new();
    let mut num_dq = 0;
    for entry in scoreboard.iter() {
        let key = match entry.placement {
            Placement::Rank(r) => r.to_string(),
            Placement::Disqualified => {
                num_dq += 1;
                format!("DQ{}", num_dq)
            }
        };
        let average = match entry.stats.average {
            Some(avg) => json!(avg),
            None => json!("no average"),
        };
        let mut js = json!({
            "name": entry.name,
            "handle": entry.handle,
            "score": entry.stats.score,
            "average": average,
        });
        if let Some(m) = js.as_object_mut() {
            for s in Score::descending() {
                m.insert(format!("{}s", s.value()), json!(entry.stats.count(s)));
            }
        }
        res.insert(key, js);
    }
    JSValue::Object(res)
}

fn self_vote_to_json(sv: &SelfVote) -> JSValue {
    match sv {
        SelfVote::Cast(s) => json!(s.value()),
        SelfVote::Missing => JSValue::Null,
        SelfVote::Disqualified => json!("disqualified"),
    }
}

fn build_notes(event: &PreparedEvent, results: &EventResults) -> Vec<String> {
    let mut notes: Vec<String> = Vec::new();
    for h in results.disqualified.iter() {
        notes.push(format!("{} did not complete the ballot and is disqualified", h));
    }
    for h in event.completeness().incomplete_non_participants.iter() {
        notes.push(format!("{} did not vote for every participant", h));
    }
    for (voter, recipient) in event.unknown_recipients().iter() {
        notes.push(format!(
            "{} voted for {}, who is not a participant of this event",
            voter, recipient
        ));
    }
    notes
}

fn build_results_js(settings: &EventSettings, event: &PreparedEvent, results: &EventResults) -> JSValue {
    let mut generosity: JSMap<String, JSValue> = JSMap::new();
    for (voter, g) in results.generosity.iter() {
        generosity.insert(
            voter.clone(),
            json!({"given": g.given, "totalGiven": g.total_given, "generosity": g.generosity}),
        );
    }

    let mut distribution: JSMap<String, JSValue> = JSMap::new();
    for b in results.distribution.buckets.iter() {
        distribution.insert(
            b.score.value().to_string(),
            json!({"count": b.count, "%": b.percent}),
        );
    }

    let mut self_votes: JSMap<String, JSValue> = JSMap::new();
    for (h, sv) in results.self_votes.iter() {
        self_votes.insert(h.clone(), self_vote_to_json(sv));
    }

    json!({
        "event": {"id": settings.event, "name": settings.event_name},
        "scoreboard": scoreboard_to_json(&results.scoreboard),
        "votes": votes_to_json(&results.votes),
        "generosity": generosity,
        "distribution": distribution,
        "totalValidVotes": results.distribution.total_valid_votes,
        "selfVotes": self_votes,
        "disqualified": results.disqualified,
        "notes": build_notes(event, results),
    })
}

fn log_scoreboard(results: &EventResults) {
    for entry in results.scoreboard.iter() {
        let place = match entry.placement {
            Placement::Rank(r) => r.to_string(),
            Placement::Disqualified => "DQ".to_string(),
        };
        info!(
            "{:>3} {} ({}): {} points, average {:?}",
            place, entry.name, entry.handle, entry.stats.score, entry.stats.average
        );
    }
}

fn write_results(out: &Option<String>, pretty_js: &str) -> LmcResult<()> {
    match out {
        None => {
            println!("{}", pretty_js);
        }
        Some(p) => {
            if let Some(parent) = Path::new(p).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingResultsSnafu { path: p.clone() })?;
                }
            }
            fs::write(p, pretty_js).context(WritingResultsSnafu { path: p.clone() })?;
            info!("write_results: results written to {}", p);
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, result_js: &JSValue) -> LmcResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("check_reference: {:?}", summary_ref);
    if &summary_ref != result_js {
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty_js_stats = serde_json::to_string_pretty(result_js).context(ParsingJsonSnafu {})?;
        warn!("Found differences with the reference results");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_stats.as_str(),
            "\n",
        );
        whatever!("Difference detected between calculated results and reference results")
    }
    Ok(())
}

fn run_event_with<R: BufRead, W: Write>(
    args: &Args,
    input: &mut R,
    output: &mut W,
) -> LmcResult<JSValue> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    let identities = read_users(&settings.users_path)?;
    let participants = read_participants(&settings.participants_path, settings.event)?;
    let ballots = read_ballots(&settings.sources, settings.event)?;

    let event = prepare_event(&ballots, &identities, &participants).context(VotingSnafu {})?;
    for h in event.completeness().incomplete_non_participants.iter() {
        info!("{} voted without scoring every participant", h);
    }

    let disqualified = decide_disqualified(&event, settings.decision, input, output)?;
    let results = event.tabulate(&disqualified).context(VotingSnafu {})?;
    log_scoreboard(&results);

    let result_js = build_results_js(&settings, &event, &results);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_results(&settings.out, &pretty_js)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &result_js)?;
    }

    Ok(result_js)
}

/// Computes the results of one event, as described by the command line.
pub fn run_event(args: &Args) -> LmcResult<JSValue> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stderr();
    run_event_with(args, &mut input, &mut output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/lmc21/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn config_args() -> Args {
        Args {
            config: Some(data_path("lmc21_config.yaml")),
            out: Some("stdout".to_string()),
            ..Default::default()
        }
    }

    fn run_with_answer(args: &Args, answer: &str) -> (LmcResult<JSValue>, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();
        let res = run_event_with(args, &mut input, &mut output);
        (res, String::from_utf8_lossy(&output).to_string())
    }

    #[test]
    fn lmc21_matches_reference() {
        let _ = env_logger::builder().is_test(true).try_init();
        let args = Args {
            reference: Some(data_path("lmc21_expected_results.json")),
            disqualify_incomplete: true,
            ..config_args()
        };
        let (res, _) = run_with_answer(&args, "");
        let js = res.unwrap();
        assert_eq!(js["scoreboard"]["1"]["handle"], json!("bob"));
        assert_eq!(js["scoreboard"]["DQ1"]["handle"], json!("carl"));
        // eve is not a participant, the row still carries the total given
        let eve_row = &js["votes"]["rows"][4];
        assert_eq!(eve_row["label"], json!("eve"));
        assert_eq!(eve_row["totalGiven"], json!(5));
    }

    #[test]
    fn lmc21_operator_says_yes() {
        let (res, prompt) = run_with_answer(&config_args(), "maybe\nyes\n");
        let js = res.unwrap();
        assert!(prompt.contains("carl"));
        assert!(prompt.contains("Please answer yes or no."));
        assert_eq!(js["disqualified"], json!(["carl"]));
    }

    #[test]
    fn lmc21_operator_says_no() {
        let (res, _) = run_with_answer(&config_args(), "no\n");
        match res {
            Err(LmcError::Aborted { handles }) => assert_eq!(handles, vec!["carl".to_string()]),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn lmc21_abort_incomplete() {
        let args = Args {
            abort_incomplete: true,
            ..config_args()
        };
        let (res, prompt) = run_with_answer(&args, "yes\n");
        assert!(matches!(res, Err(LmcError::Aborted { .. })));
        assert!(prompt.is_empty());
    }

    #[test]
    fn lmc21_csv_input() {
        let args = Args {
            input: Some(data_path("votes.csv")),
            input_type: Some("csv".to_string()),
            disqualify_incomplete: true,
            ..config_args()
        };
        let (res, _) = run_with_answer(&args, "");
        let js = res.unwrap();
        let reference = read_summary(&data_path("lmc21_expected_results.json")).unwrap();
        assert_eq!(js["scoreboard"], reference["scoreboard"]);
        assert_eq!(js["generosity"], reference["generosity"]);
    }

    #[test]
    fn event_out_of_range() {
        let args = Args {
            event: Some(17),
            ..config_args()
        };
        let (res, _) = run_with_answer(&args, "");
        assert!(matches!(
            res,
            Err(LmcError::EventOutOfRange {
                event: 17,
                first: 18
            })
        ));

        let args = Args {
            event: Some(22),
            ..config_args()
        };
        let (res, _) = run_with_answer(&args, "");
        assert!(matches!(res, Err(LmcError::EventOutOfRange { .. })));
    }

    #[test]
    fn conflicting_flags() {
        let args = Args {
            abort_incomplete: true,
            disqualify_incomplete: true,
            ..config_args()
        };
        assert!(resolve_settings(&args).is_err());
    }

    #[test]
    fn default_output_path() {
        let args = Args {
            out: None,
            ..config_args()
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.event, 21);
        assert_eq!(settings.event_name, "Libre Music Challenge");
        let out = settings.out.unwrap();
        assert!(out.ends_with("lmc21-results.json"), "{}", out);
        assert!(settings.users_path.ends_with("users.yaml"));
    }

    #[test]
    fn yes_no_answers() {
        let mut output: Vec<u8> = Vec::new();
        let mut input = Cursor::new(b"Y\n".to_vec());
        assert!(ask_yes_no("continue?", &mut input, &mut output).unwrap());
        let mut input = Cursor::new(b" no \n".to_vec());
        assert!(!ask_yes_no("continue?", &mut input, &mut output).unwrap());
        // End of input
        let mut input = Cursor::new(Vec::new());
        assert!(!ask_yes_no("continue?", &mut input, &mut output).unwrap());
    }

    #[test]
    fn reference_mismatch() {
        let js = json!({"scoreboard": {}});
        assert!(check_reference(&data_path("lmc21_expected_results.json"), &js).is_err());
    }
}

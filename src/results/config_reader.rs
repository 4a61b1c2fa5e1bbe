use crate::results::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The first event for which the votes were recorded by the website.
pub const DEFAULT_FIRST_EVENT: u32 = 18;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(rename = "eventId")]
    pub event_id: Option<u32>,
    #[serde(rename = "firstEvent")]
    pub first_event: Option<u32>,
    #[serde(rename = "currentEvent")]
    pub current_event: Option<u32>,
    #[serde(rename = "usersFile")]
    pub users_file: String,
    #[serde(rename = "participantsFile")]
    pub participants_file: String,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<BallotSource>,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UsersTable {
    /// handle -> artist name
    pub users: BTreeMap<String, String>,
}

fn is_yaml(path: &str) -> bool {
    path.ends_with(".yaml") || path.ends_with(".yml")
}

fn read_string(path: &str) -> LmcResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu {
        path: path.to_string(),
    })
}

pub fn read_config(path: &str) -> LmcResult<EventConfig> {
    let contents = read_string(path)?;
    let config: EventConfig = if is_yaml(path) {
        serde_yaml::from_str(&contents).context(ParsingYamlSnafu {
            path: path.to_string(),
        })?
    } else {
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})?
    };
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_users(path: &str) -> LmcResult<IdentityMap> {
    let contents = read_string(path)?;
    let table: UsersTable = serde_yaml::from_str(&contents).context(ParsingYamlSnafu {
        path: path.to_string(),
    })?;
    let pairs: Vec<(String, String)> = table.users.into_iter().collect();
    info!("read_users: {} users in {}", pairs.len(), path);
    IdentityMap::new(&pairs).context(VotingSnafu {})
}

/// The artist names of the participants of one event.
pub fn read_participants(path: &str, event: u32) -> LmcResult<Vec<String>> {
    let contents = read_string(path)?;
    let by_event: BTreeMap<u32, Vec<String>> =
        serde_yaml::from_str(&contents).context(ParsingYamlSnafu {
            path: path.to_string(),
        })?;
    let participants = by_event
        .get(&event)
        .cloned()
        .context(MissingParticipantsSnafu {
            event,
            path: path.to_string(),
        })?;
    debug!("read_participants: event {}: {:?}", event, participants);
    Ok(participants)
}

pub fn read_summary(path: &str) -> LmcResult<JSValue> {
    let contents = read_string(path)?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::table::{Record, Table};

/// Raw API tables for one point in the season, before any remapping.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub teams: Table,
    pub fixtures: Table,
    pub players: Table,
    pub players_history: Table,
    pub players_history_past: Table,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    teams: Vec<Record>,
    #[serde(default)]
    elements: Vec<Record>,
    #[serde(default)]
    fixtures: Vec<Record>,
    #[serde(default)]
    element_summaries: BTreeMap<String, RawElementSummary>,
}

#[derive(Debug, Default, Deserialize)]
struct RawElementSummary {
    #[serde(default)]
    history: Vec<Record>,
    #[serde(default)]
    history_past: Vec<Record>,
}

/// Parses the bootstrap, fixture list and per-player summaries bundled in
/// one JSON document. Past-season records carry no player id in the API,
/// so the `element_summaries` key is written into each of them.
pub fn parse_snapshot_json(raw: &str) -> Result<Snapshot> {
    let parsed: RawSnapshot = serde_json::from_str(raw)?;

    let mut history = Vec::new();
    let mut history_past = Vec::new();
    for (key, summary) in parsed.element_summaries {
        let element = key
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or(Value::String(key));
        history.extend(summary.history);
        history_past.extend(summary.history_past.into_iter().map(|mut record| {
            record
                .entry("element")
                .or_insert_with(|| element.clone());
            record
        }));
    }

    Ok(Snapshot {
        teams: Table::new("teams", parsed.teams),
        fixtures: Table::new("fixtures", parsed.fixtures),
        players: Table::new("players", parsed.elements),
        players_history: Table::new("players_history", history),
        players_history_past: Table::new("players_history_past", history_past),
    })
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)?;
    parse_snapshot_json(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_seasons_get_player_id() {
        let raw = r#"{
            "teams": [{"id": 1, "short_name": "ARS"}],
            "element_summaries": {
                "7": {
                    "history": [{"element": 7, "fixture": 1}],
                    "history_past": [{"season_name": "2023/24", "total_points": 120}]
                }
            }
        }"#;
        let snap = parse_snapshot_json(raw).unwrap();
        assert_eq!(snap.teams.len(), 1);
        assert!(snap.fixtures.is_empty());
        assert_eq!(snap.players_history.len(), 1);
        assert_eq!(snap.players_history_past.rows()[0]["element"], 7);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_snapshot_json("{\"teams\": 3}").is_err());
    }
}

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::table::Table;

pub mod data_set {
    pub const TEAM: &str = "team";
    pub const FIXTURE: &str = "fixture";
    pub const PLAYER: &str = "player";
    pub const PLAYER_HIST: &str = "player_hist";
    pub const PLAYERS_HISTORY_PAST: &str = "players_history_past";
}

/// Canonical column names.
pub mod col {
    pub const TEAM_ID: &str = "Team ID";
    pub const TEAM_CODE: &str = "Team Code";
    pub const TEAM_SHORT_NAME: &str = "Team Short Name";
    pub const TEAM_NAME: &str = "Team Name";
    pub const TEAM_STRENGTH: &str = "Team Strength";
    pub const STRENGTH_ATTACK_HOME: &str = "Strength Attack Home";
    pub const STRENGTH_ATTACK_AWAY: &str = "Strength Attack Away";
    pub const STRENGTH_DEFENCE_HOME: &str = "Strength Defence Home";
    pub const STRENGTH_DEFENCE_AWAY: &str = "Strength Defence Away";
    pub const STRENGTH_OVERALL_HOME: &str = "Strength Overall Home";
    pub const STRENGTH_OVERALL_AWAY: &str = "Strength Overall Away";

    pub const FIXTURE_ID: &str = "Fixture ID";
    pub const GAME_WEEK: &str = "Game Week";
    pub const KICK_OFF_TIME: &str = "Kick Off Time";
    pub const HOME_TEAM_ID: &str = "Home Team ID";
    pub const AWAY_TEAM_ID: &str = "Away Team ID";
    pub const HOME_TEAM_SCORE: &str = "Home Team Score";
    pub const AWAY_TEAM_SCORE: &str = "Away Team Score";
    pub const HOME_TEAM_DIFFICULTY: &str = "Home Team Difficulty";
    pub const AWAY_TEAM_DIFFICULTY: &str = "Away Team Difficulty";
    pub const FINISHED: &str = "Finished";
    pub const STARTED: &str = "Started";

    pub const PLAYER_ID: &str = "Player ID";
    pub const FIRST_NAME: &str = "First Name";
    pub const LAST_NAME: &str = "Last Name";
    pub const NAME: &str = "Name";
    pub const PLAYER_TEAM_ID: &str = "Player Team ID";
    pub const FIELD_POSITION_ID: &str = "Field Position ID";
    pub const FIELD_POSITION: &str = "Field Position";
    pub const NOW_COST: &str = "Now Cost";
    pub const CURRENT_COST: &str = "Current Cost";
    pub const MINUTES_PLAYED: &str = "Minutes Played";
    pub const MINUTES_PERCENT: &str = "Minutes Percent";
    pub const TOTAL_POINTS: &str = "Total Points";
    pub const PERCENT_SELECTED: &str = "Percent Selected";
    pub const ICT_INDEX: &str = "ICT Index";
    pub const NEWS: &str = "News";
    pub const NEWS_ADDED: &str = "News Added";
    pub const NEWS_AND_DATE: &str = "News And Date";
    pub const CHANCE_AVAIL_THIS_GW: &str = "Chance Avail This GW";
    pub const CHANCE_AVAIL_NEXT_GW: &str = "Chance Avail Next GW";

    pub const OPP_TEAM_ID: &str = "Opp Team ID";
    pub const WAS_HOME: &str = "Was Home?";
    pub const GAME_TOTAL_POINTS: &str = "Game Total Points";
    pub const GAME_MINUTES_PLAYED: &str = "Game Minutes Played";
    pub const GAME_VALUE: &str = "Game Value";
    pub const GAME_COST: &str = "Game Cost";
    pub const GAME_ICT_INDEX: &str = "Game ICT Index";

    pub const SEASON: &str = "Season";
    pub const SEASON_TOTAL_POINTS: &str = "Season Total Points";
    pub const SEASON_MINUTES_PLAYED: &str = "Season Minutes Played";
    pub const SEASON_START_COST: &str = "Season Start Cost";
    pub const SEASON_END_COST: &str = "Season End Cost";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Flag,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub source_key: String,
    pub display_order: u32,
    pub column_type: ColumnType,
}

/// Column registry for the raw data sets. Supplied by the caller so the
/// transformation stages never reach for global schema state themselves.
pub trait SchemaCatalog {
    fn columns(&self, data_set: &str) -> &[ColumnSpec];

    fn by_name(&self, data_set: &str, name: &str) -> Option<&ColumnSpec> {
        self.columns(data_set).iter().find(|c| c.name == name)
    }
}

/// Catalog for the public fantasy API snapshot layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FplCatalog {
    data_sets: HashMap<String, Vec<ColumnSpec>>,
}

static FPL_CATALOG: Lazy<FplCatalog> = Lazy::new(FplCatalog::new);

impl FplCatalog {
    pub fn new() -> Self {
        use ColumnType::*;
        use col::*;

        let mut data_sets = HashMap::new();
        data_sets.insert(
            data_set::TEAM.to_string(),
            specs(&[
                ("id", TEAM_ID, Integer),
                ("code", TEAM_CODE, Integer),
                ("short_name", TEAM_SHORT_NAME, Text),
                ("name", TEAM_NAME, Text),
                ("strength", TEAM_STRENGTH, Integer),
                ("strength_attack_home", STRENGTH_ATTACK_HOME, Integer),
                ("strength_attack_away", STRENGTH_ATTACK_AWAY, Integer),
                ("strength_defence_home", STRENGTH_DEFENCE_HOME, Integer),
                ("strength_defence_away", STRENGTH_DEFENCE_AWAY, Integer),
                ("strength_overall_home", STRENGTH_OVERALL_HOME, Integer),
                ("strength_overall_away", STRENGTH_OVERALL_AWAY, Integer),
            ]),
        );
        data_sets.insert(
            data_set::FIXTURE.to_string(),
            specs(&[
                ("id", FIXTURE_ID, Integer),
                ("event", GAME_WEEK, Integer),
                ("kickoff_time", KICK_OFF_TIME, Timestamp),
                ("team_h", HOME_TEAM_ID, Integer),
                ("team_a", AWAY_TEAM_ID, Integer),
                ("team_h_score", HOME_TEAM_SCORE, Integer),
                ("team_a_score", AWAY_TEAM_SCORE, Integer),
                ("team_h_difficulty", HOME_TEAM_DIFFICULTY, Integer),
                ("team_a_difficulty", AWAY_TEAM_DIFFICULTY, Integer),
                ("finished", FINISHED, Flag),
                ("started", STARTED, Flag),
            ]),
        );
        data_sets.insert(
            data_set::PLAYER.to_string(),
            specs(&[
                ("id", PLAYER_ID, Integer),
                ("web_name", NAME, Text),
                ("first_name", FIRST_NAME, Text),
                ("second_name", LAST_NAME, Text),
                ("team", PLAYER_TEAM_ID, Integer),
                ("element_type", FIELD_POSITION_ID, Integer),
                ("now_cost", NOW_COST, Integer),
                ("minutes", MINUTES_PLAYED, Integer),
                ("total_points", TOTAL_POINTS, Integer),
                ("selected_by_percent", PERCENT_SELECTED, Float),
                ("ict_index", ICT_INDEX, Float),
                ("news", NEWS, Text),
                ("news_added", NEWS_ADDED, Timestamp),
                ("chance_of_playing_this_round", CHANCE_AVAIL_THIS_GW, Float),
                ("chance_of_playing_next_round", CHANCE_AVAIL_NEXT_GW, Float),
            ]),
        );
        data_sets.insert(
            data_set::PLAYER_HIST.to_string(),
            specs(&[
                ("element", PLAYER_ID, Integer),
                ("fixture", FIXTURE_ID, Integer),
                ("round", GAME_WEEK, Integer),
                ("kickoff_time", KICK_OFF_TIME, Timestamp),
                ("opponent_team", OPP_TEAM_ID, Integer),
                ("was_home", WAS_HOME, Flag),
                ("total_points", GAME_TOTAL_POINTS, Integer),
                ("minutes", GAME_MINUTES_PLAYED, Integer),
                ("value", GAME_VALUE, Integer),
                ("ict_index", GAME_ICT_INDEX, Float),
            ]),
        );
        data_sets.insert(
            data_set::PLAYERS_HISTORY_PAST.to_string(),
            specs(&[
                ("element", PLAYER_ID, Integer),
                ("season_name", SEASON, Text),
                ("total_points", SEASON_TOTAL_POINTS, Integer),
                ("minutes", SEASON_MINUTES_PLAYED, Integer),
                ("start_cost", SEASON_START_COST, Integer),
                ("end_cost", SEASON_END_COST, Integer),
            ]),
        );
        Self { data_sets }
    }

    pub fn global() -> &'static FplCatalog {
        &FPL_CATALOG
    }
}

impl SchemaCatalog for FplCatalog {
    fn columns(&self, data_set: &str) -> &[ColumnSpec] {
        self.data_sets
            .get(data_set)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn specs(entries: &[(&str, &str, ColumnType)]) -> Vec<ColumnSpec> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, (source, name, ty))| ColumnSpec {
            name: name.to_string(),
            source_key: source.to_string(),
            display_order: idx as u32,
            column_type: *ty,
        })
        .collect()
}

/// Renames known source keys to canonical names. Unknown keys pass through
/// untouched so derived stages can still read them.
pub fn remap(table: &Table, data_set: &str, catalog: &dyn SchemaCatalog) -> Table {
    let mut out = table.clone();
    for spec in catalog.columns(data_set) {
        if out.has_column(&spec.source_key) {
            out.rename_column(&spec.source_key, &spec.name);
        }
    }
    out
}

/// Orders catalogued columns by display order; uncatalogued columns keep
/// their relative order after them.
pub fn reorder(table: &mut Table, data_set: &str, catalog: &dyn SchemaCatalog) {
    let mut known: Vec<(u32, String)> = Vec::new();
    let mut rest: Vec<String> = Vec::new();
    for column in table.columns() {
        match catalog.by_name(data_set, column) {
            Some(spec) => known.push((spec.display_order, column.clone())),
            None => rest.push(column.clone()),
        }
    }
    known.sort_by_key(|(order, _)| *order);
    let ordered = known.into_iter().map(|(_, c)| c).chain(rest).collect();
    table.set_column_order(ordered);
}

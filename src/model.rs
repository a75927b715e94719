use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{DataError, Result};
use crate::schema::col;
use crate::table::{RowRef, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    #[serde(rename = "Team ID")]
    pub id: u32,
    #[serde(rename = "Team Code")]
    pub code: u32,
    #[serde(rename = "Team Short Name")]
    pub short_name: String,
    #[serde(rename = "Team Name")]
    pub name: String,
    #[serde(rename = "Team Strength")]
    pub strength: Option<f64>,
}

pub const TEAM_COLUMNS: [&str; 4] = [col::TEAM_ID, col::TEAM_CODE, col::TEAM_SHORT_NAME, col::TEAM_NAME];

impl Team {
    pub fn from_table(teams: &Table) -> Result<Vec<Team>> {
        teams.decode(&TEAM_COLUMNS, |row| {
            Ok(Team {
                id: row.required_u32(col::TEAM_ID)?,
                code: row.required_u32(col::TEAM_CODE)?,
                short_name: row.required_text(col::TEAM_SHORT_NAME)?,
                name: row.required_text(col::TEAM_NAME)?,
                strength: row.f64(col::TEAM_STRENGTH),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    #[serde(rename = "Fixture ID")]
    pub id: u32,
    /// None for postponed fixtures that have not been rescheduled yet.
    #[serde(rename = "Game Week")]
    pub game_week: Option<u32>,
    #[serde(rename = "Kick Off Time")]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(rename = "Home Team ID")]
    pub home_team_id: u32,
    #[serde(rename = "Away Team ID")]
    pub away_team_id: u32,
    #[serde(rename = "Home Team Score")]
    pub home_score: Option<u32>,
    #[serde(rename = "Away Team Score")]
    pub away_score: Option<u32>,
    #[serde(rename = "Home Team Difficulty")]
    pub home_difficulty: Option<u32>,
    #[serde(rename = "Away Team Difficulty")]
    pub away_difficulty: Option<u32>,
    #[serde(rename = "Finished")]
    pub finished: bool,
}

pub const FIXTURE_COLUMNS: [&str; 6] = [
    col::FIXTURE_ID,
    col::GAME_WEEK,
    col::HOME_TEAM_SCORE,
    col::AWAY_TEAM_SCORE,
    col::HOME_TEAM_ID,
    col::AWAY_TEAM_ID,
];

impl Fixture {
    pub fn from_table(fixtures: &Table) -> Result<Vec<Fixture>> {
        fixtures.decode(&FIXTURE_COLUMNS, |row| {
            let home_score = row.u32(col::HOME_TEAM_SCORE);
            let away_score = row.u32(col::AWAY_TEAM_SCORE);
            Ok(Fixture {
                id: row.required_u32(col::FIXTURE_ID)?,
                game_week: row.u32(col::GAME_WEEK),
                kickoff: kickoff(row),
                home_team_id: row.required_u32(col::HOME_TEAM_ID)?,
                away_team_id: row.required_u32(col::AWAY_TEAM_ID)?,
                home_score,
                away_score,
                home_difficulty: row.u32(col::HOME_TEAM_DIFFICULTY),
                away_difficulty: row.u32(col::AWAY_TEAM_DIFFICULTY),
                // Older snapshots have no flag; a recorded score means it was played.
                finished: row
                    .flag(col::FINISHED)
                    .unwrap_or(home_score.is_some() && away_score.is_some()),
            })
        })
    }

    pub fn opponent_of(&self, team_id: u32) -> Option<u32> {
        if team_id == self.home_team_id {
            Some(self.away_team_id)
        } else if team_id == self.away_team_id {
            Some(self.home_team_id)
        } else {
            None
        }
    }
}

/// Player attributes after preparation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    #[serde(rename = "Player ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "First Name")]
    pub first_name: Option<String>,
    #[serde(rename = "Last Name")]
    pub last_name: Option<String>,
    #[serde(rename = "Player Team ID")]
    pub team_id: u32,
    #[serde(rename = "Field Position ID")]
    pub position_id: Option<u32>,
    #[serde(rename = "Field Position")]
    pub position: Option<String>,
    #[serde(rename = "Current Cost")]
    pub current_cost: Option<f64>,
    #[serde(rename = "Minutes Played")]
    pub minutes_played: Option<f64>,
    #[serde(rename = "Minutes Percent")]
    pub minutes_percent: Option<f64>,
    #[serde(rename = "Total Points")]
    pub total_points: Option<f64>,
    #[serde(rename = "Percent Selected")]
    pub percent_selected: Option<f64>,
    #[serde(rename = "ICT Index")]
    pub ict_index: Option<f64>,
    #[serde(rename = "News And Date")]
    pub news_and_date: Option<String>,
    #[serde(rename = "Chance Avail This GW")]
    pub chance_avail_this_gw: f64,
    #[serde(rename = "Chance Avail Next GW")]
    pub chance_avail_next_gw: f64,
}

pub const PLAYER_COLUMNS: [&str; 3] = [col::PLAYER_ID, col::NAME, col::PLAYER_TEAM_ID];

impl Player {
    pub fn from_table(players: &Table) -> Result<Vec<Player>> {
        players.decode(&PLAYER_COLUMNS, |row| {
            Ok(Player {
                id: row.required_u32(col::PLAYER_ID)?,
                name: row.required_text(col::NAME)?,
                first_name: row.text(col::FIRST_NAME),
                last_name: row.text(col::LAST_NAME),
                team_id: row.required_u32(col::PLAYER_TEAM_ID)?,
                position_id: row.u32(col::FIELD_POSITION_ID),
                position: row.text(col::FIELD_POSITION),
                current_cost: row.f64(col::CURRENT_COST),
                minutes_played: row.f64(col::MINUTES_PLAYED),
                minutes_percent: row.f64(col::MINUTES_PERCENT),
                total_points: row.f64(col::TOTAL_POINTS),
                percent_selected: row.f64(col::PERCENT_SELECTED),
                ict_index: row.f64(col::ICT_INDEX),
                news_and_date: row.text(col::NEWS_AND_DATE),
                chance_avail_this_gw: row
                    .f64(col::CHANCE_AVAIL_THIS_GW)
                    .unwrap_or(crate::prepare::DEFAULT_CHANCE_AVAIL),
                chance_avail_next_gw: row
                    .f64(col::CHANCE_AVAIL_NEXT_GW)
                    .unwrap_or(crate::prepare::DEFAULT_CHANCE_AVAIL),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTeam {
    #[serde(flatten)]
    pub player: Player,
    #[serde(rename = "Team Name")]
    pub team_name: String,
    #[serde(rename = "Team Short Name")]
    pub team_short_name: String,
    #[serde(rename = "Long Name")]
    pub long_name: String,
    #[serde(rename = "Long Name and Team")]
    pub long_name_and_team: String,
    #[serde(rename = "Name and Short Team")]
    pub name_and_short_team: String,
}

/// Joins players with their team and derives the display names.
pub fn player_teams(players: &[Player], teams: &[Team]) -> Result<Vec<PlayerTeam>> {
    let by_id = index_teams(teams);
    players
        .iter()
        .map(|p| {
            let team = by_id.get(&p.team_id).ok_or_else(|| DataError::UnknownTeam {
                table: "players".to_string(),
                team_id: p.team_id,
            })?;
            let long_name = match (&p.first_name, &p.last_name) {
                (Some(first), Some(last)) => format!("{first} {last}"),
                _ => p.name.clone(),
            };
            Ok(PlayerTeam {
                long_name_and_team: format!("{long_name} ({})", team.name),
                name_and_short_team: format!("{} ({})", p.name, team.short_name),
                long_name,
                team_name: team.name.clone(),
                team_short_name: team.short_name.clone(),
                player: p.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureTeams {
    #[serde(flatten)]
    pub fixture: Fixture,
    #[serde(rename = "Team Name Home")]
    pub home_name: String,
    #[serde(rename = "Team Short Name Home")]
    pub home_short_name: String,
    #[serde(rename = "Team Name Away")]
    pub away_name: String,
    #[serde(rename = "Team Short Name Away")]
    pub away_short_name: String,
}

pub fn fixture_teams(fixtures: &[Fixture], teams: &[Team]) -> Result<Vec<FixtureTeams>> {
    let by_id = index_teams(teams);
    let lookup = |team_id: u32| {
        by_id
            .get(&team_id)
            .copied()
            .ok_or_else(|| DataError::UnknownTeam {
                table: "fixtures".to_string(),
                team_id,
            })
    };
    fixtures
        .iter()
        .map(|f| {
            let home = lookup(f.home_team_id)?;
            let away = lookup(f.away_team_id)?;
            Ok(FixtureTeams {
                fixture: f.clone(),
                home_name: home.name.clone(),
                home_short_name: home.short_name.clone(),
                away_name: away.name.clone(),
                away_short_name: away.short_name.clone(),
            })
        })
        .collect()
}

/// One past-fixture record from a player's history.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFixtureHistory {
    pub player_id: u32,
    pub fixture_id: u32,
    pub opp_team_id: Option<u32>,
    pub was_home: Option<bool>,
    pub game_week: Option<u32>,
    pub kickoff: Option<DateTime<Utc>>,
    pub total_points: Option<f64>,
    pub minutes: Option<f64>,
    pub game_cost: Option<f64>,
    pub game_ict_index: Option<f64>,
}

pub const PLAYER_HISTORY_COLUMNS: [&str; 4] = [
    col::PLAYER_ID,
    col::FIXTURE_ID,
    col::GAME_TOTAL_POINTS,
    col::GAME_MINUTES_PLAYED,
];

impl PlayerFixtureHistory {
    pub fn from_table(history: &Table) -> Result<Vec<PlayerFixtureHistory>> {
        history.decode(&PLAYER_HISTORY_COLUMNS, |row| {
            Ok(PlayerFixtureHistory {
                player_id: row.required_u32(col::PLAYER_ID)?,
                fixture_id: row.required_u32(col::FIXTURE_ID)?,
                opp_team_id: row.u32(col::OPP_TEAM_ID),
                was_home: row.flag(col::WAS_HOME),
                game_week: row.u32(col::GAME_WEEK),
                kickoff: kickoff(row),
                total_points: row.f64(col::GAME_TOTAL_POINTS),
                minutes: row.f64(col::GAME_MINUTES_PLAYED),
                game_cost: row.f64(col::GAME_COST),
                game_ict_index: row.f64(col::GAME_ICT_INDEX),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeason {
    #[serde(rename = "Player ID")]
    pub player_id: u32,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Season Total Points")]
    pub total_points: Option<f64>,
    #[serde(rename = "Season Minutes Played")]
    pub minutes: Option<f64>,
    #[serde(rename = "Season Start Cost")]
    pub start_cost: Option<f64>,
    #[serde(rename = "Season End Cost")]
    pub end_cost: Option<f64>,
}

impl PlayerSeason {
    pub fn from_table(past: &Table) -> Result<Vec<PlayerSeason>> {
        past.decode(&[col::PLAYER_ID, col::SEASON], |row| {
            Ok(PlayerSeason {
                player_id: row.required_u32(col::PLAYER_ID)?,
                season: row.required_text(col::SEASON)?,
                total_points: row.f64(col::SEASON_TOTAL_POINTS),
                minutes: row.f64(col::SEASON_MINUTES_PLAYED),
                start_cost: row.f64(col::SEASON_START_COST).map(|c| c / 10.0),
                end_cost: row.f64(col::SEASON_END_COST).map(|c| c / 10.0),
            })
        })
    }
}

pub fn index_teams(teams: &[Team]) -> HashMap<u32, &Team> {
    teams.iter().map(|t| (t.id, t)).collect()
}

fn kickoff(row: &RowRef<'_>) -> Option<DateTime<Utc>> {
    let raw = row.text(col::KICK_OFF_TIME)?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::columns::{Column, Value};
use crate::error::{DataError, Result};
use crate::model::{Fixture, PlayerFixtureHistory, PlayerTeam, Team, index_teams};
use crate::team_scores::TeamScoreStats;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerFixtureRow {
    #[serde(rename = "Player ID")]
    pub player_id: u32,
    #[serde(rename = "Fixture ID")]
    pub fixture_id: u32,
    #[serde(rename = "Game Week")]
    pub game_week: u32,
    #[serde(rename = "Kick Off Time")]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Name and Short Team")]
    pub name_and_short_team: String,
    #[serde(rename = "Player Team ID")]
    pub team_id: u32,
    #[serde(rename = "Team Short Name")]
    pub team_short_name: String,
    #[serde(rename = "Opp Team Short Name")]
    pub opp_team_short_name: String,
    #[serde(rename = "Is Home?")]
    pub is_home: bool,
    #[serde(rename = "Field Position ID")]
    pub position_id: Option<u32>,
    #[serde(rename = "Field Position")]
    pub position: Option<String>,
    #[serde(rename = "News And Date")]
    pub news_and_date: Option<String>,
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
    #[serde(rename = "Chance Avail This GW")]
    pub chance_avail_this_gw: Option<f64>,
    #[serde(rename = "Chance Avail Next GW")]
    pub chance_avail_next_gw: Option<f64>,

    #[serde(rename = "Game Total Points")]
    pub game_total_points: Option<f64>,
    #[serde(rename = "Game Minutes Played")]
    pub game_minutes_played: Option<f64>,
    #[serde(rename = "Game Cost")]
    pub game_cost: Option<f64>,
    #[serde(rename = "Game ICT Index")]
    pub game_ict_index: Option<f64>,

    #[serde(rename = "Team Total Points")]
    pub team_total_points: Option<f64>,
    #[serde(rename = "Opp Team Total Points")]
    pub opp_team_total_points: Option<f64>,
    #[serde(rename = "Total Team Goals Scored")]
    pub total_team_goals_scored: Option<f64>,
    #[serde(rename = "Total Opp Team Goals Scored")]
    pub total_opp_team_goals_scored: Option<f64>,
    #[serde(rename = "Rel. Fixture Strength")]
    pub rel_fixture_strength: Option<f64>,
    #[serde(rename = "Fixture Short Name Difficulty")]
    pub fixture_short_name_difficulty: Option<String>,

    // Filled by `player_stats::calc_player_fixture_stats`.
    #[serde(rename = "GW Played")]
    pub gw_played: bool,
    #[serde(rename = "GWs Played To GW")]
    pub gws_played_to_gw: Option<f64>,
    #[serde(rename = "Total Points To GW")]
    pub total_points_to_gw: Option<f64>,
    #[serde(rename = "Avg Points To GW")]
    pub avg_points_to_gw: Option<f64>,
    #[serde(rename = "Avg Minutes Played Recently To GW")]
    pub avg_minutes_played_recently_to_gw: Option<f64>,
    #[serde(rename = "Avg Points Opp Points Adj To GW")]
    pub avg_points_opp_points_adj_to_gw: Option<f64>,
    #[serde(rename = "Total Opp Team Goals Scored Diff")]
    pub total_opp_team_goals_scored_diff: Option<f64>,
    #[serde(rename = "Rel. Fixture Strength To GW")]
    pub rel_fixture_strength_to_gw: Option<f64>,

    // Filled by `expected_points::apply_expected_points`.
    #[serde(rename = "Expected Points")]
    pub expected_points: Option<f64>,
}

impl PlayerFixtureRow {
    pub fn value(&self, column: Column) -> Value {
        use Column::*;
        match column {
            FixtureId => Value::Number(f64::from(self.fixture_id)),
            KickOffTime => Value::text(
                self.kickoff
                    .map(|k| k.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .as_deref(),
            ),
            Name => Value::Text(self.name.clone()),
            NameAndShortTeam => Value::Text(self.name_and_short_team.clone()),
            PlayerTeamId => Value::Number(f64::from(self.team_id)),
            TeamShortName => Value::Text(self.team_short_name.clone()),
            OppTeamShortName => Value::Text(self.opp_team_short_name.clone()),
            IsHome => Value::Flag(self.is_home),
            FieldPositionId => Value::number(self.position_id.map(f64::from)),
            FieldPosition => Value::text(self.position.as_deref()),
            NewsAndDate => Value::text(self.news_and_date.as_deref()),
            CurrentCost => Value::number(self.current_cost),
            MinutesPlayed => Value::number(self.minutes_played),
            MinutesPercent => Value::number(self.minutes_percent),
            TotalPoints => Value::number(self.total_points),
            PercentSelected => Value::number(self.percent_selected),
            IctIndex => Value::number(self.ict_index),
            ChanceAvailThisGw => Value::number(self.chance_avail_this_gw),
            ChanceAvailNextGw => Value::number(self.chance_avail_next_gw),
            GameTotalPoints => Value::number(self.game_total_points),
            GameMinutesPlayed => Value::number(self.game_minutes_played),
            GameCost => Value::number(self.game_cost),
            GameIctIndex => Value::number(self.game_ict_index),
            GwPlayed => Value::Flag(self.gw_played),
            GwsPlayedToGw => Value::number(self.gws_played_to_gw),
            TotalPointsToGw => Value::number(self.total_points_to_gw),
            AvgPointsToGw => Value::number(self.avg_points_to_gw),
            AvgMinutesPlayedRecentlyToGw => Value::number(self.avg_minutes_played_recently_to_gw),
            AvgPointsOppPointsAdjToGw => Value::number(self.avg_points_opp_points_adj_to_gw),
            TeamTotalPoints => Value::number(self.team_total_points),
            OppTeamTotalPoints => Value::number(self.opp_team_total_points),
            TotalTeamGoalsScored => Value::number(self.total_team_goals_scored),
            TotalOppTeamGoalsScored => Value::number(self.total_opp_team_goals_scored),
            TotalOppTeamGoalsScoredDiff => Value::number(self.total_opp_team_goals_scored_diff),
            RelFixtureStrength => Value::number(self.rel_fixture_strength),
            RelFixtureStrengthToGw => Value::number(self.rel_fixture_strength_to_gw),
            FixtureShortNameDifficulty => Value::text(self.fixture_short_name_difficulty.as_deref()),
            ExpectedPoints => Value::number(self.expected_points),
        }
    }

    /// Chronological order key; unscheduled kickoffs sort last.
    pub fn order_key(&self) -> (bool, Option<DateTime<Utc>>, u32) {
        (self.kickoff.is_none(), self.kickoff, self.fixture_id)
    }
}

/// Team-level inputs shared by every player row.
pub struct FixtureContext<'a> {
    fixtures: HashMap<u32, &'a Fixture>,
    teams: HashMap<u32, &'a Team>,
    score_stats: &'a BTreeMap<u32, TeamScoreStats>,
    league_points: &'a HashMap<u32, f64>,
}

impl<'a> FixtureContext<'a> {
    pub fn new(
        fixtures: &'a [Fixture],
        teams: &'a [Team],
        score_stats: &'a BTreeMap<u32, TeamScoreStats>,
        league_points: &'a HashMap<u32, f64>,
    ) -> Self {
        Self {
            fixtures: fixtures.iter().map(|f| (f.id, f)).collect(),
            teams: index_teams(teams),
            score_stats,
            league_points,
        }
    }

    fn team(&self, team_id: u32) -> Result<&'a Team> {
        self.teams
            .get(&team_id)
            .copied()
            .ok_or_else(|| DataError::UnknownTeam {
                table: "fixtures".to_string(),
                team_id,
            })
    }

    fn row(&self, player: &PlayerTeam, fixture: &Fixture, team_id: u32) -> Result<Option<PlayerFixtureRow>> {
        let Some(game_week) = fixture.game_week else {
            return Ok(None);
        };
        let Some(opp_id) = fixture.opponent_of(team_id) else {
            return Ok(None);
        };
        let team = self.team(team_id)?;
        let opp = self.team(opp_id)?;
        let is_home = fixture.home_team_id == team_id;
        let difficulty = if is_home {
            fixture.home_difficulty
        } else {
            fixture.away_difficulty
        };
        let p = &player.player;

        Ok(Some(PlayerFixtureRow {
            player_id: p.id,
            fixture_id: fixture.id,
            game_week,
            kickoff: fixture.kickoff,
            name: p.name.clone(),
            name_and_short_team: format!("{} ({})", p.name, team.short_name),
            team_id,
            team_short_name: team.short_name.clone(),
            opp_team_short_name: opp.short_name.clone(),
            is_home,
            position_id: p.position_id,
            position: p.position.clone(),
            news_and_date: p.news_and_date.clone(),
            current_cost: p.current_cost,
            minutes_played: p.minutes_played,
            minutes_percent: p.minutes_percent,
            total_points: p.total_points,
            percent_selected: p.percent_selected,
            ict_index: p.ict_index,
            chance_avail_this_gw: Some(p.chance_avail_this_gw),
            chance_avail_next_gw: Some(p.chance_avail_next_gw),
            // Team totals are as of the snapshot, not as of this fixture.
            team_total_points: self.league_points.get(&team_id).copied(),
            opp_team_total_points: self.league_points.get(&opp_id).copied(),
            total_team_goals_scored: self.score_stats.get(&team_id).map(|s| s.total_scored),
            total_opp_team_goals_scored: self.score_stats.get(&opp_id).map(|s| s.total_scored),
            rel_fixture_strength: team.strength.zip(opp.strength).map(|(t, o)| t / o),
            fixture_short_name_difficulty: Some(fixture_label(&opp.short_name, is_home, difficulty)),
            ..Default::default()
        }))
    }
}

/// "CHE (H3)": opponent, venue and difficulty for the player's side.
pub fn fixture_label(opp_short_name: &str, is_home: bool, difficulty: Option<u32>) -> String {
    let venue = if is_home { 'H' } else { 'A' };
    match difficulty {
        Some(d) => format!("{opp_short_name} ({venue}{d})"),
        None => format!("{opp_short_name} ({venue})"),
    }
}

pub fn build_player_fixture_rows(
    players: &[PlayerTeam],
    history: &[PlayerFixtureHistory],
    ctx: &FixtureContext<'_>,
) -> Result<Vec<PlayerFixtureRow>> {
    let mut history_by_player: HashMap<u32, Vec<&PlayerFixtureHistory>> = HashMap::new();
    for h in history {
        history_by_player.entry(h.player_id).or_default().push(h);
    }

    let mut upcoming_by_team: HashMap<u32, Vec<&Fixture>> = HashMap::new();
    for f in ctx.fixtures.values().filter(|f| !f.finished) {
        upcoming_by_team.entry(f.home_team_id).or_default().push(f);
        upcoming_by_team.entry(f.away_team_id).or_default().push(f);
    }

    let mut rows = Vec::new();
    for player in players {
        let p = &player.player;
        let mut seen: HashSet<u32> = HashSet::new();

        let played = history_by_player.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
        if played.is_empty() {
            debug!(player_id = p.id, "player has no fixture history");
        }
        for h in played {
            let Some(fixture) = ctx.fixtures.get(&h.fixture_id) else {
                warn!(player_id = p.id, fixture_id = h.fixture_id, "history references unknown fixture");
                continue;
            };
            let team_id = match h.was_home {
                Some(true) => fixture.home_team_id,
                Some(false) => fixture.away_team_id,
                None => h
                    .opp_team_id
                    .and_then(|opp| fixture.opponent_of(opp))
                    .unwrap_or(p.team_id),
            };
            let Some(mut row) = ctx.row(player, fixture, team_id)? else {
                continue;
            };
            row.game_total_points = h.total_points;
            row.game_minutes_played = h.minutes;
            row.game_cost = h.game_cost;
            row.game_ict_index = h.game_ict_index;
            if row.kickoff.is_none() {
                row.kickoff = h.kickoff;
            }
            seen.insert(fixture.id);
            rows.push(row);
        }

        if let Some(upcoming) = upcoming_by_team.get(&p.team_id) {
            for fixture in upcoming {
                if seen.contains(&fixture.id) {
                    continue;
                }
                if let Some(row) = ctx.row(player, fixture, p.team_id)? {
                    rows.push(row);
                }
            }
        }
    }

    rows.sort_by(|a, b| {
        a.player_id
            .cmp(&b.player_id)
            .then_with(|| a.order_key().cmp(&b.order_key()))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Player;

    fn team(id: u32, short: &str, strength: f64) -> Team {
        Team {
            id,
            code: id,
            short_name: short.to_string(),
            name: short.to_string(),
            strength: Some(strength),
        }
    }

    fn player(id: u32, team_id: u32, team_short: &str) -> PlayerTeam {
        PlayerTeam {
            player: Player {
                id,
                name: format!("P{id}"),
                first_name: None,
                last_name: None,
                team_id,
                position_id: Some(3),
                position: Some("MID".to_string()),
                current_cost: Some(6.0),
                minutes_played: Some(90.0),
                minutes_percent: Some(100.0),
                total_points: Some(6.0),
                percent_selected: Some(1.0),
                ict_index: Some(5.0),
                news_and_date: None,
                chance_avail_this_gw: 100.0,
                chance_avail_next_gw: 100.0,
            },
            team_name: team_short.to_string(),
            team_short_name: team_short.to_string(),
            long_name: format!("P{id}"),
            long_name_and_team: format!("P{id} ({team_short})"),
            name_and_short_team: format!("P{id} ({team_short})"),
        }
    }

    #[test]
    fn played_and_upcoming_fixtures_both_become_rows() {
        let teams = vec![team(1, "ARS", 4.0), team(2, "CHE", 2.0)];
        let fixtures = vec![
            Fixture {
                id: 10,
                game_week: Some(1),
                kickoff: "2024-08-17T14:00:00Z".parse().ok(),
                home_team_id: 1,
                away_team_id: 2,
                home_score: Some(2),
                away_score: Some(0),
                home_difficulty: Some(3),
                away_difficulty: Some(4),
                finished: true,
            },
            Fixture {
                id: 11,
                game_week: Some(2),
                kickoff: "2024-08-24T14:00:00Z".parse().ok(),
                home_team_id: 2,
                away_team_id: 1,
                home_score: None,
                away_score: None,
                home_difficulty: Some(4),
                away_difficulty: Some(2),
                finished: false,
            },
            Fixture {
                id: 12,
                game_week: None,
                kickoff: None,
                home_team_id: 1,
                away_team_id: 2,
                home_score: None,
                away_score: None,
                home_difficulty: None,
                away_difficulty: None,
                finished: false,
            },
        ];
        let history = vec![PlayerFixtureHistory {
            player_id: 7,
            fixture_id: 10,
            opp_team_id: Some(2),
            was_home: Some(true),
            game_week: Some(1),
            kickoff: None,
            total_points: Some(9.0),
            minutes: Some(90.0),
            game_cost: Some(6.0),
            game_ict_index: Some(12.0),
        }];
        let stats = BTreeMap::new();
        let points = HashMap::from([(1, 3.0), (2, 0.0)]);
        let ctx = FixtureContext::new(&fixtures, &teams, &stats, &points);

        let rows = build_player_fixture_rows(&[player(7, 1, "ARS")], &history, &ctx).unwrap();
        assert_eq!(rows.len(), 2, "unscheduled fixture is skipped");

        assert_eq!(rows[0].fixture_id, 10);
        assert_eq!(rows[0].game_total_points, Some(9.0));
        assert_eq!(rows[0].fixture_short_name_difficulty.as_deref(), Some("CHE (H3)"));
        assert_eq!(rows[0].rel_fixture_strength, Some(2.0));
        assert_eq!(rows[0].team_total_points, Some(3.0));
        assert_eq!(rows[0].opp_team_total_points, Some(0.0));

        assert_eq!(rows[1].fixture_id, 11);
        assert_eq!(rows[1].game_total_points, None);
        assert!(!rows[1].is_home);
        assert_eq!(rows[1].fixture_short_name_difficulty.as_deref(), Some("CHE (A2)"));
    }

    #[test]
    fn label_without_difficulty() {
        assert_eq!(fixture_label("LIV", false, None), "LIV (A)");
    }
}

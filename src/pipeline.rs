use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::expected_points::apply_expected_points;
use crate::horizon::{Horizon, HorizonRow, calc_eps_for_next_gws};
use crate::model::{
    Fixture, FixtureTeams, Player, PlayerFixtureHistory, PlayerSeason, PlayerTeam, Team,
    fixture_teams, player_teams,
};
use crate::player_fixtures::{FixtureContext, PlayerFixtureRow, build_player_fixture_rows};
use crate::player_stats::calc_player_fixture_stats;
use crate::prepare::{
    prepare_fixtures, prepare_players, prepare_players_history, prepare_players_history_past,
    prepare_teams,
};
use crate::projection::{PlayerUnitRow, describe_idle_players, project_to_gw};
use crate::schema::SchemaCatalog;
use crate::snapshot::Snapshot;
use crate::team_scores::{
    FixtureTeamRow, TeamScoreStats, team_fixture_scores, team_league_points, team_score_stats,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub horizons: Vec<Horizon>,
    /// Current game week; detected from the fixture list when unset.
    pub next_gw: Option<u32>,
    /// Season length; the highest scheduled game week when unset.
    pub total_gws: Option<u32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            horizons: vec![Horizon::NextGw, Horizon::NextGws(5), Horizon::GwsToEnd],
            next_gw: None,
            total_gws: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub next_gw: u32,
    pub total_gws: u32,
    pub teams: Vec<Team>,
    pub fixtures: Vec<FixtureTeams>,
    pub players: Vec<PlayerTeam>,
    pub past_seasons: Vec<PlayerSeason>,
    pub team_fixture_scores: Vec<FixtureTeamRow>,
    pub team_score_stats: Vec<TeamScoreStats>,
    pub player_fixtures: Vec<PlayerFixtureRow>,
    pub player_gws: Vec<PlayerUnitRow>,
    pub horizons: Vec<HorizonRow>,
}

pub fn season_length(fixtures: &[Fixture]) -> u32 {
    fixtures.iter().filter_map(|f| f.game_week).max().unwrap_or(0)
}

/// Lowest game week that still has an unfinished fixture, or the final
/// week once everything has been played.
pub fn detect_next_gw(fixtures: &[Fixture], total_gws: u32) -> u32 {
    fixtures
        .iter()
        .filter(|f| !f.finished)
        .filter_map(|f| f.game_week)
        .min()
        .unwrap_or(total_gws)
}

pub fn run(snapshot: &Snapshot, catalog: &dyn SchemaCatalog, opts: &RunOptions) -> Result<ProjectionReport> {
    let teams_table = prepare_teams(&snapshot.teams, catalog);
    let fixtures_table = prepare_fixtures(&snapshot.fixtures, catalog);
    let players_table = prepare_players(&snapshot.players, catalog);
    let history_table = prepare_players_history(&snapshot.players_history, catalog);
    let past_table = prepare_players_history_past(&snapshot.players_history_past, catalog);

    let teams = Team::from_table(&teams_table)?;
    let fixtures = Fixture::from_table(&fixtures_table)?;
    let players = Player::from_table(&players_table)?;
    let history = PlayerFixtureHistory::from_table(&history_table)?;
    let past_seasons = PlayerSeason::from_table(&past_table)?;
    info!(
        teams = teams.len(),
        fixtures = fixtures.len(),
        players = players.len(),
        history = history.len(),
        "snapshot decoded"
    );

    let unscheduled = fixtures.iter().filter(|f| f.game_week.is_none()).count();
    if unscheduled > 0 {
        warn!(unscheduled, "fixtures without a game week are left out of the projection");
    }

    let players = player_teams(&players, &teams)?;
    let fixture_rows = fixture_teams(&fixtures, &teams)?;
    let scores = team_fixture_scores(&fixtures_table, &teams_table)?;
    let score_stats = team_score_stats(&scores);
    let league_points = team_league_points(&fixtures);

    let ctx = FixtureContext::new(&fixtures, &teams, &score_stats, &league_points);
    let rows = build_player_fixture_rows(&players, &history, &ctx)?;
    let mut rows = calc_player_fixture_stats(rows);
    apply_expected_points(&mut rows);
    info!(rows = rows.len(), "player fixture rows built");

    let total_gws = opts.total_gws.unwrap_or_else(|| season_length(&fixtures));
    let next_gw = opts
        .next_gw
        .unwrap_or_else(|| detect_next_gw(&fixtures, total_gws));

    let roster: Vec<u32> = players.iter().map(|p| p.player.id).collect();
    let mut player_gws = project_to_gw(&rows, &roster, total_gws);
    describe_idle_players(&mut player_gws, &players);
    info!(rows = player_gws.len(), total_gws, "projected to game weeks");

    let horizons = if total_gws == 0 || next_gw == 0 || next_gw > total_gws {
        warn!(next_gw, total_gws, "no game week to project from; horizons skipped");
        Vec::new()
    } else {
        calc_eps_for_next_gws(&player_gws, &opts.horizons, next_gw, total_gws)?
    };
    info!(players = horizons.len(), next_gw, "horizon summaries ready");

    Ok(ProjectionReport {
        next_gw,
        total_gws,
        teams,
        fixtures: fixture_rows,
        players,
        past_seasons,
        team_fixture_scores: scores,
        team_score_stats: score_stats.into_values().collect(),
        player_fixtures: rows,
        player_gws,
        horizons,
    })
}

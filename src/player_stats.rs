use std::collections::{HashMap, VecDeque};

use crate::player_fixtures::PlayerFixtureRow;

/// Trailing window for the recent-form averages, in fixtures.
pub const RECENT_FIXTURES: usize = 10;

#[derive(Debug, Default)]
pub struct PlayerRunningState {
    prior_fixtures: usize,
    played: u32,
    points_total: Option<f64>,
    recent_points: VecDeque<Option<f64>>,
    recent_minutes: VecDeque<Option<f64>>,
    last_avg_points: Option<f64>,
    strength_sum: f64,
    strength_count: u32,
}

/// Statistics known before a fixture kicks off.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorStats {
    pub gws_played: Option<f64>,
    pub total_points: Option<f64>,
    pub avg_points: Option<f64>,
    pub avg_minutes: Option<f64>,
    pub rel_fixture_strength: Option<f64>,
}

impl PlayerRunningState {
    /// Values attributable to the next fixture. Counts and sums carry the
    /// last known value through fixtures without data; the recent-minutes
    /// average does not and goes undefined once its window holds no data.
    pub fn prior(&mut self) -> PriorStats {
        let gws_played = (self.prior_fixtures > 0).then_some(f64::from(self.played));

        let avg_points = mean_defined(&self.recent_points).or(self.last_avg_points);
        self.last_avg_points = avg_points;

        let rel_fixture_strength =
            (self.strength_count > 0).then(|| self.strength_sum / f64::from(self.strength_count));

        PriorStats {
            gws_played,
            total_points: self.points_total,
            avg_points,
            avg_minutes: mean_defined(&self.recent_minutes),
            rel_fixture_strength,
        }
    }

    pub fn absorb(&mut self, row: &PlayerFixtureRow) {
        self.prior_fixtures += 1;
        if row.gw_played {
            self.played += 1;
        }
        if let Some(points) = row.game_total_points {
            self.points_total = Some(self.points_total.unwrap_or(0.0) + points);
        }
        push_window(&mut self.recent_points, row.game_total_points);
        push_window(&mut self.recent_minutes, row.game_minutes_played);
        if let Some(strength) = row.rel_fixture_strength.filter(|s| !s.is_nan()) {
            self.strength_sum += strength;
            self.strength_count += 1;
        }
    }
}

fn push_window(window: &mut VecDeque<Option<f64>>, value: Option<f64>) {
    if window.len() == RECENT_FIXTURES {
        window.pop_front();
    }
    window.push_back(value);
}

fn mean_defined(window: &VecDeque<Option<f64>>) -> Option<f64> {
    let (sum, n) = window
        .iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0u32), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / f64::from(n))
}

/// Fills the historical columns of every row. Output is ordered by kickoff
/// (then fixture, then player) across all players.
pub fn calc_player_fixture_stats(mut rows: Vec<PlayerFixtureRow>) -> Vec<PlayerFixtureRow> {
    rows.sort_by(|a, b| {
        a.order_key()
            .cmp(&b.order_key())
            .then(a.player_id.cmp(&b.player_id))
    });

    let mut states: HashMap<u32, PlayerRunningState> = HashMap::new();
    for row in &mut rows {
        row.gw_played = row.game_minutes_played.is_some_and(|m| m > 0.0);

        let state = states.entry(row.player_id).or_default();
        // Read before absorb: a row never sees its own fixture.
        let prior = state.prior();
        row.gws_played_to_gw = prior.gws_played;
        row.total_points_to_gw = prior.total_points;
        row.avg_points_to_gw = prior.avg_points;
        row.avg_minutes_played_recently_to_gw = prior.avg_minutes;
        row.rel_fixture_strength_to_gw = prior.rel_fixture_strength;

        row.total_opp_team_goals_scored_diff = row
            .total_team_goals_scored
            .zip(row.total_opp_team_goals_scored)
            .map(|(own, opp)| own - opp);
        row.avg_points_opp_points_adj_to_gw = match (
            row.avg_points_to_gw,
            row.team_total_points,
            row.opp_team_total_points,
        ) {
            (Some(avg), Some(team), Some(opp)) => Some(avg * team / opp),
            _ => None,
        };

        state.absorb(row);
    }
    rows
}

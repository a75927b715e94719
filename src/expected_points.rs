use std::collections::HashMap;

use crate::player_fixtures::PlayerFixtureRow;

/// Expected score for one fixture: the player's points-per-appearance to
/// date, scaled by how this fixture's relative strength compares with the
/// strength of the fixtures the player has faced so far.
///
/// When no appearances are recorded (zero or undefined) the cumulative
/// total stands in for the rate. Undefined inputs give an undefined result;
/// a zero strength-to-date gives an infinite one.
pub fn expected_points(
    total_points_to_gw: Option<f64>,
    gws_played_to_gw: Option<f64>,
    rel_fixture_strength: Option<f64>,
    rel_fixture_strength_to_gw: Option<f64>,
) -> Option<f64> {
    let total = total_points_to_gw?;
    let rate = match gws_played_to_gw {
        Some(played) if played != 0.0 && !played.is_nan() => total / played,
        _ => total,
    };
    Some(rate * rel_fixture_strength? / rel_fixture_strength_to_gw?)
}

/// Sets `expected_points` on each row. A row whose strength-to-date is
/// undefined falls back to the player's most recent known value. Rows must
/// already be in kickoff order.
pub fn apply_expected_points(rows: &mut [PlayerFixtureRow]) {
    let mut last_strength_to_gw: HashMap<u32, f64> = HashMap::new();
    for row in rows {
        let strength_to_gw = match row.rel_fixture_strength_to_gw {
            Some(v) => {
                last_strength_to_gw.insert(row.player_id, v);
                Some(v)
            }
            None => last_strength_to_gw.get(&row.player_id).copied(),
        };
        row.expected_points = expected_points(
            row.total_points_to_gw,
            row.gws_played_to_gw,
            row.rel_fixture_strength,
            strength_to_gw,
        );
    }
}

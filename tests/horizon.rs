use fpl_projections::DataError;
use fpl_projections::horizon::{Horizon, calc_eps_for_next_gws};
use fpl_projections::player_fixtures::PlayerFixtureRow;
use fpl_projections::projection::{PlayerUnitRow, project_to_gw};

/// One fixture per week for a single player, expected points equal to the
/// game week number.
fn season(total_gws: u32, chance_next: f64) -> Vec<PlayerUnitRow> {
    let rows: Vec<PlayerFixtureRow> = (1..=total_gws)
        .map(|gw| PlayerFixtureRow {
            player_id: 1,
            fixture_id: gw,
            game_week: gw,
            name: "Haaland".to_string(),
            expected_points: Some(f64::from(gw)),
            chance_avail_next_gw: Some(chance_next),
            fixture_short_name_difficulty: Some(format!("GW{gw}")),
            ..Default::default()
        })
        .collect();
    project_to_gw(&rows, &[1], total_gws)
}

#[test]
fn next_three_weeks_from_week_ten() {
    let canonical = season(38, 100.0);
    let out = calc_eps_for_next_gws(&canonical, &[Horizon::NextGws(3)], 10, 38).unwrap();
    let h = out[0].get(Horizon::NextGws(3)).unwrap();
    assert_eq!(h.window, 3);
    assert_eq!(h.expected_points, 10.0 + 11.0 + 12.0);
    assert_eq!(h.fixtures.as_deref(), Some("GW10, GW11, GW12"));
    assert_eq!(out[0].current.game_week, 10);
}

#[test]
fn window_clips_at_season_end() {
    let canonical = season(38, 100.0);
    let out = calc_eps_for_next_gws(
        &canonical,
        &[Horizon::NextGws(5), Horizon::GwsToEnd, Horizon::NextGw],
        37,
        38,
    )
    .unwrap();
    let row = &out[0];
    assert_eq!(row.get(Horizon::NextGws(5)).unwrap().window, 2);
    assert_eq!(row.get(Horizon::NextGws(5)).unwrap().expected_points, 75.0);
    assert_eq!(row.get(Horizon::GwsToEnd).unwrap().expected_points, 75.0);
    assert_eq!(row.get(Horizon::GwsToEnd).unwrap().fixtures, None);
    assert_eq!(row.get(Horizon::NextGw).unwrap().expected_points, 37.0);
}

#[test]
fn availability_scales_expected_points() {
    let canonical = season(4, 50.0);
    let out = calc_eps_for_next_gws(&canonical, &[Horizon::NextGws(2)], 1, 4).unwrap();
    assert_eq!(out[0].horizons[0].expected_points, 1.5);
}

#[test]
fn missing_current_week_is_an_error() {
    let canonical = season(5, 100.0);
    let err = calc_eps_for_next_gws(&canonical, &[Horizon::NextGw], 6, 8).unwrap_err();
    assert!(matches!(
        err,
        DataError::MissingCurrentUnit {
            player_id: 1,
            game_week: 6
        }
    ));
}

#[test]
fn serialized_row_names_horizon_columns() {
    let canonical = season(6, 100.0);
    let out = calc_eps_for_next_gws(&canonical, &[Horizon::NextGw, Horizon::GwsToEnd], 5, 6).unwrap();
    let json = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(json["Name"], "Haaland");
    assert_eq!(json["Expected Points Next GW"], 5.0);
    assert_eq!(json["Fixtures Next GW"], "GW5");
    assert_eq!(json["Expected Points GWs To End"], 11.0);
    assert!(json.get("Fixtures GWs To End").is_none());
}

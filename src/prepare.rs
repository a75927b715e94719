use chrono::DateTime;
use serde_json::Value;

use crate::schema::{SchemaCatalog, col, data_set, remap, reorder};
use crate::table::{Record, Table, cell_f64, cell_text, number_value};

/// Default when the API leaves a chance-of-playing field empty.
pub const DEFAULT_CHANCE_AVAIL: f64 = 100.0;

const TEAM_STRENGTH_DETAIL: [&str; 6] = [
    col::STRENGTH_ATTACK_HOME,
    col::STRENGTH_ATTACK_AWAY,
    col::STRENGTH_DEFENCE_HOME,
    col::STRENGTH_DEFENCE_AWAY,
    col::STRENGTH_OVERALL_HOME,
    col::STRENGTH_OVERALL_AWAY,
];

const FIXTURE_RAW_ONLY: [&str; 3] = ["stats", "finished_provisional", "provisional_start_time"];

pub fn prepare_teams(raw: &Table, catalog: &dyn SchemaCatalog) -> Table {
    let mut teams = remap(raw, data_set::TEAM, catalog);
    teams.drop_columns(&TEAM_STRENGTH_DETAIL);
    teams
}

pub fn prepare_fixtures(raw: &Table, catalog: &dyn SchemaCatalog) -> Table {
    let mut trimmed = raw.clone();
    trimmed.drop_columns(&FIXTURE_RAW_ONLY);
    let mut fixtures = remap(&trimmed, data_set::FIXTURE, catalog);
    reorder(&mut fixtures, data_set::FIXTURE, catalog);
    fixtures
}

pub fn prepare_players(raw: &Table, catalog: &dyn SchemaCatalog) -> Table {
    let mut players = remap(raw, data_set::PLAYER, catalog);

    let max_minutes = players
        .rows()
        .iter()
        .filter_map(|r| cell_f64(r, col::MINUTES_PLAYED))
        .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));

    players.assign(col::ICT_INDEX, |r| number_value(cell_f64(r, col::ICT_INDEX)));
    players.assign(col::FIELD_POSITION, |r| {
        cell_f64(r, col::FIELD_POSITION_ID)
            .and_then(|id| field_position_label(id as u32))
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null)
    });
    players.assign(col::CURRENT_COST, |r| {
        number_value(cell_f64(r, col::NOW_COST).map(|c| c / 10.0))
    });
    // 0/0 when nobody has played yet; that NaN serializes as null.
    players.assign(col::MINUTES_PERCENT, |r| {
        number_value(
            cell_f64(r, col::MINUTES_PLAYED)
                .zip(max_minutes)
                .map(|(m, max)| m / max * 100.0),
        )
    });
    players.assign(col::NEWS_AND_DATE, |r| {
        news_and_date(r)
            .map(Value::String)
            .unwrap_or(Value::Null)
    });
    players.assign(col::PERCENT_SELECTED, |r| {
        number_value(cell_f64(r, col::PERCENT_SELECTED))
    });
    for chance in [col::CHANCE_AVAIL_THIS_GW, col::CHANCE_AVAIL_NEXT_GW] {
        players.assign(chance, |r| {
            number_value(Some(cell_f64(r, chance).unwrap_or(DEFAULT_CHANCE_AVAIL)))
        });
    }

    reorder(&mut players, data_set::PLAYER, catalog);
    players
}

pub fn prepare_players_history(raw: &Table, catalog: &dyn SchemaCatalog) -> Table {
    let mut history = remap(raw, data_set::PLAYER_HIST, catalog);
    history.assign(col::GAME_COST, |r| {
        number_value(cell_f64(r, col::GAME_VALUE).map(|v| v / 10.0))
    });
    history.assign(col::GAME_ICT_INDEX, |r| {
        number_value(cell_f64(r, col::GAME_ICT_INDEX))
    });
    history
}

pub fn prepare_players_history_past(raw: &Table, catalog: &dyn SchemaCatalog) -> Table {
    remap(raw, data_set::PLAYERS_HISTORY_PAST, catalog)
}

pub fn field_position_label(id: u32) -> Option<&'static str> {
    match id {
        1 => Some("GK"),
        2 => Some("DEF"),
        3 => Some("MID"),
        4 => Some("FWD"),
        _ => None,
    }
}

/// "Hamstring injury (14 Sep 2024)"; none when there is no news text.
pub fn news_and_date(record: &Record) -> Option<String> {
    let news = cell_text(record, col::NEWS)?;
    let date_part = cell_text(record, col::NEWS_ADDED)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| format!(" ({})", dt.format("%d %b %Y")))
        .unwrap_or_default();
    Some(format!("{news}{date_part}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FplCatalog;
    use serde_json::json;

    fn table(name: &str, rows: Vec<Value>) -> Table {
        Table::new(
            name,
            rows.into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        )
    }

    #[test]
    fn players_get_derived_columns() {
        let raw = table(
            "players",
            vec![
                json!({"id": 1, "web_name": "Saka", "team": 1, "element_type": 3, "now_cost": 92,
                       "minutes": 900, "total_points": 80, "selected_by_percent": "41.2", "ict_index": "120.5",
                       "news": "", "news_added": null,
                       "chance_of_playing_this_round": null, "chance_of_playing_next_round": 75}),
                json!({"id": 2, "web_name": "Raya", "team": 1, "element_type": 1, "now_cost": 55,
                       "minutes": 450, "total_points": 40, "selected_by_percent": "10.0", "ict_index": "30.0",
                       "news": "Knock", "news_added": "2024-09-14T10:03:11.123456Z",
                       "chance_of_playing_this_round": 50, "chance_of_playing_next_round": null}),
            ],
        );
        let players = prepare_players(&raw, FplCatalog::global());
        let saka = &players.rows()[0];
        let raya = &players.rows()[1];

        assert_eq!(cell_f64(saka, col::CURRENT_COST), Some(9.2));
        assert_eq!(cell_f64(saka, col::MINUTES_PERCENT), Some(100.0));
        assert_eq!(cell_f64(raya, col::MINUTES_PERCENT), Some(50.0));
        assert_eq!(cell_text(saka, col::FIELD_POSITION).as_deref(), Some("MID"));
        assert_eq!(cell_f64(saka, col::PERCENT_SELECTED), Some(41.2));
        assert_eq!(cell_f64(saka, col::CHANCE_AVAIL_THIS_GW), Some(100.0));
        assert_eq!(cell_f64(saka, col::CHANCE_AVAIL_NEXT_GW), Some(75.0));
        assert_eq!(cell_f64(raya, col::CHANCE_AVAIL_NEXT_GW), Some(100.0));
        assert_eq!(cell_text(saka, col::NEWS_AND_DATE), None);
        assert_eq!(
            cell_text(raya, col::NEWS_AND_DATE).as_deref(),
            Some("Knock (14 Sep 2024)")
        );
    }

    #[test]
    fn teams_drop_venue_strengths() {
        let raw = table(
            "teams",
            vec![json!({"id": 1, "code": 3, "short_name": "ARS", "name": "Arsenal",
                        "strength": 4, "strength_attack_home": 1300})],
        );
        let teams = prepare_teams(&raw, FplCatalog::global());
        assert!(teams.has_column(col::TEAM_STRENGTH));
        assert!(!teams.has_column(col::STRENGTH_ATTACK_HOME));
    }

    #[test]
    fn history_cost_is_scaled() {
        let raw = table(
            "players_history",
            vec![json!({"element": 1, "fixture": 10, "value": 95, "ict_index": "7.1"})],
        );
        let history = prepare_players_history(&raw, FplCatalog::global());
        assert_eq!(cell_f64(&history.rows()[0], col::GAME_COST), Some(9.5));
        assert_eq!(cell_f64(&history.rows()[0], col::GAME_ICT_INDEX), Some(7.1));
    }
}

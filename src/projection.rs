use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::columns::{Column, Fill, Value, aggregate};
use crate::model::PlayerTeam;
use crate::player_fixtures::PlayerFixtureRow;

/// The canonical row for one player in one game week.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerUnitRow {
    pub player_id: u32,
    pub game_week: u32,
    /// Fixtures combined into this row; zero for a synthetic (blank) row.
    pub fixture_count: usize,
    cells: Vec<Value>,
}

impl PlayerUnitRow {
    fn synthetic(player_id: u32, game_week: u32) -> Self {
        Self {
            player_id,
            game_week,
            fixture_count: 0,
            cells: vec![Value::Missing; Column::ALL.len()],
        }
    }

    pub fn get(&self, column: Column) -> &Value {
        &self.cells[column.index()]
    }

    pub fn set(&mut self, column: Column, value: Value) {
        self.cells[column.index()] = value;
    }

    pub fn number(&self, column: Column) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        self.get(column).as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.fixture_count == 0
    }
}

impl Serialize for PlayerUnitRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Column::ALL.len() + 3))?;
        map.serialize_entry("Player ID", &self.player_id)?;
        map.serialize_entry("Game Week", &self.game_week)?;
        map.serialize_entry("Fixture Count", &self.fixture_count)?;
        for column in Column::ALL {
            map.serialize_entry(column.name(), self.get(column))?;
        }
        map.end()
    }
}

/// Combines the fixtures of one player's game week. `group` must be in
/// chronological order.
pub fn combine_fixtures(player_id: u32, game_week: u32, group: &[&PlayerFixtureRow]) -> PlayerUnitRow {
    let mut out = PlayerUnitRow::synthetic(player_id, game_week);
    out.fixture_count = group.len();
    let mut values = Vec::with_capacity(group.len());
    for column in Column::ALL {
        values.clear();
        values.extend(group.iter().map(|r| r.value(column)));
        out.set(column, aggregate(column.aggregation(), &values));
    }
    out
}

/// Per-player fill state: the last defined value of every forward-filled
/// column, updated while walking game weeks in order.
#[derive(Debug, Default)]
struct FillState {
    last: BTreeMap<Column, Value>,
}

impl FillState {
    fn fill(&mut self, row: &mut PlayerUnitRow) {
        for column in Column::ALL {
            match column.fill() {
                Fill::ForwardFill => {
                    if row.get(column).is_missing() {
                        if let Some(prev) = self.last.get(&column) {
                            row.set(column, prev.clone());
                        }
                    } else {
                        self.last.insert(column, row.get(column).clone());
                    }
                }
                Fill::Zero => {
                    if row.get(column).is_missing() {
                        row.set(column, Value::Number(0.0));
                    }
                }
                Fill::Leave => {}
            }
        }
    }
}

/// Builds exactly one row per (player, game week) for game weeks
/// `1..=total_gws`, for every player in `roster` and every player that
/// appears in `rows`. Output is ordered by player, then game week.
///
/// Fixtures outside `1..=total_gws` are dropped.
pub fn project_to_gw(rows: &[PlayerFixtureRow], roster: &[u32], total_gws: u32) -> Vec<PlayerUnitRow> {
    let players: BTreeSet<u32> = roster
        .iter()
        .copied()
        .chain(rows.iter().map(|r| r.player_id))
        .collect();

    let mut groups: BTreeMap<(u32, u32), Vec<&PlayerFixtureRow>> = BTreeMap::new();
    for row in rows {
        groups.entry((row.player_id, row.game_week)).or_default().push(row);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|r| r.order_key());
    }

    let mut out = Vec::with_capacity(players.len() * total_gws as usize);
    for player_id in players {
        let mut state = FillState::default();
        for gw in 1..=total_gws {
            let mut row = match groups.get(&(player_id, gw)) {
                Some(group) => combine_fixtures(player_id, gw, group),
                None => PlayerUnitRow::synthetic(player_id, gw),
            };
            state.fill(&mut row);
            out.push(row);
        }
    }
    out
}

/// Players with no fixture at all have nothing to carry forward; their
/// descriptive cells come from the player record instead.
pub fn describe_idle_players(rows: &mut [PlayerUnitRow], players: &[PlayerTeam]) {
    let active: HashSet<u32> = rows
        .iter()
        .filter(|r| !r.is_blank())
        .map(|r| r.player_id)
        .collect();
    let by_id: HashMap<u32, &PlayerTeam> = players.iter().map(|p| (p.player.id, p)).collect();
    for row in rows.iter_mut().filter(|r| !active.contains(&r.player_id)) {
        let Some(player) = by_id.get(&row.player_id) else {
            continue;
        };
        for column in Column::ALL {
            if column.fill() != Fill::ForwardFill || !row.get(column).is_missing() {
                continue;
            }
            if let Some(value) = describe(player, column) {
                row.set(column, value);
            }
        }
    }
}

fn describe(player: &PlayerTeam, column: Column) -> Option<Value> {
    let p = &player.player;
    let value = match column {
        Column::Name => Value::Text(p.name.clone()),
        Column::NameAndShortTeam => Value::Text(player.name_and_short_team.clone()),
        Column::PlayerTeamId => Value::Number(f64::from(p.team_id)),
        Column::TeamShortName => Value::Text(player.team_short_name.clone()),
        Column::FieldPositionId => Value::number(p.position_id.map(f64::from)),
        Column::FieldPosition => Value::text(p.position.as_deref()),
        Column::NewsAndDate => Value::text(p.news_and_date.as_deref()),
        Column::CurrentCost => Value::number(p.current_cost),
        Column::MinutesPlayed => Value::number(p.minutes_played),
        Column::MinutesPercent => Value::number(p.minutes_percent),
        Column::TotalPoints => Value::number(p.total_points),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_row(player_id: u32, fixture_id: u32, gw: u32, day: u32, points: f64) -> PlayerFixtureRow {
        PlayerFixtureRow {
            player_id,
            fixture_id,
            game_week: gw,
            kickoff: format!("2024-09-{day:02}T15:00:00Z").parse().ok(),
            name: "Saka".to_string(),
            team_short_name: "ARS".to_string(),
            current_cost: Some(10.0),
            game_total_points: Some(points),
            game_minutes_played: Some(90.0),
            expected_points: Some(points / 2.0),
            chance_avail_next_gw: Some(100.0),
            avg_points_to_gw: Some(points),
            fixture_short_name_difficulty: Some(format!("F{fixture_id}")),
            ..Default::default()
        }
    }

    #[test]
    fn double_week_sums_points_and_joins_labels() {
        let rows = vec![
            fixture_row(1, 21, 2, 14, 5.0),
            fixture_row(1, 20, 2, 11, 3.0),
        ];
        let projected = project_to_gw(&rows, &[], 2);
        let gw2 = &projected[1];
        assert_eq!(gw2.fixture_count, 2);
        assert_eq!(gw2.number(Column::GameTotalPoints), Some(8.0));
        assert_eq!(gw2.number(Column::GameMinutesPlayed), Some(180.0));
        assert_eq!(gw2.number(Column::ExpectedPoints), Some(4.0));
        assert_eq!(gw2.number(Column::AvgPointsToGw), Some(4.0));
        assert_eq!(gw2.number(Column::CurrentCost), Some(10.0));
        assert_eq!(gw2.text(Column::FixtureShortNameDifficulty), Some("F20, F21"));
        assert_eq!(gw2.number(Column::FixtureId), Some(21.0));
    }

    #[test]
    fn blank_week_fills_descriptive_and_zeroes_expected() {
        let rows = vec![fixture_row(1, 10, 1, 1, 6.0), fixture_row(1, 30, 3, 20, 2.0)];
        let projected = project_to_gw(&rows, &[], 3);
        let blank = &projected[1];
        assert!(blank.is_blank());
        assert_eq!(blank.text(Column::Name), Some("Saka"));
        assert_eq!(blank.text(Column::TeamShortName), Some("ARS"));
        assert_eq!(blank.number(Column::CurrentCost), Some(10.0));
        assert_eq!(blank.number(Column::ExpectedPoints), Some(0.0));
        assert_eq!(blank.number(Column::ChanceAvailNextGw), Some(0.0));
        assert_eq!(blank.number(Column::ChanceAvailThisGw), Some(0.0));
        assert!(blank.get(Column::GameTotalPoints).is_missing());
        assert!(blank.get(Column::AvgPointsToGw).is_missing());
        assert!(blank.get(Column::FixtureShortNameDifficulty).is_missing());
    }

    #[test]
    fn leading_blank_has_nothing_to_carry() {
        let rows = vec![fixture_row(1, 20, 2, 10, 6.0)];
        let projected = project_to_gw(&rows, &[], 2);
        assert!(projected[0].get(Column::Name).is_missing());
        assert_eq!(projected[0].number(Column::ExpectedPoints), Some(0.0));
    }

    #[test]
    fn roster_players_without_fixtures_still_get_rows() {
        let rows = vec![fixture_row(1, 10, 1, 1, 6.0)];
        let projected = project_to_gw(&rows, &[1, 2], 3);
        assert_eq!(projected.len(), 6);
        assert!(projected.iter().filter(|r| r.player_id == 2).all(|r| r.is_blank()));
    }

    #[test]
    fn serializes_with_column_names() {
        let rows = vec![fixture_row(1, 10, 1, 1, 6.0)];
        let projected = project_to_gw(&rows, &[], 1);
        let json = serde_json::to_value(&projected[0]).unwrap();
        assert_eq!(json["Player ID"], 1);
        assert_eq!(json["Game Week"], 1);
        assert_eq!(json["Game Total Points"], 6.0);
        assert_eq!(json["Fixture Short Name Difficulty"], "F10");
        assert!(json["GWs Played To GW"].is_null());
    }
}

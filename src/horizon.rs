use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::columns::Column;
use crate::error::{DataError, Result};
use crate::projection::PlayerUnitRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    NextGw,
    GwsToEnd,
    NextGws(u32),
}

impl Horizon {
    /// Number of game weeks covered when the current week is `next_gw` of
    /// `total_gws`. Never runs past the end of the season.
    pub fn window_len(self, next_gw: u32, total_gws: u32) -> u32 {
        let remaining = (total_gws + 1).saturating_sub(next_gw);
        match self {
            Horizon::NextGw => remaining.min(1),
            Horizon::GwsToEnd => remaining,
            Horizon::NextGws(k) => remaining.min(k),
        }
    }

    pub fn has_fixtures_column(self) -> bool {
        !matches!(self, Horizon::GwsToEnd)
    }

    pub fn expected_points_column(self) -> String {
        format!("Expected Points {self}")
    }

    pub fn fixtures_column(self) -> String {
        format!("Fixtures {self}")
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::NextGw => f.write_str("Next GW"),
            Horizon::GwsToEnd => f.write_str("GWs To End"),
            Horizon::NextGws(k) => write!(f, "Next {k} GWs"),
        }
    }
}

impl FromStr for Horizon {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        let lower = label.to_ascii_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        match words.as_slice() {
            ["next", "gw"] => Ok(Horizon::NextGw),
            ["gws", "to", "end"] => Ok(Horizon::GwsToEnd),
            ["next", k, "gws"] => match k.parse::<u32>() {
                Ok(k) if k > 0 => Ok(Horizon::NextGws(k)),
                _ => Err(DataError::UnknownHorizon(label.to_string())),
            },
            _ => Err(DataError::UnknownHorizon(label.to_string())),
        }
    }
}

pub fn parse_horizons<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Horizon>> {
    labels.iter().map(|l| l.as_ref().parse()).collect()
}

/// Window length for each horizon, in the order given.
pub fn next_gw_counts(horizons: &[Horizon], next_gw: u32, total_gws: u32) -> Vec<(Horizon, u32)> {
    horizons
        .iter()
        .map(|h| (*h, h.window_len(next_gw, total_gws)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizonValue {
    pub horizon: Horizon,
    pub window: u32,
    pub expected_points: f64,
    pub fixtures: Option<String>,
}

/// A player's current-week row plus one summary per horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonRow {
    pub current: PlayerUnitRow,
    pub horizons: Vec<HorizonValue>,
}

impl HorizonRow {
    pub fn get(&self, horizon: Horizon) -> Option<&HorizonValue> {
        self.horizons.iter().find(|h| h.horizon == horizon)
    }
}

impl Serialize for HorizonRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Player ID", &self.current.player_id)?;
        map.serialize_entry("Game Week", &self.current.game_week)?;
        map.serialize_entry("Fixture Count", &self.current.fixture_count)?;
        for column in Column::ALL {
            map.serialize_entry(column.name(), self.current.get(column))?;
        }
        for h in &self.horizons {
            let ep = h.expected_points.is_finite().then_some(h.expected_points);
            map.serialize_entry(&h.horizon.expected_points_column(), &ep)?;
            if h.horizon.has_fixtures_column() {
                map.serialize_entry(&h.horizon.fixtures_column(), &h.fixtures)?;
            }
        }
        map.end()
    }
}

/// Sums availability-weighted expected points over each horizon's window
/// starting at `next_gw`. `canonical` must hold one row per player per game
/// week, as produced by `project_to_gw`.
///
/// Undefined terms are skipped; a window with no defined term sums to 0.
pub fn calc_eps_for_next_gws(
    canonical: &[PlayerUnitRow],
    horizons: &[Horizon],
    next_gw: u32,
    total_gws: u32,
) -> Result<Vec<HorizonRow>> {
    let mut by_player: HashMap<u32, Vec<&PlayerUnitRow>> = HashMap::new();
    for row in canonical {
        by_player.entry(row.player_id).or_default().push(row);
    }
    let mut player_ids: Vec<u32> = by_player.keys().copied().collect();
    player_ids.sort_unstable();

    let counts = next_gw_counts(horizons, next_gw, total_gws);
    let mut out = Vec::with_capacity(player_ids.len());
    for player_id in player_ids {
        let rows = &by_player[&player_id];
        let weeks: HashMap<u32, &PlayerUnitRow> = rows.iter().map(|r| (r.game_week, *r)).collect();
        let Some(current) = weeks.get(&next_gw) else {
            return Err(DataError::MissingCurrentUnit {
                player_id,
                game_week: next_gw,
            });
        };

        let summaries = counts
            .iter()
            .map(|&(horizon, window)| {
                let in_window: Vec<&PlayerUnitRow> = (next_gw..next_gw + window)
                    .filter_map(|gw| weeks.get(&gw).copied())
                    .collect();
                let expected_points = in_window
                    .iter()
                    .filter_map(|r| weighted_expected_points(r))
                    .sum();
                let fixtures = horizon
                    .has_fixtures_column()
                    .then(|| join_labels(&in_window))
                    .flatten();
                HorizonValue {
                    horizon,
                    window,
                    expected_points,
                    fixtures,
                }
            })
            .collect();

        out.push(HorizonRow {
            current: (*current).clone(),
            horizons: summaries,
        });
    }
    Ok(out)
}

fn weighted_expected_points(row: &PlayerUnitRow) -> Option<f64> {
    let ep = row.number(Column::ExpectedPoints)?;
    let chance = row.number(Column::ChanceAvailNextGw)?;
    let weighted = ep * chance / 100.0;
    (!weighted.is_nan()).then_some(weighted)
}

fn join_labels(rows: &[&PlayerUnitRow]) -> Option<String> {
    let labels: Vec<&str> = rows
        .iter()
        .filter_map(|r| r.text(Column::FixtureShortNameDifficulty))
        .collect();
    (!labels.is_empty()).then(|| labels.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Next GW".parse::<Horizon>().unwrap(), Horizon::NextGw);
        assert_eq!("gws to end".parse::<Horizon>().unwrap(), Horizon::GwsToEnd);
        assert_eq!("Next 5 GWs".parse::<Horizon>().unwrap(), Horizon::NextGws(5));
        assert_eq!(Horizon::NextGws(3).to_string(), "Next 3 GWs");
    }

    #[test]
    fn unknown_labels_fail() {
        for bad in ["Next week", "Next 0 GWs", "Next x GWs", ""] {
            assert!(matches!(bad.parse::<Horizon>(), Err(DataError::UnknownHorizon(_))), "{bad}");
        }
    }

    #[test]
    fn windows_clip_to_season_end() {
        assert_eq!(Horizon::NextGws(3).window_len(10, 38), 3);
        assert_eq!(Horizon::NextGws(5).window_len(37, 38), 2);
        assert_eq!(Horizon::NextGw.window_len(38, 38), 1);
        assert_eq!(Horizon::GwsToEnd.window_len(30, 38), 9);
        assert_eq!(Horizon::NextGw.window_len(39, 38), 0);
    }

    #[test]
    fn counts_keep_horizon_order() {
        let counts = next_gw_counts(&[Horizon::GwsToEnd, Horizon::NextGw], 36, 38);
        assert_eq!(counts, vec![(Horizon::GwsToEnd, 3), (Horizon::NextGw, 1)]);
    }
}

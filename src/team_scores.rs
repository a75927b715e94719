use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{DataError, Result};
use crate::model::{Fixture, Team, index_teams};
use crate::table::Table;

/// One fixture seen from one participating team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureTeamRow {
    #[serde(rename = "Fixture ID")]
    pub fixture_id: u32,
    #[serde(rename = "Game Week")]
    pub game_week: Option<u32>,
    #[serde(rename = "Home Team Score")]
    pub home_score: Option<u32>,
    #[serde(rename = "Away Team Score")]
    pub away_score: Option<u32>,
    #[serde(rename = "Team ID")]
    pub team_id: u32,
    #[serde(rename = "Team Goals Scored")]
    pub goals_scored: Option<u32>,
    #[serde(rename = "Team Goals Conceded")]
    pub goals_conceded: Option<u32>,
    #[serde(rename = "Is Home?")]
    pub is_home: bool,
    #[serde(rename = "Team Code")]
    pub team_code: u32,
    #[serde(rename = "Team Short Name")]
    pub team_short_name: String,
    #[serde(rename = "Team Name")]
    pub team_name: String,
}

/// Unfolds each fixture into a home row and an away row, scored/conceded
/// from that team's point of view. Rows come back ordered by game week
/// (unscheduled last), then fixture, home before away.
///
/// Both tables are checked before either is decoded. A table without rows
/// lists no columns and is not checked.
pub fn team_fixture_scores(fixtures: &Table, teams: &Table) -> Result<Vec<FixtureTeamRow>> {
    if !fixtures.is_empty() {
        fixtures.require(&crate::model::FIXTURE_COLUMNS)?;
    }
    if !teams.is_empty() {
        teams.require(&crate::model::TEAM_COLUMNS)?;
    }
    let fixtures = Fixture::from_table(fixtures)?;
    let teams = Team::from_table(teams)?;
    expand_fixtures(&fixtures, &teams)
}

pub fn expand_fixtures(fixtures: &[Fixture], teams: &[Team]) -> Result<Vec<FixtureTeamRow>> {
    let by_id = index_teams(teams);
    let mut rows = Vec::with_capacity(fixtures.len() * 2);
    for f in fixtures {
        for is_home in [true, false] {
            let team_id = if is_home { f.home_team_id } else { f.away_team_id };
            let team = by_id.get(&team_id).ok_or_else(|| DataError::UnknownTeam {
                table: "fixtures".to_string(),
                team_id,
            })?;
            let (scored, conceded) = if is_home {
                (f.home_score, f.away_score)
            } else {
                (f.away_score, f.home_score)
            };
            rows.push(FixtureTeamRow {
                fixture_id: f.id,
                game_week: f.game_week,
                home_score: f.home_score,
                away_score: f.away_score,
                team_id,
                goals_scored: scored,
                goals_conceded: conceded,
                is_home,
                team_code: team.code,
                team_short_name: team.short_name.clone(),
                team_name: team.name.clone(),
            });
        }
    }
    rows.sort_by_key(|r| (r.game_week.is_none(), r.game_week, r.fixture_id, !r.is_home));
    Ok(rows)
}

/// Season totals per team, split by venue. A team that has not played on
/// one side yet gets NaN for that side, and the NaN flows into the totals
/// and ratios rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScoreStats {
    #[serde(rename = "Team ID")]
    pub team_id: u32,
    #[serde(rename = "Team Short Name")]
    pub team_short_name: String,
    #[serde(rename = "Total Team Goals Scored Home")]
    pub scored_home: f64,
    #[serde(rename = "Total Team Goals Scored Away")]
    pub scored_away: f64,
    #[serde(rename = "Total Team Goals Conceded Home")]
    pub conceded_home: f64,
    #[serde(rename = "Total Team Goals Conceded Away")]
    pub conceded_away: f64,
    #[serde(rename = "Total Team Goals Scored Ratio")]
    pub scored_ratio: f64,
    #[serde(rename = "Total Team Goals Conceded Ratio")]
    pub conceded_ratio: f64,
    #[serde(rename = "Total Team Goals Scored")]
    pub total_scored: f64,
    #[serde(rename = "Total Team Goals Conceded")]
    pub total_conceded: f64,
}

#[derive(Debug, Default)]
struct VenueTotals {
    rows: usize,
    scored: f64,
    conceded: f64,
}

impl VenueTotals {
    fn scored(&self) -> f64 {
        if self.rows == 0 { f64::NAN } else { self.scored }
    }

    fn conceded(&self) -> f64 {
        if self.rows == 0 { f64::NAN } else { self.conceded }
    }
}

pub fn team_score_stats(rows: &[FixtureTeamRow]) -> BTreeMap<u32, TeamScoreStats> {
    let mut venues: BTreeMap<u32, (String, VenueTotals, VenueTotals)> = BTreeMap::new();
    for r in rows {
        let entry = venues.entry(r.team_id).or_insert_with(|| {
            (
                r.team_short_name.clone(),
                VenueTotals::default(),
                VenueTotals::default(),
            )
        });
        let side = if r.is_home { &mut entry.1 } else { &mut entry.2 };
        side.rows += 1;
        // Unplayed fixtures count towards the venue but add nothing.
        side.scored += r.goals_scored.map(f64::from).unwrap_or(0.0);
        side.conceded += r.goals_conceded.map(f64::from).unwrap_or(0.0);
    }

    venues
        .into_iter()
        .map(|(team_id, (short_name, home, away))| {
            let scored_home = home.scored();
            let scored_away = away.scored();
            let conceded_home = home.conceded();
            let conceded_away = away.conceded();
            let stats = TeamScoreStats {
                team_id,
                team_short_name: short_name,
                scored_home,
                scored_away,
                conceded_home,
                conceded_away,
                scored_ratio: scored_away / scored_home,
                conceded_ratio: conceded_away / conceded_home,
                total_scored: scored_home + scored_away,
                total_conceded: conceded_home + conceded_away,
            };
            (team_id, stats)
        })
        .collect()
}

/// League-table points to date: 3 for a win, 1 for a draw.
pub fn team_league_points(fixtures: &[Fixture]) -> HashMap<u32, f64> {
    let mut points: HashMap<u32, f64> = HashMap::new();
    for f in fixtures {
        points.entry(f.home_team_id).or_insert(0.0);
        points.entry(f.away_team_id).or_insert(0.0);
        if !f.finished {
            continue;
        }
        let (Some(home), Some(away)) = (f.home_score, f.away_score) else {
            continue;
        };
        let (home_pts, away_pts) = match home.cmp(&away) {
            std::cmp::Ordering::Greater => (3.0, 0.0),
            std::cmp::Ordering::Less => (0.0, 3.0),
            std::cmp::Ordering::Equal => (1.0, 1.0),
        };
        *points.entry(f.home_team_id).or_insert(0.0) += home_pts;
        *points.entry(f.away_team_id).or_insert(0.0) += away_pts;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn team(id: u32, short: &str) -> Team {
        Team {
            id,
            code: id + 100,
            short_name: short.to_string(),
            name: format!("{short} FC"),
            strength: Some(3.0),
        }
    }

    fn fixture(id: u32, gw: u32, home: u32, away: u32, score: Option<(u32, u32)>) -> Fixture {
        Fixture {
            id,
            game_week: Some(gw),
            kickoff: None,
            home_team_id: home,
            away_team_id: away,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            home_difficulty: None,
            away_difficulty: None,
            finished: score.is_some(),
        }
    }

    #[test]
    fn expansion_doubles_rows_and_preserves_goals() {
        let teams = vec![team(1, "ARS"), team(2, "CHE"), team(3, "LIV")];
        let fixtures = vec![
            fixture(10, 1, 1, 2, Some((3, 1))),
            fixture(11, 2, 2, 3, Some((0, 0))),
            fixture(12, 3, 3, 1, None),
        ];
        let rows = expand_fixtures(&fixtures, &teams).unwrap();
        assert_eq!(rows.len(), 2 * fixtures.len());

        for f in &fixtures {
            let pair: Vec<_> = rows.iter().filter(|r| r.fixture_id == f.id).collect();
            assert_eq!(pair.len(), 2);
            if let (Some(h), Some(a)) = (f.home_score, f.away_score) {
                let scored: u32 = pair.iter().filter_map(|r| r.goals_scored).sum();
                assert_eq!(scored, h + a);
            }
        }

        let ars_home = rows
            .iter()
            .find(|r| r.fixture_id == 10 && r.team_id == 1)
            .unwrap();
        assert!(ars_home.is_home);
        assert_eq!(ars_home.goals_scored, Some(3));
        assert_eq!(ars_home.goals_conceded, Some(1));
        assert_eq!(ars_home.team_short_name, "ARS");
    }

    fn record(v: serde_json::Value) -> crate::table::Record {
        v.as_object().cloned().unwrap()
    }

    fn complete_fixtures() -> Table {
        Table::new(
            "fixtures",
            vec![record(json!({
                "Fixture ID": 1,
                "Game Week": 1,
                "Home Team Score": 2,
                "Away Team Score": 0,
                "Home Team ID": 1,
                "Away Team ID": 2,
            }))],
        )
    }

    #[test]
    fn expansion_reports_missing_fixture_columns() {
        let fixtures = Table::new(
            "fixtures",
            vec![record(json!({"Fixture ID": 1, "Game Week": 1}))],
        );
        let teams = Table::new("teams", vec![]);
        let err = team_fixture_scores(&fixtures, &teams).unwrap_err();
        match err {
            DataError::MissingColumns { table, columns } => {
                assert_eq!(table, "fixtures");
                assert!(columns.contains(&"Home Team Score".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn expansion_reports_missing_team_columns() {
        let teams = Table::new(
            "teams",
            vec![
                record(json!({"Team ID": 1, "Team Short Name": "ARS", "Team Name": "Arsenal"})),
                record(json!({"Team ID": 2, "Team Short Name": "CHE", "Team Name": "Chelsea"})),
            ],
        );
        let err = team_fixture_scores(&complete_fixtures(), &teams).unwrap_err();
        match err {
            DataError::MissingColumns { table, columns } => {
                assert_eq!(table, "teams");
                assert_eq!(columns, vec!["Team Code".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_fixture_table_expands_to_nothing() {
        let teams = Table::new(
            "teams",
            vec![record(json!({
                "Team ID": 1,
                "Team Code": 3,
                "Team Short Name": "ARS",
                "Team Name": "Arsenal",
            }))],
        );
        let rows = team_fixture_scores(&Table::new("fixtures", vec![]), &teams).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn score_stats_split_by_venue() {
        let teams = vec![team(1, "ARS"), team(2, "CHE")];
        let fixtures = vec![
            fixture(10, 1, 1, 2, Some((3, 1))),
            fixture(11, 2, 2, 1, Some((2, 2))),
        ];
        let stats = team_score_stats(&expand_fixtures(&fixtures, &teams).unwrap());
        let ars = &stats[&1];
        assert_eq!(ars.scored_home, 3.0);
        assert_eq!(ars.scored_away, 2.0);
        assert_eq!(ars.conceded_home, 1.0);
        assert_eq!(ars.conceded_away, 2.0);
        assert_eq!(ars.total_scored, 5.0);
        assert_eq!(ars.total_conceded, 3.0);
        assert!((ars.scored_ratio - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(ars.conceded_ratio, 2.0);
    }

    #[test]
    fn ratios_without_home_goals_are_not_finite() {
        let teams = vec![team(1, "ARS"), team(2, "CHE")];
        let fixtures = vec![fixture(10, 1, 1, 2, Some((0, 2)))];
        let stats = team_score_stats(&expand_fixtures(&fixtures, &teams).unwrap());
        // ARS: home 0 scored, no away games at all.
        assert!(stats[&1].scored_ratio.is_nan());
        assert!(stats[&1].total_scored.is_nan());
        // CHE: away 2, no home games.
        assert!(stats[&2].scored_ratio.is_nan());
    }

    #[test]
    fn league_points_count_finished_results() {
        let fixtures = vec![
            fixture(10, 1, 1, 2, Some((3, 1))),
            fixture(11, 2, 2, 1, Some((2, 2))),
            fixture(12, 3, 1, 2, None),
        ];
        let pts = team_league_points(&fixtures);
        assert_eq!(pts[&1], 4.0);
        assert_eq!(pts[&2], 1.0);
    }
}

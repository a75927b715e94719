use std::collections::HashMap;

use chrono::{Duration, NaiveDate, SecondsFormat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::snapshot::Snapshot;
use crate::table::{Record, Table};

const TEAM_NAMES: [(&str, &str); 20] = [
    ("ARS", "Arsenal"),
    ("AVL", "Aston Villa"),
    ("BOU", "Bournemouth"),
    ("BRE", "Brentford"),
    ("BHA", "Brighton"),
    ("CHE", "Chelsea"),
    ("CRY", "Crystal Palace"),
    ("EVE", "Everton"),
    ("FUL", "Fulham"),
    ("IPS", "Ipswich"),
    ("LEI", "Leicester"),
    ("LIV", "Liverpool"),
    ("MCI", "Man City"),
    ("MUN", "Man Utd"),
    ("NEW", "Newcastle"),
    ("NFO", "Nott'm Forest"),
    ("SOU", "Southampton"),
    ("TOT", "Spurs"),
    ("WHU", "West Ham"),
    ("WOL", "Wolves"),
];

/// Game week that loses one fixture, and the week it is moved to.
pub const BLANK_GW: u32 = 3;
pub const DOUBLE_GW: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeSeasonConfig {
    /// Even, at most 20.
    pub teams: usize,
    pub players_per_team: usize,
    /// Game weeks already played.
    pub played_gws: u32,
}

impl Default for FakeSeasonConfig {
    fn default() -> Self {
        Self {
            teams: 8,
            players_per_team: 4,
            played_gws: 6,
        }
    }
}

struct FakeFixture {
    id: u32,
    gw: u32,
    home: u32,
    away: u32,
    kickoff: String,
    score: Option<(u32, u32)>,
}

/// A double round robin with one fixture of [`BLANK_GW`] rescheduled into
/// [`DOUBLE_GW`], so two teams blank once and double once.
pub fn fake_season(seed: u64, config: FakeSeasonConfig) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (config.teams.clamp(2, TEAM_NAMES.len()) / 2 * 2) as u32;

    let teams: Vec<Record> = (1..=n)
        .map(|id| {
            let (short, name) = TEAM_NAMES[(id - 1) as usize];
            record(json!({
                "id": id,
                "code": id + 100,
                "short_name": short,
                "name": name,
                "strength": rng.gen_range(2..=5),
                "strength_attack_home": rng.gen_range(1000..1400),
                "strength_attack_away": rng.gen_range(1000..1400),
                "strength_defence_home": rng.gen_range(1000..1400),
                "strength_defence_away": rng.gen_range(1000..1400),
                "strength_overall_home": rng.gen_range(1000..1400),
                "strength_overall_away": rng.gen_range(1000..1400),
            }))
        })
        .collect();

    let fixtures = schedule(n, config.played_gws, &mut rng);
    let fixture_records: Vec<Record> = fixtures
        .iter()
        .map(|f| {
            record(json!({
                "id": f.id,
                "event": f.gw,
                "kickoff_time": f.kickoff,
                "team_h": f.home,
                "team_a": f.away,
                "team_h_score": f.score.map(|s| s.0),
                "team_a_score": f.score.map(|s| s.1),
                "team_h_difficulty": rng.gen_range(2..=5),
                "team_a_difficulty": rng.gen_range(2..=5),
                "finished": f.score.is_some(),
                "started": f.score.is_some(),
                "finished_provisional": f.score.is_some(),
                "provisional_start_time": false,
                "stats": [],
            }))
        })
        .collect();

    let mut players = Vec::new();
    let mut history = Vec::new();
    let mut history_past = Vec::new();
    let mut totals: HashMap<u32, (u32, u32)> = HashMap::new();
    let mut next_id = 1u32;
    for team_id in 1..=n {
        for slot in 0..config.players_per_team {
            let player_id = next_id;
            next_id += 1;
            let now_cost = rng.gen_range(40..=130);
            let regular = rng.gen_bool(0.8);
            for f in fixtures.iter().filter(|f| f.score.is_some()) {
                let was_home = f.home == team_id;
                if !was_home && f.away != team_id {
                    continue;
                }
                let minutes = if regular && rng.gen_bool(0.9) {
                    rng.gen_range(60..=90)
                } else {
                    rng.gen_range(0..=30)
                };
                let points = if minutes == 0 { 0 } else { rng.gen_range(1..=12) };
                let entry = totals.entry(player_id).or_default();
                entry.0 += points;
                entry.1 += minutes;
                history.push(record(json!({
                    "element": player_id,
                    "fixture": f.id,
                    "round": f.gw,
                    "kickoff_time": f.kickoff,
                    "opponent_team": if was_home { f.away } else { f.home },
                    "was_home": was_home,
                    "total_points": points,
                    "minutes": minutes,
                    "value": now_cost,
                    "ict_index": format!("{:.1}", rng.gen_range(0.0..15.0)),
                })));
            }
            history_past.push(record(json!({
                "element": player_id,
                "season_name": "2023/24",
                "total_points": rng.gen_range(20..=220),
                "minutes": rng.gen_range(200..=3400),
                "start_cost": now_cost - 5,
                "end_cost": now_cost,
            })));

            let (points, minutes) = totals.get(&player_id).copied().unwrap_or_default();
            let injured = rng.gen_bool(0.1);
            players.push(record(json!({
                "id": player_id,
                "web_name": format!("{}{}", TEAM_NAMES[(team_id - 1) as usize].0, slot + 1),
                "first_name": "Player",
                "second_name": format!("{player_id}"),
                "team": team_id,
                "element_type": (slot % 4) + 1,
                "now_cost": now_cost,
                "minutes": minutes,
                "total_points": points,
                "selected_by_percent": format!("{:.1}", rng.gen_range(0.1..45.0)),
                "ict_index": format!("{:.1}", rng.gen_range(0.0..120.0)),
                "news": if injured { "Knock - 75% chance of playing" } else { "" },
                "news_added": if injured { Value::from("2024-09-14T10:30:00Z") } else { Value::Null },
                "chance_of_playing_this_round": if injured { Value::from(75) } else { Value::Null },
                "chance_of_playing_next_round": if injured { Value::from(75) } else { Value::Null },
            })));
        }
    }

    Snapshot {
        teams: Table::new("teams", teams),
        fixtures: Table::new("fixtures", fixture_records),
        players: Table::new("players", players),
        players_history: Table::new("players_history", history),
        players_history_past: Table::new("players_history_past", history_past),
    }
}

fn schedule(n: u32, played_gws: u32, rng: &mut StdRng) -> Vec<FakeFixture> {
    let rounds = n - 1;
    let season_start = NaiveDate::from_ymd_opt(2024, 8, 17)
        .and_then(|d| d.and_hms_opt(14, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or_default();

    let mut ring: Vec<u32> = (1..=n).collect();
    let mut pairings: Vec<(u32, u32, u32)> = Vec::new();
    for round in 0..rounds {
        for i in 0..(n / 2) as usize {
            let (a, b) = (ring[i], ring[n as usize - 1 - i]);
            let (home, away) = if (round + i as u32) % 2 == 0 { (a, b) } else { (b, a) };
            pairings.push((round + 1, home, away));
        }
        ring[1..].rotate_right(1);
    }
    let second_half: Vec<(u32, u32, u32)> = pairings
        .iter()
        .map(|&(gw, home, away)| (gw + rounds, away, home))
        .collect();
    pairings.extend(second_half);

    let total_gws = rounds * 2;
    if DOUBLE_GW <= total_gws
        && let Some(moved) = pairings.iter_mut().find(|p| p.0 == BLANK_GW)
    {
        moved.0 = DOUBLE_GW;
    }

    let mut slot_in_gw: HashMap<u32, i64> = HashMap::new();
    pairings
        .into_iter()
        .enumerate()
        .map(|(idx, (gw, home, away))| {
            let slot = slot_in_gw.entry(gw).or_insert(0);
            let kickoff = season_start
                + Duration::days(7 * i64::from(gw - 1))
                + Duration::hours(3 * *slot);
            *slot += 1;
            let score = (gw <= played_gws).then(|| (rng.gen_range(0..4), rng.gen_range(0..4)));
            FakeFixture {
                id: idx as u32 + 1,
                gw,
                home,
                away,
                kickoff: kickoff.to_rfc3339_opts(SecondsFormat::Secs, true),
                score,
            }
        })
        .collect()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

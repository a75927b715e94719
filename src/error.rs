use thiserror::Error;

/// Structural failures of a projection run. Numeric edge cases (division by
/// zero, missing history) are never reported here; they travel as undefined
/// values instead.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("table `{table}` is missing required column(s): {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("table `{table}` references unknown team id {team_id}")]
    UnknownTeam { table: String, team_id: u32 },

    #[error("table `{table}` column `{column}`: {detail}")]
    InvalidValue {
        table: String,
        column: String,
        detail: String,
    },

    #[error("unknown horizon label `{0}`")]
    UnknownHorizon(String),

    #[error("player {player_id} has no canonical row for game week {game_week}")]
    MissingCurrentUnit { player_id: u32, game_week: u32 },

    #[error("reading snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

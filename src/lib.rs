pub mod columns;
pub mod config;
pub mod error;
pub mod expected_points;
pub mod fake_season;
pub mod horizon;
pub mod model;
pub mod pipeline;
pub mod player_fixtures;
pub mod player_stats;
pub mod prepare;
pub mod projection;
pub mod schema;
pub mod snapshot;
pub mod table;
pub mod team_scores;

pub use error::{DataError, Result};

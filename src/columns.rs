use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    FixtureId,
    KickOffTime,
    Name,
    NameAndShortTeam,
    PlayerTeamId,
    TeamShortName,
    OppTeamShortName,
    IsHome,
    FieldPositionId,
    FieldPosition,
    NewsAndDate,
    CurrentCost,
    MinutesPlayed,
    MinutesPercent,
    TotalPoints,
    PercentSelected,
    IctIndex,
    ChanceAvailThisGw,
    ChanceAvailNextGw,
    GameTotalPoints,
    GameMinutesPlayed,
    GameCost,
    GameIctIndex,
    GwPlayed,
    GwsPlayedToGw,
    TotalPointsToGw,
    AvgPointsToGw,
    AvgMinutesPlayedRecentlyToGw,
    AvgPointsOppPointsAdjToGw,
    TeamTotalPoints,
    OppTeamTotalPoints,
    TotalTeamGoalsScored,
    TotalOppTeamGoalsScored,
    TotalOppTeamGoalsScoredDiff,
    RelFixtureStrength,
    RelFixtureStrengthToGw,
    FixtureShortNameDifficulty,
    ExpectedPoints,
}

/// How a column's values are combined across the fixtures of one game week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Per-occurrence quantities; a double game week counts twice.
    Sum,
    Mean,
    /// Chronological, joined with ", ".
    Concatenate,
    /// Chronologically last defined value.
    Last,
}

/// How a column is filled for game weeks where it is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    ForwardFill,
    Zero,
    Leave,
}

impl Column {
    pub const ALL: [Column; 38] = [
        Column::FixtureId,
        Column::KickOffTime,
        Column::Name,
        Column::NameAndShortTeam,
        Column::PlayerTeamId,
        Column::TeamShortName,
        Column::OppTeamShortName,
        Column::IsHome,
        Column::FieldPositionId,
        Column::FieldPosition,
        Column::NewsAndDate,
        Column::CurrentCost,
        Column::MinutesPlayed,
        Column::MinutesPercent,
        Column::TotalPoints,
        Column::PercentSelected,
        Column::IctIndex,
        Column::ChanceAvailThisGw,
        Column::ChanceAvailNextGw,
        Column::GameTotalPoints,
        Column::GameMinutesPlayed,
        Column::GameCost,
        Column::GameIctIndex,
        Column::GwPlayed,
        Column::GwsPlayedToGw,
        Column::TotalPointsToGw,
        Column::AvgPointsToGw,
        Column::AvgMinutesPlayedRecentlyToGw,
        Column::AvgPointsOppPointsAdjToGw,
        Column::TeamTotalPoints,
        Column::OppTeamTotalPoints,
        Column::TotalTeamGoalsScored,
        Column::TotalOppTeamGoalsScored,
        Column::TotalOppTeamGoalsScoredDiff,
        Column::RelFixtureStrength,
        Column::RelFixtureStrengthToGw,
        Column::FixtureShortNameDifficulty,
        Column::ExpectedPoints,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::FixtureId => "Fixture ID",
            Column::KickOffTime => "Kick Off Time",
            Column::Name => "Name",
            Column::NameAndShortTeam => "Name and Short Team",
            Column::PlayerTeamId => "Player Team ID",
            Column::TeamShortName => "Team Short Name",
            Column::OppTeamShortName => "Opp Team Short Name",
            Column::IsHome => "Is Home?",
            Column::FieldPositionId => "Field Position ID",
            Column::FieldPosition => "Field Position",
            Column::NewsAndDate => "News And Date",
            Column::CurrentCost => "Current Cost",
            Column::MinutesPlayed => "Minutes Played",
            Column::MinutesPercent => "Minutes Percent",
            Column::TotalPoints => "Total Points",
            Column::PercentSelected => "Percent Selected",
            Column::IctIndex => "ICT Index",
            Column::ChanceAvailThisGw => "Chance Avail This GW",
            Column::ChanceAvailNextGw => "Chance Avail Next GW",
            Column::GameTotalPoints => "Game Total Points",
            Column::GameMinutesPlayed => "Game Minutes Played",
            Column::GameCost => "Game Cost",
            Column::GameIctIndex => "Game ICT Index",
            Column::GwPlayed => "GW Played",
            Column::GwsPlayedToGw => "GWs Played To GW",
            Column::TotalPointsToGw => "Total Points To GW",
            Column::AvgPointsToGw => "Avg Points To GW",
            Column::AvgMinutesPlayedRecentlyToGw => "Avg Minutes Played Recently To GW",
            Column::AvgPointsOppPointsAdjToGw => "Avg Points Opp Points Adj To GW",
            Column::TeamTotalPoints => "Team Total Points",
            Column::OppTeamTotalPoints => "Opp Team Total Points",
            Column::TotalTeamGoalsScored => "Total Team Goals Scored",
            Column::TotalOppTeamGoalsScored => "Total Opp Team Goals Scored",
            Column::TotalOppTeamGoalsScoredDiff => "Total Opp Team Goals Scored Diff",
            Column::RelFixtureStrength => "Rel. Fixture Strength",
            Column::RelFixtureStrengthToGw => "Rel. Fixture Strength To GW",
            Column::FixtureShortNameDifficulty => "Fixture Short Name Difficulty",
            Column::ExpectedPoints => "Expected Points",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn aggregation(self) -> Aggregation {
        use Column::*;
        match self {
            GameTotalPoints | GameMinutesPlayed | ExpectedPoints => Aggregation::Sum,

            FixtureShortNameDifficulty => Aggregation::Concatenate,

            CurrentCost | MinutesPlayed | MinutesPercent | TotalPoints | PercentSelected
            | IctIndex | ChanceAvailThisGw | ChanceAvailNextGw | GameCost | GameIctIndex
            | GwsPlayedToGw | TotalPointsToGw | AvgPointsToGw | AvgMinutesPlayedRecentlyToGw
            | AvgPointsOppPointsAdjToGw | TeamTotalPoints | OppTeamTotalPoints
            | TotalTeamGoalsScored | TotalOppTeamGoalsScored | TotalOppTeamGoalsScoredDiff
            | RelFixtureStrength | RelFixtureStrengthToGw => Aggregation::Mean,

            FixtureId | KickOffTime | Name | NameAndShortTeam | PlayerTeamId | TeamShortName
            | OppTeamShortName | IsHome | FieldPositionId | FieldPosition | NewsAndDate
            | GwPlayed => Aggregation::Last,
        }
    }

    pub fn fill(self) -> Fill {
        use Column::*;
        match self {
            PlayerTeamId | Name | NameAndShortTeam | NewsAndDate | FieldPositionId
            | FieldPosition | TeamShortName | MinutesPlayed | MinutesPercent | CurrentCost
            | TotalPoints => Fill::ForwardFill,

            ExpectedPoints | ChanceAvailThisGw | ChanceAvailNextGw => Fill::Zero,

            _ => Fill::Leave,
        }
    }
}

/// A single cell. `Missing` is the undefined value; a `Number` may still be
/// NaN or infinite after a division by zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Missing,
    Number(f64),
    Text(String),
    Flag(bool),
}

impl Value {
    pub fn number(v: Option<f64>) -> Value {
        v.map(Value::Number).unwrap_or(Value::Missing)
    }

    pub fn text(v: Option<&str>) -> Value {
        v.map(|s| Value::Text(s.to_string())).unwrap_or(Value::Missing)
    }

    /// Missing cells and NaN numbers count as undefined.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Number(n) if !n.is_finite() => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Flag(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Combines the chronologically ordered values of one column.
pub fn aggregate(aggregation: Aggregation, values: &[Value]) -> Value {
    let defined = || values.iter().filter(|v| !v.is_missing());
    match aggregation {
        Aggregation::Sum => {
            let mut nums = defined().filter_map(Value::as_f64).peekable();
            if nums.peek().is_none() {
                return Value::Missing;
            }
            Value::Number(nums.sum())
        }
        Aggregation::Mean => {
            let nums: Vec<f64> = defined().filter_map(Value::as_f64).collect();
            if nums.is_empty() {
                return Value::Missing;
            }
            Value::Number(nums.iter().sum::<f64>() / nums.len() as f64)
        }
        Aggregation::Concatenate => {
            let parts: Vec<&str> = defined().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                return Value::Missing;
            }
            Value::Text(parts.join(", "))
        }
        Aggregation::Last => defined().last().cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_matches_all_order() {
        for (idx, col) in Column::ALL.iter().enumerate() {
            assert_eq!(col.index(), idx);
            assert_eq!(Column::from_name(col.name()), Some(*col));
        }
    }

    #[test]
    fn aggregate_skips_undefined() {
        let vals = [Value::Number(3.0), Value::Missing, Value::Number(f64::NAN), Value::Number(5.0)];
        assert_eq!(aggregate(Aggregation::Sum, &vals), Value::Number(8.0));
        assert_eq!(aggregate(Aggregation::Mean, &vals), Value::Number(4.0));
        assert_eq!(aggregate(Aggregation::Last, &vals), Value::Number(5.0));
        assert_eq!(aggregate(Aggregation::Sum, &[Value::Missing]), Value::Missing);
    }

    #[test]
    fn concatenate_keeps_order() {
        let vals = [
            Value::Text("ARS (H2)".into()),
            Value::Missing,
            Value::Text("CHE (A4)".into()),
        ];
        assert_eq!(
            aggregate(Aggregation::Concatenate, &vals),
            Value::Text("ARS (H2), CHE (A4)".into())
        );
    }

    #[test]
    fn infinity_is_defined_and_propagates() {
        let vals = [Value::Number(f64::INFINITY), Value::Number(1.0)];
        assert_eq!(aggregate(Aggregation::Sum, &vals), Value::Number(f64::INFINITY));
    }
}

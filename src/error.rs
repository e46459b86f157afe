use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Cat5Error {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Unknown team: {0}")]
    UnknownTeam(u32),

    #[error("Team {team_id} not present in matchup")]
    TeamNotInMatchup { team_id: u32 },

    #[error("Team {team_id} has no opponent this period")]
    MissingOpponent { team_id: u32 },

    #[error("No matchup period boundaries for year {year}, period {period}")]
    MissingPeriod { year: i32, period: u32 },

    #[error("Cannot draw {requested} starts, only {available} have positive weight")]
    InsufficientWeight { requested: usize, available: usize },

    #[error("Distribution error: {0}")]
    Distribution(String),
}

pub type Result<T, E = Cat5Error> = std::result::Result<T, E>;

use thiserror::Error;

/// Rule violations raised by the scoring and comparison engine.
///
/// I/O and SQL failures travel as `anyhow::Error`; these are the cases a caller
/// may want to match on and report back to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoutError {
    #[error("importance weight {0} is not one of 1, 3, 5")]
    InvalidWeight(u8),
    #[error("at most {max} qualities can be selected, got {got}")]
    TooManyQualities { max: usize, got: usize },
    #[error("unknown quality `{0}`")]
    UnknownQuality(String),
    #[error("unknown position `{0}`")]
    UnknownPosition(String),
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),
    #[error("No data found for player {0}")]
    PlayerNotFound(String),
    #[error("Attribute {attribute} not found for player {player}")]
    MissingAttribute { player: String, attribute: String },
    #[error("invalid table key `{0}`")]
    InvalidTableKey(String),
}

use thiserror::Error;

/// Rejected navigation requests from the UI channel.
///
/// External fragment changes never fail; they resolve to the nearest valid
/// state instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("year {0} is not supported")]
    UnsupportedYear(String),

    #[error("reservoir {0} is not in the loaded year")]
    UnknownReservoir(String),

    #[error("no reservoir is selected")]
    NoSelection,
}

pub type Result<T> = std::result::Result<T, NavError>;

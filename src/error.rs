use thiserror::Error;

/// Errors raised by the pairing core
#[derive(Debug, Error)]
pub enum PairingError {
    /// A preference row is malformed or not a permutation of the counterpart group
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    /// The two rank matrices do not reference the same identity universe
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Matcher has not been run yet")]
    NotRun,

    /// More members were left unmatched than the group sizes explain
    #[error("Incomplete matching: {unmatched} unmatched {side} members, expected at most {expected}")]
    Incomplete {
        side: &'static str,
        unmatched: usize,
        expected: usize,
    },

    #[error("Duplicate pairing in {round}: {member} was already paired with {partner}")]
    DuplicatePairing {
        round: String,
        member: String,
        partner: String,
    },
}

pub type Result<T> = std::result::Result<T, PairingError>;

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use validator::Validate;

use crate::error::PairingError;
use crate::models::{PairingRequest, PreferenceTable};

/// Errors that can occur when reading or writing preference tables
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Pairing(#[from] PairingError),
}

/// Read, validate and align a pairing request from a JSON file
pub fn load_request<P: AsRef<Path>>(path: P) -> Result<PairingRequest, TableError> {
    let path = path.as_ref();
    tracing::info!("Reading preferences from {}", path.display());

    let raw = fs::read_to_string(path)?;
    parse_request(&raw)
}

/// Parse, validate and align a pairing request
pub fn parse_request(raw: &str) -> Result<PairingRequest, TableError> {
    let mut request: PairingRequest = serde_json::from_str(raw)?;
    request.validate()?;

    drop_duplicates(&mut request.proposers, "proposer");
    if let Some(responders) = request.responders.as_mut() {
        drop_duplicates(responders, "responder");
        align_tables(&mut request.proposers, responders);
    }

    Ok(request)
}

fn drop_duplicates(table: &mut PreferenceTable, side: &str) {
    for name in table.remove_duplicate_members() {
        tracing::warn!("Dropped a repeated {} submission from {}", side, name);
    }
}

/// Give every member named by the other table a row in its own table
///
/// Members who never answered the survey are added with blank rows, which
/// ties all of their counterparts.
pub fn align_tables(proposers: &mut PreferenceTable, responders: &mut PreferenceTable) {
    let added_proposers = proposers.add_missing_members(&responders.counterparts);
    let added_responders = responders.add_missing_members(&proposers.counterparts);

    if added_proposers + added_responders > 0 {
        tracing::warn!(
            "Added {} proposers and {} responders without answers",
            added_proposers,
            added_responders
        );
    }
}

/// Write `value` as pretty JSON to `path`, or to stdout without a path
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), TableError> {
    let json = serde_json::to_string_pretty(value)?;

    match path {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!("Wrote results to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}

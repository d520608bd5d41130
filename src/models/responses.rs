use serde::Serialize;

use crate::models::domain::{Orientation, Partner};

/// One row of a match table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRow {
    pub member: String,
    pub partner: Partner,
    /// Rank the member gave the partner
    #[serde(rename = "memberRank")]
    pub member_rank: Option<u32>,
    /// Rank the partner gave the member
    #[serde(rename = "partnerRank")]
    pub partner_rank: Option<u32>,
}

/// Result of a single pairing run
#[derive(Debug, Clone, Serialize)]
pub struct PairingResponse {
    pub orientation: Orientation,
    pub matches: Vec<MatchRow>,
    pub unmatched: usize,
    pub proposals: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Per-member partners across all rounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub member: String,
    /// First partner in each round
    pub partners: Vec<Partner>,
    /// Further partners a responder took on in the second pass
    #[serde(rename = "alsoMet", skip_serializing_if = "Vec::is_empty")]
    pub also_met: Vec<ExtraMeeting>,
}

/// A responder's second partner within one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraMeeting {
    pub round: String,
    pub partner: String,
}

/// Round-mode table: one column per round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundTable {
    pub columns: Vec<String>,
    pub rows: Vec<ScheduleRow>,
}

/// A repeated meeting found in a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRow {
    pub round: String,
    pub member: String,
    pub partner: String,
}

/// Result of a multi-round scheduling run
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub table: RoundTable,
    /// Responder-keyed companion table, present when the group sizes differ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reciprocal: Option<RoundTable>,
    pub duplicates: Vec<DuplicateRow>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

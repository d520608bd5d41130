//! Stable Pairing - stable matching engine for mentoring programs and speed networking
//!
//! This library pairs members of two groups from their ranked preferences so
//! that no two members would both rather be with each other than with their
//! assigned partners. It provides preference-matrix conversion, an A-optimal
//! Gale–Shapley engine that tolerates unequal group sizes, a second pass for
//! leftover members, and a multi-round scheduler that avoids repeat meetings.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{choice_to_rank, rank_to_choice, Pipeline, RoundScheduler, StableMatcher, UnpairedResolver};
pub use error::{PairingError, Result};
pub use models::{ChoiceMatrix, Group, Matching, Orientation, Partner, RankMatrix, PairingRequest, PreferenceTable};

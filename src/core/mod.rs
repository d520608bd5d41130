// Core algorithm exports
pub mod completeness;
pub mod convert;
pub mod matcher;
pub mod pipeline;
pub mod resolver;
pub mod rounds;
pub mod synthesize;

pub use completeness::{check_matching, check_schedule, expected_unmatched, OnIncomplete};
pub use convert::{choice_to_rank, rank_to_choice};
pub use matcher::StableMatcher;
pub use pipeline::{Pipeline, PreparedMatrices};
pub use resolver::{UnpairedPolicy, UnpairedResolver};
pub use rounds::{Duplicate, Round, RoundLabel, RoundScheduler, Schedule};
pub use synthesize::responder_preferences;

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ChoiceMatrix, Group, Matching, Orientation, Partner, RankMatrix, Tier, UNMATCHED};
pub use requests::{PairingRequest, PreferenceTable};
pub use responses::{DuplicateRow, ExtraMeeting, MatchRow, PairingResponse, RoundTable, ScheduleResponse, ScheduleRow};

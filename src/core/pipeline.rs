use crate::config::{PairingSettings, RoundSettings};
use crate::core::completeness::check_matching;
use crate::core::convert::choice_to_rank;
use crate::core::resolver::UnpairedResolver;
use crate::core::rounds::RoundScheduler;
use crate::core::synthesize::responder_preferences;
use crate::error::Result;
use crate::models::{
    DuplicateRow, MatchRow, Matching, Orientation, PairingRequest, PairingResponse, Partner,
    RankMatrix, ScheduleResponse,
};

/// Rank matrices for both sides of a request
#[derive(Debug, Clone)]
pub struct PreparedMatrices {
    pub proposers: RankMatrix,
    pub responders: RankMatrix,
}

/// Main pairing orchestrator
///
/// # Pipeline Stages
/// 1. Preference tables to tiered choice matrices
/// 2. Seeded tie-breaking into rank matrices
/// 3. Stable matching, with the configured leftover repair
/// 4. Completeness check and output table
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: PairingSettings,
}

impl Pipeline {
    pub fn new(settings: PairingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PairingSettings {
        &self.settings
    }

    /// Turn both preference tables into rank matrices
    ///
    /// Without a responder table the responders' ranks are synthesized from
    /// the proposers' ranks.
    pub fn prepare(&self, request: &PairingRequest) -> Result<PreparedMatrices> {
        let seed = self.settings.shuffle_seed;
        let proposers = choice_to_rank(&request.proposers.to_choices()?, seed)?;

        let responders = match &request.responders {
            Some(table) => choice_to_rank(&table.to_choices()?, seed)?,
            None => {
                tracing::info!(
                    "No responder preferences given, deriving them with rank cut {}",
                    self.settings.rank_cut
                );
                responder_preferences(&proposers, self.settings.rank_cut, seed)?
            }
        };

        Ok(PreparedMatrices {
            proposers,
            responders,
        })
    }

    /// Compute a single stable matching
    pub fn pair(&self, request: &PairingRequest, orient: Orientation) -> Result<PairingResponse> {
        let matrices = self.prepare(request)?;

        let (matching, proposals) = UnpairedResolver::new(self.settings.unpaired)
            .resolve_counted(&matrices.proposers, &matrices.responders)?;
        check_matching(&matching, self.settings.unpaired, self.settings.on_incomplete)?;

        let matches = match_rows(&matching, &matrices, orient);
        let unmatched = matches.iter().filter(|row| !row.partner.is_matched()).count();

        tracing::info!(
            "Paired {} proposers with {} responders ({} unmatched in {:?} view)",
            matching.a().len(),
            matching.b().len(),
            unmatched,
            orient
        );

        Ok(PairingResponse {
            orientation: orient,
            matches,
            unmatched,
            proposals,
            generated_at: chrono::Utc::now(),
        })
    }

    /// Compute `num_pairs + num_bonus` rounds of non-repeating matchings
    pub fn schedule(&self, request: &PairingRequest, rounds: RoundSettings) -> Result<ScheduleResponse> {
        let matrices = self.prepare(request)?;

        let schedule = RoundScheduler::new(rounds.num_pairs, rounds.num_bonus)
            .with_unpaired_policy(self.settings.unpaired)
            .with_on_incomplete(self.settings.on_incomplete)
            .schedule(&matrices.proposers, &matrices.responders)?;

        let sizes_differ =
            matrices.proposers.members().len() != matrices.responders.members().len();

        tracing::info!(
            "Scheduled {} rounds with {} repeated meetings",
            schedule.rounds().len(),
            schedule.duplicates().len()
        );

        Ok(ScheduleResponse {
            table: schedule.partner_table(Orientation::A),
            reciprocal: sizes_differ.then(|| schedule.partner_table(Orientation::B)),
            duplicates: schedule
                .duplicates()
                .iter()
                .map(|d| DuplicateRow {
                    round: d.label.to_string(),
                    member: d.member.clone(),
                    partner: d.partner.clone(),
                })
                .collect(),
            generated_at: chrono::Utc::now(),
        })
    }
}

/// Output rows with the rank each side gave the other
fn match_rows(matching: &Matching, matrices: &PreparedMatrices, orient: Orientation) -> Vec<MatchRow> {
    let (own, other) = match orient {
        Orientation::A => (&matrices.proposers, &matrices.responders),
        Orientation::B => (&matrices.responders, &matrices.proposers),
    };

    matching
        .series(orient)
        .into_iter()
        .map(|(member, partner)| {
            let (member_rank, partner_rank) = match &partner {
                Partner::Matched(name) => (own.rank_of(&member, name), other.rank_of(name, &member)),
                Partner::Unmatched => (None, None),
            };
            MatchRow {
                member,
                partner,
                member_rank,
                partner_rank,
            }
        })
        .collect()
}

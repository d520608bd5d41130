use std::collections::HashMap;

use crate::error::{PairingError, Result};
use crate::models::{Matching, Orientation, Partner, RankMatrix};

/// Proposal-based stable matching between proposers (A) and responders (B)
///
/// McVitie–Wilson formulation of Gale–Shapley deferred acceptance. Each
/// proposer walks down its own preference list; a responder keeps the best
/// proposer seen so far and releases the one it held, who resumes proposing
/// where they left off. The result is optimal for A and pessimal for B among
/// all stable matchings.
///
/// The group sizes may differ. Surplus proposers exhaust their lists and stay
/// unmatched; surplus responders are never engaged.
#[derive(Debug)]
pub struct StableMatcher<'m> {
    a_ranks: &'m RankMatrix,
    b_ranks: &'m RankMatrix,
    /// A's column `h` is B's row `a_col_to_b_row[h]`
    a_col_to_b_row: Vec<usize>,
    /// Proposer `i` is B's column `a_row_to_b_col[i]`
    a_row_to_b_col: Vec<usize>,
    matching: Option<Matching>,
    proposals: usize,
}

impl<'m> StableMatcher<'m> {
    /// Pair up A's ranking of B with B's ranking of A
    ///
    /// # Errors
    /// `ShapeMismatch` unless A's rows are exactly B's columns and B's rows
    /// are exactly A's columns (as identity sets; order may differ).
    pub fn new(a_ranks: &'m RankMatrix, b_ranks: &'m RankMatrix) -> Result<Self> {
        let a_members = a_ranks.members();
        let b_members = b_ranks.members();

        if a_members.len() != b_ranks.counterparts().len() {
            return Err(PairingError::ShapeMismatch(format!(
                "A has {} members but B ranks {} counterparts",
                a_members.len(),
                b_ranks.counterparts().len()
            )));
        }
        if b_members.len() != a_ranks.counterparts().len() {
            return Err(PairingError::ShapeMismatch(format!(
                "B has {} members but A ranks {} counterparts",
                b_members.len(),
                a_ranks.counterparts().len()
            )));
        }

        let a_row_to_b_col = a_members
            .names()
            .iter()
            .map(|name| {
                b_ranks.counterparts().position(name).ok_or_else(|| {
                    PairingError::ShapeMismatch(format!("A member '{}' is not ranked by B", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let a_col_to_b_row = a_ranks
            .counterparts()
            .names()
            .iter()
            .map(|name| {
                b_members.position(name).ok_or_else(|| {
                    PairingError::ShapeMismatch(format!("A ranks '{}' who is not a B member", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            a_ranks,
            b_ranks,
            a_col_to_b_row,
            a_row_to_b_col,
            matching: None,
            proposals: 0,
        })
    }

    /// Does responder `b` prefer proposer `suitor` to proposer `holder`?
    #[inline]
    fn prefers(&self, b: usize, suitor: usize, holder: usize) -> bool {
        self.b_ranks.rank(b, self.a_row_to_b_col[suitor])
            < self.b_ranks.rank(b, self.a_row_to_b_col[holder])
    }

    /// Run deferred acceptance and store the resulting matching
    pub fn run(&mut self) -> &Matching {
        let num_a = self.a_ranks.members().len();
        let num_b = self.b_ranks.members().len();

        // Proposal order per proposer, already translated to B row positions
        let orders: Vec<Vec<usize>> = (0..num_a)
            .map(|i| {
                self.a_ranks
                    .preference_order(i)
                    .into_iter()
                    .map(|h| self.a_col_to_b_row[h])
                    .collect()
            })
            .collect();

        let mut next = vec![0usize; num_a];
        let mut engaged: Vec<Option<usize>> = vec![None; num_b];
        let mut proposals = 0;

        for start in 0..num_a {
            let mut suitor = start;
            loop {
                let Some(&target) = orders[suitor].get(next[suitor]) else {
                    tracing::trace!(
                        "{} exhausted their preferences",
                        self.a_ranks.members().name(suitor)
                    );
                    break;
                };
                next[suitor] += 1;
                proposals += 1;

                match engaged[target] {
                    None => {
                        engaged[target] = Some(suitor);
                        break;
                    }
                    Some(holder) if self.prefers(target, suitor, holder) => {
                        engaged[target] = Some(suitor);
                        suitor = holder;
                    }
                    Some(_) => {}
                }
            }
        }

        let matching = Matching::from_engagements(
            self.a_ranks.members().clone(),
            self.b_ranks.members().clone(),
            &engaged,
        );

        tracing::debug!(
            "Stable matching of {}x{} finished after {} proposals ({} proposers unmatched)",
            num_a,
            num_b,
            proposals,
            matching.unmatched_a().len()
        );

        self.proposals = proposals;
        self.matching.insert(matching)
    }

    /// Matching from the last `run`, if any
    pub fn matching(&self) -> Option<&Matching> {
        self.matching.as_ref()
    }

    /// Proposals made during the last `run`
    pub fn proposals(&self) -> usize {
        self.proposals
    }

    /// Every member of the chosen side mapped to its partner or the sentinel
    pub fn matches_as_series(&self, orient: Orientation) -> Result<Vec<(String, Partner)>> {
        self.matching
            .as_ref()
            .map(|m| m.series(orient))
            .ok_or(PairingError::NotRun)
    }

    /// Unordered view of [`matches_as_series`](Self::matches_as_series)
    pub fn matches_as_map(&self, orient: Orientation) -> Result<HashMap<String, Partner>> {
        self.matching
            .as_ref()
            .map(|m| m.to_map(orient))
            .ok_or(PairingError::NotRun)
    }
}

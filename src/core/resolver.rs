use serde::Deserialize;

use crate::core::matcher::StableMatcher;
use crate::error::Result;
use crate::models::{Matching, RankMatrix};

/// What happens to proposers left over after the first pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpairedPolicy {
    /// Single pass; each responder takes at most one proposer
    #[default]
    Leave,
    /// Second pass of the leftovers against all responders, so a responder
    /// may end up with two proposers
    ReuseResponders,
}

impl UnpairedPolicy {
    /// How many proposers the responder side can absorb in total
    pub fn capacity(self, responders: usize) -> usize {
        match self {
            UnpairedPolicy::Leave => responders,
            UnpairedPolicy::ReuseResponders => responders * 2,
        }
    }
}

/// Runs the engine and, if allowed, repairs leftover proposers with a second pass
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpairedResolver {
    policy: UnpairedPolicy,
}

impl UnpairedResolver {
    pub fn new(policy: UnpairedPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnpairedPolicy {
        self.policy
    }

    /// Match `a_ranks` against `b_ranks`, then re-run on the leftovers
    ///
    /// The second problem keeps only the unmatched proposers' rows of A and
    /// only their columns of B, re-ranked. Second-pass pairs fill the gaps of
    /// the first pass and never replace an existing assignment. Whoever is
    /// still unmatched afterwards stays unmatched.
    pub fn resolve(&self, a_ranks: &RankMatrix, b_ranks: &RankMatrix) -> Result<Matching> {
        self.resolve_counted(a_ranks, b_ranks).map(|(matching, _)| matching)
    }

    /// Like [`resolve`](Self::resolve), also returning the first pass's proposal count
    pub fn resolve_counted(
        &self,
        a_ranks: &RankMatrix,
        b_ranks: &RankMatrix,
    ) -> Result<(Matching, usize)> {
        let mut first = StableMatcher::new(a_ranks, b_ranks)?;
        let mut matching = first.run().clone();
        let proposals = first.proposals();

        let leftovers = matching.unmatched_a();
        if leftovers.is_empty() || self.policy == UnpairedPolicy::Leave {
            return Ok((matching, proposals));
        }

        let all_b: Vec<usize> = (0..a_ranks.counterparts().len()).collect();
        let leftover_cols: Vec<usize> = leftovers
            .iter()
            .filter_map(|&i| b_ranks.counterparts().position(a_ranks.members().name(i)))
            .collect();

        let a_sub = a_ranks.restrict(&leftovers, &all_b)?;
        let b_sub = b_ranks.restrict(&(0..b_ranks.members().len()).collect::<Vec<_>>(), &leftover_cols)?;

        let mut second = StableMatcher::new(&a_sub, &b_sub)?;
        let repair = second.run();
        matching.merge(repair);

        tracing::debug!(
            "Second pass placed {} of {} leftover proposers",
            leftovers.len() - matching.unmatched_a().len(),
            leftovers.len()
        );

        Ok((matching, proposals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, Orientation, Partner};

    /// Five proposers, three responders, everyone agreeing on the order
    fn five_by_three() -> (RankMatrix, RankMatrix) {
        let a = Group::generated(5, "a");
        let b = Group::generated(3, "b");
        let a_ranks = RankMatrix::new(a.clone(), b.clone(), vec![vec![1, 2, 3]; 5]).unwrap();
        let b_ranks = RankMatrix::new(b, a, vec![vec![1, 2, 3, 4, 5]; 3]).unwrap();
        (a_ranks, b_ranks)
    }

    #[test]
    fn test_leave_policy_keeps_leftovers() {
        let (a_ranks, b_ranks) = five_by_three();
        let matching = UnpairedResolver::new(UnpairedPolicy::Leave)
            .resolve(&a_ranks, &b_ranks)
            .unwrap();

        assert_eq!(matching.unmatched_a(), vec![3, 4]);
        assert!(matching.unmatched_b().is_empty());
    }

    #[test]
    fn test_second_pass_reuses_responders() {
        let (a_ranks, b_ranks) = five_by_three();
        let matching = UnpairedResolver::new(UnpairedPolicy::ReuseResponders)
            .resolve(&a_ranks, &b_ranks)
            .unwrap();

        assert!(matching.unmatched_a().is_empty());
        assert_eq!(matching.partners_of("aAD"), vec!["bAA"]);
        assert_eq!(matching.partners_of("aAE"), vec!["bAB"]);
        assert_eq!(matching.partners_of("bAA"), vec!["aAA", "aAD"]);

        // First-pass partner is the one reported in the B view
        let b_view = matching.to_map(Orientation::B);
        assert_eq!(b_view["bAA"], Partner::Matched("aAA".into()));
    }

    #[test]
    fn test_proposals_count_first_pass_only() {
        let (a_ranks, b_ranks) = five_by_three();
        let mut matcher = StableMatcher::new(&a_ranks, &b_ranks).unwrap();
        matcher.run();

        let (matching, proposals) = UnpairedResolver::new(UnpairedPolicy::ReuseResponders)
            .resolve_counted(&a_ranks, &b_ranks)
            .unwrap();
        assert!(matching.unmatched_a().is_empty());
        // 1 + 2 + 3 for the placed proposers, 3 each for the two left over
        assert_eq!(proposals, 12);
        assert_eq!(proposals, matcher.proposals());
    }
}

//! Conversion between choice matrices and rank matrices.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{PairingError, Result};
use crate::models::domain::{check_permutation, ChoiceMatrix, RankMatrix};

/// Seeded RNG for tie-breaking, or an entropy-seeded one without a seed
pub(crate) fn tie_break_rng(shuffle_seed: Option<u64>) -> ChaCha8Rng {
    match shuffle_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Convert a choice matrix into a rank matrix with unique ranks per row
///
/// Tied counterparts receive the contiguous block of ranks their tier covers,
/// shuffled with an RNG derived from `shuffle_seed`. Rows are processed in
/// order and only ties consume randomness, so a tie-free matrix converts the
/// same way with or without a seed.
///
/// # Errors
/// `InvalidMatrix` if a row repeats or omits a counterpart.
pub fn choice_to_rank(choice: &ChoiceMatrix, shuffle_seed: Option<u64>) -> Result<RankMatrix> {
    let mut rng = tie_break_rng(shuffle_seed);
    let members = choice.members();
    let counterparts = choice.counterparts();
    let n = counterparts.len();

    let mut ranks = Vec::with_capacity(members.len());
    for (m, row) in choice.rows().iter().enumerate() {
        let mut ranked = vec![0u32; n];
        let mut next_rank = 1u32;

        for tier in row {
            let mut slots: Vec<u32> = (next_rank..next_rank + tier.len() as u32).collect();
            if tier.len() > 1 {
                slots.shuffle(&mut rng);
            }

            for (&c, slot) in tier.iter().zip(slots) {
                if ranked[c] != 0 {
                    return Err(PairingError::InvalidMatrix(format!(
                        "row '{}' lists '{}' more than once",
                        members.name(m),
                        counterparts.name(c)
                    )));
                }
                ranked[c] = slot;
            }
            next_rank += tier.len() as u32;
        }

        if let Some(missing) = ranked.iter().position(|&r| r == 0) {
            return Err(PairingError::InvalidMatrix(format!(
                "row '{}' never ranks '{}'",
                members.name(m),
                counterparts.name(missing)
            )));
        }
        ranks.push(ranked);
    }

    RankMatrix::new(members.clone(), counterparts.clone(), ranks)
}

/// Convert a rank matrix into a tie-free choice matrix
///
/// # Errors
/// `InvalidMatrix` if a row's ranks are not exactly `1..=n`.
pub fn rank_to_choice(rank: &RankMatrix) -> Result<ChoiceMatrix> {
    let n = rank.counterparts().len();
    let mut rows = Vec::with_capacity(rank.members().len());

    for (m, row) in rank.rows().iter().enumerate() {
        check_permutation(row, n).map_err(|reason| {
            PairingError::InvalidMatrix(format!("row '{}': {}", rank.members().name(m), reason))
        })?;
        rows.push(rank.preference_order(m));
    }

    ChoiceMatrix::strict(rank.members().clone(), rank.counterparts().clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::Group;

    fn groups() -> (Group, Group) {
        (
            Group::new(["ann", "bob"]).unwrap(),
            Group::new(["w", "x", "y"]).unwrap(),
        )
    }

    #[test]
    fn test_choice_to_rank_strict() {
        let (members, counterparts) = groups();
        let choice =
            ChoiceMatrix::strict(members, counterparts, vec![vec![2, 0, 1], vec![0, 1, 2]]).unwrap();

        let rank = choice_to_rank(&choice, None).unwrap();
        assert_eq!(rank.row(0), &[2, 3, 1]);
        assert_eq!(rank.row(1), &[1, 2, 3]);
    }

    #[test]
    fn test_round_trip_without_ties() {
        let (members, counterparts) = groups();
        let choice =
            ChoiceMatrix::strict(members, counterparts, vec![vec![1, 2, 0], vec![2, 1, 0]]).unwrap();

        let back = rank_to_choice(&choice_to_rank(&choice, Some(7)).unwrap()).unwrap();
        assert_eq!(back, choice);
    }

    #[test]
    fn test_ties_get_contiguous_ranks() {
        let (members, counterparts) = groups();
        let choice = ChoiceMatrix::new(
            members,
            counterparts,
            vec![vec![vec![1], vec![0, 2]], vec![vec![0, 1, 2]]],
        )
        .unwrap();

        let rank = choice_to_rank(&choice, Some(1234)).unwrap();
        assert_eq!(rank.rank(0, 1), 1);
        let mut tied = vec![rank.rank(0, 0), rank.rank(0, 2)];
        tied.sort_unstable();
        assert_eq!(tied, vec![2, 3]);

        let again = choice_to_rank(&choice, Some(1234)).unwrap();
        assert_eq!(rank, again);
    }

    #[test]
    fn test_repeated_counterpart_rejected() {
        let (members, counterparts) = groups();
        let choice =
            ChoiceMatrix::strict(members, counterparts, vec![vec![0, 0, 1], vec![0, 1, 2]]).unwrap();

        let err = choice_to_rank(&choice, None).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_counterpart_rejected() {
        let (members, counterparts) = groups();
        let choice = ChoiceMatrix::strict(members, counterparts, vec![vec![0, 1], vec![0, 1, 2]]).unwrap();

        let err = choice_to_rank(&choice, None).unwrap_err();
        assert!(err.to_string().contains("never ranks 'y'"));
    }
}

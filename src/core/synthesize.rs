use rand::seq::SliceRandom;

use crate::core::convert::tie_break_rng;
use crate::error::Result;
use crate::models::RankMatrix;

/// Derive the responders' rankings from the proposers' rankings
///
/// For each responder, the proposers who ranked it better than `rank_cut`
/// get the top ranks in a random order; everybody else follows, also
/// shuffled. A low cut makes the outcome follow A's wishes closely, a high
/// cut leaves more to chance.
pub fn responder_preferences(
    a_ranks: &RankMatrix,
    rank_cut: u32,
    shuffle_seed: Option<u64>,
) -> Result<RankMatrix> {
    let mut rng = tie_break_rng(shuffle_seed);
    let proposers = a_ranks.members();
    let responders = a_ranks.counterparts();

    let mut ranks = Vec::with_capacity(responders.len());
    for b in 0..responders.len() {
        let (keen, rest): (Vec<usize>, Vec<usize>) =
            (0..proposers.len()).partition(|&i| a_ranks.rank(i, b) < rank_cut);

        let mut keen_ranks: Vec<u32> = (1..=keen.len() as u32).collect();
        let mut rest_ranks: Vec<u32> =
            (keen.len() as u32 + 1..=proposers.len() as u32).collect();
        keen_ranks.shuffle(&mut rng);
        rest_ranks.shuffle(&mut rng);

        let mut row = vec![0u32; proposers.len()];
        for (i, rank) in keen.into_iter().zip(keen_ranks) {
            row[i] = rank;
        }
        for (i, rank) in rest.into_iter().zip(rest_ranks) {
            row[i] = rank;
        }
        ranks.push(row);
    }

    RankMatrix::new(responders.clone(), proposers.clone(), ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;

    #[test]
    fn test_keen_proposers_ranked_first() {
        let a = Group::new(["a1", "a2", "a3", "a4"]).unwrap();
        let b = Group::new(["b1", "b2"]).unwrap();
        let a_ranks = RankMatrix::new(
            a,
            b,
            vec![vec![1, 2], vec![2, 1], vec![1, 2], vec![2, 1]],
        )
        .unwrap();

        let b_ranks = responder_preferences(&a_ranks, 2, Some(99)).unwrap();
        assert_eq!(b_ranks.members().names(), &["b1", "b2"]);

        // a1 and a3 put b1 first, so b1 ranks them 1 and 2 in some order
        let mut top = vec![b_ranks.rank(0, 0), b_ranks.rank(0, 2)];
        top.sort_unstable();
        assert_eq!(top, vec![1, 2]);

        let mut top = vec![b_ranks.rank(1, 1), b_ranks.rank(1, 3)];
        top.sort_unstable();
        assert_eq!(top, vec![1, 2]);

        assert_eq!(b_ranks, responder_preferences(&a_ranks, 2, Some(99)).unwrap());
    }
}

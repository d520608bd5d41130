use std::collections::HashSet;
use std::fmt;

use crate::core::completeness::{check_matching, check_schedule, OnIncomplete};
use crate::core::matcher::StableMatcher;
use crate::core::resolver::{UnpairedPolicy, UnpairedResolver};
use crate::error::Result;
use crate::models::{
    ExtraMeeting, Group, Matching, Orientation, Partner, RankMatrix, RoundTable, ScheduleRow,
};

/// Column label of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundLabel {
    Regular(usize),
    Bonus(usize),
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundLabel::Regular(k) => write!(f, "Round {}", k),
            RoundLabel::Bonus(k) => write!(f, "Bonus #{}", k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub label: RoundLabel,
    pub matching: Matching,
}

/// A proposer meeting the same responder again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub label: RoundLabel,
    pub member: String,
    pub partner: String,
}

/// Rounds produced by [`RoundScheduler`]
#[derive(Debug, Clone)]
pub struct Schedule {
    a: Group,
    b: Group,
    rounds: Vec<Round>,
    duplicates: Vec<Duplicate>,
}

impl Schedule {
    fn new(a: Group, b: Group, rounds: Vec<Round>) -> Self {
        let mut seen: Vec<HashSet<usize>> = vec![HashSet::new(); a.len()];
        let mut duplicates = Vec::new();

        for round in &rounds {
            for (i, j) in round.matching.pairs() {
                if !seen[i].insert(j) {
                    duplicates.push(Duplicate {
                        label: round.label,
                        member: a.name(i).to_string(),
                        partner: b.name(j).to_string(),
                    });
                }
            }
        }

        Self {
            a,
            b,
            rounds,
            duplicates,
        }
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn labels(&self) -> Vec<String> {
        self.rounds.iter().map(|r| r.label.to_string()).collect()
    }

    /// Repeated meetings, in round order
    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// One row per member of the chosen side, one partner per round
    pub fn partner_table(&self, orient: Orientation) -> RoundTable {
        let group = match orient {
            Orientation::A => &self.a,
            Orientation::B => &self.b,
        };

        let mut rows: Vec<ScheduleRow> = group
            .names()
            .iter()
            .map(|name| ScheduleRow {
                member: name.clone(),
                partners: Vec::with_capacity(self.rounds.len()),
                also_met: Vec::new(),
            })
            .collect();

        for round in &self.rounds {
            for (row, (_, partner)) in rows.iter_mut().zip(round.matching.series(orient)) {
                row.partners.push(partner);
            }

            // A responder keeps its first partner in the column; the rest go alongside
            if orient == Orientation::B {
                for (j, row) in rows.iter_mut().enumerate() {
                    for &i in round.matching.partners_of_b(j).iter().skip(1) {
                        row.also_met.push(ExtraMeeting {
                            round: round.label.to_string(),
                            partner: self.a.name(i).to_string(),
                        });
                    }
                }
            }
        }

        RoundTable {
            columns: self.labels(),
            rows,
        }
    }

    /// Partners a member met, in round order
    pub fn partners_of(&self, name: &str) -> Vec<Partner> {
        self.rounds
            .iter()
            .map(|round| match round.matching.partners_of(name).first() {
                Some(partner) => Partner::Matched(partner.to_string()),
                None => Partner::Unmatched,
            })
            .collect()
    }
}

/// Private copies of both rank matrices, rewritten between rounds
struct WorkingMatrices {
    a: RankMatrix,
    b: RankMatrix,
    /// Responder `j` is A's column `b_in_a[j]`
    b_in_a: Vec<usize>,
    /// Proposer `i` is B's column `a_in_b[i]`
    a_in_b: Vec<usize>,
}

impl WorkingMatrices {
    fn new(a: &RankMatrix, b: &RankMatrix) -> Result<Self> {
        // Validates that both matrices describe the same identities
        StableMatcher::new(a, b)?;

        let b_in_a = b
            .members()
            .names()
            .iter()
            .filter_map(|name| a.counterparts().position(name))
            .collect();
        let a_in_b = a
            .members()
            .names()
            .iter()
            .filter_map(|name| b.counterparts().position(name))
            .collect();

        Ok(Self {
            a: a.clone(),
            b: b.clone(),
            b_in_a,
            a_in_b,
        })
    }

    /// Make every pair of `matching` each party's last choice
    fn down_rank(&mut self, matching: &Matching) {
        for (i, j) in matching.pairs() {
            self.a.down_rank(i, self.b_in_a[j]);
            self.b.down_rank(j, self.a_in_b[i]);
        }
    }
}

/// Repeats the matching for a number of rounds, steering away from repeats
///
/// After each round every matched pair is pushed to the bottom of both
/// partners' lists. Rounds past `num_pairs` are labelled as bonus rounds.
/// Once the round count exceeds `min(|A|, |B|) - 1` the lists run out of
/// fresh partners and repeated meetings become possible; these are reported
/// through [`Schedule::duplicates`] and the [`OnIncomplete`] policy.
#[derive(Debug, Clone, Copy)]
pub struct RoundScheduler {
    num_pairs: usize,
    num_bonus: usize,
    resolver: UnpairedResolver,
    on_incomplete: OnIncomplete,
}

impl RoundScheduler {
    pub fn new(num_pairs: usize, num_bonus: usize) -> Self {
        Self {
            num_pairs,
            num_bonus,
            resolver: UnpairedResolver::default(),
            on_incomplete: OnIncomplete::default(),
        }
    }

    pub fn with_unpaired_policy(mut self, policy: UnpairedPolicy) -> Self {
        self.resolver = UnpairedResolver::new(policy);
        self
    }

    pub fn with_on_incomplete(mut self, on_incomplete: OnIncomplete) -> Self {
        self.on_incomplete = on_incomplete;
        self
    }

    pub fn total_rounds(&self) -> usize {
        self.num_pairs + self.num_bonus
    }

    fn label(&self, round: usize) -> RoundLabel {
        if round <= self.num_pairs {
            RoundLabel::Regular(round)
        } else {
            RoundLabel::Bonus(round - self.num_pairs)
        }
    }

    /// Produce all rounds; `a_ranks` and `b_ranks` are left untouched
    pub fn schedule(&self, a_ranks: &RankMatrix, b_ranks: &RankMatrix) -> Result<Schedule> {
        let mut working = WorkingMatrices::new(a_ranks, b_ranks)?;

        let smaller = a_ranks.members().len().min(b_ranks.members().len());
        if self.total_rounds() > smaller.saturating_sub(1) {
            tracing::warn!(
                "{} rounds requested for a smaller group of {}; repeated meetings are possible",
                self.total_rounds(),
                smaller
            );
        }

        let mut rounds = Vec::with_capacity(self.total_rounds());
        for round in 1..=self.total_rounds() {
            let matching = self.resolver.resolve(&working.a, &working.b)?;
            check_matching(&matching, self.resolver.policy(), self.on_incomplete)?;
            working.down_rank(&matching);

            let label = self.label(round);
            tracing::debug!("{} scheduled with {} pairs", label, matching.pairs().len());
            rounds.push(Round { label, matching });
        }

        let schedule = Schedule::new(
            a_ranks.members().clone(),
            b_ranks.members().clone(),
            rounds,
        );
        check_schedule(&schedule, self.on_incomplete)?;

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let scheduler = RoundScheduler::new(2, 2);
        let labels: Vec<String> = (1..=4).map(|r| scheduler.label(r).to_string()).collect();
        assert_eq!(labels, vec!["Round 1", "Round 2", "Bonus #1", "Bonus #2"]);
    }

    #[test]
    fn test_down_rank_hits_both_sides() {
        let a = Group::new(["a1", "a2"]).unwrap();
        let b = Group::new(["b1", "b2"]).unwrap();
        let a_ranks = RankMatrix::new(a.clone(), b.clone(), vec![vec![1, 2], vec![2, 1]]).unwrap();
        let b_ranks = RankMatrix::new(b.clone(), a.clone(), vec![vec![1, 2], vec![2, 1]]).unwrap();

        let mut working = WorkingMatrices::new(&a_ranks, &b_ranks).unwrap();
        let matching = Matching::from_engagements(a, b, &[Some(0), Some(1)]);
        working.down_rank(&matching);

        assert_eq!(working.a.rows(), &[vec![2, 1], vec![1, 2]]);
        assert_eq!(working.b.rows(), &[vec![2, 1], vec![1, 2]]);
        // Originals untouched
        assert_eq!(a_ranks.rows(), &[vec![1, 2], vec![2, 1]]);
    }

    #[test]
    fn test_reuse_responders_lists_second_partners() {
        let a = Group::new(["a1", "a2", "a3", "a4", "a5"]).unwrap();
        let b = Group::new(["b1", "b2", "b3"]).unwrap();
        let a_ranks = RankMatrix::new(a.clone(), b.clone(), vec![vec![1, 2, 3]; 5]).unwrap();
        let b_ranks = RankMatrix::new(b, a, vec![vec![1, 2, 3, 4, 5]; 3]).unwrap();

        let schedule = RoundScheduler::new(2, 0)
            .with_unpaired_policy(UnpairedPolicy::ReuseResponders)
            .with_on_incomplete(OnIncomplete::Fail)
            .schedule(&a_ranks, &b_ranks)
            .unwrap();
        assert!(schedule.duplicates().is_empty());

        let matched = |name: &str| Partner::Matched(name.to_string());
        let by_a = schedule.partner_table(Orientation::A);
        let a_partners: Vec<Vec<Partner>> = by_a.rows.iter().map(|r| r.partners.clone()).collect();
        assert_eq!(
            a_partners,
            vec![
                vec![matched("b1"), matched("b2")],
                vec![matched("b2"), matched("b1")],
                vec![matched("b3"), matched("b1")],
                vec![matched("b1"), matched("b3")],
                vec![matched("b2"), matched("b3")],
            ]
        );
        assert!(by_a.rows.iter().all(|r| r.also_met.is_empty()));

        let by_b = schedule.partner_table(Orientation::B);
        let extra = |round: &str, partner: &str| ExtraMeeting {
            round: round.to_string(),
            partner: partner.to_string(),
        };
        assert_eq!(by_b.rows[0].partners, vec![matched("a1"), matched("a2")]);
        assert_eq!(
            by_b.rows[0].also_met,
            vec![extra("Round 1", "a4"), extra("Round 2", "a3")]
        );
        assert_eq!(by_b.rows[1].also_met, vec![extra("Round 1", "a5")]);
        assert_eq!(by_b.rows[2].partners, vec![matched("a3"), matched("a4")]);
        assert_eq!(by_b.rows[2].also_met, vec![extra("Round 2", "a5")]);
    }
}

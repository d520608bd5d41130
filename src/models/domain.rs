use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::error::{PairingError, Result};

/// Rendering of [`Partner::Unmatched`] in every output table
pub const UNMATCHED: &str = "None";

/// Ordered, duplicate-free collection of member identities
///
/// Positions are stable: index `i` always names the same member, and the
/// lookup table maps every name back to its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Group {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(PairingError::InvalidMatrix(format!(
                    "duplicate member id '{}'",
                    name
                )));
            }
        }

        Ok(Self { names, index })
    }

    /// Placeholder names `prefixAA`, `prefixAB`, ... for unlabeled input
    ///
    /// Two letters cover 676 members; larger groups get wider labels.
    pub fn generated(count: usize, prefix: &str) -> Self {
        let mut width = 2;
        while 26usize.pow(width as u32) < count {
            width += 1;
        }

        let names: Vec<String> = (0..count)
            .map(|i| {
                let mut letters = vec![b'A'; width];
                let mut rest = i;
                for slot in letters.iter_mut().rev() {
                    *slot = b'A' + (rest % 26) as u8;
                    rest /= 26;
                }
                format!("{}{}", prefix, String::from_utf8_lossy(&letters))
            })
            .collect();

        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, position: usize) -> &str {
        &self.names[position]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// First member of `self` missing from `other`, if any
    pub fn first_missing_from(&self, other: &Group) -> Option<&str> {
        self.names
            .iter()
            .find(|name| !other.contains(name))
            .map(String::as_str)
    }

    /// Sub-group made of the members at `positions`, in that order
    pub fn subset(&self, positions: &[usize]) -> Result<Self> {
        Self::new(positions.iter().map(|&p| self.names[p].clone()))
    }
}

/// Check that `row` holds every rank in `1..=n` exactly once
pub(crate) fn check_permutation(row: &[u32], n: usize) -> std::result::Result<(), String> {
    if row.len() != n {
        return Err(format!("expected {} ranks, found {}", n, row.len()));
    }

    let mut seen = vec![false; n];
    for &rank in row {
        let slot = rank as usize;
        if slot == 0 || slot > n {
            return Err(format!("rank {} outside 1..={}", rank, n));
        }
        if seen[slot - 1] {
            return Err(format!("rank {} appears more than once", rank));
        }
        seen[slot - 1] = true;
    }

    Ok(())
}

/// Preference data as "the rank I give to counterpart X"
///
/// `ranks[m][c]` is member `m`'s rank of counterpart `c`, 1 being the most
/// preferred. Every row is a permutation of `1..=counterparts.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankMatrix {
    members: Group,
    counterparts: Group,
    ranks: Vec<Vec<u32>>,
}

impl RankMatrix {
    pub fn new(members: Group, counterparts: Group, ranks: Vec<Vec<u32>>) -> Result<Self> {
        if ranks.len() != members.len() {
            return Err(PairingError::InvalidMatrix(format!(
                "expected {} rows, found {}",
                members.len(),
                ranks.len()
            )));
        }

        for (position, row) in ranks.iter().enumerate() {
            check_permutation(row, counterparts.len()).map_err(|reason| {
                PairingError::InvalidMatrix(format!(
                    "row '{}': {}",
                    members.name(position),
                    reason
                ))
            })?;
        }

        Ok(Self {
            members,
            counterparts,
            ranks,
        })
    }

    /// Build from signed input, rejecting negative and zero ranks by name
    pub fn from_signed(members: Group, counterparts: Group, ranks: Vec<Vec<i64>>) -> Result<Self> {
        let mut converted = Vec::with_capacity(ranks.len());

        for (position, row) in ranks.into_iter().enumerate() {
            let row = row
                .into_iter()
                .enumerate()
                .map(|(column, rank)| {
                    u32::try_from(rank)
                        .ok()
                        .filter(|&r| r > 0)
                        .ok_or_else(|| {
                            PairingError::InvalidMatrix(format!(
                                "row '{}': rank {} for column {} is not a positive integer",
                                members.names().get(position).map_or("?", String::as_str),
                                rank,
                                column
                            ))
                        })
                })
                .collect::<Result<Vec<u32>>>()?;
            converted.push(row);
        }

        Self::new(members, counterparts, converted)
    }

    pub fn members(&self) -> &Group {
        &self.members
    }

    pub fn counterparts(&self) -> &Group {
        &self.counterparts
    }

    pub fn rank(&self, member: usize, counterpart: usize) -> u32 {
        self.ranks[member][counterpart]
    }

    pub fn row(&self, member: usize) -> &[u32] {
        &self.ranks[member]
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.ranks
    }

    pub fn rank_of(&self, member: &str, counterpart: &str) -> Option<u32> {
        let m = self.members.position(member)?;
        let c = self.counterparts.position(counterpart)?;
        Some(self.ranks[m][c])
    }

    /// Counterpart positions ordered from most to least preferred
    pub fn preference_order(&self, member: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.counterparts.len()).collect();
        order.sort_by_key(|&c| self.ranks[member][c]);
        order
    }

    /// Demote `counterpart` to `member`'s last choice
    ///
    /// Everything ranked worse than the counterpart moves up one place, so the
    /// row stays a permutation and the relative order of the rest is kept.
    pub fn down_rank(&mut self, member: usize, counterpart: usize) {
        let worst = self.counterparts.len() as u32;
        let row = &mut self.ranks[member];
        let used = row[counterpart];

        for rank in row.iter_mut() {
            if *rank > used {
                *rank -= 1;
            }
        }
        row[counterpart] = worst;
    }

    /// Restrict to the given rows and columns, re-ranking each row to `1..=k`
    pub fn restrict(&self, members: &[usize], counterparts: &[usize]) -> Result<Self> {
        let ranks = members
            .iter()
            .map(|&m| {
                let mut order: Vec<usize> = (0..counterparts.len()).collect();
                order.sort_by_key(|&k| self.ranks[m][counterparts[k]]);

                let mut row = vec![0u32; counterparts.len()];
                for (place, k) in order.into_iter().enumerate() {
                    row[k] = place as u32 + 1;
                }
                row
            })
            .collect();

        Self::new(
            self.members.subset(members)?,
            self.counterparts.subset(counterparts)?,
            ranks,
        )
    }
}

/// Counterparts a member ranks equally
pub type Tier = Vec<usize>;

/// Preference data as "the counterpart I rank k-th"
///
/// Each row is a sequence of tiers from most to least preferred. A tie-free
/// matrix holds only single-member tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMatrix {
    members: Group,
    counterparts: Group,
    rows: Vec<Vec<Tier>>,
}

impl ChoiceMatrix {
    pub fn new(members: Group, counterparts: Group, rows: Vec<Vec<Tier>>) -> Result<Self> {
        if rows.len() != members.len() {
            return Err(PairingError::InvalidMatrix(format!(
                "expected {} rows, found {}",
                members.len(),
                rows.len()
            )));
        }

        for (position, row) in rows.iter().enumerate() {
            if let Some(&bad) = row.iter().flatten().find(|&&c| c >= counterparts.len()) {
                return Err(PairingError::InvalidMatrix(format!(
                    "row '{}' names counterpart #{} of {}",
                    members.name(position),
                    bad,
                    counterparts.len()
                )));
            }
        }

        Ok(Self {
            members,
            counterparts,
            rows,
        })
    }

    /// Tie-free choice matrix from plain ordered rows
    pub fn strict(members: Group, counterparts: Group, rows: Vec<Vec<usize>>) -> Result<Self> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| vec![c]).collect())
            .collect();
        Self::new(members, counterparts, rows)
    }

    /// Group counterparts into tiers by priority marker, lowest marker first
    ///
    /// Equal markers form a tie; gaps between markers are ignored.
    pub fn from_priorities(
        members: Group,
        counterparts: Group,
        priorities: &[Vec<u32>],
    ) -> Result<Self> {
        let mut rows = Vec::with_capacity(priorities.len());

        for (position, row) in priorities.iter().enumerate() {
            if row.len() != counterparts.len() {
                return Err(PairingError::InvalidMatrix(format!(
                    "row '{}': expected {} priorities, found {}",
                    members.names().get(position).map_or("?", String::as_str),
                    counterparts.len(),
                    row.len()
                )));
            }

            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by_key(|&c| (row[c], c));

            let mut tiers: Vec<Tier> = Vec::new();
            let mut last = None;
            for c in order {
                match tiers.last_mut() {
                    Some(tier) if last == Some(row[c]) => tier.push(c),
                    _ => tiers.push(vec![c]),
                }
                last = Some(row[c]);
            }
            rows.push(tiers);
        }

        Self::new(members, counterparts, rows)
    }

    pub fn members(&self) -> &Group {
        &self.members
    }

    pub fn counterparts(&self) -> &Group {
        &self.counterparts
    }

    pub fn row(&self, member: usize) -> &[Tier] {
        &self.rows[member]
    }

    pub fn rows(&self) -> &[Vec<Tier>] {
        &self.rows
    }

    pub fn has_ties(&self) -> bool {
        self.rows.iter().flatten().any(|tier| tier.len() > 1)
    }

    /// Row as counterpart names, ties flattened in stored order
    pub fn ordered_names(&self, member: usize) -> Vec<&str> {
        self.rows[member]
            .iter()
            .flatten()
            .map(|&c| self.counterparts.name(c))
            .collect()
    }
}

/// Which side's members key an output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Proposers as keys
    #[default]
    A,
    /// Responders as keys
    B,
}

/// Assigned partner, or the explicit unmatched sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partner {
    Matched(String),
    Unmatched,
}

impl Partner {
    pub fn is_matched(&self) -> bool {
        matches!(self, Partner::Matched(_))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Partner::Matched(name) => Some(name),
            Partner::Unmatched => None,
        }
    }
}

impl fmt::Display for Partner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or(UNMATCHED))
    }
}

impl Serialize for Partner {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name().unwrap_or(UNMATCHED))
    }
}

/// Assignment between proposers (A) and responders (B)
///
/// Every proposer has at most one partner. A responder normally has at most
/// one as well; a second pass over leftover proposers may give it more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    a: Group,
    b: Group,
    a_to_b: Vec<Option<usize>>,
    b_to_a: Vec<Vec<usize>>,
}

impl Matching {
    /// Build from the responder-side engagement list of one engine pass
    pub(crate) fn from_engagements(a: Group, b: Group, engaged: &[Option<usize>]) -> Self {
        let mut a_to_b = vec![None; a.len()];
        let mut b_to_a = vec![Vec::new(); b.len()];

        for (j, holder) in engaged.iter().enumerate() {
            if let Some(i) = *holder {
                a_to_b[i] = Some(j);
                b_to_a[j].push(i);
            }
        }

        Self {
            a,
            b,
            a_to_b,
            b_to_a,
        }
    }

    pub fn a(&self) -> &Group {
        &self.a
    }

    pub fn b(&self) -> &Group {
        &self.b
    }

    pub fn partner_of_a(&self, a: usize) -> Option<usize> {
        self.a_to_b[a]
    }

    pub fn partners_of_b(&self, b: usize) -> &[usize] {
        &self.b_to_a[b]
    }

    /// All partner names of a member of either side
    pub fn partners_of(&self, name: &str) -> Vec<&str> {
        if let Some(i) = self.a.position(name) {
            return self.a_to_b[i].iter().map(|&j| self.b.name(j)).collect();
        }
        match self.b.position(name) {
            Some(j) => self.b_to_a[j].iter().map(|&i| self.a.name(i)).collect(),
            None => Vec::new(),
        }
    }

    /// Matched `(a, b)` position pairs in proposer order
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.a_to_b
            .iter()
            .enumerate()
            .filter_map(|(i, partner)| partner.map(|j| (i, j)))
            .collect()
    }

    pub fn unmatched_a(&self) -> Vec<usize> {
        (0..self.a.len())
            .filter(|&i| self.a_to_b[i].is_none())
            .collect()
    }

    pub fn unmatched_b(&self) -> Vec<usize> {
        (0..self.b.len())
            .filter(|&j| self.b_to_a[j].is_empty())
            .collect()
    }

    /// Every member of the chosen side mapped to its partner, in group order
    pub fn series(&self, orient: Orientation) -> Vec<(String, Partner)> {
        match orient {
            Orientation::A => self
                .a
                .names()
                .iter()
                .zip(&self.a_to_b)
                .map(|(name, partner)| {
                    let partner = partner
                        .map_or(Partner::Unmatched, |j| Partner::Matched(self.b.name(j).to_string()));
                    (name.clone(), partner)
                })
                .collect(),
            Orientation::B => self
                .b
                .names()
                .iter()
                .zip(&self.b_to_a)
                .map(|(name, partners)| {
                    let partner = partners
                        .first()
                        .map_or(Partner::Unmatched, |&i| Partner::Matched(self.a.name(i).to_string()));
                    (name.clone(), partner)
                })
                .collect(),
        }
    }

    pub fn to_map(&self, orient: Orientation) -> HashMap<String, Partner> {
        self.series(orient).into_iter().collect()
    }

    /// Fill this matching's unmatched proposers from a later pass
    ///
    /// `later` may cover any subset of both groups; names are mapped back by
    /// identity. Existing assignments are never overwritten.
    pub(crate) fn merge(&mut self, later: &Matching) {
        for (li, lj) in later.pairs() {
            let (Some(i), Some(j)) = (
                self.a.position(later.a.name(li)),
                self.b.position(later.b.name(lj)),
            ) else {
                continue;
            };

            if self.a_to_b[i].is_none() {
                self.a_to_b[i] = Some(j);
                self.b_to_a[j].push(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(names: &[&str]) -> Group {
        Group::new(names.iter().copied()).unwrap()
    }

    #[test]
    fn test_group_rejects_duplicates() {
        let err = Group::new(["ann", "bob", "ann"]).unwrap_err();
        assert!(matches!(err, PairingError::InvalidMatrix(_)));
    }

    #[test]
    fn test_generated_names() {
        let g = Group::generated(3, "setA_");
        assert_eq!(g.names(), &["setA_AA", "setA_AB", "setA_AC"]);

        let wide = Group::generated(700, "x");
        assert_eq!(wide.name(0), "xAAA");
        assert_eq!(wide.name(27), "xABB");
        assert_eq!(wide.len(), 700);
    }

    #[test]
    fn test_rank_matrix_rejects_ties() {
        let err = RankMatrix::new(group(&["a"]), group(&["x", "y"]), vec![vec![1, 1]]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rank_matrix_rejects_short_row() {
        let err = RankMatrix::new(group(&["a"]), group(&["x", "y"]), vec![vec![1]]).unwrap_err();
        assert!(err.to_string().contains("expected 2 ranks"));
    }

    #[test]
    fn test_from_signed_rejects_negative() {
        let err = RankMatrix::from_signed(group(&["a"]), group(&["x", "y"]), vec![vec![-1, 2]])
            .unwrap_err();
        assert!(err.to_string().contains("not a positive integer"));
    }

    #[test]
    fn test_down_rank_keeps_permutation() {
        let mut m = RankMatrix::new(group(&["a"]), group(&["w", "x", "y", "z"]), vec![vec![2, 1, 4, 3]])
            .unwrap();
        m.down_rank(0, 0);
        assert_eq!(m.row(0), &[4, 1, 3, 2]);
    }

    #[test]
    fn test_restrict_reranks() {
        let m = RankMatrix::new(
            group(&["a", "b"]),
            group(&["w", "x", "y"]),
            vec![vec![3, 1, 2], vec![1, 2, 3]],
        )
        .unwrap();
        let sub = m.restrict(&[0], &[0, 2]).unwrap();
        assert_eq!(sub.row(0), &[2, 1]);
        assert_eq!(sub.counterparts().names(), &["w", "y"]);
    }

    #[test]
    fn test_from_priorities_groups_ties() {
        let c = ChoiceMatrix::from_priorities(
            group(&["a"]),
            group(&["w", "x", "y", "z"]),
            &[vec![5, 10, 3, 3]],
        )
        .unwrap();
        assert_eq!(c.row(0), &[vec![2, 3], vec![0], vec![1]]);
        assert!(c.has_ties());
    }

    #[test]
    fn test_partner_sentinel_display() {
        assert_eq!(Partner::Unmatched.to_string(), UNMATCHED);
        assert_eq!(Partner::Matched("bob".into()).to_string(), "bob");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

use crate::error::{PairingError, Result};
use crate::models::domain::{ChoiceMatrix, Group};

/// One side's answers to a ranking survey
///
/// `priorities[m][c]` is the marker member `m` gave counterpart `c`: lower is
/// more preferred, equal markers are ties, `null` means no answer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreferenceTable {
    #[validate(length(min = 1))]
    pub members: Vec<String>,
    #[validate(length(min = 1))]
    pub counterparts: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<Vec<Option<i64>>>,
}

impl PreferenceTable {
    /// Append an unanswered row for every name in `members` not already present
    pub fn add_missing_members<'a, I>(&mut self, members: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut added = 0;
        for name in members {
            if !self.members.contains(name) {
                self.members.push(name.clone());
                self.priorities.push(vec![None; self.counterparts.len()]);
                added += 1;
            }
        }
        added
    }

    /// Drop repeated submissions from the same member
    ///
    /// Of the rows sharing a name, the one with the fewest blank answers is
    /// kept, the later one on a tie. Returns the names of the dropped rows.
    /// Tables whose row count does not match the member list are left alone.
    pub fn remove_duplicate_members(&mut self) -> Vec<String> {
        if self.priorities.len() != self.members.len() {
            return Vec::new();
        }

        let blanks = |position: usize| {
            self.priorities[position]
                .iter()
                .filter(|cell| cell.is_none())
                .count()
        };

        let mut keep: HashMap<&str, usize> = HashMap::with_capacity(self.members.len());
        for (position, name) in self.members.iter().enumerate() {
            match keep.get(name.as_str()) {
                Some(&kept) if blanks(position) > blanks(kept) => {}
                _ => {
                    keep.insert(name.as_str(), position);
                }
            }
        }

        if keep.len() == self.members.len() {
            return Vec::new();
        }

        let kept: HashSet<usize> = keep.into_values().collect();
        let mut dropped = Vec::new();
        let mut members = Vec::with_capacity(kept.len());
        let mut priorities = Vec::with_capacity(kept.len());

        for (position, (name, row)) in self
            .members
            .drain(..)
            .zip(self.priorities.drain(..))
            .enumerate()
        {
            if kept.contains(&position) {
                members.push(name);
                priorities.push(row);
            } else {
                dropped.push(name);
            }
        }

        self.members = members;
        self.priorities = priorities;
        dropped
    }

    /// Fill unanswered cells and return the table as tiered choices
    ///
    /// A blank cell becomes the row's largest marker + 1, so every blank is
    /// tied for last. A row with no answers at all is filled with the
    /// counterpart count, tying every counterpart.
    pub fn to_choices(&self) -> Result<ChoiceMatrix> {
        let members = Group::new(self.members.iter().cloned())?;
        let counterparts = Group::new(self.counterparts.iter().cloned())?;

        if self.priorities.len() != members.len() {
            return Err(PairingError::InvalidMatrix(format!(
                "expected {} preference rows, found {}",
                members.len(),
                self.priorities.len()
            )));
        }

        let mut filled = Vec::with_capacity(self.priorities.len());
        for (name, row) in self.members.iter().zip(&self.priorities) {
            if row.len() != counterparts.len() {
                return Err(PairingError::InvalidMatrix(format!(
                    "row '{}': expected {} priorities, found {}",
                    name,
                    counterparts.len(),
                    row.len()
                )));
            }

            let mut answered = Vec::with_capacity(row.len());
            for cell in row.iter().flatten() {
                let marker = u32::try_from(*cell).map_err(|_| {
                    PairingError::InvalidMatrix(format!(
                        "row '{}': priority {} is negative or too large",
                        name, cell
                    ))
                })?;
                answered.push(marker);
            }

            let blank = match answered.iter().max() {
                Some(&max) => max.saturating_add(1),
                None => counterparts.len() as u32,
            };

            let mut markers = answered.into_iter();
            let row = row
                .iter()
                .map(|cell| match cell {
                    Some(_) => markers.next().unwrap_or(blank),
                    None => blank,
                })
                .collect();
            filled.push(row);
        }

        ChoiceMatrix::from_priorities(members, counterparts, &filled)
    }
}

/// Input to a pairing run
///
/// Without a responder table the responders' preferences are derived from the
/// proposers' answers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairingRequest {
    #[validate(nested)]
    pub proposers: PreferenceTable,
    #[validate(nested)]
    #[serde(default)]
    pub responders: Option<PreferenceTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(priorities: Vec<Vec<Option<i64>>>) -> PreferenceTable {
        PreferenceTable {
            members: vec!["ann".into(), "bob".into()],
            counterparts: vec!["x".into(), "y".into(), "z".into()],
            priorities,
        }
    }

    #[test]
    fn test_blanks_tie_for_last() {
        let choices = table(vec![
            vec![Some(2), None, Some(1)],
            vec![None, None, None],
        ])
        .to_choices()
        .unwrap();

        assert_eq!(choices.row(0), &[vec![2], vec![0], vec![1]]);
        assert_eq!(choices.row(1), &[vec![0, 1, 2]]);
    }

    #[test]
    fn test_negative_priority_rejected() {
        let err = table(vec![vec![Some(-1), Some(2), Some(3)], vec![Some(1), Some(2), Some(3)]])
            .to_choices()
            .unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_row_length_mismatch_rejected() {
        let err = table(vec![vec![Some(1), Some(2)], vec![Some(1), Some(2), Some(3)]])
            .to_choices()
            .unwrap_err();
        assert!(err.to_string().contains("row 'ann'"));
    }

    #[test]
    fn test_add_missing_members() {
        let mut t = table(vec![vec![Some(1), Some(2), Some(3)], vec![Some(3), Some(2), Some(1)]]);
        let others = vec!["bob".to_string(), "cat".to_string()];
        assert_eq!(t.add_missing_members(&others), 1);
        assert_eq!(t.members.len(), 3);
        assert_eq!(t.priorities[2], vec![None, None, None]);
    }

    #[test]
    fn test_validation_requires_members() {
        let t = PreferenceTable {
            members: vec![],
            counterparts: vec!["x".into()],
            priorities: vec![],
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_duplicate_keeps_fewest_blanks() {
        let mut t = PreferenceTable {
            members: vec!["ann".into(), "ann".into(), "bo".into(), "ann".into()],
            counterparts: vec!["x".into(), "y".into()],
            priorities: vec![
                vec![Some(1), Some(2)],
                vec![Some(2), None],
                vec![Some(1), Some(2)],
                vec![Some(2), Some(1)],
            ],
        };

        assert_eq!(t.remove_duplicate_members(), vec!["ann", "ann"]);
        assert_eq!(t.members, vec!["bo", "ann"]);
        // Equal blank counts keep the later submission
        assert_eq!(t.priorities[1], vec![Some(2), Some(1)]);
    }
}

//! Post-condition checks applied around the engine.
//!
//! The engine always returns a well-formed, possibly partial matching. These
//! checks decide whether a partial result or a repeated meeting is an error
//! (`OnIncomplete::Fail`) or only worth a warning (`OnIncomplete::Warn`).

use serde::Deserialize;

use crate::core::resolver::UnpairedPolicy;
use crate::core::rounds::Schedule;
use crate::error::{PairingError, Result};
use crate::models::Matching;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnIncomplete {
    #[default]
    Warn,
    Fail,
}

/// Unmatched proposers and responders explained by group sizes alone
pub fn expected_unmatched(num_a: usize, num_b: usize, policy: UnpairedPolicy) -> (usize, usize) {
    (
        num_a.saturating_sub(policy.capacity(num_b)),
        num_b.saturating_sub(num_a),
    )
}

/// Compare the unmatched counts of `matching` with what the sizes explain
pub fn check_matching(
    matching: &Matching,
    policy: UnpairedPolicy,
    on_incomplete: OnIncomplete,
) -> Result<()> {
    let (expected_a, expected_b) = expected_unmatched(matching.a().len(), matching.b().len(), policy);
    let unmatched_a = matching.unmatched_a().len();
    let unmatched_b = matching.unmatched_b().len();

    let problem = if unmatched_a > expected_a {
        Some(("proposer", unmatched_a, expected_a))
    } else if unmatched_b > expected_b {
        Some(("responder", unmatched_b, expected_b))
    } else {
        None
    };

    let Some((side, unmatched, expected)) = problem else {
        return Ok(());
    };

    match on_incomplete {
        OnIncomplete::Fail => Err(PairingError::Incomplete {
            side,
            unmatched,
            expected,
        }),
        OnIncomplete::Warn => {
            tracing::warn!(
                "{} {} members unmatched, group sizes explain only {}",
                unmatched,
                side,
                expected
            );
            Ok(())
        }
    }
}

/// Report repeated meetings in `schedule`
pub fn check_schedule(schedule: &Schedule, on_incomplete: OnIncomplete) -> Result<()> {
    let Some(first) = schedule.duplicates().first() else {
        return Ok(());
    };

    match on_incomplete {
        OnIncomplete::Fail => Err(PairingError::DuplicatePairing {
            round: first.label.to_string(),
            member: first.member.clone(),
            partner: first.partner.clone(),
        }),
        OnIncomplete::Warn => {
            for duplicate in schedule.duplicates() {
                tracing::warn!(
                    "{}: {} meets {} again",
                    duplicate.label,
                    duplicate.member,
                    duplicate.partner
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;

    fn partial() -> Matching {
        // a2 left alone although b2 is free
        Matching::from_engagements(
            Group::new(["a1", "a2"]).unwrap(),
            Group::new(["b1", "b2"]).unwrap(),
            &[Some(0), None],
        )
    }

    #[test]
    fn test_expected_unmatched() {
        assert_eq!(expected_unmatched(5, 3, UnpairedPolicy::Leave), (2, 0));
        assert_eq!(expected_unmatched(5, 3, UnpairedPolicy::ReuseResponders), (0, 0));
        assert_eq!(expected_unmatched(3, 5, UnpairedPolicy::Leave), (0, 2));
    }

    #[test]
    fn test_fail_policy_raises() {
        let err = check_matching(&partial(), UnpairedPolicy::Leave, OnIncomplete::Fail).unwrap_err();
        assert!(matches!(
            err,
            PairingError::Incomplete {
                side: "proposer",
                unmatched: 1,
                expected: 0
            }
        ));
    }

    #[test]
    fn test_warn_policy_proceeds() {
        assert!(check_matching(&partial(), UnpairedPolicy::Leave, OnIncomplete::Warn).is_ok());
    }
}

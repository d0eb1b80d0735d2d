//! Finalization rules for a payroll.
//!
//! Every entry is checked before anything is submitted, so the caller can
//! list all offending records at once.

use rust_decimal::Decimal;
use safra_shared::types::PayrollEntryId;
use serde::{Deserialize, Serialize};

use super::error::PayrollError;

/// The parts of an entry the finalization rules look at.
#[derive(Debug, Clone)]
pub struct FinalizationCandidate {
    /// Entry being checked.
    pub entry_id: PayrollEntryId,
    /// Employee name, for the report.
    pub employee_name: String,
    /// Days worked.
    pub days_worked: u32,
    /// Computed gross amount.
    pub gross_amount: Decimal,
    /// Total advance deduction.
    pub advance_deduction: Decimal,
}

/// A rule an entry breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// No days worked were recorded.
    ZeroDaysWorked,
    /// Advances exceed what the employee earns in the period.
    #[serde(rename_all = "camelCase")]
    AdvanceExceedsGross {
        /// Total advance deduction.
        advance_deduction: Decimal,
        /// Gross amount of the entry.
        gross_amount: Decimal,
    },
}

/// One offending entry with every rule it breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizationIssue {
    /// Offending entry.
    pub entry_id: PayrollEntryId,
    /// Employee name.
    pub employee_name: String,
    /// Broken rules.
    pub problems: Vec<IssueKind>,
}

/// Returns the rules a single entry breaks (empty when it is fine).
#[must_use]
pub fn entry_issues(candidate: &FinalizationCandidate) -> Vec<IssueKind> {
    let mut problems = Vec::new();
    if candidate.days_worked == 0 {
        problems.push(IssueKind::ZeroDaysWorked);
    }
    if candidate.advance_deduction > candidate.gross_amount {
        problems.push(IssueKind::AdvanceExceedsGross {
            advance_deduction: candidate.advance_deduction,
            gross_amount: candidate.gross_amount,
        });
    }
    problems
}

/// Checks every entry of a payroll before finalization.
///
/// # Errors
///
/// - `PayrollError::EmptyPayroll` when there are no entries
/// - `PayrollError::FinalizationBlocked` listing every offending entry
pub fn validate_finalization(candidates: &[FinalizationCandidate]) -> Result<(), PayrollError> {
    if candidates.is_empty() {
        return Err(PayrollError::EmptyPayroll);
    }

    let issues: Vec<FinalizationIssue> = candidates
        .iter()
        .filter_map(|candidate| {
            let problems = entry_issues(candidate);
            (!problems.is_empty()).then(|| FinalizationIssue {
                entry_id: candidate.entry_id,
                employee_name: candidate.employee_name.clone(),
                problems,
            })
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(PayrollError::FinalizationBlocked { issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(name: &str, days: u32, gross: Decimal, advance: Decimal) -> FinalizationCandidate {
        FinalizationCandidate {
            entry_id: PayrollEntryId::new(),
            employee_name: name.to_string(),
            days_worked: days,
            gross_amount: gross,
            advance_deduction: advance,
        }
    }

    #[test]
    fn test_valid_payroll_passes() {
        let entries = vec![
            candidate("Ana", 15, dec!(1000), dec!(200)),
            candidate("Bruno", 6, dec!(600), dec!(600)),
        ];
        assert!(validate_finalization(&entries).is_ok());
    }

    #[test]
    fn test_empty_payroll_rejected() {
        assert!(matches!(
            validate_finalization(&[]),
            Err(PayrollError::EmptyPayroll)
        ));
    }

    #[test]
    fn test_zero_days_rejected_regardless_of_amounts() {
        let entries = vec![candidate("Ana", 0, dec!(5000), Decimal::ZERO)];
        let Err(PayrollError::FinalizationBlocked { issues }) = validate_finalization(&entries)
        else {
            panic!("expected FinalizationBlocked");
        };
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].problems, vec![IssueKind::ZeroDaysWorked]);
    }

    #[test]
    fn test_every_offending_entry_is_listed() {
        let entries = vec![
            candidate("Ana", 0, dec!(100), dec!(150)),
            candidate("Bruno", 15, dec!(1000), Decimal::ZERO),
            candidate("Carla", 3, dec!(300), dec!(300.01)),
        ];
        let Err(PayrollError::FinalizationBlocked { issues }) = validate_finalization(&entries)
        else {
            panic!("expected FinalizationBlocked");
        };

        let names: Vec<&str> = issues.iter().map(|i| i.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Carla"]);
        assert_eq!(issues[0].problems.len(), 2);
        assert!(matches!(
            issues[1].problems[0],
            IssueKind::AdvanceExceedsGross { .. }
        ));
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let json = serde_json::to_value(IssueKind::AdvanceExceedsGross {
            advance_deduction: dec!(10),
            gross_amount: dec!(5),
        })
        .unwrap();
        assert_eq!(json["kind"], "ADVANCE_EXCEEDS_GROSS");
        assert!(json.get("advanceDeduction").is_some());
    }
}

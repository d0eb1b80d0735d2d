//! Property tests for the payroll lifecycle.

use proptest::prelude::*;
use rust_decimal_macros::dec;
use safra_shared::types::{PayrollEntryId, UserId};
use uuid::Uuid;

use super::error::PayrollError;
use super::types::PayrollStatus;
use super::validation::FinalizationCandidate;
use super::workflow::PayrollWorkflow;

fn arb_status() -> impl Strategy<Value = PayrollStatus> {
    prop_oneof![
        Just(PayrollStatus::Rascunho),
        Just(PayrollStatus::PendenteLiberacao),
        Just(PayrollStatus::EmProcessamento),
        Just(PayrollStatus::Fechada),
        Just(PayrollStatus::Cancelada),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn valid_entries() -> Vec<FinalizationCandidate> {
    vec![FinalizationCandidate {
        entry_id: PayrollEntryId::new(),
        employee_name: "Ana".to_string(),
        days_worked: 15,
        gross_amount: dec!(1000),
        advance_deduction: dec!(0),
    }]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every produced action lands on a status the transition table allows.
    #[test]
    fn prop_actions_follow_transition_table(status in arb_status(), user in arb_user()) {
        let attempts = [
            PayrollWorkflow::finalize(status, &valid_entries(), user),
            PayrollWorkflow::reopen(status, user),
            PayrollWorkflow::start_processing(status),
            PayrollWorkflow::close(status),
            PayrollWorkflow::cancel(status, user, "erro de digitação".to_string()),
        ];
        for action in attempts.into_iter().flatten() {
            prop_assert!(PayrollWorkflow::is_valid_transition(status, action.new_status()));
        }
    }

    /// Only drafts are editable.
    #[test]
    fn prop_only_draft_is_editable(status in arb_status()) {
        let result = PayrollWorkflow::ensure_editable(status);
        if status == PayrollStatus::Rascunho {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(
                matches!(result, Err(PayrollError::NotEditable(s)) if s == status),
                "expected NotEditable"
            );
        }
    }

    /// Final states accept no transition.
    #[test]
    fn prop_final_states_are_absorbing(user in arb_user()) {
        for status in [PayrollStatus::Fechada, PayrollStatus::Cancelada] {
            prop_assert!(status.is_final());
            prop_assert!(PayrollWorkflow::finalize(status, &valid_entries(), user).is_err());
            prop_assert!(PayrollWorkflow::reopen(status, user).is_err());
            prop_assert!(PayrollWorkflow::start_processing(status).is_err());
            prop_assert!(PayrollWorkflow::close(status).is_err());
            prop_assert!(PayrollWorkflow::cancel(status, user, "x".to_string()).is_err());
        }
    }
}

//! Property tests for the bank status mapper.

use proptest::prelude::*;

use super::status::{
    BankStatusCode, ITEM_STATES, Settlement, batch_settlement, describe_batch_status,
    describe_item_status,
};

fn arb_item_code() -> impl Strategy<Value = BankStatusCode> {
    prop_oneof![
        prop::sample::select(ITEM_STATES.to_vec()).prop_map(BankStatusCode::parse),
        "[A-Z]{3,12}".prop_map(|s| BankStatusCode::parse(&s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Release is offered for codes 1 and 4 only.
    #[test]
    fn prop_release_only_for_1_and_4(code in any::<u8>()) {
        let display = describe_batch_status(&BankStatusCode::Numeric(code));
        prop_assert_eq!(display.can_release, code == 1 || code == 4);
    }

    /// Text codes never enable release, whatever they say.
    #[test]
    fn prop_text_never_releases(code in "[A-Za-z ]{0,20}") {
        let display = describe_batch_status(&BankStatusCode::Text(code.to_uppercase()));
        prop_assert!(!display.can_release);
    }

    /// Terminal states never offer actions.
    #[test]
    fn prop_terminal_items_have_no_actions(code in arb_item_code()) {
        let display = describe_item_status(&code);
        if display.outcome.is_terminal() {
            prop_assert!(!display.can_cancel);
            prop_assert!(!display.can_release);
        }
    }

    /// A batch is paid exactly when every item is paid.
    #[test]
    fn prop_batch_paid_iff_all_paid(codes in prop::collection::vec(arb_item_code(), 1..20)) {
        let all_paid = codes
            .iter()
            .all(|c| describe_item_status(c).outcome == Settlement::Paid);
        prop_assert_eq!(batch_settlement(&codes) == Settlement::Paid, all_paid);
    }
}

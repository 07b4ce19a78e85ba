use proptest::prelude::*;
use sdk::errors::{EngineError, Fault, HuddleErrorExt, TransportError};

// Every engine error carries a static, non-empty hint that never echoes the
// raw payload it was built from.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-z_]{8,40}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Handling(error_str.clone()),
            EngineError::Unfurl(error_str.clone()),
            EngineError::from(TransportError::ConnectionReset(error_str.clone())),
            EngineError::from(TransportError::Closed(error_str.clone())),
            EngineError::from(TransportError::api("users.info", error_str.clone())),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&error_str));
        }
    }
}

proptest! {
    #[test]
    fn test_only_resets_and_timeouts_force_reconnect(detail in "\\PC{0,32}") {
        prop_assert_eq!(TransportError::ConnectionReset(detail.clone()).fault(), Fault::Transport);
        prop_assert_eq!(TransportError::Timeout(detail.clone()).fault(), Fault::Transport);
        prop_assert_eq!(TransportError::Closed(detail.clone()).fault(), Fault::Protocol);
        prop_assert_eq!(TransportError::Decode(detail.clone()).fault(), Fault::Protocol);
    }
}

proptest! {
    #[test]
    fn test_budget_errors_are_never_recoverable(errors in 0u32..1000, max in 0u32..1000) {
        let err = EngineError::ErrorBudgetExhausted { errors, max };
        prop_assert!(!err.is_recoverable());
    }
}

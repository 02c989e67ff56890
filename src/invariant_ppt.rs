//! Runtime invariants with contract-test support.
//!
//! Production code asserts invariants through [`assert_invariant!`]; every
//! check is recorded in a thread-local log so that tests can prove the
//! invariant was actually exercised, not just declared.
//!
//! ```rust,ignore
//! use crabhdr::invariant_ppt::{contract_test, names};
//!
//! let _ = crabhdr::bracket::plan(5, 1.0, range, step);
//! contract_test("planner", &[names::PLAN_SORTED, names::PLAN_IN_RANGE]);
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::thread_local;

/// Messages of the invariants asserted by the pipeline.
pub mod names {
    pub const PLAN_SORTED: &str = "Bracket plan is sorted ascending";
    pub const PLAN_IN_RANGE: &str = "Bracket plan indices lie inside the device range";
    pub const PLAN_LENGTH: &str = "Bracket plan is no longer than the shot count";
    pub const FUSED_GEOMETRY: &str = "Fused image has the reference geometry";
    pub const NORMALIZED_GEOMETRY: &str = "Normalized frame matches the reference geometry";
    pub const FLAT_WEIGHT_BUDGET: &str = "Overlay weights sum to the flat alpha budget";
}

thread_local! {
    static INVARIANT_LOG: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record it for contract testing.
///
/// # Panics
/// Panics if the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __assert_invariant_impl(condition: bool, message: &str, context: Option<&str>) {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().insert(message.to_string());
    });

    if !condition {
        let ctx = context.unwrap_or("unknown");
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Panics unless every listed invariant was checked on this thread.
pub fn contract_test(test_name: &str, required_invariants: &[&str]) {
    let log = INVARIANT_LOG.with(|log| log.borrow().clone());

    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|invariant| !log.contains(*invariant))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: The following invariants were not checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

pub fn clear_invariant_log() {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().clear();
    });
}

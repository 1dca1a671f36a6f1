//! Property-based invariant tests for `TestHost`.
//!
//! 1. After settling, the leaf always sees the latest observable value
//! 2. One observable change costs at most one render pass
//! 3. Identical runs produce identical trace digests

use bindery_harness::{ConfigGuard, TestHost};
use bindery_runtime::{Actions, BindingSpec, ComponentType, Data, Element, RenderProps, bind};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    Set(i32),
    Props(i32),
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    proptest::collection::vec(
        prop_oneof![(0i32..5).prop_map(Step::Set), (0i32..5).prop_map(Step::Props)],
        0..=30,
    )
}

/// Run `steps`, checking per-step invariants; returns the trace digest.
fn run(steps: &[Step]) -> Result<String, TestCaseError> {
    let value = Data::new(0);
    let ty = bind(
        BindingSpec::new().observable("value", value.clone()),
        Actions::new(),
        ComponentType::function("Gauge", |_| Element::Empty),
    );
    let mut host = TestHost::new(ty, RenderProps::new());
    prop_assert!(host.mount().is_ok());

    let mut latest = 0;
    for step in steps {
        match step {
            Step::Set(v) => {
                value.set(*v);
                let passes = host.settle();
                prop_assert!(matches!(passes, Ok(0 | 1)), "{passes:?}");
                latest = *v;
            }
            Step::Props(p) => {
                prop_assert!(host.set_props(RenderProps::new().with_value("p", *p)).is_ok());
                prop_assert_eq!(host.leaf_value("p"), Some(p));
            }
        }
        prop_assert_eq!(host.leaf_value("value"), Some(&latest));
    }
    prop_assert!(host.unmount().is_ok());
    prop_assert_eq!(value.subscriber_count(), 0);
    Ok(host.trace().digest())
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Host invariants
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn host_tracks_latest_and_replays_identically(steps in arb_steps()) {
        let _guard = ConfigGuard::acquire();
        let first = run(&steps)?;
        let second = run(&steps)?;
        prop_assert_eq!(first, second);
    }
}

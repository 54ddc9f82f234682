//! Property tests: vector clock ordering
//!
//! `compare` must be `Equal` iff the clocks are componentwise equal,
//! `Concurrent` iff incomparable, and `Before` must be transitive.

use chrysalis_core::clock::{ClockOrdering, InstanceClock, VectorClock};
use chrysalis_core::identifiers::InstanceId;
use proptest::prelude::*;

fn instances() -> Vec<InstanceId> {
    ["a", "b", "c", "d"]
        .iter()
        .map(|s| InstanceId::named(*s))
        .collect()
}

fn arb_clock() -> impl Strategy<Value = VectorClock> {
    prop::collection::vec(0u64..6, 4).prop_map(|counters| {
        let mut clock = VectorClock::new();
        for (instance, counter) in instances().into_iter().zip(counters) {
            if counter > 0 {
                clock.insert(instance, counter);
            }
        }
        clock
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn equal_iff_componentwise_equal(a in arb_clock(), b in arb_clock()) {
        let componentwise_equal = instances().iter().all(|i| a.get(i) == b.get(i));
        prop_assert_eq!(a.compare(&b) == ClockOrdering::Equal, componentwise_equal);
    }

    #[test]
    fn compare_is_antisymmetric(a in arb_clock(), b in arb_clock()) {
        let forward = a.compare(&b);
        let backward = b.compare(&a);
        let expected = match forward {
            ClockOrdering::Before => ClockOrdering::After,
            ClockOrdering::After => ClockOrdering::Before,
            other => other,
        };
        prop_assert_eq!(backward, expected);
    }

    #[test]
    fn before_is_transitive(a in arb_clock(), b in arb_clock(), c in arb_clock()) {
        if a.compare(&b) == ClockOrdering::Before && b.compare(&c) == ClockOrdering::Before {
            prop_assert_eq!(a.compare(&c), ClockOrdering::Before);
        }
    }

    #[test]
    fn merge_max_is_upper_bound(a in arb_clock(), b in arb_clock()) {
        let mut merged = a.clone();
        merged.merge_max(&b);
        for i in instances() {
            prop_assert!(merged.get(&i) >= a.get(&i));
            prop_assert!(merged.get(&i) >= b.get(&i));
        }
        // merged dominates both inputs
        prop_assert_ne!(merged.compare(&a), ClockOrdering::Before);
        prop_assert_ne!(merged.compare(&b), ClockOrdering::Before);
    }
}

#[test]
fn message_exchange_establishes_happens_before() {
    let mut alice = InstanceClock::new(InstanceId::named("alice"));
    let mut bob = InstanceClock::new(InstanceId::named("bob"));

    let sent = alice.tick();
    let received = bob.observe(&sent);

    assert_eq!(sent.vector.compare(&received.vector), ClockOrdering::Before);
    assert_eq!(received.vector.compare(&sent.vector), ClockOrdering::After);
}

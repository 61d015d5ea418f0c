//! Property tests for the Value Bridge
//!
//! Optionals and sequences must bridge deterministically in both
//! directions, and a bad list element must be reported, never skipped.

use proptest::prelude::*;
use std::time::Duration;

use libsim::bridge::{
    duration_from_seconds, list_to_vec, optional_to_value, sequence_to_list, DisplayList,
    DisplayPair, DisplayShared,
};
use libsim::engine::{Location, Vector3D};
use libsim::script::{FromValue, Value};

proptest! {
    #[test]
    fn prop_optional_bridges_deterministically(optional in proptest::option::of(any::<i64>())) {
        let first = optional_to_value(optional);
        let second = optional_to_value(optional);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(Option::<i64>::from_value(&first).unwrap(), optional);
        prop_assert_eq!(first.is_none(), optional.is_none());
    }

    #[test]
    fn prop_list_round_trip_preserves_order(items in proptest::collection::vec(any::<i64>(), 0..64)) {
        let list = sequence_to_list(items.clone());
        prop_assert_eq!(list.as_list().map(<[Value]>::len), Some(items.len()));
        prop_assert_eq!(list_to_vec::<i64>(&list).unwrap(), items);
    }

    #[test]
    fn prop_string_list_round_trip(items in proptest::collection::vec("[a-z]{0,8}", 0..16)) {
        let list = sequence_to_list(items.clone());
        prop_assert_eq!(list_to_vec::<String>(&list).unwrap(), items);
    }

    #[test]
    fn prop_list_element_mismatch_names_first_bad_index(
        items in proptest::collection::vec(any::<i64>(), 1..32),
        position in any::<prop::sample::Index>(),
    ) {
        let bad = position.index(items.len());
        let mut values: Vec<Value> = items.iter().map(|&i| Value::Int(i)).collect();
        values[bad] = Value::Str("not a number".to_string());

        let err = list_to_vec::<i64>(&Value::List(values)).unwrap_err();
        prop_assert!(err.is_invalid_argument());
        let expected = format!("list item {}:", bad);
        prop_assert!(err.message().starts_with(&expected));
    }

    #[test]
    fn prop_duration_truncates_to_millis(millis in 0u64..10_000_000, extra in 0.0f64..0.999) {
        let seconds = (millis as f64 + extra) / 1e3;
        let duration = duration_from_seconds(seconds);
        prop_assert!(duration <= Duration::from_millis(millis + 1));
        prop_assert!(duration + Duration::from_millis(1) >= Duration::from_millis(millis));
    }
}

#[test]
fn test_non_list_is_rejected() {
    let err = list_to_vec::<i64>(&Value::Int(3)).unwrap_err();
    assert_eq!(err.message(), "expected list, found int");
}

#[test]
fn test_negative_duration_is_zero() {
    assert_eq!(duration_from_seconds(-2.5), Duration::ZERO);
    assert_eq!(duration_from_seconds(1.5), Duration::from_millis(1500));
}

#[test]
fn test_native_list_renders_with_element_display() {
    let locations = vec![Location::new(1.0, 2.0, 3.0), Location::new(0.0, 0.0, 0.0)];
    assert_eq!(
        DisplayList(&locations).to_string(),
        format!("[{}, {}]", locations[0], locations[1])
    );
}

#[test]
fn test_pair_and_shared_rendering() {
    assert_eq!(DisplayPair(&(1, "a")).to_string(), "(1,a)");
    let empty: Option<std::sync::Arc<Vector3D>> = None;
    assert_eq!(DisplayShared(&empty).to_string(), "nullptr");
    let shared = Some(std::sync::Arc::new(Vector3D::new(1.0, 0.0, 0.0)));
    assert_eq!(DisplayShared(&shared).to_string(), Vector3D::new(1.0, 0.0, 0.0).to_string());
}

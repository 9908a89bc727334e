//! Join Property Tests
//!
//! Order independence, inclusive window bounds, watermark expiry, outer-join
//! speculative rows and asymmetric windows.

use velojoin::{
    JoinConfig, JoinCoordinator, JoinError, JoinType, JoinWindowSpec, SideRecord, StreamRecord,
    TimestampedBuffer,
};

use crate::unit::common::{StringJoin, StringRow, concat, init_logging, record, render};

fn coordinator(config: JoinConfig) -> StringJoin {
    init_logging();
    JoinCoordinator::new(config).unwrap()
}

fn left(key: u32, value: &str, ts: i64) -> SideRecord<u32, String, String> {
    SideRecord::Left(record(key, value, ts))
}

fn right(key: u32, value: &str, ts: i64) -> SideRecord<u32, String, String> {
    SideRecord::Right(record(key, value, ts))
}

fn matched_values(rows: &[StringRow]) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .filter(|row| row.is_matched())
        .map(|row| row.join_with(&concat))
        .collect();
    values.sort();
    values
}

#[test]
fn test_scenario_inner_basic_match() {
    let mut join = coordinator(JoinConfig::inner(JoinWindowSpec::of("a").within(100)));
    assert!(join.process_left(record(0, "X0", 0)).is_empty());
    let rows = join.process_right(record(0, "Y0", 0));
    assert_eq!(render(&rows), vec!["0:X0+Y0"]);
}

#[test]
fn test_scenario_outer_speculative_then_match() {
    let mut join = coordinator(JoinConfig::left_outer(JoinWindowSpec::of("b").within(100)));
    let first = join.process_left(record(2, "X2", 0));
    assert_eq!(render(&first), vec!["2:X2+null"]);
    assert_eq!(first[0].timestamp_ms, 0);

    let second = join.process_right(record(2, "Y2", 50));
    assert_eq!(render(&second), vec!["2:X2+Y2"]);
    assert_eq!(second[0].timestamp_ms, 50);

    // Exactly one speculative row, never retracted
    assert_eq!(join.stats().unmatched_emitted, 1);
    assert_eq!(join.stats().matches_emitted, 1);
}

#[test]
fn test_scenario_expiry_boundary() {
    let mut join = coordinator(JoinConfig::inner(JoinWindowSpec::of("c").within(100)));
    for (i, key) in [0u32, 1, 2, 3].into_iter().enumerate() {
        join.process_left(record(key, &format!("X{}", key), 1_000 + i as i64));
    }
    // Same key everywhere so the only filter is time
    let mut join_one_key = coordinator(JoinConfig::inner(JoinWindowSpec::of("c").within(100)));
    for ts in 1_000..=1_003 {
        join_one_key.process_left(record(7, &format!("L{}", ts), ts));
    }
    let rows = join_one_key.process_right(record(7, "R", 1_101));
    assert_eq!(render(&rows), vec!["7:L1001+R", "7:L1002+R", "7:L1003+R"]);

    let rows = join.process_right(record(0, "YY0", 1_101));
    assert!(rows.is_empty());
}

#[test]
fn test_scenario_backward_reprobe() {
    let mut join = coordinator(JoinConfig::inner(JoinWindowSpec::of("d").within(100)));
    join.process_left(record(1, "early", 1_000));
    join.process_left(record(1, "late", 1_090));
    // Left watermark at 1090, cutoff 990: both still retained
    assert_eq!(join.left_store().watermark(), Some(1_090));

    // A right record far behind the left watermark still matches what is in its window
    let rows = join.process_right(record(1, "Y", 950));
    assert_eq!(render(&rows), vec!["1:early+Y"]);
}

#[test]
fn test_pair_matches_independent_of_arrival_order() {
    let window = JoinWindowSpec::of("p1").before(30).after(80);
    for offset in -40..=90i64 {
        let right_ts = 1_000 + offset;

        let mut left_first = coordinator(JoinConfig::inner(window.clone()));
        let left_first_rows =
            left_first.process_batch(vec![left(1, "L", 1_000), right(1, "R", right_ts)]);

        let mut right_first = coordinator(JoinConfig::inner(window.clone()));
        let right_first_rows =
            right_first.process_batch(vec![right(1, "R", right_ts), left(1, "L", 1_000)]);

        let expected: Vec<String> = if (-30..=80).contains(&offset) {
            vec!["L+R".to_string()]
        } else {
            Vec::new()
        };
        assert_eq!(matched_values(&left_first_rows), expected, "offset {}", offset);
        assert_eq!(matched_values(&right_first_rows), expected, "offset {}", offset);
        if let (Some(a), Some(b)) = (left_first_rows.first(), right_first_rows.first()) {
            assert_eq!(a.timestamp_ms, b.timestamp_ms);
        }
    }
}

#[test]
fn test_interleaved_arrivals_within_retention() {
    let window = JoinWindowSpec::of("mix").within(100);
    let inputs = vec![
        left(1, "L-a", 1_000),
        right(1, "R-a", 1_020),
        left(2, "L-b", 1_030),
        right(1, "R-b", 1_090),
        right(2, "R-c", 1_040),
        left(1, "L-c", 1_060),
    ];

    let mut forward = coordinator(JoinConfig::inner(window.clone()));
    let forward_rows = forward.process_batch(inputs.clone());

    let mut reversed = coordinator(JoinConfig::inner(window));
    let reversed_rows = reversed.process_batch(inputs.into_iter().rev());

    let expected = vec![
        "L-a+R-a".to_string(),
        "L-a+R-b".to_string(),
        "L-b+R-c".to_string(),
        "L-c+R-a".to_string(),
        "L-c+R-b".to_string(),
    ];
    assert_eq!(matched_values(&forward_rows), expected);
    assert_eq!(matched_values(&reversed_rows), expected);
}

#[test]
fn test_window_bounds_are_inclusive() {
    let window = JoinWindowSpec::of("p2").before(20).after(50);

    // right.time - left.time == after matches; after + 1 does not
    let mut join = coordinator(JoinConfig::inner(window.clone()));
    join.process_left(record(1, "L", 1_000));
    assert_eq!(join.process_right(record(1, "at-after", 1_050)).len(), 1);
    assert!(join.process_right(record(1, "past-after", 1_051)).is_empty());

    // right.time - left.time == -before matches; -(before + 1) does not
    let mut join = coordinator(JoinConfig::inner(window));
    join.process_right(record(1, "at-before", 980));
    join.process_right(record(1, "past-before", 979));
    let rows = join.process_left(record(1, "L", 1_000));
    assert_eq!(render(&rows), vec!["1:L+at-before"]);
}

#[test]
fn test_expired_entries_never_match_again() {
    let mut buffer: TimestampedBuffer<u32, &str> = TimestampedBuffer::new("right", 100);
    buffer.put(1, "old", 1_000);
    assert_eq!(buffer.range_query(&1, 1_000, 1_000).count(), 1);

    // Watermark moves past 1000 + retention
    buffer.put(2, "new", 1_101);
    assert_eq!(buffer.range_query(&1, 1_000, 1_000).count(), 0);
    assert_eq!(buffer.range_query(&1, i64::MIN, i64::MAX).count(), 0);
}

#[test]
fn test_late_insert_is_not_retained() {
    let mut join = coordinator(JoinConfig::inner(JoinWindowSpec::of("p6").within(100)));
    join.process_left(record(1, "now", 10_000));
    join.process_left(record(1, "stale", 5_000));

    assert_eq!(join.left_store().len(), 1);
    assert_eq!(join.stats().left_late_drops, 1);
    assert_eq!(join.left_store().stats().late_drops, 1);

    // The stale value can never be matched later
    assert!(join.process_right(record(1, "Y", 5_000)).is_empty());
}

#[test]
fn test_late_arrival_still_probes() {
    let mut join = coordinator(JoinConfig::inner(JoinWindowSpec::of("late").within(100)));
    join.process_right(record(1, "Y", 5_000));
    join.process_left(record(1, "X", 10_000));

    // Too old for its own buffer, but the right buffer still holds a match
    let rows = join.process_left(record(1, "X-late", 5_050));
    assert_eq!(render(&rows), vec!["1:X-late+Y"]);
    assert_eq!(join.stats().left_late_drops, 1);
}

#[test]
fn test_right_outer_mirrors_left_outer() {
    let mut join = coordinator(JoinConfig::right_outer(JoinWindowSpec::of("ro").within(10)));
    assert!(join.process_left(record(1, "X", 0)).is_empty());
    assert_eq!(render(&join.process_right(record(2, "Y", 0))), vec!["2:null+Y"]);
    assert_eq!(render(&join.process_right(record(1, "Y", 5))), vec!["1:X+Y"]);
}

#[test]
fn test_outer_unmatched_emitted_per_arrival() {
    let mut join = coordinator(JoinConfig::full_outer(JoinWindowSpec::of("fo").within(10)));
    // No deduplication of speculative rows for repeated keys
    assert_eq!(render(&join.process_left(record(1, "a", 0))), vec!["1:a+null"]);
    assert_eq!(render(&join.process_left(record(1, "b", 1))), vec!["1:b+null"]);
    assert_eq!(
        render(&join.process_right(record(1, "y", 100))),
        vec!["1:null+y"]
    );
    assert_eq!(join.stats().unmatched_emitted, 3);
}

#[test]
fn test_asymmetric_window_retention() {
    let window = JoinWindowSpec::of("asym").before(10).after(500);
    let mut join = coordinator(JoinConfig::new(window, JoinType::Inner));
    assert_eq!(join.left_store().retention_ms(), 500);
    assert_eq!(join.right_store().retention_ms(), 10);

    join.process_left(record(1, "L", 1_000));
    join.process_right(record(9, "other-key", 1_400));
    // right arrival 450ms after the left entry is within `after`
    assert_eq!(render(&join.process_right(record(1, "R", 1_450))), vec!["1:L+R"]);
}

#[test]
fn test_retention_override_keeps_entries_longer() {
    let window = JoinWindowSpec::of("until").within(100).until(1_000);
    let mut join = coordinator(JoinConfig::inner(window));
    join.process_left(record(1, "L", 1_000));
    join.process_left(record(2, "L2", 1_800));
    assert_eq!(join.left_store().len(), 2);

    // Retained, but still outside the join window
    assert!(join.process_right(record(1, "R", 1_200)).is_empty());
}

#[test]
fn test_invalid_windows_rejected() {
    let negative = JoinCoordinator::<u32, String, String>::new(JoinConfig::inner(
        JoinWindowSpec::of("neg").before(-1),
    ));
    assert!(matches!(negative, Err(JoinError::Configuration { .. })));

    let short_retention = JoinCoordinator::<u32, String, String>::new(JoinConfig::inner(
        JoinWindowSpec::of("short").within(100).until(50),
    ));
    let err = short_retention.unwrap_err();
    assert!(err.is_build_time());
    assert!(err.to_string().contains("short"));
}

#[test]
fn test_tombstone_value_matches_like_any_value() {
    init_logging();
    let mut join: JoinCoordinator<u32, Option<String>, Option<String>> =
        JoinCoordinator::new(JoinConfig::full_outer(JoinWindowSpec::of("tomb").within(100)))
            .unwrap();

    let first = join.process_left(StreamRecord::new(1, None, 0));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].left, Some(None));
    assert_eq!(first[0].right, None);

    // The absent left value is buffered and matched like any other value
    let second = join.process_right(StreamRecord::new(1, Some("y".to_string()), 10));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].left, Some(None));
    assert_eq!(second[0].right, Some(Some("y".to_string())));
    assert_eq!(second[0].timestamp_ms, 10);
    assert!(second[0].is_matched());
    assert_eq!(join.left_store().len(), 1);
}

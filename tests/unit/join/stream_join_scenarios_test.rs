//! Stream-Stream Join Scenario Tests
//!
//! Multi-step sequences over keys 0..3 with a symmetric 100ms window,
//! checking the exact output of every step.

use velojoin::{JoinConfig, JoinCoordinator, JoinWindowSpec};

use crate::unit::common::{
    EXPECTED_KEYS, StringJoin, init_logging, push_left, push_right, record, render,
};

fn window() -> JoinWindowSpec {
    JoinWindowSpec::of("test").within(100)
}

fn inner_join() -> StringJoin {
    init_logging();
    JoinCoordinator::new(JoinConfig::inner(window())).unwrap()
}

fn outer_join() -> StringJoin {
    init_logging();
    JoinCoordinator::new(JoinConfig::full_outer(window())).unwrap()
}

#[test]
fn test_inner_join_sequence() {
    let mut join = inner_join();
    let first_two = &EXPECTED_KEYS[..2];

    // Other side empty: nothing to emit
    assert!(push_left(&mut join, first_two, "X", 0).is_empty());

    assert_eq!(
        push_right(&mut join, first_two, "Y", 0),
        vec!["0:X0+Y0", "1:X1+Y1"]
    );

    assert_eq!(
        push_left(&mut join, &EXPECTED_KEYS, "X", 0),
        vec!["0:X0+Y0", "1:X1+Y1"]
    );

    // Keys 0 and 1 now have two left entries each
    assert_eq!(
        push_right(&mut join, &EXPECTED_KEYS, "YY", 0),
        vec![
            "0:X0+YY0", "0:X0+YY0", "1:X1+YY1", "1:X1+YY1", "2:X2+YY2", "3:X3+YY3"
        ]
    );

    assert_eq!(
        push_left(&mut join, &EXPECTED_KEYS, "XX", 0),
        vec![
            "0:XX0+Y0", "0:XX0+YY0", "1:XX1+Y1", "1:XX1+YY1", "2:XX2+YY2", "3:XX3+YY3"
        ]
    );

    assert_eq!(
        push_right(&mut join, first_two, "YYY", 0),
        vec![
            "0:X0+YYY0",
            "0:X0+YYY0",
            "0:XX0+YYY0",
            "1:X1+YYY1",
            "1:X1+YYY1",
            "1:XX1+YYY1"
        ]
    );

    let stats = join.stats();
    assert_eq!(stats.matches_emitted, 22);
    assert_eq!(stats.unmatched_emitted, 0);
}

#[test]
fn test_outer_join_sequence() {
    let mut join = outer_join();
    let first_two = &EXPECTED_KEYS[..2];

    assert_eq!(
        push_left(&mut join, first_two, "X", 0),
        vec!["0:X0+null", "1:X1+null"]
    );

    // The speculative rows above are not retracted
    assert_eq!(
        push_right(&mut join, first_two, "Y", 0),
        vec!["0:X0+Y0", "1:X1+Y1"]
    );

    assert_eq!(
        push_left(&mut join, &EXPECTED_KEYS, "X", 0),
        vec!["0:X0+Y0", "1:X1+Y1", "2:X2+null", "3:X3+null"]
    );

    assert_eq!(
        push_right(&mut join, &EXPECTED_KEYS, "YY", 0),
        vec![
            "0:X0+YY0", "0:X0+YY0", "1:X1+YY1", "1:X1+YY1", "2:X2+YY2", "3:X3+YY3"
        ]
    );

    assert_eq!(
        push_left(&mut join, &EXPECTED_KEYS, "XX", 0),
        vec![
            "0:XX0+Y0", "0:XX0+YY0", "1:XX1+Y1", "1:XX1+YY1", "2:XX2+YY2", "3:XX3+YY3"
        ]
    );

    assert_eq!(
        push_right(&mut join, first_two, "YYY", 0),
        vec![
            "0:X0+YYY0",
            "0:X0+YYY0",
            "0:XX0+YYY0",
            "1:X1+YYY1",
            "1:X1+YYY1",
            "1:XX1+YYY1"
        ]
    );

    assert_eq!(join.stats().unmatched_emitted, 4);
}

#[test]
fn test_windowing_sequence() {
    let mut join = inner_join();
    let first_two = &EXPECTED_KEYS[..2];

    assert!(push_left(&mut join, first_two, "X", 0).is_empty());
    assert_eq!(
        push_right(&mut join, first_two, "Y", 0),
        vec!["0:X0+Y0", "1:X1+Y1"]
    );

    // Left entries at 1000, 1001, 1002, 1003
    let mut rows = Vec::new();
    for (i, &key) in EXPECTED_KEYS.iter().enumerate() {
        rows.extend(join.process_left(record(key, &format!("X{}", key), 1_000 + i as i64)));
    }
    assert!(rows.is_empty());

    // Right arrivals moving forward: left entries fall out of the window one by one
    let mut time = 1_000 + 100;
    let forward: [&[&str]; 5] = [
        &["0:X0+YY0", "1:X1+YY1", "2:X2+YY2", "3:X3+YY3"],
        &["1:X1+YY1", "2:X2+YY2", "3:X3+YY3"],
        &["2:X2+YY2", "3:X3+YY3"],
        &["3:X3+YY3"],
        &[],
    ];
    for expected in forward {
        assert_eq!(push_right(&mut join, &EXPECTED_KEYS, "YY", time), expected);
        time += 1;
    }

    // Right arrivals before the left entries: they come into the window one by one
    let mut time = 1_000 - 100 - 1;
    let backward: [&[&str]; 5] = [
        &[],
        &["0:X0+YY0"],
        &["0:X0+YY0", "1:X1+YY1"],
        &["0:X0+YY0", "1:X1+YY1", "2:X2+YY2"],
        &["0:X0+YY0", "1:X1+YY1", "2:X2+YY2", "3:X3+YY3"],
    ];
    for expected in backward {
        assert_eq!(push_right(&mut join, &EXPECTED_KEYS, "YY", time), expected);
        time += 1;
    }

    // Right entries at 2000, 2001, 2002, 2003
    let mut rows = Vec::new();
    for (i, &key) in EXPECTED_KEYS.iter().enumerate() {
        rows.extend(join.process_right(record(key, &format!("Y{}", key), 2_000 + i as i64)));
    }
    assert!(render(&rows).is_empty());

    let mut time = 2_000 + 100;
    let forward: [&[&str]; 5] = [
        &["0:XX0+Y0", "1:XX1+Y1", "2:XX2+Y2", "3:XX3+Y3"],
        &["1:XX1+Y1", "2:XX2+Y2", "3:XX3+Y3"],
        &["2:XX2+Y2", "3:XX3+Y3"],
        &["3:XX3+Y3"],
        &[],
    ];
    for expected in forward {
        assert_eq!(push_left(&mut join, &EXPECTED_KEYS, "XX", time), expected);
        time += 1;
    }

    let mut time = 2_000 - 100 - 1;
    let backward: [&[&str]; 5] = [
        &[],
        &["0:XX0+Y0"],
        &["0:XX0+Y0", "1:XX1+Y1"],
        &["0:XX0+Y0", "1:XX1+Y1", "2:XX2+Y2"],
        &["0:XX0+Y0", "1:XX1+Y1", "2:XX2+Y2", "3:XX3+Y3"],
    ];
    for expected in backward {
        assert_eq!(push_left(&mut join, &EXPECTED_KEYS, "XX", time), expected);
        time += 1;
    }
}

#[test]
fn test_windowing_expires_old_entries() {
    let mut join = inner_join();

    push_left(&mut join, &EXPECTED_KEYS, "X", 1_000);
    assert_eq!(join.left_store().len(), 4);

    // Left watermark jumps far ahead; the entries at 1000 leave the buffer
    push_left(&mut join, &[9], "X", 5_000);
    assert_eq!(join.left_store().len(), 1);
    assert_eq!(join.left_store().stats().records_expired, 4);

    // A right arrival that would have matched them finds nothing
    assert!(push_right(&mut join, &EXPECTED_KEYS, "Y", 1_000).is_empty());
}

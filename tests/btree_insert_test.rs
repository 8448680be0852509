//! Insertion and range-scan scenarios from the testable-properties list:
//! ordered retrieval, duplicate preservation, and forcing enough splits
//! to grow tree height.

mod test_utils;

use rand::seq::SliceRandom;

use index_core::cursor::Operator;
use index_core::key::IntKey;
use index_core::rid::Rid;
use index_core::BTreeIndex;

fn open_empty_index(name: &str) -> BTreeIndex<IntKey> {
    let dir = test_utils::scratch_dir(name);
    let relation_path = dir.join("students.rel");
    test_utils::write_empty_relation(&relation_path, 16);
    BTreeIndex::<IntKey>::open_or_create(&dir, "students", 0, &relation_path, 16).unwrap()
}

/// S1: insert `[5,3,8,1,9,2,7,4,6]` with rids `(1,1)..(1,9)`; scan
/// `(GTE 3, LTE 7)` returns keys 3,4,5,6,7 in order.
#[test]
fn s1_bounded_inclusive_scan_returns_ascending_order() {
    let mut index = open_empty_index("s1");
    let keys = [5, 3, 8, 1, 9, 2, 7, 4, 6];
    for (i, k) in keys.iter().enumerate() {
        index.insert_entry(IntKey(*k), Rid::new(1, (i + 1) as u32)).unwrap();
    }

    index.start_scan(IntKey(3), Operator::Gte, IntKey(7), Operator::Lte).unwrap();
    let mut got = Vec::new();
    loop {
        match index.scan_next() {
            Ok(rid) => got.push(rid),
            Err(_) => break,
        }
    }
    index.end_scan().unwrap();

    let expected_keys = [3, 4, 5, 6, 7];
    let expected_rids: Vec<Rid> = expected_keys
        .iter()
        .map(|k| Rid::new(1, keys.iter().position(|x| x == k).unwrap() as u32 + 1))
        .collect();
    assert_eq!(got, expected_rids);
}

/// S2: insert `1..1000` ascending; scan `(GT 500, LT 505)` returns exactly
/// `501..=504`.
#[test]
fn s2_ascending_insert_then_open_interval_scan() {
    let mut index = open_empty_index("s2");
    for k in 1..1000 {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(500), Operator::Gt, IntKey(505), Operator::Lt).unwrap();
    let got: Vec<u32> = index.scan_iter().map(|r| r.slot_number).collect();
    index.end_scan().unwrap();

    assert_eq!(got, vec![501, 502, 503, 504]);
}

/// S4: force at least three root splits (tree height >= 3), then check
/// P3 (leaf chain visits every leaf once in ascending order) and P4 (all
/// leaves at equal depth, indirectly verified by a full ascending scan
/// never skipping or repeating a key).
#[test]
fn s4_many_splits_preserve_leaf_chain_order() {
    let mut index = open_empty_index("s4");
    let n = 20_000;
    for k in 0..n {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(i32::MIN), Operator::Gte, IntKey(i32::MAX), Operator::Lte).unwrap();
    let got: Vec<u32> = index.scan_iter().map(|r| r.slot_number).collect();
    index.end_scan().unwrap();

    assert_eq!(got.len(), n as usize);
    for w in got.windows(2) {
        assert!(w[0] < w[1], "leaf chain produced out-of-order keys: {} then {}", w[0], w[1]);
    }
}

/// S3: insert `1..=10000` in random order, twice each (duplicates); a
/// point scan `(GTE 100, LTE 100)` returns exactly the 2 rids for key
/// 100, and a full scan confirms every entry still shows up (P1).
#[test]
fn s3_randomized_duplicate_inserts_point_scan_returns_exactly_two() {
    let mut index = open_empty_index("s3");
    let mut rng = rand::thread_rng();

    let mut order: Vec<i32> = (1..=10_000).collect();
    order.shuffle(&mut rng);

    let mut next_slot = 1u32;
    for k in order {
        for _ in 0..2 {
            index.insert_entry(IntKey(k), Rid::new(1, next_slot)).unwrap();
            next_slot += 1;
        }
    }

    index.start_scan(IntKey(100), Operator::Gte, IntKey(100), Operator::Lte).unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();
    assert_eq!(got.len(), 2);

    index.start_scan(IntKey(i32::MIN), Operator::Gte, IntKey(i32::MAX), Operator::Lte).unwrap();
    let keys_seen = index.scan_iter().count();
    index.end_scan().unwrap();
    assert_eq!(keys_seen, 20_000);
}

/// Duplicate keys are permitted and both survive a point range scan.
#[test]
fn duplicates_are_preserved() {
    let mut index = open_empty_index("dups");
    index.insert_entry(IntKey(100), Rid::new(1, 1)).unwrap();
    index.insert_entry(IntKey(100), Rid::new(1, 2)).unwrap();

    index.start_scan(IntKey(100), Operator::Gte, IntKey(100), Operator::Lte).unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();

    assert_eq!(got, vec![Rid::new(1, 1), Rid::new(1, 2)]);
}

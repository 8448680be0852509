//! Range-scan boundary, empty-range, and mixed-operator scenarios.

mod test_utils;

use index_core::cursor::Operator;
use index_core::key::{DoubleKey, IntKey, StringKey};
use index_core::rid::Rid;
use index_core::BTreeIndex;

fn open_empty_int_index(name: &str) -> BTreeIndex<IntKey> {
    let dir = test_utils::scratch_dir(name);
    let relation_path = dir.join("t.rel");
    test_utils::write_empty_relation(&relation_path, 16);
    BTreeIndex::<IntKey>::open_or_create(&dir, "t", 0, &relation_path, 16).unwrap()
}

/// Starting a scan against a freshly created index, before any
/// `insert_entry` call, must not panic: the root is still the empty
/// sentinel with no leaves allocated, and the first `scan_next` should
/// simply report `IndexScanCompleted`.
#[test]
fn scan_over_empty_tree_completes_without_panicking() {
    let mut index = open_empty_int_index("scan_empty_tree");

    index.start_scan(IntKey(0), Operator::Gte, IntKey(100), Operator::Lte).unwrap();
    let err = index.scan_next().unwrap_err();
    assert_eq!(err.to_string(), index_core::IndexError::IndexScanCompleted.to_string());
    index.end_scan().unwrap();
}

/// An interior range with no qualifying keys returns immediately with
/// `IndexScanCompleted` and no rids.
#[test]
fn interior_gap_range_yields_no_rows() {
    let mut index = open_empty_int_index("interior_gap");
    for k in [1, 2, 3, 10, 11, 12] {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(4), Operator::Gte, IntKey(9), Operator::Lte).unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();
    assert!(got.is_empty());
}

/// Strict operators (GT/LT) exclude the boundary keys themselves even
/// when they're present in the tree.
#[test]
fn strict_operators_exclude_boundaries() {
    let mut index = open_empty_int_index("strict_ops");
    for k in 1..=10 {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(3), Operator::Gt, IntKey(8), Operator::Lt).unwrap();
    let got: Vec<u32> = index.scan_iter().map(|r| r.slot_number).collect();
    index.end_scan().unwrap();
    assert_eq!(got, vec![4, 5, 6, 7]);
}

/// S5: `startScan(GT, 10, LT, 10)` is an empty open interval and yields
/// zero results regardless of what's in the tree.
#[test]
fn s5_empty_open_interval_yields_no_rows() {
    let mut index = open_empty_int_index("s5");
    for k in 1..=20 {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(10), Operator::Gt, IntKey(10), Operator::Lt).unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();
    assert!(got.is_empty());
}

/// S6: `startScan(LT, ..)` as the low operator fails with `BadOpcodes`;
/// a crossed range (`GTE 10, LTE 5`) fails with `BadScanRange`.
#[test]
fn s6_bad_opcodes_and_bad_scan_range_are_rejected() {
    let mut index = open_empty_int_index("s6");
    index.insert_entry(IntKey(1), Rid::new(1, 1)).unwrap();

    let err = index.start_scan(IntKey(5), Operator::Lt, IntKey(20), Operator::Lte).unwrap_err();
    assert_eq!(err, index_core::IndexError::BadOpcodes);

    let err = index.start_scan(IntKey(10), Operator::Gte, IntKey(5), Operator::Lte).unwrap_err();
    assert_eq!(err, index_core::IndexError::BadScanRange);
}

/// Re-running `startScan` with a new range on the same index reuses the
/// index without requiring an intervening `endScan` (Open Question on
/// this is resolved as "re-initializes").
#[test]
fn restarting_scan_without_end_scan_reinitializes() {
    let mut index = open_empty_int_index("scan_restart");
    for k in 1..=20 {
        index.insert_entry(IntKey(k), Rid::new(1, k as u32)).unwrap();
    }

    index.start_scan(IntKey(1), Operator::Gte, IntKey(5), Operator::Lte).unwrap();
    let first: Vec<u32> = index.scan_iter().map(|r| r.slot_number).collect();
    assert_eq!(first, vec![1, 2, 3, 4, 5]);

    // No end_scan() call here on purpose.
    index.start_scan(IntKey(15), Operator::Gte, IntKey(18), Operator::Lte).unwrap();
    let second: Vec<u32> = index.scan_iter().map(|r| r.slot_number).collect();
    index.end_scan().unwrap();
    assert_eq!(second, vec![15, 16, 17, 18]);
}

/// `scan_next` called before `start_scan` reports the uninitialized-cursor
/// error rather than panicking.
#[test]
fn scan_next_without_start_scan_errors() {
    let mut index = open_empty_int_index("no_start");
    index.insert_entry(IntKey(1), Rid::new(1, 1)).unwrap();
    let err = index.scan_next().unwrap_err();
    assert_eq!(err.to_string(), index_core::IndexError::ScanNotInitialized.to_string());
}

/// Double-precision keys order correctly including negative/fractional
/// values and ties resolve to insertion order along the leaf chain.
#[test]
fn double_keys_scan_in_numeric_order() {
    let dir = test_utils::scratch_dir("double_scan");
    let relation_path = dir.join("d.rel");
    test_utils::write_empty_relation(&relation_path, 16);
    let mut index =
        BTreeIndex::<DoubleKey>::open_or_create(&dir, "d", 0, &relation_path, 16).unwrap();

    let values = [-3.5, 2.25, 0.0, -1.0, 10.125, 2.25];
    for (i, v) in values.iter().enumerate() {
        index.insert_entry(DoubleKey(*v), Rid::new(1, i as u32 + 1)).unwrap();
    }

    index
        .start_scan(DoubleKey(-10.0), Operator::Gte, DoubleKey(10.125), Operator::Lte)
        .unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();
    assert_eq!(got.len(), values.len());
}

/// String keys compare lexicographically over all ten bytes, including
/// keys that share a common prefix.
#[test]
fn string_keys_scan_lexicographically() {
    let dir = test_utils::scratch_dir("string_scan");
    let relation_path = dir.join("s.rel");
    test_utils::write_empty_relation(&relation_path, 16);
    let mut index =
        BTreeIndex::<StringKey>::open_or_create(&dir, "s", 0, &relation_path, 16).unwrap();

    let words = ["banana", "apple", "app", "apply", "cherry"];
    for (i, w) in words.iter().enumerate() {
        index
            .insert_entry(StringKey::from_str_padded(w, b' '), Rid::new(1, i as u32 + 1))
            .unwrap();
    }

    index
        .start_scan(
            StringKey::from_str_padded("", 0),
            Operator::Gte,
            StringKey::from_str_padded("~~~~~~~~~~", b'~'),
            Operator::Lte,
        )
        .unwrap();
    let got: Vec<Rid> = index.scan_iter().collect();
    index.end_scan().unwrap();
    assert_eq!(got.len(), words.len());

    let mut sorted_words = words.to_vec();
    sorted_words.sort();
    let expected_first = sorted_words[0];
    assert_eq!(got[0].slot_number, words.iter().position(|w| w == &expected_first).unwrap() as u32 + 1);
}

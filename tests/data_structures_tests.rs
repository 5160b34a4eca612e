//! Integration tests for UInt32BitSet

use ecmawalk::UInt32BitSet;

#[test]
fn test_set_range_spans_words() {
    let mut bits = UInt32BitSet::new();
    bits.set_range(60, 70);
    assert!(!bits.get(59));
    assert!((60..70).all(|i| bits.get(i)));
    assert!(!bits.get(70));
    assert_eq!(bits.count(), 10);
}

#[test]
fn test_last_set_bit() {
    let mut bits = UInt32BitSet::new();
    assert_eq!(bits.last_set_bit(200), -1);
    bits.set(100);
    assert_eq!(bits.last_set_bit(200), 100);
    assert_eq!(bits.last_set_bit(100), 100);
    assert_eq!(bits.last_set_bit(99), -1);
}

#[test]
fn test_clear_from() {
    let mut bits = UInt32BitSet::new();
    bits.set_range(0, 128);
    bits.clear_from(64);
    assert_eq!(bits.count(), 64);
    assert_eq!(bits.last_set_bit(u32::MAX), 63);
}

#[test]
fn test_high_indices() {
    let mut bits = UInt32BitSet::new();
    bits.set(u32::MAX);
    assert!(bits.get(u32::MAX));
    assert_eq!(bits.last_set_bit(u32::MAX), i64::from(u32::MAX));
    bits.clear(u32::MAX);
    assert!(bits.is_empty());
}

#[test]
fn test_next_set_bit() {
    let mut bits = UInt32BitSet::new();
    bits.set(5);
    bits.set(300);
    assert_eq!(bits.next_set_bit(0), Some(5));
    assert_eq!(bits.next_set_bit(6), Some(300));
    assert_eq!(bits.next_set_bit(301), None);
}

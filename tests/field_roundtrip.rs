//! Round-trip property tests for [`cib::matcher::Field`] (§8): inserting a
//! value that fits a field's declared width, then extracting it, returns the
//! original value — across single- and multi-slice fields.

use cib::matcher::{Field, Slice};

#[test]
fn single_byte_field_round_trips() {
    let field = Field::single("status", 0, 7, 0);
    let mut buf = [0u8; 1];
    for v in 0u64..=255 {
        field.insert(&mut buf, v);
        assert_eq!(field.extract(&buf), v);
    }
}

#[test]
fn sub_byte_field_round_trips_without_disturbing_neighboring_bits() {
    // bits 3..=5 of byte 0: a 3-bit field, neighbors left untouched.
    let field = Field::single("mode", 0, 5, 3);
    let mut buf = [0b1000_0001u8];
    field.insert(&mut buf, 0b101);
    assert_eq!(field.extract(&buf), 0b101);
    // bit 0 and bit 7 (outside the field) are unchanged.
    assert_eq!(buf[0] & 0b1000_0001, 0b1000_0001);
}

#[test]
fn multi_slice_field_concatenates_msb_first() {
    // A 12-bit field spread across two bytes: the high 4 bits live in byte 0
    // (bits 3..=0), the low 8 bits in byte 1 (bits 7..=0).
    let field = Field::new(
        "wide",
        vec![
            Slice { word_index: 0, msb: 3, lsb: 0 },
            Slice { word_index: 1, msb: 7, lsb: 0 },
        ],
    );
    assert_eq!(field.width(), 12);

    let mut buf = [0u8; 2];
    for v in [0u64, 1, 0xFF, 0x0AB, 0xFFF] {
        field.insert(&mut buf, v);
        assert_eq!(field.extract(&buf), v, "round-trip failed for {v:#x}");
    }
}

#[test]
fn three_slice_field_round_trips() {
    let field = Field::new(
        "triple",
        vec![
            Slice { word_index: 0, msb: 1, lsb: 0 },
            Slice { word_index: 1, msb: 7, lsb: 0 },
            Slice { word_index: 2, msb: 2, lsb: 0 },
        ],
    );
    assert_eq!(field.width(), 2 + 8 + 3);

    let mut buf = [0u8; 3];
    for v in [0u64, 1, 0b11_10101010_101, 0b10_00000000_000] {
        field.insert(&mut buf, v);
        assert_eq!(field.extract(&buf), v, "round-trip failed for {v:#x}");
    }
}

use super::{DecTable, EncTable, MIN_TABLE_SER_SIZE, TABLE_SER_END_FLAG, TABLE_SER_START_FLAG};

use crate::code::BitCode;
use crate::error::HuffError;
use crate::huffman::{count_frequencies, HuffmanTree};

fn table_for(data: &[u8]) -> EncTable {
    let tree = HuffmanTree::new(count_frequencies(data)).unwrap();
    EncTable::new(&tree)
}

#[test]
fn test_enc_table_covers_all_bytes() {
    let table = table_for(b"aabbcceef");

    assert_eq!(table.item_num(), 5);
    for b in [b'a', b'b', b'c', b'e', b'f'] {
        assert!(table.get(b).is_some(), "missing code for {b}");
    }
    assert!(table.get(b'z').is_none());
}

#[test]
fn test_enc_table_empty() {
    let table = table_for(b"");

    assert_eq!(table.item_num(), 0);
    assert!(table.iter().next().is_none());
}

#[test]
fn test_dec_table_inverts_enc_table() {
    let enc = table_for(b"the quick brown fox jumps over the lazy dog");
    let dec = DecTable::from(&enc);

    assert_eq!(enc.item_num(), dec.item_num());
    for (byte, code) in enc.iter() {
        assert_eq!(dec.get(code), Some(byte));
    }
}

#[test]
fn test_dec_table_lookup_needs_exact_length() {
    let mut short = BitCode::new();
    short.append_zero();
    let mut long = short;
    long.append_zero();

    let enc = table_for(b"iiiiii");
    let dec = DecTable::from(&enc);

    assert_eq!(dec.get(short), Some(b'i'));
    assert_eq!(dec.get(long), None);
}

#[test]
fn test_serialized_layout() {
    let table = table_for(b"iiiiii");
    let ser = table.serialize();

    assert_eq!(ser.len(), MIN_TABLE_SER_SIZE + 5);
    assert_eq!(&ser[0..4], &TABLE_SER_START_FLAG.to_be_bytes());
    assert_eq!(&ser[4..8], &1u32.to_be_bytes());
    // single item: byte 'i', code "0" packed as length 1, bits 0
    assert_eq!(ser[8], b'i');
    assert_eq!(&ser[9..13], &0x0100_0000u32.to_be_bytes());
    assert_eq!(&ser[17..21], &TABLE_SER_END_FLAG.to_be_bytes());
}

#[test]
fn test_serialization_round_trip() {
    let enc = table_for(b"aabbcceef");
    let ser = enc.serialize();

    let enc2 = EncTable::deserialize(&ser).unwrap();
    assert_eq!(enc, enc2);

    let dec = DecTable::deserialize(&ser).unwrap();
    assert_eq!(dec, DecTable::from(&enc));
}

#[test]
fn test_serialization_round_trip_full_alphabet() {
    let all: Vec<u8> = (0..=255u8).flat_map(|b| vec![b; b as usize + 1]).collect();
    let enc = table_for(&all);
    assert_eq!(enc.item_num(), 256);

    let restored = EncTable::deserialize(&enc.serialize()).unwrap();
    assert_eq!(enc, restored);
}

#[test]
fn test_deserialize_too_small() {
    let err = EncTable::deserialize(&[0u8; 3]).unwrap_err();
    assert!(matches!(err, HuffError::TooSmall { len: 3, .. }));
}

#[test]
fn test_deserialize_bad_start_flag() {
    let mut ser = table_for(b"abc").serialize();
    ser[0] ^= 0xFF;

    let err = EncTable::deserialize(&ser).unwrap_err();
    assert!(matches!(err, HuffError::BadStartFlag));
}

#[test]
fn test_deserialize_bad_end_flag() {
    let mut ser = table_for(b"abc").serialize();
    let last = ser.len() - 1;
    ser[last] ^= 0xFF;

    let err = EncTable::deserialize(&ser).unwrap_err();
    assert!(matches!(err, HuffError::BadEndFlag));
}

#[test]
fn test_deserialize_corrupt_item_is_rejected() {
    let mut ser = table_for(b"aabbcceef").serialize();
    // flip a bit inside the first table item
    ser[10] ^= 0x10;

    let err = DecTable::deserialize(&ser).unwrap_err();
    assert!(matches!(err, HuffError::ChecksumMismatch { .. }));
}

#[test]
fn test_every_single_byte_flip_is_rejected() {
    let ser = table_for(b"aabbcceef").serialize();
    let crc_at = ser.len() - 8;

    for i in 0..ser.len() {
        let mut corrupt = ser.clone();
        corrupt[i] ^= 0x01;

        let res = DecTable::deserialize(&corrupt);
        let err = match res {
            Err(e) => e,
            Ok(_) => panic!("flip at {i} was accepted"),
        };

        match i {
            i if i < 4 => assert!(matches!(err, HuffError::BadStartFlag)),
            i if i < crc_at => assert!(matches!(
                err,
                HuffError::ChecksumMismatch { .. }
                    | HuffError::Overflow { .. }
                    | HuffError::BadEndFlag
            )),
            i if i < crc_at + 4 => assert!(matches!(err, HuffError::ChecksumMismatch { .. })),
            _ => assert!(matches!(err, HuffError::BadEndFlag)),
        }
    }
}

#[test]
fn test_deserialize_truncated_items() {
    let ser = table_for(b"aabbcceef").serialize();
    let err = EncTable::deserialize(&ser[..ser.len() - 9]).unwrap_err();

    assert!(matches!(
        err,
        HuffError::Overflow { .. } | HuffError::ChecksumMismatch { .. }
    ));
}

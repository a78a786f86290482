use std::collections::HashMap;

use log::warn;

use crate::code::BitCode;
use crate::error::{HuffError, Result};
use crate::huffman::HuffmanTree;
use crate::utils::{self, checksum};

#[cfg(test)]
mod tests;

/// Leading sentinel of a serialized table ("HFES").
pub const TABLE_SER_START_FLAG: u32 = 0x4846_4553;
/// Trailing sentinel of a serialized table ("HFEE").
pub const TABLE_SER_END_FLAG: u32 = 0x4846_4545;

const META_SIZE: usize = 4;
const TABLE_ITEM_SIZE: usize = 5;

/// Smallest possible serialization: both flags, the item count and the CRC.
pub const MIN_TABLE_SER_SIZE: usize = 4 * META_SIZE;

/// Byte → code mapping used while encoding.
///
/// Backed by a 256-slot array so the per-input-byte lookup is an index, not
/// a hash.
#[derive(Clone, PartialEq)]
pub struct EncTable {
    codes: [Option<BitCode>; 256],
    len: usize,
}

impl Default for EncTable {
    fn default() -> Self {
        EncTable {
            codes: [None; 256],
            len: 0,
        }
    }
}

impl EncTable {
    /// Collects the code of every leaf of `tree`.
    pub fn new(tree: &HuffmanTree) -> Self {
        let mut table = EncTable::default();
        for &id in tree.leaves() {
            let node = tree.node(id);
            if let Some(code) = node.code() {
                table.insert(node.byte, code);
            }
        }

        table
    }

    fn insert(&mut self, byte: u8, code: BitCode) {
        if self.codes[byte as usize].is_none() {
            self.len += 1;
        }
        self.codes[byte as usize] = Some(code);
    }

    /// The code for `byte`, if the table covers it.
    pub fn get(&self, byte: u8) -> Option<BitCode> {
        self.codes[byte as usize]
    }

    /// Number of bytes the table covers.
    pub fn item_num(&self) -> usize {
        self.len
    }

    /// Present entries in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, BitCode)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(byte, code)| code.map(|c| (byte as u8, c)))
    }

    /// Serializes the table (big-endian):
    ///
    /// ```text
    /// START_FLAG   4 bytes
    /// ITEM_COUNT   4 bytes u32
    /// ITEM × N     1 byte + 4 bytes packed code
    /// CRC32        4 bytes, over everything above
    /// END_FLAG     4 bytes
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let n = self.item_num();
        let mut ser = Vec::with_capacity(MIN_TABLE_SER_SIZE + TABLE_ITEM_SIZE * n);

        utils::write_u32_to_bytes(TABLE_SER_START_FLAG, &mut ser);
        utils::write_u32_to_bytes(n as u32, &mut ser);
        for (byte, code) in self.iter() {
            ser.push(byte);
            utils::write_u32_to_bytes(code.packed(), &mut ser);
        }

        let crc = checksum::crc32(&ser);
        utils::write_u32_to_bytes(crc, &mut ser);
        utils::write_u32_to_bytes(TABLE_SER_END_FLAG, &mut ser);

        ser
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut table = EncTable::default();
        for (byte, code) in parse_table_items(data)? {
            table.insert(byte, code);
        }

        Ok(table)
    }
}

impl std::fmt::Debug for EncTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(b, c)| (b, c.to_string())))
            .finish()
    }
}

/// Code → byte mapping used while decoding; the inverse of [`EncTable`].
///
/// Keyed by the packed (length, bits) value, so two codes only match when
/// both their length and their bits agree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecTable {
    map: HashMap<BitCode, u8>,
}

impl DecTable {
    /// The byte `code` stands for, if any.
    pub fn get(&self, code: BitCode) -> Option<u8> {
        self.map.get(&code).copied()
    }

    /// Number of codes the table covers.
    pub fn item_num(&self) -> usize {
        self.map.len()
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut map = HashMap::new();
        for (byte, code) in parse_table_items(data)? {
            map.insert(code, byte);
        }

        Ok(DecTable { map })
    }
}

impl From<&EncTable> for DecTable {
    fn from(enc: &EncTable) -> Self {
        let mut map = HashMap::with_capacity(enc.item_num());
        for (byte, code) in enc.iter() {
            map.insert(code, byte);
        }

        DecTable { map }
    }
}

/// Shared deserialization driver: validates the envelope and yields the raw
/// items. Both table directions are rebuilt from the same wire bytes.
fn parse_table_items(data: &[u8]) -> Result<Vec<(u8, BitCode)>> {
    if data.len() < MIN_TABLE_SER_SIZE {
        return Err(HuffError::TooSmall {
            len: data.len(),
            need: MIN_TABLE_SER_SIZE,
        });
    }

    let mut cursor = 0;
    if utils::read_u32_at(data, cursor)? != TABLE_SER_START_FLAG {
        return Err(HuffError::BadStartFlag);
    }
    cursor += META_SIZE;

    let item_num = utils::read_u32_at(data, cursor)? as usize;
    cursor += META_SIZE;

    let mut items = Vec::with_capacity(item_num.min(256));
    for _ in 0..item_num {
        let byte = utils::read_u8_at(data, cursor)?;
        let packed = utils::read_u32_at(data, cursor + 1)?;
        cursor += TABLE_ITEM_SIZE;
        items.push((byte, BitCode::from_packed(packed)));
    }

    let expected = utils::read_u32_at(data, cursor)?;
    let actual = checksum::crc32(&data[..cursor]);
    if expected != actual {
        warn!("expected checksum is {expected:#x}, but got {actual:#x}");
        return Err(HuffError::ChecksumMismatch { expected, actual });
    }
    cursor += META_SIZE;

    if utils::read_u32_at(data, cursor)? != TABLE_SER_END_FLAG {
        return Err(HuffError::BadEndFlag);
    }

    Ok(items)
}

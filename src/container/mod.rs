use log::{debug, warn};

use crate::bitstreams::{BitsReader, BitsWriter};
use crate::error::{HuffError, Result};
use crate::huffman::{count_frequencies, HuffmanTree};
use crate::table::{DecTable, EncTable, MIN_TABLE_SER_SIZE};
use crate::utils::{self, checksum};


/// Leading container sentinel ("RY").
pub const CONTAINER_START_FLAG: u16 = 0x5259;
/// Trailing container sentinel ("AN").
pub const CONTAINER_END_FLAG: u16 = 0x414E;

/// Fixed-width container bytes: both sentinels, the four header sizes, the
/// table length, the payload bit-length fields and the CRC. The filename,
/// serialized table and payload come on top.
pub const CONTAINER_OVERHEAD: usize = 27;

/// Smallest parseable container: the fixed fields plus an empty table.
pub const MIN_CONTAINER_SIZE: usize = CONTAINER_OVERHEAD + MIN_TABLE_SER_SIZE;

/// Result of unpacking a container.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    /// Basename the compressor recorded; informational only.
    pub filename: String,
    /// The recovered original bytes.
    pub data: Vec<u8>,
}

/// Compresses `data` with a code table derived from its own frequencies.
///
/// Returns the packed buffer and the number of valid bits in it.
pub fn compress_bytes(data: &[u8]) -> Result<(Vec<u8>, u64)> {
    let tree = HuffmanTree::new(count_frequencies(data))?;
    let table = EncTable::new(&tree);

    compress_bytes_with(data, &table)
}

fn compress_bytes_with(data: &[u8], table: &EncTable) -> Result<(Vec<u8>, u64)> {
    let mut writer = BitsWriter::new();
    let mut total_bits = 0u64;

    for (offset, &byte) in data.iter().enumerate() {
        let code = table
            .get(byte)
            .ok_or(HuffError::CodeMissing { byte, offset })?;
        total_bits += code.bit_len() as u64;
        writer.write_code(code)?;
    }

    Ok((writer.buf(), total_bits))
}

/// Decodes `bit_len` valid bits of `data` against `table`.
pub fn decompress_bytes(data: &[u8], bit_len: u64, table: &DecTable) -> Result<Vec<u8>> {
    BitsReader::new(data, bit_len, table).read_all()
}

/// Builds a complete container (big-endian):
///
/// ```text
/// HEADER  start_flag u16, filename_len u16, original_size u32,
///         compressed_size u32, filename
/// DATA    table_ser_len u32, table_ser, payload_bytes_needed u32,
///         payload_slot u8, payload
/// TAIL    crc32 u32 over all preceding bytes, end_flag u16
/// ```
///
/// `filename` should be a basename; it is stored verbatim and only read
/// back for information.
pub fn pack(data: &[u8], filename: &str) -> Result<Vec<u8>> {
    if data.len() > u32::MAX as usize {
        return Err(HuffError::InputTooLarge { len: data.len() });
    }
    if filename.len() > u16::MAX as usize {
        return Err(HuffError::InputTooLarge {
            len: filename.len(),
        });
    }

    let tree = HuffmanTree::new(count_frequencies(data))?;
    let enc_table = EncTable::new(&tree);
    let (payload, bit_len) = compress_bytes_with(data, &enc_table)?;
    let table_ser = enc_table.serialize();

    let bytes_needed = bit_len.div_ceil(8) as u32;
    let slot = (bit_len % 8) as u8;

    let mut out =
        Vec::with_capacity(CONTAINER_OVERHEAD + filename.len() + table_ser.len() + payload.len());

    // header
    utils::write_u16_to_bytes(CONTAINER_START_FLAG, &mut out);
    utils::write_u16_to_bytes(filename.len() as u16, &mut out);
    utils::write_u32_to_bytes(data.len() as u32, &mut out);
    utils::write_u32_to_bytes(payload.len() as u32, &mut out);
    out.extend_from_slice(filename.as_bytes());

    // data area
    utils::write_u32_to_bytes(table_ser.len() as u32, &mut out);
    out.extend_from_slice(&table_ser);
    utils::write_u32_to_bytes(bytes_needed, &mut out);
    out.push(slot);
    out.extend_from_slice(&payload);

    // tail
    let crc = checksum::crc32(&out);
    utils::write_u32_to_bytes(crc, &mut out);
    utils::write_u16_to_bytes(CONTAINER_END_FLAG, &mut out);

    debug!(
        "packed {} bytes into a {} byte container ({} payload bits)",
        data.len(),
        out.len(),
        bit_len
    );

    Ok(out)
}

/// Parses a container and recovers the original bytes.
///
/// Walks the layout [`pack`] writes: header, decode table, payload bit
/// length, payload, then validates the CRC over everything preceding it and
/// the end sentinel.
pub fn unpack(data: &[u8]) -> Result<Unpacked> {
    if data.len() < MIN_CONTAINER_SIZE {
        return Err(HuffError::TooSmall {
            len: data.len(),
            need: MIN_CONTAINER_SIZE,
        });
    }

    let mut cursor = 0usize;

    if utils::read_u16_at(data, cursor)? != CONTAINER_START_FLAG {
        return Err(HuffError::BadStartFlag);
    }
    cursor += 2;

    let filename_len = utils::read_u16_at(data, cursor)? as usize;
    cursor += 2;
    let original_size = utils::read_u32_at(data, cursor)? as usize;
    cursor += 4;
    let compressed_size = utils::read_u32_at(data, cursor)? as usize;
    cursor += 4;

    let filename_bytes = data
        .get(cursor..cursor + filename_len)
        .ok_or(HuffError::Overflow { at: cursor })?;
    let filename = String::from_utf8_lossy(filename_bytes).into_owned();
    cursor += filename_len;

    let table_ser_len = utils::read_u32_at(data, cursor)? as usize;
    cursor += 4;
    let table_ser = data
        .get(cursor..cursor + table_ser_len)
        .ok_or(HuffError::Overflow { at: cursor })?;
    let dec_table = DecTable::deserialize(table_ser)?;
    cursor += table_ser_len;

    let bytes_needed = utils::read_u32_at(data, cursor)? as usize;
    cursor += 4;
    let slot = utils::read_u8_at(data, cursor)?;
    cursor += 1;

    let payload = data
        .get(cursor..cursor + compressed_size)
        .ok_or(HuffError::Overflow { at: cursor })?;
    cursor += compressed_size;

    // The declared bit length must describe exactly the payload bytes,
    // otherwise the bit reader would run off the buffer.
    if slot >= 8 || bytes_needed != payload.len() || (bytes_needed == 0 && slot != 0) {
        return Err(HuffError::Overflow { at: cursor });
    }
    let valid_bits = if slot == 0 {
        bytes_needed as u64 * 8
    } else {
        (bytes_needed as u64 - 1) * 8 + slot as u64
    };

    let recovered = decompress_bytes(payload, valid_bits, &dec_table)?;

    let expected = utils::read_u32_at(data, cursor)?;
    let actual = checksum::crc32(&data[..cursor]);
    if expected != actual {
        warn!("expected checksum is {expected:#x}, but got {actual:#x}");
        return Err(HuffError::ChecksumMismatch { expected, actual });
    }
    cursor += 4;

    if utils::read_u16_at(data, cursor)? != CONTAINER_END_FLAG {
        return Err(HuffError::BadEndFlag);
    }

    debug!(
        "unpacked {} bytes (header said {original_size})",
        recovered.len()
    );

    Ok(Unpacked {
        filename,
        data: recovered,
    })
}

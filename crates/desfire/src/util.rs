//! Byte-level helpers for the DESFire native wire format

use bytes::BytesMut;

use crate::constants::BLOCK_SIZE;

/// Encode a value as 2 bytes, least significant byte first
pub(crate) const fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Encode a value as 3 bytes, least significant byte first
pub(crate) const fn u24_le(value: u32) -> [u8; 3] {
    let bytes = value.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Rotate a 16-byte value left by one byte
pub(crate) fn rotate_left(value: &[u8; 16]) -> [u8; 16] {
    core::array::from_fn(|i| value[(i + 1) % 16])
}

/// Rotate a 16-byte value right by one byte
pub(crate) fn rotate_right(value: &[u8; 16]) -> [u8; 16] {
    core::array::from_fn(|i| value[(i + 15) % 16])
}

/// Append ISO/IEC 9797-1 padding method 2: a 0x80 marker byte, then zeros
/// up to the block boundary. Always adds at least one byte.
pub(crate) fn pad_method2(data: &mut BytesMut) {
    data.extend_from_slice(&[0x80]);
    let rem = data.len() % BLOCK_SIZE;
    if rem != 0 {
        data.resize(data.len() + BLOCK_SIZE - rem, 0x00);
    }
}

/// Strip ISO/IEC 9797-1 method 2 padding. Returns the unpadded length,
/// or None if no 0x80 marker is found.
pub(crate) fn unpad_method2(data: &[u8]) -> Option<usize> {
    data.iter().rposition(|&b| b != 0x00).filter(|&i| data[i] == 0x80)
}

// src/common/crc.rs

use super::error::ProtocolError;
use crc::{Algorithm, Crc};

/// CRC-8 used by Sensirion sensors on every transferred 16-bit word.
/// Polynomial: 0x31 (x^8 + x^5 + x^4 + 1)
/// Initial Value: 0xFF
/// Input Reflected: false
/// Output Reflected: false
/// Final XOR: 0x00
/// Check Value: 0xF7 (for "123456789")
pub const SENSIRION_CRC: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&SENSIRION_CRC);

/// Length of one word on the wire: two data bytes followed by their CRC.
pub const WORD_WITH_CRC_LEN: usize = 3;

/// Calculates the CRC-8 over a single big-endian data word.
#[inline]
pub fn calculate_crc8(word: [u8; 2]) -> u8 {
    CRC_COMPUTER.checksum(&word)
}

/// Encodes a 16-bit value as the three bytes the device expects: MSB, LSB, CRC.
pub fn encode_word(value: u16) -> [u8; WORD_WITH_CRC_LEN] {
    let [msb, lsb] = value.to_be_bytes();
    [msb, lsb, calculate_crc8([msb, lsb])]
}

/// Verifies one `[MSB, LSB, CRC]` group and returns the data word.
///
/// # Returns
///
/// * `Ok(word)` if the CRC matches.
/// * `Err(ProtocolError::ShortResponse)` if fewer than three bytes are given.
/// * `Err(ProtocolError::CrcMismatch)` if the CRCs don't match.
pub fn verify_word(chunk: &[u8]) -> Result<u16, ProtocolError> {
    if chunk.len() < WORD_WITH_CRC_LEN {
        return Err(ProtocolError::ShortResponse {
            expected: WORD_WITH_CRC_LEN,
            got: chunk.len(),
        });
    }
    let data = [chunk[0], chunk[1]];
    let calculated = calculate_crc8(data);
    if calculated == chunk[2] {
        Ok(u16::from_be_bytes(data))
    } else {
        Err(ProtocolError::CrcMismatch {
            expected: chunk[2],
            calculated,
        })
    }
}

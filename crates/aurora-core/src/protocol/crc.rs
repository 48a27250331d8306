//! Frame checksum
//!
//! Every frame on the Aurora bus ends in a CRC-16/X-25 style checksum: the
//! reflected CCITT polynomial seeded with 0xFFFF and complemented at the end.
//! The checksum is transmitted low byte first.
//!
//! ```text
//! +---------------------------+--------+--------+
//! | data[0..n]                | crc_lo | crc_hi |
//! +---------------------------+--------+--------+
//! ```

use crc::{Crc, CRC_16_IBM_SDLC};

use super::{format_hex, ProtocolError};

/// Reflected 0x1021 (0x8408) polynomial, seed 0xFFFF, final complement
const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Number of checksum bytes trailing every frame
pub const CRC_LEN: usize = 2;

/// Calculate the checksum of a byte sequence.
///
/// An empty sequence yields 0x0000, the complement of the untouched seed.
pub fn crc16(data: &[u8]) -> u16 {
    X25.checksum(data)
}

/// Split a 16-bit word into wire order (low byte, high byte)
pub fn word_to_bytes(word: u16) -> [u8; 2] {
    word.to_le_bytes()
}

/// Append the checksum of `data` in wire order
pub fn append_crc(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + CRC_LEN);
    out.extend_from_slice(data);
    out.extend_from_slice(&word_to_bytes(crc16(data)));
    out
}

/// Check the trailing checksum of a received frame and return the payload.
///
/// A frame too short to carry a checksum is reported as a mismatch.
pub fn verify_and_strip(frame: &[u8]) -> Result<&[u8], ProtocolError> {
    let split = frame.len().saturating_sub(CRC_LEN);
    let (data, received) = frame.split_at(split);
    let computed = word_to_bytes(crc16(data));

    if received.len() == CRC_LEN && received == computed {
        return Ok(data);
    }

    tracing::warn!(
        "Inverter response failed CRC check: response={} data={} crc={} expected={}",
        format_hex(frame),
        format_hex(data),
        format_hex(received),
        format_hex(&computed)
    );
    Err(ProtocolError::ChecksumMismatch {
        frame: frame.to_vec(),
        computed,
        received: received.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(crc16(&[]), 0x0000);
    }

    #[test]
    fn test_check_value() {
        // Standard check value for the X-25 parameter set
        assert_eq!(crc16(b"123456789"), 0x906E);
    }

    /// Bitwise form of the inverter's checksum: reflected 0x8408, seed 0xFFFF
    fn reference_crc(data: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for &byte in data {
            let mut b = byte;
            for _ in 0..8 {
                crc = if (crc ^ b as u16) & 1 != 0 {
                    (crc >> 1) ^ 0x8408
                } else {
                    crc >> 1
                };
                b >>= 1;
            }
        }
        !crc
    }

    #[test]
    fn test_matches_bitwise_algorithm() {
        let inputs: [&[u8]; 4] = [
            &[],
            b"123456789",
            &[0x02, 0x3B, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00],
            &[0xFF; 37],
        ];
        for data in inputs {
            assert_eq!(crc16(data), reference_crc(data), "data {}", format_hex(data));
        }
    }

    #[test]
    fn test_word_order() {
        assert_eq!(word_to_bytes(0x906E), [0x6E, 0x90]);
    }

    #[test]
    fn test_roundtrip() {
        let payloads: [&[u8]; 4] = [
            &[],
            &[0x02],
            &[0x02, 0x3B, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00],
            &[0x00, 0x06, 0x43, 0x66, 0x80, 0x00],
        ];
        for payload in payloads {
            let framed = append_crc(payload);
            assert_eq!(framed.len(), payload.len() + CRC_LEN);
            assert_eq!(verify_and_strip(&framed).unwrap(), payload);
        }
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let framed = append_crc(&[0x00, 0x06, 0x43, 0x66, 0x80, 0x00]);
        for byte in 0..framed.len() {
            for bit in 0..8 {
                let mut corrupted = framed.clone();
                corrupted[byte] ^= 1 << bit;
                let err = verify_and_strip(&corrupted).unwrap_err();
                assert!(
                    matches!(err, ProtocolError::ChecksumMismatch { .. }),
                    "flip of byte {byte} bit {bit} not detected"
                );
            }
        }
    }

    #[test]
    fn test_mismatch_carries_diagnostics() {
        let mut framed = append_crc(&[1, 2, 3, 4, 5, 6]);
        framed[7] ^= 0xFF;
        match verify_and_strip(&framed) {
            Err(ProtocolError::ChecksumMismatch {
                frame,
                computed,
                received,
            }) => {
                assert_eq!(frame, framed);
                assert_eq!(computed, word_to_bytes(crc16(&[1, 2, 3, 4, 5, 6])));
                assert_eq!(received, framed[6..].to_vec());
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_short_frame_rejected() {
        assert!(verify_and_strip(&[]).is_err());
        assert!(verify_and_strip(&[0xFF]).is_err());
    }
}

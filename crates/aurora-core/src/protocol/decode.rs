//! Response payload decoding
//!
//! Each decoder takes the 6-byte payload left after CRC stripping. Decoders
//! never fail: a payload that is too short or holds bytes that cannot be
//! interpreted under the decoder's shape produces an empty
//! [`ResponseTuple`].

use byteorder::{BigEndian, ByteOrder};

use super::commands::Decoder;
use super::response::{ResponseData, ResponseTuple};

/// Length of a response payload without CRC
pub const PAYLOAD_LEN: usize = 6;

/// Seconds between the Unix epoch and 2000-01-01T00:00:00Z, the inverter's
/// time reference
pub const INVERTER_EPOCH_OFFSET: i64 = 946_684_800;

/// Decode a payload with the given shape
pub fn decode(decoder: Decoder, payload: &[u8]) -> ResponseTuple {
    let Some(p) = payload.get(..PAYLOAD_LEN) else {
        tracing::debug!(
            "Payload too short for {:?}: {} byte(s)",
            decoder,
            payload.len()
        );
        return ResponseTuple::empty();
    };

    let decoded = match decoder {
        Decoder::Ascii6 => decode_ascii(p),
        Decoder::AsciiWithState => decode_ascii_and_state(p),
        Decoder::Float32 => decode_float(p),
        Decoder::Uint32 => decode_int(p),
        Decoder::WeekYear => decode_week_year(p),
        Decoder::Timestamp => decode_timestamp(p),
        Decoder::AlarmQuad => decode_alarms(p),
    };

    decoded.unwrap_or_else(|| {
        tracing::debug!("Could not decode {:?} payload {}", decoder, super::format_hex(p));
        ResponseTuple::empty()
    })
}

fn ascii(bytes: &[u8]) -> Option<String> {
    if bytes.is_ascii() {
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}

fn two_digits(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [hi @ b'0'..=b'9', lo @ b'0'..=b'9'] => Some((hi - b'0') * 10 + (lo - b'0')),
        _ => None,
    }
}

fn decode_ascii(p: &[u8]) -> Option<ResponseTuple> {
    ascii(p).map(|s| ResponseTuple::data_only(ResponseData::Text(s)))
}

// Only the first two parameter bytes form the version fragment; bytes 4 and
// 5 are ignored.
fn decode_ascii_and_state(p: &[u8]) -> Option<ResponseTuple> {
    let text = ascii(&p[2..4])?;
    Some(ResponseTuple::with_state(p[0], p[1], ResponseData::Text(text)))
}

fn decode_float(p: &[u8]) -> Option<ResponseTuple> {
    let value = BigEndian::read_f32(&p[2..6]);
    Some(ResponseTuple::with_state(p[0], p[1], ResponseData::Float(value)))
}

fn decode_int(p: &[u8]) -> Option<ResponseTuple> {
    let value = BigEndian::read_u32(&p[2..6]);
    Some(ResponseTuple::with_state(p[0], p[1], ResponseData::Integer(value)))
}

fn decode_week_year(p: &[u8]) -> Option<ResponseTuple> {
    let week = two_digits(&p[2..4])?;
    let year = two_digits(&p[4..6])?;
    Some(ResponseTuple::with_state(
        p[0],
        p[1],
        ResponseData::WeekYear { week, year },
    ))
}

fn decode_timestamp(p: &[u8]) -> Option<ResponseTuple> {
    let seconds = BigEndian::read_u32(&p[2..6]) as i64;
    Some(ResponseTuple::with_state(
        p[0],
        p[1],
        ResponseData::Timestamp(seconds + INVERTER_EPOCH_OFFSET),
    ))
}

fn decode_alarms(p: &[u8]) -> Option<ResponseTuple> {
    let alarms = [p[2], p[3], p[4], p[5]];
    Some(ResponseTuple::with_state(p[0], p[1], ResponseData::Alarms(alarms)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL: [Decoder; 7] = [
        Decoder::Ascii6,
        Decoder::AsciiWithState,
        Decoder::Float32,
        Decoder::Uint32,
        Decoder::WeekYear,
        Decoder::Timestamp,
        Decoder::AlarmQuad,
    ];

    #[test]
    fn test_short_payload_is_empty() {
        for decoder in ALL {
            for len in 0..PAYLOAD_LEN {
                let payload = vec![b'0'; len];
                assert!(
                    decode(decoder, &payload).is_empty(),
                    "{decoder:?} with {len} bytes"
                );
            }
        }
    }

    #[test]
    fn test_ascii6() {
        let r = decode(Decoder::Ascii6, b"-3G79-");
        assert_eq!(r.transmission_state(), None);
        assert_eq!(r.global_state(), None);
        assert_eq!(r.data(), Some(&ResponseData::Text("-3G79-".into())));
    }

    #[test]
    fn test_ascii6_rejects_non_ascii() {
        assert!(decode(Decoder::Ascii6, &[b'1', b'2', 0xC3, b'4', b'5', b'6']).is_empty());
    }

    #[test]
    fn test_ascii_with_state_uses_two_bytes() {
        let r = decode(Decoder::AsciiWithState, &[0, 6, b'C', b'4', b'B', b'N']);
        assert_eq!(r.transmission_state(), Some(0));
        assert_eq!(r.global_state(), Some(6));
        assert_eq!(r.data(), Some(&ResponseData::Text("C4".into())));
    }

    #[test]
    fn test_float32() {
        let r = decode(Decoder::Float32, &[0x00, 0x00, 0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(r.transmission_state(), Some(0));
        assert_eq!(r.global_state(), Some(0));
        let value = r.data().and_then(ResponseData::as_f32).unwrap();
        assert!((value - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_float32_negative() {
        // -230.5 = 0xC3668000
        let r = decode(Decoder::Float32, &[0, 6, 0xC3, 0x66, 0x80, 0x00]);
        assert_eq!(r.data().and_then(ResponseData::as_f32), Some(-230.5));
    }

    #[test]
    fn test_uint32() {
        let r = decode(Decoder::Uint32, &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(r.data(), Some(&ResponseData::Integer(256)));

        let r = decode(Decoder::Uint32, &[0, 6, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(r.data(), Some(&ResponseData::Integer(0x0102_0304)));
    }

    #[test]
    fn test_week_year() {
        let r = decode(Decoder::WeekYear, &[0x00, 0x00, b'0', b'5', b'1', b'7']);
        assert_eq!(r.data(), Some(&ResponseData::WeekYear { week: 5, year: 17 }));
    }

    #[test]
    fn test_week_year_rejects_non_digits() {
        assert!(decode(Decoder::WeekYear, &[0, 0, b'0', b'x', b'1', b'7']).is_empty());
        assert!(decode(Decoder::WeekYear, &[0, 0, b'0', b'5', 0x01, 0x07]).is_empty());
    }

    #[test]
    fn test_timestamp() {
        let r = decode(Decoder::Timestamp, &[0, 6, 0, 0, 0, 0]);
        assert_eq!(r.data(), Some(&ResponseData::Timestamp(INVERTER_EPOCH_OFFSET)));

        // 2017-01-31T00:00:00Z is 539_136_000 s after 2000-01-01
        let secs: u32 = 539_136_000;
        let b = secs.to_be_bytes();
        let r = decode(Decoder::Timestamp, &[0, 6, b[0], b[1], b[2], b[3]]);
        let dt = r.data().and_then(ResponseData::as_datetime).unwrap();
        assert_eq!(dt.to_rfc3339(), "2017-01-31T00:00:00+00:00");
    }

    #[test]
    fn test_alarms_keep_order() {
        let r = decode(Decoder::AlarmQuad, &[0, 6, 1, 13, 0, 33]);
        assert_eq!(r.data(), Some(&ResponseData::Alarms([1, 13, 0, 33])));
    }

    #[test]
    fn test_longer_payload_uses_first_six_bytes() {
        let r = decode(Decoder::Uint32, &[0, 6, 0, 0, 0, 7, 0xFF, 0xFF]);
        assert_eq!(r.data(), Some(&ResponseData::Integer(7)));
    }
}

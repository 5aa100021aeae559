// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conversions between decimal wire text and native primitive byte images.

use bytes::Bytes;

use crate::data_type::DataType;
use crate::error::ArchiveError;

/// Parses an optionally signed decimal payload into `(negative, magnitude)`.
///
/// Accumulation wraps at 64 bits, matching the width-agnostic wire contract:
/// a value is reinterpreted at the receiver's width, not range-checked.
pub(crate) fn parse_decimal(payload: &[u8]) -> Result<(bool, u64), ArchiveError> {
    let malformed = || ArchiveError::MalformedInt {
        text: String::from_utf8_lossy(payload).into_owned(),
    };
    let (negative, digits) = match payload.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, payload),
    };
    if digits.is_empty() {
        return Err(malformed());
    }
    let mut acc: u64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return Err(malformed());
        }
        acc = acc.wrapping_mul(10).wrapping_add(u64::from(c - b'0'));
    }
    Ok((negative, acc))
}

/// Native byte image of an unsigned value truncated to `size` bytes.
#[allow(clippy::cast_possible_truncation)] // truncation to the stored width is the point
pub(crate) fn unsigned_bytes(value: u64, size: usize) -> Option<Vec<u8>> {
    match size {
        1 => Some((value as u8).to_ne_bytes().to_vec()),
        2 => Some((value as u16).to_ne_bytes().to_vec()),
        4 => Some((value as u32).to_ne_bytes().to_vec()),
        8 => Some(value.to_ne_bytes().to_vec()),
        _ => None,
    }
}

/// Native byte image of a signed value truncated to `size` bytes.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn signed_bytes(value: i64, size: usize) -> Option<Vec<u8>> {
    match size {
        1 => Some((value as i8).to_ne_bytes().to_vec()),
        2 => Some((value as i16).to_ne_bytes().to_vec()),
        4 => Some((value as i32).to_ne_bytes().to_vec()),
        8 => Some(value.to_ne_bytes().to_vec()),
        _ => None,
    }
}

/// Reads a signed integer out of a native byte image.
pub(crate) fn read_signed(raw: &[u8]) -> i64 {
    match *raw {
        [a] => i64::from(i8::from_ne_bytes([a])),
        [a, b] => i64::from(i16::from_ne_bytes([a, b])),
        [a, b, c, d] => i64::from(i32::from_ne_bytes([a, b, c, d])),
        [a, b, c, d, e, f, g, h] => i64::from_ne_bytes([a, b, c, d, e, f, g, h]),
        _ => unreachable!("unknown signed integer size {}", raw.len()),
    }
}

/// Reads an unsigned integer out of a native byte image.
pub(crate) fn read_unsigned(raw: &[u8]) -> u64 {
    match *raw {
        [a] => u64::from(a),
        [a, b] => u64::from(u16::from_ne_bytes([a, b])),
        [a, b, c, d] => u64::from(u32::from_ne_bytes([a, b, c, d])),
        [a, b, c, d, e, f, g, h] => u64::from_ne_bytes([a, b, c, d, e, f, g, h]),
        _ => unreachable!("unknown unsigned integer size {}", raw.len()),
    }
}

/// Reads a real out of a native byte image, widening `real32` to `f64`.
pub(crate) fn read_real(raw: &[u8]) -> f64 {
    match *raw {
        [a, b, c, d] => f64::from(f32::from_ne_bytes([a, b, c, d])),
        [a, b, c, d, e, f, g, h] => f64::from_ne_bytes([a, b, c, d, e, f, g, h]),
        _ => unreachable!("unknown floating point size {}", raw.len()),
    }
}

/// Re-encodes an enum's raw image at a different width, preserving the value.
pub(crate) fn resize_enum_raw(raw: &[u8], new_size: usize) -> Option<Vec<u8>> {
    unsigned_bytes(read_unsigned(raw), new_size)
}

/// Renders a primitive object's raw image as wire text.
///
/// Reals use the shortest round-trip decimal (Rust's float `Display`),
/// booleans render as `0`/`1`, enums as unsigned decimal at their stored
/// width, strings pass their payload through.
pub(crate) fn format_primitive(data_type: &DataType, raw: &[u8]) -> String {
    if data_type.is_integer() {
        if data_type.is_signed() {
            read_signed(raw).to_string()
        } else {
            read_unsigned(raw).to_string()
        }
    } else if data_type.is_enum() {
        read_unsigned(raw).to_string()
    } else if data_type.is_real() {
        match *raw {
            [a, b, c, d] => f32::from_ne_bytes([a, b, c, d]).to_string(),
            [a, b, c, d, e, f, g, h] => f64::from_ne_bytes([a, b, c, d, e, f, g, h]).to_string(),
            _ => unreachable!("unknown floating point size {}", raw.len()),
        }
    } else if data_type.is_bool() {
        if raw.first().is_some_and(|b| *b != 0) {
            "1".to_owned()
        } else {
            "0".to_owned()
        }
    } else if data_type.is_string() {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        unreachable!("value formatting requested for non-primitive type")
    }
}

/// Parses a primitive wire payload into the native byte image dictated by the
/// descriptor.
pub(crate) fn decode_primitive(data_type: &DataType, payload: &[u8]) -> Result<Bytes, ArchiveError> {
    if data_type.is_integer() || data_type.is_enum() {
        let (negative, magnitude) = parse_decimal(payload)?;
        let value = if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        };
        let bytes = unsigned_bytes(value, data_type.size()).ok_or(ArchiveError::MalformedInt {
            text: String::from_utf8_lossy(payload).into_owned(),
        })?;
        Ok(Bytes::from(bytes))
    } else if data_type.is_real() {
        let malformed = || ArchiveError::MalformedReal {
            text: String::from_utf8_lossy(payload).into_owned(),
        };
        let text = std::str::from_utf8(payload).map_err(|_| malformed())?;
        let value: f64 = text.parse().map_err(|_| malformed())?;
        #[allow(clippy::cast_possible_truncation)]
        let bytes = match data_type.size() {
            4 => (value as f32).to_ne_bytes().to_vec(),
            8 => value.to_ne_bytes().to_vec(),
            _ => return Err(malformed()),
        };
        Ok(Bytes::from(bytes))
    } else if data_type.is_bool() {
        let (_, magnitude) = parse_decimal(payload)?;
        Ok(Bytes::from(vec![u8::from(magnitude != 0)]))
    } else if data_type.is_string() {
        Ok(Bytes::copy_from_slice(payload))
    } else {
        unreachable!("primitive decode requested for non-primitive type")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::data_type::BaseKind;

    #[test]
    fn decimal_parsing_accepts_sign_and_rejects_junk() {
        assert!(matches!(parse_decimal(b"305419896"), Ok((false, 305_419_896))));
        assert!(matches!(parse_decimal(b"-7"), Ok((true, 7))));
        assert!(matches!(parse_decimal(b""), Err(ArchiveError::MalformedInt { .. })));
        assert!(matches!(parse_decimal(b"-"), Err(ArchiveError::MalformedInt { .. })));
        assert!(matches!(parse_decimal(b"12a"), Err(ArchiveError::MalformedInt { .. })));
    }

    #[test]
    fn int_round_trip_through_text() {
        let t = DataType::scalar(BaseKind::Int { signed: true }, 4);
        let raw = decode_primitive(&t, b"-7").unwrap();
        assert_eq!(raw.as_ref(), (-7i32).to_ne_bytes());
        assert_eq!(format_primitive(&t, &raw), "-7");

        let u = DataType::scalar(BaseKind::Int { signed: false }, 8);
        let raw = decode_primitive(&u, b"18446744073709551615").unwrap();
        assert_eq!(format_primitive(&u, &raw), "18446744073709551615");
    }

    #[test]
    fn narrow_signed_values_render_as_numbers() {
        let t = DataType::scalar(BaseKind::Int { signed: true }, 1);
        let raw = decode_primitive(&t, b"-128").unwrap();
        assert_eq!(format_primitive(&t, &raw), "-128");
    }

    #[test]
    fn reals_use_shortest_round_trip_text() {
        let t = DataType::scalar(BaseKind::Real, 8);
        let raw = decode_primitive(&t, b"3.5").unwrap();
        assert_eq!(format_primitive(&t, &raw), "3.5");

        let f = DataType::scalar(BaseKind::Real, 4);
        let raw = decode_primitive(&f, b"0.1").unwrap();
        assert_eq!(format_primitive(&f, &raw), "0.1");

        assert!(matches!(
            decode_primitive(&t, b"x.y"),
            Err(ArchiveError::MalformedReal { .. })
        ));
    }

    #[test]
    fn bools_encode_as_zero_or_one() {
        let t = DataType::scalar(BaseKind::Bool, 1);
        assert_eq!(decode_primitive(&t, b"1").unwrap().as_ref(), &[1]);
        assert_eq!(decode_primitive(&t, b"0").unwrap().as_ref(), &[0]);
        assert_eq!(format_primitive(&t, &[1]), "1");
        assert_eq!(format_primitive(&t, &[0]), "0");
    }

    #[test]
    fn enum_width_resize_preserves_the_value() {
        let narrow = unsigned_bytes(7, 4).unwrap();
        let wide = resize_enum_raw(&narrow, 8).unwrap();
        assert_eq!(wide.len(), 8);
        assert_eq!(read_unsigned(&wide), 7);
        let back = resize_enum_raw(&wide, 4).unwrap();
        assert_eq!(back, narrow);
    }

    #[test]
    fn unknown_widths_are_rejected_not_asserted() {
        let t = DataType::scalar(BaseKind::Int { signed: true }, 3);
        assert!(matches!(
            decode_primitive(&t, b"5"),
            Err(ArchiveError::MalformedInt { .. })
        ));
    }

    #[test]
    fn string_payloads_pass_through() {
        let t = DataType::string_type();
        let raw = decode_primitive(&t, "héllo".as_bytes()).unwrap();
        assert_eq!(format_primitive(&t, &raw), "héllo");
    }
}

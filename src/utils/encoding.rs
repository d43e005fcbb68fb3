// Text payload transcoding
//
// Text frames start with one encoding selector byte. Four encodings exist
// in the wild; reading supports all of them, writing always normalizes to
// UTF-16LE with a leading byte order mark.

use encoding_rs::{UTF_16BE, UTF_16LE};

use crate::error::{Result, TagError};

/// Text encoding selector byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16Be = 2,
    Utf8 = 3,
}

/// UTF-16 byte order of a decoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

impl TextEncoding {
    /// Map a selector byte, rejecting unknown values
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(TextEncoding::Iso8859_1),
            1 => Ok(TextEncoding::Utf16),
            2 => Ok(TextEncoding::Utf16Be),
            3 => Ok(TextEncoding::Utf8),
            other => Err(TagError::UnsupportedEncoding(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Iso8859_1 => "ISO 8859-1",
            TextEncoding::Utf16 => "UTF-16",
            TextEncoding::Utf16Be => "UTF-16BE",
            TextEncoding::Utf8 => "UTF-8",
        }
    }
}

/// Decode a complete text frame payload (selector byte plus text)
pub fn decode_text_payload(payload: &[u8]) -> Result<String> {
    if payload.is_empty() {
        return Err(TagError::Transcoding("empty text payload".to_string()));
    }

    let encoding = TextEncoding::from_byte(payload[0])?;
    let content = &payload[1..];

    let mut text = match encoding {
        TextEncoding::Iso8859_1 => latin1_to_string(content),
        TextEncoding::Utf16 => decode_utf16_with_bom(content, ByteOrder::LittleEndian)?,
        TextEncoding::Utf16Be => decode_utf16_with_bom(content, ByteOrder::BigEndian)?,
        TextEncoding::Utf8 => match std::str::from_utf8(content) {
            Ok(s) => s.to_string(),
            Err(e) => return Err(TagError::Transcoding(format!("invalid UTF-8: {}", e))),
        },
    };

    // Taggers routinely write a NUL terminator into the payload;
    // anything after it is not part of the value.
    if let Some(pos) = text.find('\0') {
        text.truncate(pos);
    }

    Ok(text)
}

/// Encode text for writing: selector 0x01, LE BOM, UTF-16LE code units
///
/// The encoding a value had on disk before is never preserved.
pub fn encode_text_payload(text: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(3 + text.len() * 2);
    payload.push(TextEncoding::Utf16 as u8);
    payload.extend_from_slice(&BOM_LE);
    payload.extend(utf16le_bytes(text));
    payload
}

/// Map ISO 8859-1 bytes to a string
///
/// Only the printable ranges are mapped: 0x20..=0x7F verbatim and
/// 0xA0..=0xFF as their Latin-1 code points. Everything else is dropped.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| (0x20..=0x7F).contains(&b) || b >= 0xA0)
        .map(|&b| b as char)
        .collect()
}

/// Decode UTF-16 content that may start with one or more BOM units
///
/// Broken tagging tools stack multiple (even contradicting) BOMs in front
/// of the text. All leading BOM units are consumed and the last one read
/// decides the byte order; `default` applies when none is present. An odd
/// trailing byte is ignored.
pub fn decode_utf16_with_bom(bytes: &[u8], default: ByteOrder) -> Result<String> {
    let (content, order) = skip_boms(bytes, default);
    decode_utf16_units(content, order)
}

/// Consume leading BOM units, returning the remaining bytes and the
/// byte order selected by the last BOM read
pub fn skip_boms(bytes: &[u8], default: ByteOrder) -> (&[u8], ByteOrder) {
    let mut order = default;
    let mut rest = bytes;
    while rest.len() >= 2 {
        match [rest[0], rest[1]] {
            BOM_LE => order = ByteOrder::LittleEndian,
            BOM_BE => order = ByteOrder::BigEndian,
            _ => break,
        }
        rest = &rest[2..];
    }
    (rest, order)
}

/// Decode UTF-16 code units of a known byte order
pub fn decode_utf16_units(bytes: &[u8], order: ByteOrder) -> Result<String> {
    // Drop an odd trailing byte; it cannot form a code unit.
    let even = &bytes[..bytes.len() & !1];

    let encoding = match order {
        ByteOrder::LittleEndian => UTF_16LE,
        ByteOrder::BigEndian => UTF_16BE,
    };

    match encoding.decode_without_bom_handling_and_without_replacement(even) {
        Some(text) => Ok(text.into_owned()),
        None => Err(TagError::Transcoding(
            "malformed UTF-16 sequence".to_string(),
        )),
    }
}

/// UTF-16LE code units of a string, without BOM or terminator
pub fn utf16le_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_bytes() {
        assert_eq!(TextEncoding::from_byte(0).unwrap(), TextEncoding::Iso8859_1);
        assert_eq!(TextEncoding::from_byte(1).unwrap(), TextEncoding::Utf16);
        assert_eq!(TextEncoding::from_byte(2).unwrap(), TextEncoding::Utf16Be);
        assert_eq!(TextEncoding::from_byte(3).unwrap(), TextEncoding::Utf8);
        assert!(matches!(
            TextEncoding::from_byte(4),
            Err(TagError::UnsupportedEncoding(4))
        ));
    }

    #[test]
    fn latin1_maps_the_printable_ranges() {
        // 0xE9 is é and must become the UTF-8 sequence C3 A9
        let text = decode_text_payload(&[0x00, b'C', b'a', b'f', 0xE9]).unwrap();
        assert_eq!(text, "Café");
        assert_eq!(&text.as_bytes()[3..], [0xC3, 0xA9]);

        // 0xA2 maps into the C2 80.. range
        assert_eq!(latin1_to_string(&[0xA2]).as_bytes(), [0xC2, 0xA2]);

        // control bytes are dropped, not replaced
        assert_eq!(latin1_to_string(&[0x07, b'x', 0x1F]), "x");
    }

    #[test]
    fn latin1_is_not_null_terminated() {
        // full payload length counts; there is no terminator to strip
        let text = decode_text_payload(&[0x00, b'a', b'b']).unwrap();
        assert_eq!(text, "ab");
    }

    #[test]
    fn utf16_le_with_bom() {
        let payload = [0x01, 0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        assert_eq!(decode_text_payload(&payload).unwrap(), "Hi");
    }

    #[test]
    fn utf16_be_with_bom_under_selector_one() {
        let payload = [0x01, 0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_text_payload(&payload).unwrap(), "Hi");
    }

    #[test]
    fn utf16_double_bom_uses_the_last_one() {
        // LE BOM followed by BE BOM: content is big endian
        let payload = [0x01, 0xFF, 0xFE, 0xFE, 0xFF, 0x00, b'A'];
        assert_eq!(decode_text_payload(&payload).unwrap(), "A");
    }

    #[test]
    fn utf16_without_bom_defaults_per_selector() {
        // selector 0x01 defaults to little endian
        assert_eq!(decode_text_payload(&[0x01, b'A', 0x00]).unwrap(), "A");
        // selector 0x02 defaults to big endian
        assert_eq!(decode_text_payload(&[0x02, 0x00, b'A']).unwrap(), "A");
        // but an explicit LE BOM under 0x02 still wins
        let payload = [0x02, 0xFF, 0xFE, b'A', 0x00];
        assert_eq!(decode_text_payload(&payload).unwrap(), "A");
    }

    #[test]
    fn utf16_unpaired_surrogate_fails() {
        // lone high surrogate D800
        let payload = [0x01, 0xFF, 0xFE, 0x00, 0xD8];
        assert!(matches!(
            decode_text_payload(&payload),
            Err(TagError::Transcoding(_))
        ));
    }

    #[test]
    fn utf8_payload() {
        let mut payload = vec![0x03];
        payload.extend_from_slice("Grüße 🎵".as_bytes());
        assert_eq!(decode_text_payload(&payload).unwrap(), "Grüße 🎵");

        assert!(matches!(
            decode_text_payload(&[0x03, 0xC3]),
            Err(TagError::Transcoding(_))
        ));
    }

    #[test]
    fn decoded_text_ends_at_first_nul() {
        let payload = [0x03, b'a', b'b', 0x00, b'c'];
        assert_eq!(decode_text_payload(&payload).unwrap(), "ab");
    }

    #[test]
    fn encode_normalizes_to_utf16le() {
        let payload = encode_text_payload("Hi");
        assert_eq!(payload, [0x01, 0xFF, 0xFE, b'H', 0x00, b'i', 0x00]);
    }

    #[test]
    fn encode_decode_round_trip() {
        for text in ["", "A", "Café", "Grüße", "日本語", "🎵 music"] {
            let payload = encode_text_payload(text);
            assert_eq!(payload[0], 0x01);
            assert_eq!(decode_text_payload(&payload).unwrap(), text);
        }
    }
}

// Attached picture (APIC) frame codec
//
// Payload layout: encoding byte, NUL-terminated ASCII MIME type, picture
// type byte, description in the declared encoding, then the raw image.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, TagError};
use crate::utils::encoding::{self, ByteOrder};

/// Longest description the format allows, in characters
const MAX_DESCRIPTION_CHARS: usize = 64;

/// Picture type byte of an attached picture frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    VideoScreenCapture = 16,
    BrightColouredFish = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            1 => PictureType::FileIcon,
            2 => PictureType::OtherFileIcon,
            3 => PictureType::CoverFront,
            4 => PictureType::CoverBack,
            5 => PictureType::LeafletPage,
            6 => PictureType::Media,
            7 => PictureType::LeadArtist,
            8 => PictureType::Artist,
            9 => PictureType::Conductor,
            10 => PictureType::Band,
            11 => PictureType::Composer,
            12 => PictureType::Lyricist,
            13 => PictureType::RecordingLocation,
            14 => PictureType::DuringRecording,
            15 => PictureType::DuringPerformance,
            16 => PictureType::VideoScreenCapture,
            17 => PictureType::BrightColouredFish,
            18 => PictureType::Illustration,
            19 => PictureType::BandLogo,
            20 => PictureType::PublisherLogo,
            _ => PictureType::Other,
        }
    }

    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PictureType::Other => "Other",
            PictureType::FileIcon => "File Icon",
            PictureType::OtherFileIcon => "Other File Icon",
            PictureType::CoverFront => "Cover (front)",
            PictureType::CoverBack => "Cover (back)",
            PictureType::LeafletPage => "Leaflet page",
            PictureType::Media => "Media",
            PictureType::LeadArtist => "Lead artist",
            PictureType::Artist => "Artist",
            PictureType::Conductor => "Conductor",
            PictureType::Band => "Band",
            PictureType::Composer => "Composer",
            PictureType::Lyricist => "Lyricist",
            PictureType::RecordingLocation => "Recording Location",
            PictureType::DuringRecording => "During recording",
            PictureType::DuringPerformance => "During performance",
            PictureType::VideoScreenCapture => "Video screen capture",
            PictureType::BrightColouredFish => "Bright coloured fish",
            PictureType::Illustration => "Illustration",
            PictureType::BandLogo => "Band logo",
            PictureType::PublisherLogo => "Publisher logo",
        }
    }
}

/// Picture extracted from an attached picture frame
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub mime_type: String,
    pub description: String,
    pub data: Vec<u8>,
}

impl CoverArt {
    /// Save the image bytes to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.data)
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "jpg",
        }
    }
}

/// Parse an APIC payload, checking it carries the requested picture type
pub(crate) fn parse_picture_payload(payload: &[u8], requested: PictureType) -> Result<CoverArt> {
    if payload.is_empty() {
        return Err(TagError::Transcoding("empty picture payload".to_string()));
    }

    let encoding = payload[0];
    let mut offset = 1;

    // MIME type, ASCII, NUL-terminated
    let mime_end = payload[offset..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| TagError::Transcoding("unterminated MIME type".to_string()))?;
    let mime_type = match std::str::from_utf8(&payload[offset..offset + mime_end]) {
        Ok(s) => s.to_string(),
        Err(_) => return Err(TagError::Transcoding("non-ASCII MIME type".to_string())),
    };
    offset += mime_end + 1;

    // picture type byte, checked before the description is touched
    let found = *payload
        .get(offset)
        .ok_or_else(|| TagError::Transcoding("picture payload ends after MIME type".to_string()))?;
    if found != requested.as_byte() {
        return Err(TagError::PictureTypeMismatch {
            requested: requested.as_byte(),
            found,
        });
    }
    offset += 1;

    let (description, description_len) = parse_description(&payload[offset..], encoding)?;
    offset += description_len;

    Ok(CoverArt {
        mime_type,
        description,
        data: payload[offset..].to_vec(),
    })
}

/// Decode the description field, returning the text and the number of
/// payload bytes it occupied including its terminator
fn parse_description(bytes: &[u8], encoding: u8) -> Result<(String, usize)> {
    if encoding == 0x00 {
        // ISO 8859-1, NUL-terminated, at most 64 characters
        let window = &bytes[..bytes.len().min(MAX_DESCRIPTION_CHARS + 1)];
        let end = window
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| TagError::Transcoding("unterminated picture description".to_string()))?;
        Ok((encoding::latin1_to_string(&window[..end]), end + 1))
    } else {
        // one BOM unit, then UTF-16 terminated by a zero unit
        if bytes.len() < 2 {
            return Err(TagError::Transcoding(
                "picture description misses its BOM".to_string(),
            ));
        }
        // only an explicit big-endian mark switches the byte order
        let order = if bytes[0..2] == [0xFE, 0xFF] {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        };

        let units = &bytes[2..];
        let mut end = None;
        for i in 0..=MAX_DESCRIPTION_CHARS {
            let pos = i * 2;
            if pos + 2 > units.len() {
                break;
            }
            if units[pos] == 0 && units[pos + 1] == 0 {
                end = Some(pos);
                break;
            }
        }
        let end = end.ok_or_else(|| {
            TagError::Transcoding("unterminated picture description".to_string())
        })?;

        let text = encoding::decode_utf16_units(&units[..end], order)?;
        Ok((text, 2 + end + 2)) // BOM + content + zero unit
    }
}

/// Build an APIC payload
///
/// The description is always written as UTF-16LE with one BOM and a
/// double-zero terminator, whatever encoding a previous frame used.
pub(crate) fn build_picture_payload(
    picture_type: PictureType,
    mime_type: &str,
    description: Option<&str>,
    image: &[u8],
) -> Vec<u8> {
    let description = description.unwrap_or("");
    let mut payload = Vec::with_capacity(mime_type.len() + description.len() * 2 + image.len() + 8);

    payload.push(0x01); // encoding: UTF-16
    payload.extend_from_slice(mime_type.as_bytes());
    payload.push(0x00);
    payload.push(picture_type.as_byte());
    payload.extend_from_slice(&[0xFF, 0xFE]); // BOM, little endian
    payload.extend(encoding::utf16le_bytes(description));
    payload.extend_from_slice(&[0x00, 0x00]);
    payload.extend_from_slice(image);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_layout() {
        let payload = build_picture_payload(
            PictureType::CoverFront,
            "image/jpg",
            Some("Hi"),
            &[0xDE, 0xAD],
        );
        let mut expected = vec![0x01];
        expected.extend_from_slice(b"image/jpg\0");
        expected.push(0x03);
        expected.extend_from_slice(&[0xFF, 0xFE, b'H', 0x00, b'i', 0x00, 0x00, 0x00]);
        expected.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(payload, expected);
    }

    #[test]
    fn parse_round_trip() {
        let image = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let payload =
            build_picture_payload(PictureType::CoverFront, "image/jpeg", Some("Front"), &image);
        let cover = parse_picture_payload(&payload, PictureType::CoverFront).unwrap();
        assert_eq!(cover.mime_type, "image/jpeg");
        assert_eq!(cover.description, "Front");
        assert_eq!(cover.data, image);
        assert_eq!(cover.extension(), "jpg");
    }

    #[test]
    fn parse_without_description() {
        let payload = build_picture_payload(PictureType::CoverFront, "image/png", None, &[1, 2, 3]);
        let cover = parse_picture_payload(&payload, PictureType::CoverFront).unwrap();
        assert_eq!(cover.description, "");
        assert_eq!(cover.data, [1, 2, 3]);
        assert_eq!(cover.extension(), "png");
    }

    #[test]
    fn parse_latin1_description() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"image/jpg\0");
        payload.push(0x03);
        payload.extend_from_slice(&[b'C', b'a', b'f', 0xE9, 0x00]);
        payload.extend_from_slice(&[0xAA, 0xBB]);

        let cover = parse_picture_payload(&payload, PictureType::CoverFront).unwrap();
        assert_eq!(cover.description, "Café");
        assert_eq!(cover.data, [0xAA, 0xBB]);
    }

    #[test]
    fn parse_big_endian_description() {
        let mut payload = vec![0x01];
        payload.extend_from_slice(b"image/jpg\0");
        payload.push(0x03);
        payload.extend_from_slice(&[0xFE, 0xFF, 0x00, b'X', 0x00, 0x00]);
        payload.push(0x42);

        let cover = parse_picture_payload(&payload, PictureType::CoverFront).unwrap();
        assert_eq!(cover.description, "X");
        assert_eq!(cover.data, [0x42]);
    }

    #[test]
    fn picture_type_mismatch() {
        let payload = build_picture_payload(PictureType::CoverBack, "image/jpg", None, &[]);
        let error = parse_picture_payload(&payload, PictureType::CoverFront).unwrap_err();
        assert!(matches!(
            error,
            TagError::PictureTypeMismatch {
                requested: 3,
                found: 4
            }
        ));
    }

    #[test]
    fn unterminated_fields_fail() {
        // MIME type without its NUL
        let payload = [0x01, b'i', b'm', b'a', b'g', b'e'];
        assert!(matches!(
            parse_picture_payload(&payload, PictureType::CoverFront),
            Err(TagError::Transcoding(_))
        ));

        // UTF-16 description without the zero unit
        let mut payload = vec![0x01];
        payload.extend_from_slice(b"image/jpg\0");
        payload.push(0x03);
        payload.extend_from_slice(&[0xFF, 0xFE, b'A', 0x00]);
        assert!(matches!(
            parse_picture_payload(&payload, PictureType::CoverFront),
            Err(TagError::Transcoding(_))
        ));
    }

    #[test]
    fn picture_type_table() {
        assert_eq!(PictureType::from_byte(3), PictureType::CoverFront);
        assert_eq!(PictureType::from_byte(99), PictureType::Other);
        assert_eq!(PictureType::CoverFront.as_byte(), 3);
        assert_eq!(PictureType::CoverFront.as_str(), "Cover (front)");
    }
}

// ID3v2 tag header

use crate::id3::synchsafe;

/// Size of the on-disk tag header in bytes
pub const HEADER_SIZE: u32 = 10;

/// Tag header magic marker
pub const MAGIC: [u8; 3] = *b"ID3";

/// Extended header bit of the header flags byte
pub const FLAG_EXTENDED_HEADER: u8 = 1 << 6;

/// MPEG frame-sync patterns seen at the start of bare MP3 files
const FRAME_SYNC_PATTERNS: [[u8; 2]; 4] = [
    [0xFF, 0xFB], // *.mp3 (standard)
    [0xFF, 0xFA],
    [0xFF, 0xF3],
    [0xFF, 0xFD],
];

/// True if the two bytes look like the start of an MPEG audio frame
pub fn is_frame_sync(bytes: [u8; 2]) -> bool {
    FRAME_SYNC_PATTERNS.contains(&bytes)
}

/// Decoded ID3v2 tag header
///
/// `declared_size` is the size the file header claimed when the tag was
/// opened. It never changes afterwards, except for the padding rescue in
/// the reader, and is only used to locate the audio payload. The size of
/// the current frames lives in the frame store.
#[derive(Debug, Clone)]
pub struct TagHeader {
    pub version: (u8, u8),
    pub flags: u8,
    pub declared_size: u32,
}

impl TagHeader {
    /// Parse the 10 header bytes; `None` if the magic marker is missing
    pub fn parse(buffer: &[u8; 10]) -> Option<Self> {
        if buffer[0..3] != MAGIC {
            return None;
        }

        Some(TagHeader {
            version: (buffer[3], buffer[4]),
            flags: buffer[5],
            declared_size: synchsafe::decode_size([buffer[6], buffer[7], buffer[8], buffer[9]]),
        })
    }

    /// Default header for a tag synthesized onto a bare MP3 file
    pub fn new_empty() -> Self {
        TagHeader {
            version: (3, 0), // ID3v2.3.0
            flags: 0,
            declared_size: 0,
        }
    }

    /// Serialize the header with the given tag size (frames plus padding)
    pub fn to_bytes(&self, tag_size: u32) -> [u8; 10] {
        let size = synchsafe::encode_size(tag_size);
        [
            MAGIC[0],
            MAGIC[1],
            MAGIC[2],
            self.version.0,
            self.version.1,
            self.flags,
            size[0],
            size[1],
            size[2],
            size[3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_header() {
        let buffer = [b'I', b'D', b'3', 3, 0, 0, 0x00, 0x00, 0x02, 0x01];
        let header = TagHeader::parse(&buffer).unwrap();
        assert_eq!(header.version, (3, 0));
        assert_eq!(header.flags, 0);
        assert_eq!(header.declared_size, 257);
    }

    #[test]
    fn parse_rejects_wrong_magic() {
        let buffer = [0xFF, 0xFB, 0x90, 3, 0, 0, 0, 0, 0, 0];
        assert!(TagHeader::parse(&buffer).is_none());
    }

    #[test]
    fn header_round_trip() {
        let header = TagHeader {
            version: (3, 0),
            flags: 0,
            declared_size: 0,
        };
        let bytes = header.to_bytes(4096);
        let parsed = TagHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.version, (3, 0));
        assert_eq!(parsed.declared_size, 4096);
    }

    #[test]
    fn frame_sync_detection() {
        assert!(is_frame_sync([0xFF, 0xFB]));
        assert!(is_frame_sync([0xFF, 0xFA]));
        assert!(is_frame_sync([0xFF, 0xF3]));
        assert!(is_frame_sync([0xFF, 0xFD]));
        assert!(!is_frame_sync([0xFF, 0xFF]));
        assert!(!is_frame_sync([b'I', b'D']));
    }
}

// ID3v2.3 frame and frame store

use std::collections::HashMap;
use std::fmt;

/// Size of the on-disk frame header (ID + size + flags)
pub const FRAME_HEADER_SIZE: u32 = 10;

/// Four-byte frame identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub [u8; 4]);

/// Common ID3v2.3 frame identifiers
pub mod frame_ids {
    use super::FrameId;

    pub const TITLE: FrameId = FrameId(*b"TIT2"); // Title/songname/content description
    pub const ALBUM: FrameId = FrameId(*b"TALB"); // Album/Movie/Show title
    pub const ARTIST: FrameId = FrameId(*b"TPE1"); // Lead performer(s)/Soloist(s)
    pub const BAND: FrameId = FrameId(*b"TPE2"); // Band/orchestra/accompaniment
    pub const YEAR: FrameId = FrameId(*b"TYER"); // Year
    pub const TRACK: FrameId = FrameId(*b"TRCK"); // Track number/Position in set
    pub const DISC: FrameId = FrameId(*b"TPOS"); // Part of a set
    pub const PICTURE: FrameId = FrameId(*b"APIC"); // Attached picture
}

impl FrameId {
    /// The all-zero identifier marks the start of the padding area
    pub fn is_sentinel(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    /// True for text information frames ("T***")
    pub fn is_text(&self) -> bool {
        self.0[0] == b'T'
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl From<[u8; 4]> for FrameId {
    fn from(bytes: [u8; 4]) -> Self {
        FrameId(bytes)
    }
}

/// One metadata frame: identifier, flags, and opaque payload
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub flags: u16,
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame with zero flags, as the set operations do
    pub fn new(id: FrameId, data: Vec<u8>) -> Self {
        Frame { id, flags: 0, data }
    }

    /// Payload size plus the 10-byte frame header
    pub fn total_size(&self) -> u32 {
        self.data.len() as u32 + FRAME_HEADER_SIZE
    }
}

/// Ordered frame collection with unique identifiers
///
/// Keeps the running sum of all frame sizes (payload plus header) so the
/// writer always knows the real tag size, independent of whatever the file
/// header claimed when the tag was opened.
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
    index: HashMap<FrameId, usize>,
    real_size: u32,
}

impl FrameStore {
    pub fn new() -> Self {
        FrameStore::default()
    }

    /// Look up a frame by identifier
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.index.get(&id).map(|&pos| &self.frames[pos])
    }

    /// Insert a frame, replacing any existing frame with the same identifier
    ///
    /// A replaced frame keeps its position in the list. The size accounting
    /// drops the old frame and adds the new one.
    pub fn set_or_replace(&mut self, frame: Frame) {
        self.real_size += frame.total_size();

        match self.index.get(&frame.id) {
            Some(&pos) => {
                self.real_size -= self.frames[pos].total_size();
                self.frames[pos] = frame;
            }
            None => {
                self.index.insert(frame.id, self.frames.len());
                self.frames.push(frame);
            }
        }
    }

    /// Remove every frame and reset the size accounting
    pub fn remove_all(&mut self) {
        self.frames.clear();
        self.index.clear();
        self.real_size = 0;
    }

    /// Sum of all frame sizes including their headers, excluding padding
    pub fn real_size(&self) -> u32 {
        self.real_size
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate frames in store order
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: &[u8; 4], len: usize) -> Frame {
        Frame::new(FrameId(*id), vec![0xAB; len])
    }

    fn expected_size(store: &FrameStore) -> u32 {
        store.iter().map(|f| f.data.len() as u32 + 10).sum()
    }

    #[test]
    fn append_and_get() {
        let mut store = FrameStore::new();
        store.set_or_replace(frame(b"TIT2", 5));
        store.set_or_replace(frame(b"TALB", 7));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(frame_ids::TITLE).unwrap().data.len(), 5);
        assert!(store.get(frame_ids::ARTIST).is_none());
        assert_eq!(store.real_size(), 15 + 17);
    }

    #[test]
    fn replace_keeps_position_and_uniqueness() {
        let mut store = FrameStore::new();
        store.set_or_replace(frame(b"TIT2", 5));
        store.set_or_replace(frame(b"TALB", 7));
        store.set_or_replace(frame(b"TIT2", 100));

        assert_eq!(store.len(), 2);
        let order: Vec<FrameId> = store.iter().map(|f| f.id).collect();
        assert_eq!(order, vec![frame_ids::TITLE, frame_ids::ALBUM]);
        assert_eq!(store.get(frame_ids::TITLE).unwrap().data.len(), 100);
        assert_eq!(store.real_size(), expected_size(&store));
    }

    #[test]
    fn real_size_tracks_every_mutation() {
        let mut store = FrameStore::new();
        assert_eq!(store.real_size(), 0);

        store.set_or_replace(frame(b"TIT2", 3));
        assert_eq!(store.real_size(), expected_size(&store));

        store.set_or_replace(frame(b"TPE1", 0));
        assert_eq!(store.real_size(), expected_size(&store));

        store.set_or_replace(frame(b"TIT2", 42));
        assert_eq!(store.real_size(), expected_size(&store));

        store.set_or_replace(frame(b"APIC", 1000));
        assert_eq!(store.real_size(), expected_size(&store));

        store.remove_all();
        assert_eq!(store.real_size(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn frame_id_display() {
        assert_eq!(frame_ids::TITLE.to_string(), "TIT2");
        assert_eq!(FrameId([0x00, b'A', b'B', 0xFF]).to_string(), "?AB?");
    }
}

// ID3v2.3 tag reading and writing
//
// A Tag owns its source file for its whole lifetime. Opening parses the
// header, all frames, and the padding; closing rebuilds the tag in front
// of the untouched audio payload and consumes the Tag.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TagError};
use crate::id3::frame::{frame_ids, Frame, FrameId, FrameStore, FRAME_HEADER_SIZE};
use crate::id3::header::{self, TagHeader, HEADER_SIZE};
use crate::id3::picture::{self, CoverArt, PictureType};
use crate::utils::encoding;
use crate::utils::io::{read_be_u16, read_be_u32};

/// Zero bytes written after the last frame, reserved for in-place growth
pub const PADDING_SIZE: u32 = 2048;

/// Options for opening a tag
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Synthesize an empty tag when the file is a bare MP3
    pub create_tag: bool,
    /// Print header and frame details while reading
    pub print_header: bool,
}

/// Where a closed tag is written to
#[derive(Debug, Clone)]
pub enum WriteDestination {
    /// Overwrite the source file through a temporary spool file
    InPlace,
    /// Write to another file, leaving the source untouched
    Path(PathBuf),
    /// Write nothing (read-only mode)
    Discard,
}

/// An open ID3v2 tag bound to its source file
#[derive(Debug)]
pub struct Tag {
    header: TagHeader,
    store: FrameStore,
    file: File,
    path: PathBuf,
    /// Absolute offset of the first audio byte in the source file
    audio_offset: u64,
}

impl Tag {
    /// Open a file and parse its tag
    pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Tag> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| TagError::source_access(&path, e))?;
        let mut reader = BufReader::new(file);

        let mut buffer = [0u8; HEADER_SIZE as usize];
        reader
            .read_exact(&mut buffer)
            .map_err(|e| read_error(&path, "file ends inside the tag header", e))?;

        let mut synthesized = false;
        let mut tag_header = match TagHeader::parse(&buffer) {
            Some(h) => h,
            None if options.create_tag && header::is_frame_sync([buffer[0], buffer[1]]) => {
                // bare MP3: start with an empty tag and reparse the audio
                // from the beginning of the file
                debug!("no tag marker, creating an empty tag for a bare MP3");
                reader
                    .seek(SeekFrom::Start(0))
                    .map_err(|e| TagError::source_access(&path, e))?;
                synthesized = true;
                TagHeader::new_empty()
            }
            None => {
                return Err(TagError::Unsupported(format!(
                    "no tag marker found, file starts with {:02X} {:02X} {:02X}",
                    buffer[0], buffer[1], buffer[2]
                )));
            }
        };

        if options.print_header {
            println!("Header");
            println!("  version: 2.{}.{}", tag_header.version.0, tag_header.version.1);
            println!("  flags:   0x{:02X}", tag_header.flags);
            println!("  size:    {}", tag_header.declared_size);
        }

        if tag_header.flags & header::FLAG_EXTENDED_HEADER != 0 {
            return Err(TagError::Unsupported(
                "extended header is not supported".to_string(),
            ));
        }
        if tag_header.flags != 0 {
            return Err(TagError::Unsupported(format!(
                "unsupported header flags 0x{:02X}",
                tag_header.flags
            )));
        }
        if tag_header.version == (4, 0) {
            warn!("ID3v2.4.0 is only partially supported");
        } else if tag_header.version != (3, 0) {
            return Err(TagError::Unsupported(format!(
                "version 2.{}.{} is not supported, only 2.3.0",
                tag_header.version.0, tag_header.version.1
            )));
        }

        // frame loop: runs until the declared size is used up or the
        // all-zero sentinel marks the start of the padding
        let mut store = FrameStore::new();
        let mut offset: u32 = 0;
        while offset < tag_header.declared_size {
            let mut id = [0u8; 4];
            reader
                .read_exact(&mut id)
                .map_err(|e| read_error(&path, "file ends inside a frame header", e))?;
            let id = FrameId(id);
            if id.is_sentinel() {
                offset += 4; // the sentinel bytes count toward the padding
                break;
            }

            let size = read_be_u32(&mut reader)
                .map_err(|e| read_error(&path, "file ends inside a frame header", e))?;
            let flags = read_be_u16(&mut reader)
                .map_err(|e| read_error(&path, "file ends inside a frame header", e))?;
            let mut data = vec![0u8; size as usize];
            reader
                .read_exact(&mut data)
                .map_err(|e| read_error(&path, "file ends inside a frame payload", e))?;

            if options.print_header {
                println!(
                    "Frame @ offset {:6}: ID: '{}', Flags: 0x{:04X}, Size: {:6}",
                    offset, id, flags, size
                );
            }

            store.set_or_replace(Frame { id, flags, data });
            offset += size + FRAME_HEADER_SIZE;
        }

        // padding check: everything up to the declared size must be zero.
        // A nonzero byte means the header lied about the size; assume the
        // padding ends here and resynchronize.
        while offset < tag_header.declared_size {
            let mut byte = [0u8; 1];
            reader
                .read_exact(&mut byte)
                .map_err(|e| read_error(&path, "file ends inside the padding area", e))?;
            if byte[0] != 0 {
                warn!(
                    "bad padding byte 0x{:02X} at offset {}, expected padding up to {}; \
                     assuming the declared size is wrong",
                    byte[0], offset, tag_header.declared_size
                );
                tag_header.declared_size = offset;
                reader
                    .seek(SeekFrom::Start((tag_header.declared_size + HEADER_SIZE) as u64))
                    .map_err(|e| TagError::source_access(&path, e))?;
                break;
            }
            offset += 1;
        }

        // a synthesized tag has its audio at the very start of the file;
        // otherwise it follows the tag as declared (after any rescue)
        let audio_offset = if synthesized {
            0
        } else {
            (tag_header.declared_size + HEADER_SIZE) as u64
        };

        // the audio payload should start right here
        let mut magic = [0u8; 2];
        match reader.read_exact(&mut magic) {
            Ok(()) if header::is_frame_sync(magic) => {}
            Ok(()) => warn!(
                "no MPEG frame sync at offset {}, found 0x{:02X}{:02X}",
                audio_offset, magic[0], magic[1]
            ),
            Err(_) => warn!("file ends where the audio payload should start"),
        }

        debug!(
            declared_size = tag_header.declared_size,
            real_size = store.real_size(),
            frames = store.len(),
            "tag opened"
        );

        Ok(Tag {
            header: tag_header,
            store,
            file: reader.into_inner(),
            path,
            audio_offset,
        })
    }

    /// Serialize the tag and release it
    ///
    /// The rebuilt tag consists of a recomputed header, all frames in
    /// store order, fixed-size zero padding, and the source's audio
    /// payload copied verbatim. A `Path` destination equal to the source
    /// degrades to `InPlace`.
    pub fn close(self, destination: WriteDestination) -> Result<()> {
        let destination = match destination {
            WriteDestination::Path(p) if p == self.path => WriteDestination::InPlace,
            other => other,
        };
        let mut tag = self;

        match destination {
            // dropping the tag releases the file handle and all frames
            WriteDestination::Discard => Ok(()),

            WriteDestination::Path(p) => {
                let file = File::create(&p).map_err(|e| TagError::source_access(&p, e))?;
                let mut writer = BufWriter::new(file);
                tag.write_to(&mut writer)?;
                writer.flush().map_err(TagError::WriteFailure)
            }

            WriteDestination::InPlace => {
                // spool the full result first so a failed write never
                // leaves a half-rewritten source file
                let mut spool = tempfile::tempfile().map_err(TagError::WriteFailure)?;
                {
                    let mut writer = BufWriter::new(&mut spool);
                    tag.write_to(&mut writer)?;
                    writer.flush().map_err(TagError::WriteFailure)?;
                }
                spool
                    .seek(SeekFrom::Start(0))
                    .map_err(TagError::WriteFailure)?;

                let file = File::options()
                    .write(true)
                    .truncate(true)
                    .open(&tag.path)
                    .map_err(|e| TagError::source_access(&tag.path, e))?;
                let mut writer = BufWriter::new(file);
                io::copy(&mut spool, &mut writer).map_err(TagError::WriteFailure)?;
                writer.flush().map_err(TagError::WriteFailure)
            }
        }
    }

    fn write_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let header_bytes = self.header.to_bytes(self.store.real_size() + PADDING_SIZE);
        writer
            .write_all(&header_bytes)
            .map_err(TagError::WriteFailure)?;

        for frame in self.store.iter() {
            // frame sizes are written as plain big-endian integers, never
            // synchsafe, even for a tag that was opened as 2.4
            writer
                .write_all(&frame.id.as_bytes())
                .map_err(TagError::WriteFailure)?;
            writer
                .write_all(&(frame.data.len() as u32).to_be_bytes())
                .map_err(TagError::WriteFailure)?;
            writer
                .write_all(&frame.flags.to_be_bytes())
                .map_err(TagError::WriteFailure)?;
            writer
                .write_all(&frame.data)
                .map_err(TagError::WriteFailure)?;
        }

        writer
            .write_all(&vec![0u8; PADDING_SIZE as usize])
            .map_err(TagError::WriteFailure)?;

        // copy the audio payload from where the reader located it
        self.file
            .seek(SeekFrom::Start(self.audio_offset))
            .map_err(|e| TagError::source_access(&self.path, e))?;
        io::copy(&mut self.file, writer).map_err(TagError::WriteFailure)?;
        Ok(())
    }

    /// Look up a frame by identifier
    pub fn raw_frame(&self, id: FrameId) -> Result<&Frame> {
        self.store.get(id).ok_or(TagError::FrameNotFound(id))
    }

    /// Store a frame payload, replacing an existing frame with the same ID
    pub fn set_raw_frame(&mut self, id: FrameId, data: Vec<u8>) {
        self.store.set_or_replace(Frame::new(id, data));
    }

    /// Drop every frame
    pub fn remove_all_frames(&mut self) {
        self.store.remove_all();
    }

    /// Read a text frame as UTF-8
    pub fn text_frame(&self, id: FrameId) -> Result<String> {
        encoding::decode_text_payload(&self.raw_frame(id)?.data)
    }

    /// Store a text frame, normalized to UTF-16LE with BOM
    pub fn set_text_frame(&mut self, id: FrameId, text: &str) -> Result<()> {
        self.set_raw_frame(id, encoding::encode_text_payload(text));
        Ok(())
    }

    /// Read the attached picture of the given type
    pub fn picture(&self, picture_type: PictureType) -> Result<CoverArt> {
        picture::parse_picture_payload(&self.raw_frame(frame_ids::PICTURE)?.data, picture_type)
    }

    /// Store an attached picture
    pub fn set_picture(
        &mut self,
        picture_type: PictureType,
        mime_type: &str,
        description: Option<&str>,
        image: &[u8],
    ) -> Result<()> {
        let payload = picture::build_picture_payload(picture_type, mime_type, description, image);
        self.set_raw_frame(frame_ids::PICTURE, payload);
        Ok(())
    }

    pub fn title(&self) -> Result<String> {
        self.text_frame(frame_ids::TITLE)
    }

    pub fn set_title(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::TITLE, text)
    }

    pub fn album(&self) -> Result<String> {
        self.text_frame(frame_ids::ALBUM)
    }

    pub fn set_album(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::ALBUM, text)
    }

    pub fn artist(&self) -> Result<String> {
        self.text_frame(frame_ids::ARTIST)
    }

    pub fn set_artist(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::ARTIST, text)
    }

    pub fn year(&self) -> Result<String> {
        self.text_frame(frame_ids::YEAR)
    }

    pub fn set_year(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::YEAR, text)
    }

    pub fn track(&self) -> Result<String> {
        self.text_frame(frame_ids::TRACK)
    }

    pub fn set_track(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::TRACK, text)
    }

    pub fn disc(&self) -> Result<String> {
        self.text_frame(frame_ids::DISC)
    }

    pub fn set_disc(&mut self, text: &str) -> Result<()> {
        self.set_text_frame(frame_ids::DISC, text)
    }

    /// Iterate frames in store order
    pub fn frames(&self) -> std::slice::Iter<'_, Frame> {
        self.store.iter()
    }

    pub fn frame_count(&self) -> usize {
        self.store.len()
    }

    pub fn version(&self) -> (u8, u8) {
        self.header.version
    }

    /// Override the version stamped into the header on write
    pub fn set_version(&mut self, version: (u8, u8)) {
        self.header.version = version;
    }

    /// Size the file header claimed when the tag was opened
    pub fn declared_size(&self) -> u32 {
        self.header.declared_size
    }

    /// Size of the current frames including their headers
    pub fn real_size(&self) -> u32 {
        self.store.real_size()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_error(path: &Path, context: &str, error: io::Error) -> TagError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        TagError::UnexpectedEof(context.to_string())
    } else {
        TagError::source_access(path, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn open_rejects_unknown_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "not.mp3", b"OggS\0\0\0\0\0\0\0\0");
        let error = Tag::open(&path, &OpenOptions::default()).unwrap_err();
        assert!(matches!(error, TagError::Unsupported(_)));
    }

    #[test]
    fn open_rejects_bare_mp3_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "bare.mp3", &[0xFF, 0xFB, 0x90, 0, 1, 2, 3, 4, 5, 6]);
        let error = Tag::open(&path, &OpenOptions::default()).unwrap_err();
        assert!(matches!(error, TagError::Unsupported(_)));
    }

    #[test]
    fn open_creates_tag_for_bare_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "bare.mp3", &[0xFF, 0xFB, 0x90, 0, 1, 2, 3, 4, 5, 6]);
        let options = OpenOptions {
            create_tag: true,
            ..OpenOptions::default()
        };
        let tag = Tag::open(&path, &options).unwrap();
        assert_eq!(tag.version(), (3, 0));
        assert_eq!(tag.declared_size(), 0);
        assert_eq!(tag.real_size(), 0);
        assert_eq!(tag.frame_count(), 0);
    }

    #[test]
    fn open_rejects_nonzero_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![b'I', b'D', b'3', 3, 0, 0x40, 0, 0, 0, 0];
        bytes.extend_from_slice(&[0xFF, 0xFB]);
        let path = write_fixture(&dir, "flags.mp3", &bytes);
        let error = Tag::open(&path, &OpenOptions::default()).unwrap_err();
        match error {
            TagError::Unsupported(msg) => assert!(msg.contains("extended header")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn open_rejects_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![b'I', b'D', b'3', 2, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&[0xFF, 0xFB]);
        let path = write_fixture(&dir, "v22.mp3", &bytes);
        let error = Tag::open(&path, &OpenOptions::default()).unwrap_err();
        assert!(matches!(error, TagError::Unsupported(_)));
    }

    #[test]
    fn truncated_tag_is_unexpected_eof() {
        let dir = tempfile::tempdir().unwrap();
        // declares 100 bytes of tag data but the file ends immediately
        let bytes = vec![b'I', b'D', b'3', 3, 0, 0, 0, 0, 0, 100];
        let path = write_fixture(&dir, "short.mp3", &bytes);
        let error = Tag::open(&path, &OpenOptions::default()).unwrap_err();
        assert!(matches!(error, TagError::UnexpectedEof(_)));
    }

    #[test]
    fn missing_frame_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = TagHeader::new_empty().to_bytes(0).to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFB]);
        let path = write_fixture(&dir, "empty.mp3", &bytes);
        let tag = Tag::open(&path, &OpenOptions::default()).unwrap();
        assert!(matches!(
            tag.title(),
            Err(TagError::FrameNotFound(id)) if id == frame_ids::TITLE
        ));
    }
}

// Ferrotag - An ID3v2.3 tag reader and writer for MP3 files
//
// The library surface is the Tag type: open a file, read or change its
// frames, close it to a destination. Everything below (synchsafe sizes,
// the frame store, the text and picture codecs) is public for callers
// that need direct access to the building blocks.

pub mod error;
pub mod id3;
pub mod utils;

pub use error::{Result, TagError};
pub use id3::{
    frame_ids, CoverArt, Frame, FrameId, FrameStore, OpenOptions, PictureType, Tag, TagHeader,
    WriteDestination, PADDING_SIZE,
};
pub use utils::encoding::TextEncoding;

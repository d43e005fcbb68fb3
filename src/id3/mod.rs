// ID3v2 tag handling module

pub mod frame;
pub mod header;
pub mod picture;
pub mod synchsafe;
pub mod tag;

pub use frame::{frame_ids, Frame, FrameId, FrameStore};
pub use header::TagHeader;
pub use picture::{CoverArt, PictureType};
pub use tag::{OpenOptions, Tag, WriteDestination, PADDING_SIZE};

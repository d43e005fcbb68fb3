// Error types for tag reading and writing

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::id3::frame::FrameId;

/// Errors reported by the tag codec
#[derive(Debug, Error)]
pub enum TagError {
    /// Opening, seeking, or reading the underlying file failed
    #[error("accessing \"{path}\" failed: {source}")]
    SourceAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The byte source is not a tag this crate can handle
    #[error("unsupported format: {0}")]
    Unsupported(String),

    /// No frame with the requested identifier exists
    #[error("frame {0} not found")]
    FrameNotFound(FrameId),

    /// A text or description payload could not be transcoded
    #[error("transcoding failed: {0}")]
    Transcoding(String),

    /// An APIC frame exists but carries a different picture type
    #[error("picture type mismatch: requested {requested}, found {found}")]
    PictureTypeMismatch { requested: u8, found: u8 },

    /// Writing the rebuilt tag or copying the audio payload failed
    #[error("write failed: {0}")]
    WriteFailure(#[source] io::Error),

    /// The source ended before the declared tag size was reached
    #[error("unexpected end of data: {0}")]
    UnexpectedEof(String),

    /// A text payload starts with an unrecognized encoding selector
    #[error("unsupported text encoding selector 0x{0:02X}")]
    UnsupportedEncoding(u8),
}

pub type Result<T> = std::result::Result<T, TagError>;

impl TagError {
    /// Wrap an I/O error that occurred while accessing `path`
    pub(crate) fn source_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TagError::SourceAccess {
            path: path.into(),
            source,
        }
    }
}

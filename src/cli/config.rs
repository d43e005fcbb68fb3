// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Ferrotag - ID3v2.3 tag command-line editor
#[derive(Parser, Debug)]
#[command(name = "ferrotag")]
#[command(about = "An ID3v2.3 tag reader, writer, and editor for MP3 files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print header and frame details while reading
    #[arg(long, global = true)]
    pub show_header: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for tag data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the common text frames of MP3 file(s)
    Read {
        /// MP3 file path(s)
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Write frames to an MP3 file
    Write {
        /// MP3 file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Songname (TIT2)
        #[arg(long)]
        title: Option<String>,

        /// Album name (TALB)
        #[arg(long)]
        album: Option<String>,

        /// Artist name (written to both TPE1 and TPE2)
        #[arg(long)]
        artist: Option<String>,

        /// Release year (TYER), e.g. 2001
        #[arg(long)]
        release: Option<String>,

        /// Track number (TRCK), e.g. 03/11
        #[arg(long)]
        track: Option<String>,

        /// Disc number (TPOS), e.g. 1/1
        #[arg(long)]
        disc: Option<String>,

        /// Image file stored as front cover artwork (APIC)
        #[arg(long, value_name = "PATH")]
        artwork: Option<PathBuf>,

        /// Remove all frames before applying the new values
        #[arg(long)]
        clear: bool,

        /// Create a tag if the file is a bare MP3
        #[arg(long)]
        create: bool,

        /// Apply everything but write nothing to disk
        #[arg(long)]
        readonly: bool,

        /// Stamp version 2.3.0 into the header on write
        #[arg(long = "force-v23")]
        force_v23: bool,

        /// Write to this file instead of overwriting the source
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// List all frames of a file
    Frames {
        /// MP3 file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Hexdump one frame
    Dump {
        /// MP3 file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Frame identifier, e.g. TIT2
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Export the attached picture to an image file
    ExportCover {
        /// MP3 file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output image path
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Picture type byte to request (3 = front cover)
        #[arg(long, default_value_t = 3)]
        pic_type: u8,
    },

    /// Show file information
    Info {
        /// MP3 file path(s)
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Read every matching file under a directory
    Scan {
        /// Directory to scan
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,

        /// File pattern
        #[arg(short, long, default_value = "*.mp3")]
        pattern: String,
    },
}

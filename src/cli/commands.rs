// CLI command implementations
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, Local};
use serde::Serialize;

use ferrotag::utils::encoding::TextEncoding;
use ferrotag::{frame_ids, FrameId, OpenOptions, PictureType, Tag, TagError, WriteDestination};

use crate::cli::config::Config;
use crate::cli::output::{hexdump, OutputFormatter};

/// Longest frame payload a dump prints before truncating
const DUMP_LIMIT: usize = 256;

/// The common text frames shown by `read`
const TEXT_FIELDS: [(FrameId, &str); 7] = [
    (frame_ids::TITLE, "Name"),
    (frame_ids::ALBUM, "Album"),
    (frame_ids::ARTIST, "Artist"),
    (frame_ids::BAND, ""),
    (frame_ids::YEAR, "Release"),
    (frame_ids::TRACK, "Track"),
    (frame_ids::DISC, "Disc"),
];

#[derive(Serialize)]
struct TagSummary {
    file: String,
    version: String,
    title: Option<String>,
    album: Option<String>,
    artist: Option<String>,
    band: Option<String>,
    release: Option<String>,
    track: Option<String>,
    disc: Option<String>,
}

fn open_options(config: &Config, create_tag: bool) -> OpenOptions {
    OpenOptions {
        create_tag,
        print_header: config.show_header,
    }
}

/// Read a text frame, treating a missing frame as `None`
fn text_or_none(tag: &Tag, id: FrameId) -> Result<Option<String>> {
    match tag.text_frame(id) {
        Ok(text) => Ok(Some(text)),
        Err(TagError::FrameNotFound(_)) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading frame {}", id)),
    }
}

fn summarize(tag: &Tag, path: &Path) -> Result<TagSummary> {
    Ok(TagSummary {
        file: path.display().to_string(),
        version: format!("2.{}.{}", tag.version().0, tag.version().1),
        title: text_or_none(tag, frame_ids::TITLE)?,
        album: text_or_none(tag, frame_ids::ALBUM)?,
        artist: text_or_none(tag, frame_ids::ARTIST)?,
        band: text_or_none(tag, frame_ids::BAND)?,
        release: text_or_none(tag, frame_ids::YEAR)?,
        track: text_or_none(tag, frame_ids::TRACK)?,
        disc: text_or_none(tag, frame_ids::DISC)?,
    })
}

/// Read and display the common text frames
pub fn command_read(files: &[PathBuf], config: &Config, formatter: &OutputFormatter) -> Result<()> {
    if files.is_empty() {
        bail!("no files specified");
    }

    let mut failed = false;
    for path in files {
        let tag = match Tag::open(path, &open_options(config, false)) {
            Ok(tag) => tag,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", path.display(), e));
                failed = true;
                continue;
            }
        };

        if formatter.is_json() {
            formatter.output_value(&summarize(&tag, path)?)?;
        } else {
            println!("{} (ID3v2.{}.{})", path.display(), tag.version().0, tag.version().1);
            for (id, name) in TEXT_FIELDS {
                if let Some(value) = text_or_none(&tag, id)? {
                    let label = if name.is_empty() {
                        String::new()
                    } else {
                        format!("{}:", name)
                    };
                    println!(" {}  {:8} {}", id, label, value);
                }
            }
        }

        tag.close(WriteDestination::Discard)?;
    }

    if failed {
        bail!("some files could not be read");
    }
    Ok(())
}

/// Apply the write options to one file
#[allow(clippy::too_many_arguments)]
pub fn command_write(
    file: &Path,
    title: Option<&str>,
    album: Option<&str>,
    artist: Option<&str>,
    release: Option<&str>,
    track: Option<&str>,
    disc: Option<&str>,
    artwork: Option<&Path>,
    clear: bool,
    create: bool,
    readonly: bool,
    force_v23: bool,
    output: Option<&Path>,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut tag = Tag::open(file, &open_options(config, create))
        .with_context(|| format!("opening {}", file.display()))?;

    if clear {
        tag.remove_all_frames();
    }

    if let Some(text) = title {
        tag.set_title(text)?;
    }
    if let Some(text) = album {
        tag.set_album(text)?;
    }
    if let Some(text) = artist {
        // the artist goes into both the performer and the band frame
        tag.set_artist(text)?;
        tag.set_text_frame(frame_ids::BAND, text)?;
    }
    if let Some(text) = release {
        tag.set_year(text)?;
    }
    if let Some(text) = track {
        tag.set_track(text)?;
    }
    if let Some(text) = disc {
        tag.set_disc(text)?;
    }
    if let Some(image_path) = artwork {
        let image = fs::read(image_path)
            .with_context(|| format!("reading artwork {}", image_path.display()))?;
        tag.set_picture(PictureType::CoverFront, "image/jpg", None, &image)?;
    }

    if force_v23 {
        tag.set_version((3, 0));
    }

    let destination = if readonly {
        WriteDestination::Discard
    } else {
        match output {
            Some(path) => WriteDestination::Path(path.to_path_buf()),
            None => WriteDestination::InPlace,
        }
    };

    tag.close(destination)
        .with_context(|| format!("writing {}", file.display()))?;

    if readonly {
        formatter.print_info(&format!("{}: parsed, nothing written", file.display()));
    } else {
        formatter.print_success(&format!("updated {}", file.display()));
    }
    Ok(())
}

#[derive(Serialize)]
struct FrameInfo {
    id: String,
    size: usize,
    flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    byte_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

/// Frame encoding details for the listing: encoding name, BOM state,
/// and a notice when broken tools stacked multiple BOMs
fn text_frame_details(data: &[u8]) -> (Option<String>, Option<String>) {
    let Some(&selector) = data.first() else {
        return (Some("empty".to_string()), None);
    };
    let encoding = match TextEncoding::from_byte(selector) {
        Ok(e) => e,
        Err(_) => return (Some(format!("invalid (0x{:02X})", selector)), None),
    };

    let byte_order = if encoding == TextEncoding::Utf16 {
        let order = match data.get(1..3) {
            Some([0xFF, 0xFE]) => "LE",
            Some([0xFE, 0xFF]) => "BE",
            _ => "BOM missing",
        };
        let double_bom = matches!(data.get(3..5), Some([0xFF, 0xFE]) | Some([0xFE, 0xFF]));
        if double_bom {
            Some(format!("{} (multiple BOM found!)", order))
        } else {
            Some(order.to_string())
        }
    } else {
        None
    };

    (Some(encoding.as_str().to_string()), byte_order)
}

/// MIME type of an APIC payload, as far as it can be read
fn picture_mime(data: &[u8]) -> Option<String> {
    let mime = data.get(1..)?;
    let end = mime.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&mime[..end]).to_string())
}

/// List all frames of a file
pub fn command_frames(file: &Path, config: &Config, formatter: &OutputFormatter) -> Result<()> {
    let tag = Tag::open(file, &open_options(config, false))
        .with_context(|| format!("opening {}", file.display()))?;

    let mut frames = Vec::new();
    for frame in tag.frames() {
        let (encoding, byte_order) = if frame.id.is_text() {
            text_frame_details(&frame.data)
        } else {
            (None, None)
        };
        let mime_type = if frame.id == frame_ids::PICTURE {
            picture_mime(&frame.data)
        } else {
            None
        };
        frames.push(FrameInfo {
            id: frame.id.to_string(),
            size: frame.data.len(),
            flags: frame.flags,
            encoding,
            byte_order,
            mime_type,
        });
    }

    if formatter.is_json() {
        formatter.output_value(&frames)?;
    } else {
        println!(" ID    Size    Flags   Details");
        for info in &frames {
            let mut details = String::new();
            if let Some(encoding) = &info.encoding {
                details.push_str(encoding);
            }
            if let Some(order) = &info.byte_order {
                details.push_str(&format!(" {}", order));
            }
            if let Some(mime) = &info.mime_type {
                details.push_str(mime);
            }
            let flag_marker = if info.flags == 0 { ' ' } else { '!' };
            println!(
                " {}  {:6}  0x{:04X}{} {}",
                info.id, info.size, info.flags, flag_marker, details
            );
        }
    }

    tag.close(WriteDestination::Discard)?;
    Ok(())
}

#[derive(Serialize)]
struct FrameDump {
    id: String,
    size: usize,
    flags: u16,
    data: String, // base64
}

/// Hexdump one frame
pub fn command_dump(
    file: &Path,
    id: &str,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<()> {
    let id_bytes: [u8; 4] = id
        .as_bytes()
        .try_into()
        .map_err(|_| anyhow::anyhow!("frame ID must be 4 characters, got \"{}\"", id))?;
    let id = FrameId(id_bytes);

    let tag = Tag::open(file, &open_options(config, false))
        .with_context(|| format!("opening {}", file.display()))?;
    let frame = tag
        .raw_frame(id)
        .with_context(|| format!("in {}", file.display()))?;

    if formatter.is_json() {
        formatter.output_value(&FrameDump {
            id: frame.id.to_string(),
            size: frame.data.len(),
            flags: frame.flags,
            data: base64::engine::general_purpose::STANDARD.encode(&frame.data),
        })?;
    } else {
        println!(
            "ID: {}, Size: {}, Flags: 0x{:04X}",
            frame.id,
            frame.data.len(),
            frame.flags
        );
        let shown = frame.data.len().min(DUMP_LIMIT);
        print!("{}", hexdump(&frame.data[..shown]));
        if frame.data.len() > DUMP_LIMIT {
            println!("({} more bytes)", frame.data.len() - DUMP_LIMIT);
        }
    }

    tag.close(WriteDestination::Discard)?;
    Ok(())
}

/// Export the attached picture to an image file
pub fn command_export_cover(
    file: &Path,
    output: &Path,
    pic_type: u8,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<()> {
    let tag = Tag::open(file, &open_options(config, false))
        .with_context(|| format!("opening {}", file.display()))?;

    let cover = tag
        .picture(PictureType::from_byte(pic_type))
        .with_context(|| format!("in {}", file.display()))?;
    cover
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    formatter.print_success(&format!(
        "exported {} cover ({}, {} bytes) to {}",
        PictureType::from_byte(pic_type).as_str(),
        cover.mime_type,
        cover.data.len(),
        output.display()
    ));

    tag.close(WriteDestination::Discard)?;
    Ok(())
}

#[derive(Serialize)]
struct FileInfo {
    file: String,
    size: u64,
    modified: String,
    version: String,
    declared_size: u32,
    real_size: u32,
    frames: usize,
}

/// Show file information
pub fn command_info(files: &[PathBuf], config: &Config, formatter: &OutputFormatter) -> Result<()> {
    if files.is_empty() {
        bail!("no files specified");
    }

    for path in files {
        let metadata =
            fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
        let modified: DateTime<Local> = metadata
            .modified()
            .with_context(|| format!("reading mtime of {}", path.display()))?
            .into();

        let tag = Tag::open(path, &open_options(config, false))
            .with_context(|| format!("opening {}", path.display()))?;
        let info = FileInfo {
            file: path.display().to_string(),
            size: metadata.len(),
            modified: modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            version: format!("2.{}.{}", tag.version().0, tag.version().1),
            declared_size: tag.declared_size(),
            real_size: tag.real_size(),
            frames: tag.frame_count(),
        };

        if formatter.is_json() {
            formatter.output_value(&info)?;
        } else {
            println!("{}", info.file);
            println!("  size:          {} bytes", info.size);
            println!("  modified:      {}", info.modified);
            println!("  tag version:   ID3v{}", info.version);
            println!("  declared size: {}", info.declared_size);
            println!("  real size:     {}", info.real_size);
            println!("  frames:        {}", info.frames);
        }

        tag.close(WriteDestination::Discard)?;
    }
    Ok(())
}

/// Read every matching file under a directory
pub fn command_scan(
    directory: &Path,
    pattern: &str,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<()> {
    let glob_pattern = format!("{}/**/{}", directory.display(), pattern);
    let mut success_count = 0usize;
    let mut error_count = 0usize;

    for entry in glob::glob(&glob_pattern).context("invalid glob pattern")? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                formatter.print_error(&format!("reading path: {}", e));
                error_count += 1;
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }

        match Tag::open(&path, &open_options(config, false)) {
            Ok(tag) => {
                formatter.print_success(&format!(
                    "{} ({} frames, {} bytes of tag data)",
                    path.display(),
                    tag.frame_count(),
                    tag.real_size()
                ));
                tag.close(WriteDestination::Discard)?;
                success_count += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {}", path.display(), e));
                error_count += 1;
            }
        }
    }

    formatter.print_info(&format!(
        "scanned {} files, {} errors",
        success_count + error_count,
        error_count
    ));
    if success_count + error_count == 0 {
        formatter.print_info("no files found matching pattern");
    }
    Ok(())
}

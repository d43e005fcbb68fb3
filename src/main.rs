// CLI binary entry point for ferrotag

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::commands;
use cli::{Commands, Config, OutputFormatter};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let formatter = OutputFormatter::new(config.format, config.quiet);

    let result = match &config.command {
        Commands::Read { files } => commands::command_read(files, &config, &formatter),
        Commands::Write {
            file,
            title,
            album,
            artist,
            release,
            track,
            disc,
            artwork,
            clear,
            create,
            readonly,
            force_v23,
            output,
        } => commands::command_write(
            file,
            title.as_deref(),
            album.as_deref(),
            artist.as_deref(),
            release.as_deref(),
            track.as_deref(),
            disc.as_deref(),
            artwork.as_deref(),
            *clear,
            *create,
            *readonly,
            *force_v23,
            output.as_deref(),
            &config,
            &formatter,
        ),
        Commands::Frames { file } => commands::command_frames(file, &config, &formatter),
        Commands::Dump { file, id } => commands::command_dump(file, id, &config, &formatter),
        Commands::ExportCover {
            file,
            output,
            pic_type,
        } => commands::command_export_cover(file, output, *pic_type, &config, &formatter),
        Commands::Info { files } => commands::command_info(files, &config, &formatter),
        Commands::Scan { directory, pattern } => {
            commands::command_scan(directory, pattern, &config, &formatter)
        }
    };

    if let Err(e) = result {
        formatter.print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

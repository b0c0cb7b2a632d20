use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dspace_csv_archive::{archive::SafArchiveBuilder, item::saf::handles::HandleTable};
use log::info;

/// Convert a CSV metadata export into a DSpace Simple Archive Format package
#[derive(Parser, Debug)]
#[command(name = "dspace-csv-archive", version, about)]
struct Cli {
    /// CSV metadata export; bitstream paths are resolved against its directory
    input: PathBuf,

    /// Output directory for the item tree [default: <input dir>_saf]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// ZIP archive path [default: <output>.zip]
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Separator between multiple values in one cell
    #[arg(short, long, default_value = "||")]
    delimiter: String,

    /// CSV column separator
    #[arg(long, default_value_t = ',')]
    csv_delimiter: char,

    /// JSON object mapping dc.type values to collection handles
    #[arg(long)]
    handles: Option<PathBuf>,

    /// ZIP compression level (0-9)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(i32).range(0..=9))]
    compression_level: i32,

    /// Number of failing rows tolerated before aborting
    #[arg(long, default_value_t = 0)]
    skip_limit: u16,

    /// Only write the item tree, do not compress it
    #[arg(long)]
    no_zip: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if !cli.csv_delimiter.is_ascii() {
        bail!("CSV delimiter must be an ASCII character");
    }

    let handles = match &cli.handles {
        Some(path) => HandleTable::from_path(path)?,
        None => HandleTable::default(),
    };

    info!("input_file = {}", cli.input.display());

    let mut builder = SafArchiveBuilder::new(&cli.input)
        .delimiter(&cli.delimiter)
        .csv_delimiter(cli.csv_delimiter as u8)
        .handles(handles)
        .compression_level(cli.compression_level)
        .skip_limit(cli.skip_limit)
        .zip(!cli.no_zip);
    if let Some(output) = &cli.output {
        builder = builder.output_dir(output);
    }
    if let Some(archive) = &cli.archive {
        builder = builder.archive_path(archive);
    }

    let report = builder
        .build()
        .with_context(|| format!("Invalid configuration for {}", cli.input.display()))?
        .run()
        .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

    info!("output_path = {}", report.output_dir.display());
    if let Some(archive) = &report.archive_path {
        info!("archive = {}", archive.display());
    }

    Ok(())
}

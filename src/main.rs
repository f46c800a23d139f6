//! KTEX CLI - Command-line tool for converting game textures.
//!
//! This is the main entry point for the `ktex` command-line application.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use ktex::common::DEFAULT_SCRATCH_SIZE;
use ktex::prelude::*;

/// KTEX - convert game textures between pixel formats
#[derive(Parser)]
#[command(name = "ktex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input KTEX file or directory
    #[arg(short, long, env = "KTEX_INPUT", value_parser = existing_path)]
    input: PathBuf,

    /// Output file or directory
    #[arg(short, long, env = "KTEX_OUTPUT")]
    output: PathBuf,

    /// Target pixel format code (0=DXT1, 1=DXT3, 2=DXT5, 4=ARGB, 5=RGB, 18=ETC2_EAC)
    #[arg(short, long, value_parser = target_format)]
    target: PixelFormat,

    /// Export a PNG preview of every mip level into this directory
    #[arg(short, long)]
    preview: Option<PathBuf>,

    /// Treat truncated mip payloads as failures
    #[arg(long)]
    strict: bool,

    /// Size in bytes of the read transfer buffer
    #[arg(long, default_value_t = DEFAULT_SCRATCH_SIZE)]
    scratch_size: usize,
}

fn existing_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("{} does not exist", path.display()))
    }
}

fn target_format(s: &str) -> Result<PixelFormat, String> {
    let code: u32 = s.parse().map_err(|e| format!("{e}"))?;
    PixelFormat::from_code(code).ok_or_else(|| {
        let valid: Vec<_> = PixelFormat::ALL.iter().map(|f| f.code().to_string()).collect();
        format!("unsupported pixel format {code}, expected one of {}", valid.join(", "))
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = BatchConfig::new(cli.target)
        .with_scratch_size(cli.scratch_size)
        .with_strict_payloads(cli.strict);
    if let Some(dir) = &cli.preview {
        config = config.with_preview_dir(dir);
    }

    debug!(?config, "run configuration");

    let transcoder = BlockTranscoder::new();

    if cli.input.is_dir() {
        cmd_convert_tree(&cli.input, &cli.output, config, &transcoder)
    } else {
        cmd_convert_file(&cli.input, &cli.output, config, &transcoder)
    }
}

fn cmd_convert_tree(
    input: &Path,
    output: &Path,
    config: BatchConfig,
    transcoder: &BlockTranscoder,
) -> Result<()> {
    println!("Converting {} -> {} ({})", input.display(), output.display(), config.target);

    let total = WalkDir::new(input).min_depth(1).into_iter().filter_map(|e| e.ok()).count();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let report = BatchConverter::new(config, transcoder)
        .on_entry(|_, _| pb.inc(1))
        .run(input, output)
        .context("Failed to run batch conversion")?;

    pb.finish_with_message("Done");
    println!(
        "Converted {} textures in {:?} ({} archives, {} copied, {} errors)",
        report.converted,
        start.elapsed(),
        report.archives,
        report.copied,
        report.failures.len()
    );

    for failure in &report.failures {
        match &failure.entry {
            Some(entry) => eprintln!("  {} [{}]: {}", failure.path.display(), entry, failure.message),
            None => eprintln!("  {}: {}", failure.path.display(), failure.message),
        }
    }

    Ok(())
}

fn cmd_convert_file(
    input: &Path,
    output: &Path,
    config: BatchConfig,
    transcoder: &BlockTranscoder,
) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let target = config.target;
    let tex = BatchConverter::new(config, transcoder)
        .convert_file(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!(
        "Conversion complete: {} -> {}, {} mip levels{}",
        tex.source_format(),
        target,
        tex.levels().len(),
        if tex.is_legacy() { " (legacy header)" } else { "" }
    );

    Ok(())
}

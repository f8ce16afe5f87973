use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use vgmedit::{StatusSink, TraceFormat, TrimOptions, TrimPoints, convert, optimize, trim};

mod vgm;
use vgm::{info as vgm_info, read_vgm_as_vec, write_vgm};

/// VGM editing command line tools
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary info for VGM files (accepts .vgm or .vgz; use '-' for stdin)
    Info {
        /// Input files to read
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract a sample window from a VGM file
    Trim {
        /// Input file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// First sample of the window
        #[arg(long)]
        start: u64,
        /// Loop point in samples; omit for a non-looping result
        #[arg(long = "loop", value_name = "LOOP")]
        loop_point: Option<u64>,
        /// One past the last sample of the window
        #[arg(long)]
        end: u64,
        /// Output path; the input file is replaced when omitted
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
        /// Copy chip writes verbatim instead of diffing them
        #[arg(long)]
        pass_through: bool,
        /// Gzip the output (.vgz output paths always do)
        #[arg(long)]
        gzip: bool,
    },
    /// Rewrite VGM files in place with pauses coalesced and redundant
    /// writes removed
    Optimize {
        /// Input files to rewrite
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Gzip the output
        #[arg(long)]
        gzip: bool,
    },
    /// Convert GYM / SSL / CYM trace files to sibling .vgm files
    Convert {
        /// Input files to convert; the format follows the extension
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Gzip the output and name it .vgz
        #[arg(long)]
        gzip: bool,
    },
}

/// Forwards engine warnings to stderr as they happen.
struct StderrSink;

impl StatusSink for StderrSink {
    fn warning(&mut self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

/// Run `f` once per file, reporting failures without stopping the batch.
fn for_each_file<F>(files: &[PathBuf], mut f: F) -> Result<()>
where
    F: FnMut(&PathBuf) -> Result<()>,
{
    let mut failed = 0usize;
    for file in files {
        if let Err(e) = f(file) {
            eprintln!("{}: {:#}", file.display(), e);
            failed += 1;
        }
    }
    if failed != 0 {
        bail!("{} of {} file(s) failed", failed, files.len());
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { files } => for_each_file(&files, |file| {
            let bytes = read_vgm_as_vec(file)?;
            vgm_info(file, &bytes)
        }),
        Commands::Trim {
            file,
            start,
            loop_point,
            end,
            output,
            pass_through,
            gzip,
        } => {
            let bytes = read_vgm_as_vec(&file)?;
            let trimmed = trim(
                &bytes,
                &TrimPoints {
                    start,
                    loop_point,
                    end,
                },
                &TrimOptions { pass_through },
                &mut StderrSink,
            )
            .with_context(|| format!("failed to trim {}", file.display()))?;
            let target = output.unwrap_or(file);
            write_vgm(&target, &trimmed, gzip)
        }
        Commands::Optimize { files, gzip } => for_each_file(&files, |file| {
            let bytes = read_vgm_as_vec(file)?;
            let optimized = optimize(&bytes)
                .with_context(|| format!("failed to optimize {}", file.display()))?;
            write_vgm(file, &optimized, gzip)
        }),
        Commands::Convert { files, gzip } => for_each_file(&files, |file| {
            let ext = file
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let format = TraceFormat::from_extension(ext)
                .with_context(|| format!("unrecognized trace format extension {:?}", ext))?;
            let bytes = read_vgm_as_vec(file)?;
            let converted = convert(format, &bytes)
                .with_context(|| format!("failed to convert {}", file.display()))?;
            let target = file.with_extension(if gzip { "vgz" } else { "vgm" });
            write_vgm(&target, &converted, gzip)
        }),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

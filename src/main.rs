mod batch;
mod error;
mod kana;
mod lab;
mod layout;
mod mapping;
mod rewrite;
mod seg;
mod span;
mod textgrid;
mod transliterate;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lab::TextGridOptions;
use layout::LayoutOptions;
use mapping::{MappingTable, Normalization};
use transliterate::DictionaryReading;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert TextGrid phone tiers to lab files, merging phone sequences
    Textgrid2lab(TextGridArgs),
    /// Rewrite the labels of lab files in place
    Relabel(RelabelArgs),
    /// Convert lab files to seg tables
    Lab2seg(Lab2SegArgs),
    /// Romanize Japanese transcripts in place
    Romanize(RomanizeArgs),
    /// Rename recordings after their folder and seed transcript files
    Layout(LayoutArgs),
}

#[derive(Args, Debug)]
struct TextGridArgs {
    /// Converter file: `phone [phone...],replacement` per line
    #[arg(short, long)]
    converter: PathBuf,
    #[arg(short, long, default_value = ".")]
    input: PathBuf,
    /// Mirror the input tree here instead of writing next to each TextGrid
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, default_value = "phones")]
    tier: String,
    /// Match labels as written instead of lowercased without digits
    #[arg(long)]
    keep_case: bool,
    /// Write one lab line per interval without merging
    #[arg(long)]
    no_converter: bool,
}

#[derive(Args, Debug)]
struct RelabelArgs {
    #[arg(short, long)]
    converter: PathBuf,
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct Lab2SegArgs {
    #[arg(short, long)]
    input: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct RomanizeArgs {
    #[arg(short, long)]
    input: PathBuf,
    /// jpreprocess dictionary used to read characters outside the kana table
    #[arg(short, long)]
    dictionary: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[arg(short, long)]
    input: PathBuf,
    /// Delete everything that is not a recording or its transcript
    #[arg(long)]
    prune: bool,
    /// Log the planned changes without touching the tree
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => tracing::Level::WARN,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Textgrid2lab(args) => {
            let normalization = if args.keep_case {
                Normalization::Verbatim
            } else {
                Normalization::LowercaseStripDigits
            };
            let table = MappingTable::load(&args.converter, normalization)?;
            let options = TextGridOptions {
                tier: args.tier,
                use_converter: !args.no_converter,
            };
            lab::textgrids_to_labs(&args.input, args.output.as_deref(), &table, &options)?
                .log("TextGrid conversion");
        }
        Command::Relabel(args) => {
            let table = MappingTable::load(&args.converter, Normalization::Verbatim)?;
            lab::relabel_labs(&args.input, &table)?.log("Relabel");
        }
        Command::Lab2seg(args) => {
            anyhow::ensure!(
                args.input.is_dir(),
                "Input directory does not exist: {}",
                args.input.display()
            );
            seg::labs_to_segs(&args.input, &args.output)?.log("Lab to seg conversion");
        }
        Command::Romanize(args) => {
            anyhow::ensure!(
                args.input.is_dir(),
                "Input folder '{}' not found",
                args.input.display()
            );
            let fallback = args
                .dictionary
                .as_deref()
                .map(DictionaryReading::open)
                .transpose()?;
            kana::romanize_files(&args.input, &fallback)?.log("Romaji conversion");
        }
        Command::Layout(args) => {
            anyhow::ensure!(
                args.input.is_dir(),
                "Invalid input directory: {}",
                args.input.display()
            );
            let actions = layout::plan(&args.input, LayoutOptions { prune: args.prune })
                .with_context(|| format!("Failed to scan {}", args.input.display()))?;
            let report = layout::apply(&actions, args.dry_run);
            tracing::info!(
                "Layout: {} planned, {} applied, {} failed",
                actions.len(),
                report.applied,
                report.failed
            );
        }
    }

    Ok(())
}

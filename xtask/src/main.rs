use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wordnet_store::bloom::{exception_filter_path, index_filter_path};
use wordnet_store::comparator::first_unsorted;
use wordnet_store::{BloomFilter, LexicalComparator, LineStream, LoadMode};
use wordnet_types::Pos;

/// Sorted auxiliary files that lookups binary-search when present.
const SORTED_AUXILIARY: [&str; 3] = ["cntlist.rev", "sentidx.vrb", "sents.vrb"];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Dictionary maintenance utilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Precompute per-POS Bloom filters over index and exception files.
    BuildBlooms {
        #[arg(long)]
        dict: PathBuf,
        /// Output directory; defaults to the dictionary directory.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 0.01)]
        fpp: f64,
    },
    /// Verify every binary-searched file is in comparator order.
    CheckSorted {
        #[arg(long)]
        dict: PathBuf,
    },
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::BuildBlooms { dict, out, fpp } => {
            let out = out.unwrap_or_else(|| dict.clone());
            build_blooms(&dict, &out, fpp)?;
        }
        Commands::CheckSorted { dict } => check_sorted(&dict)?,
    }
    Ok(())
}

fn build_blooms(dict: &Path, out: &Path, fpp: f64) -> Result<()> {
    if !(fpp > 0.0 && fpp < 1.0) {
        bail!("false positive rate must be in (0, 1), got {fpp}");
    }
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    for pos in Pos::ALL {
        let index = dict.join(pos.index_file());
        let filter = filter_for(&index, fpp)?;
        let target = index_filter_path(out, pos);
        filter
            .save(&target)
            .with_context(|| format!("writing {}", target.display()))?;
        println!(
            "{}: {} keys, {} bits, {} hashes -> {}",
            pos.index_file(),
            filter.capacity(),
            filter.bit_len(),
            filter.hash_count(),
            target.display()
        );

        let exceptions = dict.join(pos.exception_file());
        if !exceptions.is_file() {
            warn!("no {}; skipping its filter", exceptions.display());
            continue;
        }
        let filter = filter_for(&exceptions, fpp)?;
        let target = exception_filter_path(out, pos);
        filter
            .save(&target)
            .with_context(|| format!("writing {}", target.display()))?;
        println!(
            "{}: {} keys -> {}",
            pos.exception_file(),
            filter.capacity(),
            target.display()
        );
    }
    Ok(())
}

fn filter_for(path: &Path, fpp: f64) -> Result<BloomFilter> {
    let mut stream = LineStream::open(path, LoadMode::Owned)
        .with_context(|| format!("opening {}", path.display()))?;
    BloomFilter::from_stream(&mut stream, fpp).with_context(|| format!("reading {}", path.display()))
}

fn check_sorted(dict: &Path) -> Result<()> {
    let mut files: Vec<String> = Vec::new();
    for pos in Pos::ALL {
        files.push(pos.index_file());
        files.push(pos.exception_file());
    }
    files.extend(SORTED_AUXILIARY.iter().map(|name| name.to_string()));

    let mut failures = 0usize;
    for name in &files {
        let path = dict.join(name);
        if !path.is_file() {
            info!("{name} absent; skipped");
            continue;
        }
        let mut stream = LineStream::open(&path, LoadMode::Owned)
            .with_context(|| format!("opening {}", path.display()))?;
        match first_unsorted(&mut stream, &LexicalComparator::TO_LOWERCASE)
            .with_context(|| format!("reading {}", path.display()))?
        {
            None => println!("{name}: sorted"),
            Some(unsorted) => {
                failures += 1;
                eprintln!(
                    "{name}: {:?} at offset {} sorts before {:?}",
                    unsorted.word, unsorted.offset, unsorted.previous
                );
            }
        }
    }

    if failures > 0 {
        bail!("{failures} file(s) are not in search order.");
    }
    Ok(())
}

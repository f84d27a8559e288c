use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use wordnet_store::{IndexEngine, LoadMode, Probe};

const USAGE: &str =
    "usage: cargo run -p wordnet-store --example probe -- <dict-dir> <file> <key> [mmap|owned|direct]";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let dict_dir = args.next().map(PathBuf::from).context(USAGE)?;
    let file = args.next().context(USAGE)?;
    let key = args.next().context(USAGE)?;
    let mode = match args.next() {
        Some(raw) => LoadMode::parse(&raw).with_context(|| format!("unknown load mode {raw}"))?,
        None => LoadMode::Mmap,
    };
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let engine = IndexEngine::new(&dict_dir, mode);
    let probe = engine
        .exact_match(&key, 0, &file)
        .with_context(|| format!("searching {file} in {}", dict_dir.display()))?;
    println!("{file} ({} bytes, {mode:?})", engine.file_len(&file)?);
    println!("exact  {key:?}: {} ({:?})", probe.encoded(), probe);

    let neighbour = match probe {
        Probe::Found(offset) => offset,
        Probe::Missing { insertion_point } => insertion_point,
    };
    match engine.read_line_at(neighbour, &file)? {
        Some(line) => println!("line @{neighbour}: {line}"),
        None => println!("line @{neighbour}: <end of file>"),
    }
    match engine.prefix_match(&key, 0, &file)? {
        Some(offset) => println!("prefix {key:?}: {offset}"),
        None => println!("prefix {key:?}: not found"),
    }
    Ok(())
}

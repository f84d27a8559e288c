use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use wordnet::{Config, Pos, WordNet};

const USAGE: &str = "usage: cargo run -p wordnet --example lookup -- <dict-dir> [--demo | <word>]";

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let mut args = env::args().skip(1);
    let dict_dir = args.next().map(PathBuf::from).context(USAGE)?;
    let Some(arg) = args.next() else {
        bail!(USAGE);
    };
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let words: Vec<String> = if arg == "--demo" {
        ["running", "better", "children", "dogs", "looking up", "mothers-in-law"]
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        vec![arg]
    };

    let wn = WordNet::open(Config::new(&dict_dir))
        .with_context(|| format!("opening WordNet at {}", dict_dir.display()))?;

    println!("Dictionary: {}", dict_dir.display());

    for word in words {
        println!("\nSurface: {word}");
        for pos in Pos::ALL {
            let forms = wn.lookup_base_forms(&word, pos)?;
            if forms.is_empty() {
                continue;
            }
            println!("  {pos:?}: {}", forms.join(", "));
            for synset in wn.lookup_synsets(&word, pos)? {
                let lemmas: Vec<&str> = synset.senses().iter().map(|s| s.lemma()).collect();
                println!("    {} [{}] {}", synset.id(), lemmas.join(", "), synset.definition());
            }
        }
    }

    let stats = wn.cache_stats();
    println!(
        "\nCached: {} words, {} synsets (capacity {})",
        stats.words, stats.synsets, stats.capacity
    );
    Ok(())
}

use std::fmt::Write as _;
use std::sync::Arc;
use std::thread;

use regex::Regex;
use tempfile::TempDir;
use wordnet_store::{IndexEngine, LoadMode, Probe, StoreError};

const ANIMALS: &str = "cat n\ndog n\nzebra n\n";
const MODES: [LoadMode; 3] = [LoadMode::Mmap, LoadMode::Owned, LoadMode::Direct];

fn dict(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for (name, body) in files {
        std::fs::write(dir.path().join(name), body).expect("write fixture");
    }
    dir
}

fn offset_of(body: &str, word: &str) -> usize {
    body.find(&format!("{word} ")).expect("word in fixture")
}

#[test]
fn exact_match_reports_hits_and_insertion_points() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    for mode in MODES {
        let engine = IndexEngine::new(dir.path(), mode);
        let zebra = offset_of(ANIMALS, "zebra");
        let cat = offset_of(ANIMALS, "cat");

        assert_eq!(
            engine.exact_match("dog", 0, "index.noun").unwrap(),
            Probe::Found(offset_of(ANIMALS, "dog"))
        );
        assert_eq!(
            engine.exact_match("zebra", 0, "index.noun").unwrap(),
            Probe::Found(zebra)
        );
        assert_eq!(
            engine
                .exact_match("elephant", 0, "index.noun")
                .unwrap()
                .encoded(),
            -(zebra as i64) - 1
        );
        assert_eq!(
            engine.exact_match("ant", 0, "index.noun").unwrap().encoded(),
            -(cat as i64) - 1
        );
        assert_eq!(
            engine.exact_match("zzz", 0, "index.noun").unwrap(),
            Probe::Missing {
                insertion_point: ANIMALS.len()
            }
        );
        assert_eq!(
            engine.exact_match("DOG", 0, "index.noun").unwrap().found(),
            Some(6)
        );
    }
}

#[test]
fn prefix_match_uses_neighbouring_line() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    let engine = IndexEngine::new(dir.path(), LoadMode::Mmap);
    assert_eq!(engine.prefix_match("do", 0, "index.noun").unwrap(), Some(6));
    assert_eq!(engine.prefix_match("dog", 0, "index.noun").unwrap(), Some(6));
    assert_eq!(engine.prefix_match("x", 0, "index.noun").unwrap(), None);
    assert_eq!(engine.prefix_match("zz", 0, "index.noun").unwrap(), None);
}

#[test]
fn stepping_visits_every_line_then_stops() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    for mode in MODES {
        let engine = IndexEngine::new(dir.path(), mode);
        let mut seen = Vec::new();
        let mut offset = Some(0);
        while let Some(at) = offset {
            let line = engine.read_line_at(at, "index.noun").unwrap();
            seen.push(line.expect("line at stepped offset"));
            offset = engine.next_line_pointer(at, "index.noun").unwrap();
        }
        assert_eq!(seen, vec!["cat n", "dog n", "zebra n"]);
        assert_eq!(
            engine.read_line_at(ANIMALS.len(), "index.noun").unwrap(),
            None
        );
    }
}

#[test]
fn fallback_scan_respects_unaligned_start() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    let engine = IndexEngine::new(dir.path(), LoadMode::Owned);
    // Offset 8 is inside "dog n"; the scan resumes at the next line start.
    assert_eq!(
        engine.exact_match("zebra", 8, "index.noun").unwrap(),
        Probe::Found(12)
    );
    // Offset 6 follows a newline, so the line at 6 itself is compared.
    assert_eq!(
        engine.exact_match("dog", 6, "index.noun").unwrap(),
        Probe::Found(6)
    );
    assert_eq!(
        engine.exact_match("cat", 6, "index.noun").unwrap(),
        Probe::Missing { insertion_point: 6 }
    );
}

#[test]
fn skips_license_preamble_and_handles_crlf() {
    let body = "  1 This software is provided as is\n  2 without warranty\r\nant n\r\nbee n\r\ncat n\r\n";
    let dir = dict(&[("index.noun", body)]);
    for mode in MODES {
        let engine = IndexEngine::new(dir.path(), mode);
        for word in ["ant", "bee", "cat"] {
            assert_eq!(
                engine.exact_match(word, 0, "index.noun").unwrap(),
                Probe::Found(offset_of(body, word)),
                "{word} with {mode:?}"
            );
        }
        assert!(
            engine
                .exact_match("aardvark", 0, "index.noun")
                .unwrap()
                .found()
                .is_none()
        );
    }
}

#[test]
fn every_key_resolves_in_a_large_file() {
    let mut body = String::new();
    let mut offsets = Vec::new();
    for i in (0..600).step_by(2) {
        offsets.push((i, body.len()));
        let padding = "x".repeat(i % 7);
        writeln!(body, "w{i:04} n {padding}").unwrap();
    }
    let dir = dict(&[("index.noun", &body)]);
    for mode in MODES {
        let engine = IndexEngine::new(dir.path(), mode);
        for (pos, (i, offset)) in offsets.iter().enumerate() {
            let hit = engine.exact_match(&format!("w{i:04}"), 0, "index.noun");
            assert_eq!(hit.unwrap(), Probe::Found(*offset), "w{i:04}");

            let next = offsets.get(pos + 1).map_or(body.len(), |(_, o)| *o);
            let miss = engine.exact_match(&format!("w{:04}", i + 1), 0, "index.noun");
            assert_eq!(
                miss.unwrap(),
                Probe::Missing {
                    insertion_point: next
                },
                "w{:04}",
                i + 1
            );
        }
    }
}

#[test]
fn substring_scan_feeds_next_line_cache() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    let engine = IndexEngine::new(dir.path(), LoadMode::Direct);
    let pattern = Regex::new("o").unwrap();
    assert_eq!(
        engine.substring_match(0, &pattern, "index.noun").unwrap(),
        Some(6)
    );
    assert_eq!(engine.next_line_pointer(6, "index.noun").unwrap(), Some(12));
    assert_eq!(
        engine.substring_match(12, &pattern, "index.noun").unwrap(),
        None
    );
    let anchored = Regex::new("^z").unwrap();
    assert_eq!(
        engine.substring_match(0, &anchored, "index.noun").unwrap(),
        Some(12)
    );
}

#[test]
fn caller_errors_are_reported() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    let engine = IndexEngine::new(dir.path(), LoadMode::Mmap);

    assert!(matches!(
        engine.exact_match("", 0, "index.noun"),
        Err(StoreError::EmptyKey(_))
    ));
    assert!(matches!(
        engine.read_line_at(ANIMALS.len() + 1, "index.noun"),
        Err(StoreError::InvalidOffset { offset: 21, .. })
    ));
    let empty = Regex::new("").unwrap();
    assert!(matches!(
        engine.substring_match(0, &empty, "index.noun"),
        Err(StoreError::EmptyKey(_))
    ));
}

#[test]
fn missing_file_fails_once_then_stays_unavailable() {
    let dir = dict(&[]);
    let engine = IndexEngine::new(dir.path(), LoadMode::Mmap);
    let first = engine.exact_match("dog", 0, "index.noun").unwrap_err();
    assert!(matches!(first, StoreError::Open { .. }));
    assert!(first.is_configuration());
    let second = engine.read_line_at(0, "index.noun").unwrap_err();
    assert!(matches!(second, StoreError::Unavailable(_)));
    assert!(!engine.is_available("index.noun"));
}

#[test]
fn concurrent_lookups_share_streams() {
    let dir = dict(&[("index.noun", ANIMALS)]);
    let engine = Arc::new(IndexEngine::new(dir.path(), LoadMode::Direct));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..200 {
                    let (word, expected) = if t % 2 == 0 { ("dog", 6) } else { ("zebra", 12) };
                    assert_eq!(
                        engine.exact_match(word, 0, "index.noun").unwrap(),
                        Probe::Found(expected)
                    );
                    assert_eq!(
                        engine.read_line_at(expected, "index.noun").unwrap().as_deref(),
                        Some(if t % 2 == 0 { "dog n" } else { "zebra n" })
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("lookup thread");
    }
}

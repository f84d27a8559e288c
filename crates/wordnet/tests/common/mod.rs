//! A small but complete dictionary written to a temp dir.
//!
//! Data lines use fixed-width numeric fields, so every line's length is
//! known before any offset is assigned: one pass lays out offsets, a second
//! writes the real lines.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use tempfile::TempDir;
use wordnet::{AdjPosition, Config, Pos, WordNet};
use wordnet_store::comparator::first_unsorted;
use wordnet_store::{LexicalComparator, LineStream, fold_key};

const PREAMBLE: &str = "  1 Test dictionary shaped like the WordNet database files.\n  2 Not for redistribution.\n";

pub struct SynsetFixture {
    pub key: &'static str,
    pub pos: Pos,
    pub ss_type: char,
    pub lex_filenum: u8,
    pub words: &'static [(&'static str, u8)],
    pub pointers: &'static [(&'static str, &'static str, u8, u8)],
    pub frames: &'static [(u16, u8)],
    pub gloss: &'static str,
}

const fn synset(key: &'static str, pos: Pos, ss_type: char, lex_filenum: u8) -> SynsetFixture {
    SynsetFixture {
        key,
        pos,
        ss_type,
        lex_filenum,
        words: &[],
        pointers: &[],
        frames: &[],
        gloss: "",
    }
}

pub fn standard_synsets() -> Vec<SynsetFixture> {
    vec![
        SynsetFixture {
            words: &[("dog", 0)],
            pointers: &[("@", "animal", 0, 0)],
            gloss: "a domesticated carnivorous mammal; \"the dog barked all night\"",
            ..synset("dog", Pos::Noun, 'n', 5)
        },
        SynsetFixture {
            words: &[("animal", 0)],
            pointers: &[("~", "dog", 0, 0), ("~", "cat", 0, 0)],
            gloss: "a living organism",
            ..synset("animal", Pos::Noun, 'n', 3)
        },
        SynsetFixture {
            words: &[("cat", 0)],
            pointers: &[("@", "animal", 0, 0)],
            gloss: "feline mammal",
            ..synset("cat", Pos::Noun, 'n', 5)
        },
        SynsetFixture {
            words: &[("goose", 0)],
            gloss: "web-footed bird",
            ..synset("goose", Pos::Noun, 'n', 5)
        },
        SynsetFixture {
            words: &[("child", 0), ("kid", 0)],
            gloss: "a young person",
            ..synset("child", Pos::Noun, 'n', 18)
        },
        SynsetFixture {
            words: &[("box", 0)],
            gloss: "a container",
            ..synset("box", Pos::Noun, 'n', 6)
        },
        SynsetFixture {
            words: &[("boxful", 0)],
            gloss: "the quantity a box will hold",
            ..synset("boxful", Pos::Noun, 'n', 23)
        },
        SynsetFixture {
            words: &[("CD", 0), ("compact_disc", 0)],
            gloss: "a digitally encoded recording",
            ..synset("cd", Pos::Noun, 'n', 6)
        },
        SynsetFixture {
            words: &[("mother", 0)],
            gloss: "a female parent",
            ..synset("mother", Pos::Noun, 'n', 18)
        },
        SynsetFixture {
            words: &[("mother-in-law", 0)],
            gloss: "the mother of your spouse",
            ..synset("mother-in-law", Pos::Noun, 'n', 18)
        },
        SynsetFixture {
            words: &[("internal-combustion_engine", 0)],
            gloss: "an engine that burns fuel inside its cylinders",
            ..synset("engine", Pos::Noun, 'n', 6)
        },
        SynsetFixture {
            words: &[("hand", 0)],
            gloss: "the end of the arm",
            ..synset("hand", Pos::Noun, 'n', 8)
        },
        SynsetFixture {
            words: &[("run", 0)],
            frames: &[(2, 0)],
            gloss: "move fast by using one's feet",
            ..synset("run", Pos::Verb, 'v', 38)
        },
        SynsetFixture {
            words: &[("look_up", 0)],
            frames: &[(8, 1)],
            gloss: "seek information from",
            ..synset("look_up", Pos::Verb, 'v', 31)
        },
        SynsetFixture {
            words: &[("take_in_hand", 0)],
            gloss: "take charge of",
            ..synset("take_in_hand", Pos::Verb, 'v', 41)
        },
        SynsetFixture {
            words: &[("big(a)", 0)],
            pointers: &[("!", "small", 1, 1), ("&", "large", 0, 0)],
            gloss: "above average in size",
            ..synset("big", Pos::Adj, 'a', 0)
        },
        SynsetFixture {
            words: &[("large", 0)],
            pointers: &[("&", "big", 0, 0)],
            gloss: "of considerable size",
            ..synset("large", Pos::Adj, 's', 0)
        },
        SynsetFixture {
            words: &[("small", 0)],
            pointers: &[("!", "big", 1, 1)],
            gloss: "limited in size",
            ..synset("small", Pos::Adj, 'a', 0)
        },
        SynsetFixture {
            words: &[("tall", 0)],
            gloss: "great in vertical dimension",
            ..synset("tall", Pos::Adj, 'a', 0)
        },
        SynsetFixture {
            words: &[("quickly", 0)],
            gloss: "with speed",
            ..synset("quickly", Pos::Adv, 'r', 2)
        },
    ]
}

pub const NOUN_EXC: &str = "children child\ngeese goose\n";
pub const VERB_EXC: &str = "ran run\n";
pub const ADJ_EXC: &str = "bigger big\n";
pub const CNTLIST_REV: &str = "dog%1:05:00:: 1 42\nrun%2:38:00:: 1 7\n";
pub const SENTIDX_VRB: &str = "run%2:38:00:: 1,2\n";
pub const SENTS_VRB: &str = "1 The children %s to the playground\n2 The horses %s fast\n";
pub const FRAMES_VRB: &str = "1 Something ----s\n2 Somebody ----s\n3 It is ----ing\n4 Something is ----ing PP\n5 Something ----s something Adjective/Noun\n6 Something ----s Adjective/Noun\n7 Somebody ----s Adjective\n8 Somebody ----s something\n";

pub struct Dict {
    dir: TempDir,
    offsets: HashMap<&'static str, (Pos, u32)>,
}

impl Dict {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn offset(&self, key: &str) -> u32 {
        self.offsets[key].1
    }

    pub fn config(&self) -> Config {
        Config::new(self.path())
    }

    pub fn open(&self) -> WordNet {
        WordNet::open(self.config()).expect("open fixture dictionary")
    }

    pub fn write(&self, name: &str, body: &str) {
        std::fs::write(self.path().join(name), body).expect("write fixture file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.path().join(name)).expect("remove fixture file");
    }
}

pub fn standard() -> Dict {
    build(&standard_synsets())
}

pub fn build(synsets: &[SynsetFixture]) -> Dict {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut offsets = HashMap::new();

    for pos in Pos::ALL {
        let mut next = PREAMBLE.len();
        for fixture in synsets.iter().filter(|s| s.pos == pos) {
            offsets.insert(fixture.key, (pos, next as u32));
            next += data_line(fixture, &HashMap::new()).len();
        }
    }

    for pos in Pos::ALL {
        let mut data = String::from(PREAMBLE);
        let mut index: Vec<(String, Vec<u32>, Vec<&str>)> = Vec::new();
        for fixture in synsets.iter().filter(|s| s.pos == pos) {
            let offset = offsets[fixture.key].1;
            assert_eq!(data.len(), offset as usize, "layout drift at {}", fixture.key);
            data.push_str(&data_line(fixture, &offsets));

            for (text, _) in fixture.words {
                let lemma = AdjPosition::strip_marker(text).0.to_lowercase();
                let entry = match index.iter_mut().position(|(l, _, _)| *l == lemma) {
                    Some(i) => &mut index[i],
                    None => {
                        index.push((lemma, Vec::new(), Vec::new()));
                        index.last_mut().expect("just pushed")
                    }
                };
                entry.1.push(offset);
                for (symbol, ..) in fixture.pointers {
                    if !entry.2.contains(symbol) {
                        entry.2.push(symbol);
                    }
                }
            }
        }
        std::fs::write(dir.path().join(pos.data_file()), &data).expect("write data file");

        index.sort_by(|a, b| fold_key(&a.0).cmp(&fold_key(&b.0)));
        let mut body = String::from(PREAMBLE);
        for (lemma, synset_offsets, symbols) in &index {
            write!(
                body,
                "{lemma} {} {} {}",
                pos.to_char(),
                synset_offsets.len(),
                symbols.len()
            )
            .unwrap();
            for symbol in symbols {
                write!(body, " {symbol}").unwrap();
            }
            write!(body, " {} 0", synset_offsets.len()).unwrap();
            for offset in synset_offsets {
                write!(body, " {offset:08}").unwrap();
            }
            body.push_str("  \n");
        }
        write_sorted(dir.path(), &pos.index_file(), &body);
    }

    write_sorted(dir.path(), &Pos::Noun.exception_file(), NOUN_EXC);
    write_sorted(dir.path(), &Pos::Verb.exception_file(), VERB_EXC);
    write_sorted(dir.path(), &Pos::Adj.exception_file(), ADJ_EXC);
    write_sorted(dir.path(), "cntlist.rev", CNTLIST_REV);
    write_sorted(dir.path(), "sentidx.vrb", SENTIDX_VRB);
    write_sorted(dir.path(), "sents.vrb", SENTS_VRB);
    std::fs::write(dir.path().join("frames.vrb"), FRAMES_VRB).expect("write frames");

    Dict { dir, offsets }
}

fn data_line(fixture: &SynsetFixture, offsets: &HashMap<&'static str, (Pos, u32)>) -> String {
    let offset_of = |key: &str| offsets.get(key).map_or(0, |(_, o)| *o);
    let mut line = format!(
        "{:08} {:02} {} {:02x}",
        offset_of(fixture.key),
        fixture.lex_filenum,
        fixture.ss_type,
        fixture.words.len()
    );
    for (text, lex_id) in fixture.words {
        write!(line, " {text} {lex_id:x}").unwrap();
    }
    write!(line, " {:03}", fixture.pointers.len()).unwrap();
    for (symbol, target, src, dst) in fixture.pointers {
        let target_pos = pos_of(target, offsets).unwrap_or(fixture.pos);
        write!(
            line,
            " {symbol} {:08} {} {src:02x}{dst:02x}",
            offset_of(target),
            target_pos.to_char()
        )
        .unwrap();
    }
    if fixture.pos == Pos::Verb {
        write!(line, " {:02}", fixture.frames.len()).unwrap();
        for (frame, word) in fixture.frames {
            write!(line, " + {frame:02} {word:02x}").unwrap();
        }
    }
    write!(line, " | {}  \n", fixture.gloss).unwrap();
    line
}

fn pos_of(key: &str, offsets: &HashMap<&'static str, (Pos, u32)>) -> Option<Pos> {
    offsets.get(key).map(|(pos, _)| *pos)
}

/// Write a sorted file and check it really is sorted by the comparator.
fn write_sorted(dir: &Path, name: &str, body: &str) {
    let mut stream = LineStream::from_bytes(name, body.as_bytes().to_vec());
    let unsorted = first_unsorted(&mut stream, &LexicalComparator::TO_LOWERCASE)
        .expect("scan fixture");
    assert_eq!(unsorted, None, "{name} is not sorted");
    std::fs::write(dir.join(name), body).expect("write sorted fixture");
}

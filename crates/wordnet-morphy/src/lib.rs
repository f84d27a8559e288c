//! WordNet-style morphological processing (morphy).
//!
//! Reduces an arbitrary user-typed word or phrase to the base forms a WordNet
//! dictionary can actually find. The crate is decoupled from any particular
//! storage layer: it asks a caller-provided [`Lexicon`] for exception-list
//! entries and for whether a candidate is defined.
//!
//! # How it works
//! 1. Normalize the input ([`normalize`]).
//! 2. An exception-list entry for the whole string wins outright.
//! 3. Non-verbs: stem the whole string with the POS suffix rules.
//! 4. Verb phrases whose second word is a preposition: stem only the verb
//!    (and, for three or more words, optionally the trailing noun).
//! 5. Everything else: stem each word of the collocation separately, then try
//!    every `_`/`-` spelling of the result ([`VariantEnumerator`]).
//! 6. Append the input itself if it is defined, deduplicate, memoize.
//!
//! # Example
//! ```no_run
//! use wordnet_morphy::{Lexicon, Morphy};
//! use wordnet_types::Pos;
//!
//! # fn demo<L: Lexicon>(lexicon: &L) -> Result<(), L::Error> {
//! let morphy = Morphy::default();
//! for form in morphy.base_forms(lexicon, "running", Pos::Verb)? {
//!     println!("{form}");
//! }
//! # Ok(()) }
//! ```

mod variants;

use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use wordnet_types::Pos;

pub use variants::{MAX_POSITIONS, TooManyPositions, VariantEnumerator, Variants};

/// Default number of memoized `(input, pos)` results.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Alternation positions beyond which the variant search is skipped.
pub const MAX_ENUMERATED_POSITIONS: usize = 16;

const PREPOSITIONS: [&str; 15] = [
    "to", "at", "of", "on", "off", "in", "out", "up", "down", "from", "with", "into", "for",
    "about", "between",
];

/// What morphy needs to know about a dictionary.
pub trait Lexicon {
    type Error;

    /// Tokens of the `<pos>.exc` line whose first token is `form`: the form
    /// itself followed by its roots. Empty when there is no such line.
    fn exceptions(&self, form: &str, pos: Pos) -> Result<Vec<String>, Self::Error>;

    /// Whether `lemma` has an index entry for `pos`.
    fn is_defined(&self, lemma: &str, pos: Pos) -> Result<bool, Self::Error>;

    /// True-cased lemmas of the senses of `lemma`, or `None` when it is not
    /// defined for `pos`.
    fn true_case_lemmas(&self, lemma: &str, pos: Pos) -> Result<Option<Vec<String>>, Self::Error>;
}

/// Base-form resolver with a bounded result cache.
pub struct Morphy {
    cache: Option<Mutex<LruCache<(String, Pos), Vec<String>>>>,
}

impl Default for Morphy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl Morphy {
    /// A resolver memoizing up to `capacity` results; zero disables the cache.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Base forms of `origstr` for `pos`, in discovery order without
    /// duplicates.
    ///
    /// Results are memoized per `(origstr, pos)`, empty ones included.
    pub fn base_forms<L: Lexicon>(
        &self,
        lexicon: &L,
        origstr: &str,
        pos: Pos,
    ) -> Result<Vec<String>, L::Error> {
        let key = (origstr.to_string(), pos);
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.lock().get(&key)
        {
            trace!("morphy cache hit for {origstr:?} ({pos})");
            return Ok(hit.clone());
        }

        let s = normalize(origstr);
        if s.is_empty() {
            return Ok(Vec::new());
        }

        let mut forms = Forms::default();
        let exceptions = lexicon.exceptions(&s, pos)?;
        let roots = exception_roots(&exceptions, &s);
        let mut word_count = 0;
        let mut via_preposition = false;

        if let Some(roots) = roots {
            // The raw root always follows its true-cased lemmas.
            for root in roots {
                if let Some(lemmas) = lexicon.true_case_lemmas(root, pos)? {
                    forms.extend(lemmas);
                }
                forms.push(underscore_to_space(root));
            }
        } else if pos != Pos::Verb
            && let Some(stem) = self.morph_word(lexicon, &s, pos)?.into_iter().next()
            && stem != s
        {
            if let Some(lemmas) = lexicon.true_case_lemmas(&stem, pos)? {
                forms.extend(lemmas);
            }
        } else if pos == Pos::Verb && count_words(&s, '_') > 1 && has_preposition(&s) {
            via_preposition = true;
            if let Some(phrase) = self.morph_preposition(lexicon, &s)? {
                forms.push(underscore_to_space(&phrase));
            }
        } else {
            word_count = count_words(&s, '-');
            self.morph_collocation(lexicon, &s, pos, word_count, &mut forms)?;
        }

        // A single-word input that reached the collocation phase still picks
        // up a self-referencing exception line.
        if !via_preposition && roots.is_none() && word_count == 1 {
            for root in exceptions.iter().skip(1) {
                forms.push(underscore_to_space(root));
            }
        }
        if let Some(lemmas) = lexicon.true_case_lemmas(&s, pos)? {
            forms.extend(lemmas);
        }

        let forms = forms.into_vec();
        debug!("morphy {origstr:?} ({pos}) -> {forms:?}");
        if let Some(cache) = &self.cache {
            cache.lock().put(key, forms.clone());
        }
        Ok(forms)
    }

    /// Stem a single word (or an already-joined phrase) with the exception
    /// list and the POS suffix rules. Returns at most one defined stem, or
    /// the roots listed by an exception line.
    fn morph_word<L: Lexicon>(
        &self,
        lexicon: &L,
        word: &str,
        pos: Pos,
    ) -> Result<Vec<String>, L::Error> {
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let exceptions = lexicon.exceptions(word, pos)?;
        if !exceptions.is_empty() {
            return Ok(exceptions.into_iter().skip(1).collect());
        }
        if pos == Pos::Adv {
            return Ok(Vec::new());
        }

        let (stem, end) = match pos {
            Pos::Noun => {
                if let Some(stem) = word.strip_suffix("ful") {
                    (stem, "ful")
                } else if word.chars().count() <= 2 || word.ends_with("ss") {
                    return Ok(Vec::new());
                } else {
                    (word, "")
                }
            }
            _ => (word, ""),
        };

        let mut tried: Vec<String> = Vec::new();
        for (suffix, replacement) in rules_for(pos) {
            let Some(candidate) = apply_rule(stem, suffix, replacement) else {
                continue;
            };
            if candidate.is_empty() || tried.contains(&candidate) {
                continue;
            }
            if lexicon.is_defined(&candidate, pos)? {
                return Ok(vec![format!("{candidate}{end}")]);
            }
            tried.push(candidate);
        }
        Ok(Vec::new())
    }

    /// Verb phrase whose second word is a preposition: stem the verb and keep
    /// the rest, falling back to a noun-stemmed trailing word.
    fn morph_preposition<L: Lexicon>(
        &self,
        lexicon: &L,
        s: &str,
    ) -> Result<Option<String>, L::Error> {
        let (Some(rest_idx), Some(last_idx)) = (s.find('_'), s.rfind('_')) else {
            return Ok(None);
        };

        let mut end = None;
        if rest_idx != last_idx
            && let Some(noun) = self
                .morph_word(lexicon, &s[last_idx + 1..], Pos::Noun)?
                .into_iter()
                .next()
        {
            end = Some(format!("{}{noun}", &s[rest_idx..=last_idx]));
        }

        let first = &s[..rest_idx];
        if !is_possible_verb(first) {
            return Ok(None);
        }
        let rest = &s[rest_idx..];

        let exceptions = lexicon.exceptions(first, Pos::Verb)?;
        if let Some(root) = exceptions.get(1).filter(|root| root.as_str() != first)
            && let Some(found) = self.first_defined_phrase(lexicon, root, rest, end.as_deref())?
        {
            return Ok(Some(found));
        }

        for (suffix, replacement) in rules_for(Pos::Verb) {
            if let Some(stem) = apply_rule(first, suffix, replacement)
                && let Some(found) = self.first_defined_phrase(lexicon, &stem, rest, end.as_deref())?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn first_defined_phrase<L: Lexicon>(
        &self,
        lexicon: &L,
        verb: &str,
        rest: &str,
        end: Option<&str>,
    ) -> Result<Option<String>, L::Error> {
        let candidate = format!("{verb}{rest}");
        if lexicon.is_defined(&candidate, Pos::Verb)? {
            return Ok(Some(candidate));
        }
        if let Some(end) = end {
            let candidate = format!("{verb}{end}");
            if lexicon.is_defined(&candidate, Pos::Verb)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Stem each word of a collocation, keeping its separators, then try the
    /// joined result and (for multi-word input) its `_`/`-` variants.
    fn morph_collocation<L: Lexicon>(
        &self,
        lexicon: &L,
        s: &str,
        pos: Pos,
        word_count: usize,
        forms: &mut Forms,
    ) -> Result<(), L::Error> {
        let mut search = String::with_capacity(s.len());
        let mut start = 0;
        for _ in 1..word_count {
            let underscore = s[start..].find('_').map(|i| i + start);
            let dash = s[start..].find('-').map(|i| i + start);
            let (end, separator) = match (underscore, dash) {
                (Some(u), Some(d)) if u < d => (u, '_'),
                (_, Some(d)) => (d, '-'),
                (Some(u), None) => (u, '_'),
                (None, None) => break,
            };
            let word = &s[start..end];
            match self.morph_word(lexicon, word, pos)?.into_iter().next() {
                Some(stem) => search.push_str(&stem),
                None => search.push_str(word),
            }
            search.push(separator);
            start = end + 1;
        }
        let tail = &s[start..];
        match self.morph_word(lexicon, tail, pos)?.into_iter().next() {
            Some(stem) => search.push_str(&stem),
            None => search.push_str(tail),
        }

        if search != s
            && let Some(lemmas) = lexicon.true_case_lemmas(&search, pos)?
        {
            forms.extend(lemmas);
            return Ok(());
        }
        if word_count <= 1 {
            return Ok(());
        }

        let variants = match VariantEnumerator::new(&search) {
            Ok(v) if v.positions() <= MAX_ENUMERATED_POSITIONS => v,
            Ok(v) => {
                warn!(
                    "skipping {} separator variants of {search:?}",
                    v.variant_count()
                );
                return Ok(());
            }
            Err(err) => {
                warn!("skipping separator variants of {search:?}: {err}");
                return Ok(());
            }
        };
        for variant in &variants {
            if let Some(lemmas) = lexicon.true_case_lemmas(&variant, pos)? {
                forms.extend(lemmas);
                break;
            }
        }
        Ok(())
    }
}

/// Canonical query form: lowercase, runs of whitespace/underscore collapsed
/// to one `_`, and leading/trailing separators trimmed.
///
/// A lone `-` or `_` is returned unchanged and an all-space input becomes
/// `_`, so substring searches can still ask for separators. Idempotent.
pub fn normalize(origstr: &str) -> String {
    if origstr == "-" || origstr == "_" {
        return origstr.to_string();
    }
    if !origstr.is_empty() && origstr.chars().all(|c| c == ' ') {
        return "_".to_string();
    }
    let trimmed = origstr.trim_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());
    let lowered = trimmed.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_gap = false;
    for c in lowered.chars() {
        if c == '_' || c.is_whitespace() {
            in_gap = true;
            continue;
        }
        if in_gap {
            out.push('_');
            in_gap = false;
        }
        out.push(c);
    }
    out
}

/// Number of words in `s` split on spaces and underscores, plus dashes when
/// `separator` is `-`.
pub fn count_words(s: &str, separator: char) -> usize {
    s.split(|c: char| c == ' ' || c == '_' || (separator == '-' && c == '-'))
        .filter(|w| !w.is_empty())
        .count()
}

/// Whether the word after the first underscore is a preposition.
fn has_preposition(s: &str) -> bool {
    let Some(idx) = s.find('_') else {
        return false;
    };
    let after = &s[idx + 1..];
    PREPOSITIONS.iter().any(|prep| {
        after
            .strip_prefix(prep)
            .is_some_and(|tail| tail.is_empty() || tail.starts_with('_'))
    })
}

fn is_possible_verb(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '-')
}

fn exception_roots<'a>(exceptions: &'a [String], s: &str) -> Option<&'a [String]> {
    match exceptions.get(1) {
        Some(first_root) if first_root != s => Some(&exceptions[1..]),
        _ => None,
    }
}

fn underscore_to_space(s: &str) -> String {
    s.replace('_', " ")
}

/// Insertion-ordered set of result strings.
#[derive(Default)]
struct Forms {
    seen: HashSet<String>,
    out: Vec<String>,
}

impl Forms {
    fn push(&mut self, form: String) {
        if self.seen.insert(form.clone()) {
            self.out.push(form);
        }
    }

    fn extend(&mut self, forms: impl IntoIterator<Item = String>) {
        for form in forms {
            self.push(form);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.out
    }
}

fn apply_rule(word: &str, suffix: &str, replacement: &str) -> Option<String> {
    word.strip_suffix(suffix)
        .map(|stem| format!("{stem}{replacement}"))
}

fn rules_for(pos: Pos) -> &'static [(&'static str, &'static str)] {
    match pos {
        Pos::Noun => &[
            ("s", ""),
            ("ses", "s"),
            ("xes", "x"),
            ("zes", "z"),
            ("ches", "ch"),
            ("shes", "sh"),
            ("men", "man"),
            ("ies", "y"),
        ],
        Pos::Verb => &[
            ("s", ""),
            ("ies", "y"),
            ("es", "e"),
            ("es", ""),
            ("ed", "e"),
            ("ed", ""),
            ("ing", "e"),
            ("ing", ""),
        ],
        Pos::Adj => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
        Pos::Adv => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::convert::Infallible;

    use proptest::prelude::*;

    fn key(text: &str) -> String {
        text.trim().to_lowercase().replace(' ', "_")
    }

    #[derive(Default)]
    struct FakeLexicon {
        words: HashMap<(Pos, String), Vec<String>>,
        exceptions: HashMap<(Pos, String), Vec<String>>,
        calls: Cell<usize>,
    }

    impl FakeLexicon {
        fn word(mut self, pos: Pos, lemma: &str) -> Self {
            self.words
                .insert((pos, key(lemma)), vec![lemma.replace('_', " ")]);
            self
        }

        fn true_cased(mut self, pos: Pos, lemma: &str, senses: &[&str]) -> Self {
            self.words.insert(
                (pos, key(lemma)),
                senses.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        fn exception(mut self, pos: Pos, line: &str) -> Self {
            let tokens: Vec<String> = line.split(' ').map(str::to_string).collect();
            self.exceptions.insert((pos, tokens[0].clone()), tokens);
            self
        }
    }

    impl Lexicon for FakeLexicon {
        type Error = Infallible;

        fn exceptions(&self, form: &str, pos: Pos) -> Result<Vec<String>, Infallible> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .exceptions
                .get(&(pos, key(form)))
                .cloned()
                .unwrap_or_default())
        }

        fn is_defined(&self, lemma: &str, pos: Pos) -> Result<bool, Infallible> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.words.contains_key(&(pos, key(lemma))))
        }

        fn true_case_lemmas(&self, lemma: &str, pos: Pos) -> Result<Option<Vec<String>>, Infallible> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.words.get(&(pos, key(lemma))).cloned())
        }
    }

    fn forms(lexicon: &FakeLexicon, text: &str, pos: Pos) -> Vec<String> {
        match Morphy::new(0).base_forms(lexicon, text, pos) {
            Ok(forms) => forms,
            Err(never) => match never {},
        }
    }

    #[test]
    fn exception_roots_win() {
        let lex = FakeLexicon::default()
            .word(Pos::Noun, "goose")
            .exception(Pos::Noun, "geese goose");
        assert_eq!(forms(&lex, "geese", Pos::Noun), vec!["goose"]);
        assert_eq!(forms(&lex, "Geese ", Pos::Noun), vec!["goose"]);
    }

    #[test]
    fn exception_roots_keep_raw_form_after_true_case() {
        let lex = FakeLexicon::default()
            .true_cased(Pos::Noun, "cd", &["CD"])
            .exception(Pos::Noun, "cds cd");
        assert_eq!(forms(&lex, "cds", Pos::Noun), vec!["CD", "cd"]);

        let unknown = FakeLexicon::default().exception(Pos::Verb, "ran run");
        assert_eq!(forms(&unknown, "ran", Pos::Verb), vec!["run"]);
    }

    #[test]
    fn suffix_rules_stem_nouns() {
        let lex = FakeLexicon::default()
            .word(Pos::Noun, "dog")
            .word(Pos::Noun, "box")
            .word(Pos::Noun, "boxful")
            .word(Pos::Noun, "glass");
        assert_eq!(forms(&lex, "dogs", Pos::Noun), vec!["dog"]);
        assert_eq!(forms(&lex, "boxes", Pos::Noun), vec!["box"]);
        assert_eq!(forms(&lex, "boxesful", Pos::Noun), vec!["boxful"]);
        assert_eq!(forms(&lex, "dog", Pos::Noun), vec!["dog"]);
        assert_eq!(forms(&lex, "glass", Pos::Noun), vec!["glass"]);
        assert!(forms(&lex, "cats", Pos::Noun).is_empty());
    }

    #[test]
    fn irregular_verbs_need_an_exception() {
        let plain = FakeLexicon::default().word(Pos::Verb, "run");
        assert!(forms(&plain, "ran", Pos::Verb).is_empty());
        assert_eq!(forms(&plain, "runs", Pos::Verb), vec!["run"]);

        let with_exc = plain.exception(Pos::Verb, "ran run");
        assert_eq!(forms(&with_exc, "ran", Pos::Verb), vec!["run"]);
    }

    #[test]
    fn adjectives_and_adverbs() {
        let lex = FakeLexicon::default()
            .word(Pos::Adj, "tall")
            .word(Pos::Adj, "large")
            .word(Pos::Adv, "quickly");
        assert_eq!(forms(&lex, "taller", Pos::Adj), vec!["tall"]);
        assert_eq!(forms(&lex, "largest", Pos::Adj), vec!["large"]);
        assert!(forms(&lex, "quicklier", Pos::Adv).is_empty());
        assert_eq!(forms(&lex, "quickly", Pos::Adv), vec!["quickly"]);
    }

    #[test]
    fn returns_true_cased_lemmas() {
        let lex = FakeLexicon::default().true_cased(Pos::Noun, "cd", &["CD", "Cd"]);
        assert_eq!(forms(&lex, "CDs", Pos::Noun), vec!["CD", "Cd"]);
    }

    #[test]
    fn verb_preposition_phrases() {
        let lex = FakeLexicon::default()
            .word(Pos::Verb, "look_up")
            .word(Pos::Verb, "take_in_hand")
            .word(Pos::Noun, "hand");
        assert_eq!(forms(&lex, "looking up", Pos::Verb), vec!["look up"]);
        assert_eq!(forms(&lex, "takes in hands", Pos::Verb), vec!["take in hand"]);
        assert!(forms(&lex, "looking glass", Pos::Verb).is_empty());
    }

    #[test]
    fn verb_preposition_uses_verb_exceptions() {
        let lex = FakeLexicon::default()
            .word(Pos::Verb, "run_out")
            .exception(Pos::Verb, "ran run");
        assert_eq!(forms(&lex, "ran out", Pos::Verb), vec!["run out"]);
    }

    #[test]
    fn collocations_stem_each_word() {
        let lex = FakeLexicon::default()
            .word(Pos::Noun, "mother")
            .word(Pos::Noun, "mother-in-law");
        assert_eq!(
            forms(&lex, "mothers-in-law", Pos::Noun),
            vec!["mother-in-law"]
        );
    }

    #[test]
    fn collocations_try_separator_variants() {
        let lex = FakeLexicon::default().word(Pos::Noun, "internal-combustion_engine");
        assert_eq!(
            forms(&lex, "internal combustion engine", Pos::Noun),
            vec!["internal-combustion engine"]
        );
    }

    #[test]
    fn results_are_memoized_including_empty_ones() {
        let lex = FakeLexicon::default().word(Pos::Noun, "dog");
        let morphy = Morphy::new(16);
        let first = morphy.base_forms(&lex, "dogs", Pos::Noun).unwrap();
        let calls = lex.calls.get();
        assert_eq!(morphy.base_forms(&lex, "dogs", Pos::Noun).unwrap(), first);
        assert!(morphy.base_forms(&lex, "zzz", Pos::Noun).unwrap().is_empty());
        let after_miss = lex.calls.get();
        assert!(after_miss > calls);
        assert!(morphy.base_forms(&lex, "zzz", Pos::Noun).unwrap().is_empty());
        assert_eq!(lex.calls.get(), after_miss);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let lex = FakeLexicon::default();
        assert!(forms(&lex, "", Pos::Noun).is_empty());
        assert!(forms(&lex, " - ", Pos::Noun).is_empty());
        assert_eq!(lex.calls.get(), 0);
    }

    #[test]
    fn normalizes_queries() {
        assert_eq!(normalize("  Hot  Dog "), "hot_dog");
        assert_eq!(normalize("hot__dog"), "hot_dog");
        assert_eq!(normalize("-Mother-in-Law-"), "mother-in-law");
        assert_eq!(normalize("a - b"), "a_-_b");
        assert_eq!(normalize("   "), "_");
        assert_eq!(normalize("_"), "_");
        assert_eq!(normalize("-"), "-");
        assert_eq!(normalize("--"), "");
        assert_eq!(normalize(" -a"), "a");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn counts_words() {
        assert_eq!(count_words("dog_gone", '_'), 2);
        assert_eq!(count_words("internal-combustion engine", '-'), 3);
        assert_eq!(count_words("internal-combustion engine", '_'), 2);
        assert_eq!(count_words("", '_'), 0);
        assert_eq!(count_words("-", '_'), 1);
        assert_eq!(count_words("-", '-'), 0);
        assert_eq!(count_words("__", '_'), 0);
    }

    #[test]
    fn preposition_must_follow_the_first_word() {
        assert!(has_preposition("look_up"));
        assert!(has_preposition("give_in_to"));
        assert!(!has_preposition("look_upward"));
        assert!(!has_preposition("run_fast_up"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[ _\\-a-zA-Z\\t]{0,16}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}

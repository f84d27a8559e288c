//! Shared vocabulary for the WordNet dictionary format.
//!
//! These types carry no I/O and no allocation policy; they describe the
//! fixed codes found inside `index.*`/`data.*` lines so the storage, morphy
//! and facade crates agree on how a part of speech, a synset address or a
//! pointer symbol is spelled.
//!
//! Use [`Pos`] and [`SynsetId`] to address entries, [`SynsetType`] and
//! [`AdjPosition`] to interpret data-line markers, [`RelationType`] to decode
//! pointer symbols, and [`decode_st`] to interpret pointer source/target pairs.
//!
//! ```rust
//! use wordnet_types::{Pos, RelationType, SynsetId, decode_st};
//!
//! let pos = Pos::from_char('n').unwrap();
//! let id = SynsetId { pos, offset: 1740 };
//! assert_eq!(id.pos.file_suffix(), "noun");
//! assert_eq!(RelationType::parse("@", Pos::Noun), Some(RelationType::Hypernym));
//! assert_eq!(decode_st("0a0b"), (Some(10), Some(11)));
//! ```

use std::fmt;

/// Part-of-speech marker as used by WordNet files (`n`, `v`, `a`/`s`, `r`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
}

impl Pos {
    /// Every part of speech, in file-numbering order.
    pub const ALL: [Pos; 4] = [Pos::Noun, Pos::Verb, Pos::Adj, Pos::Adv];

    /// Parse a WordNet POS character into an enum.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Pos::Noun),
            'v' => Some(Pos::Verb),
            'a' | 's' => Some(Pos::Adj),
            'r' => Some(Pos::Adv),
            _ => None,
        }
    }

    /// Emit the POS character used in `index.*`/`data.*`.
    pub fn to_char(self) -> char {
        match self {
            Pos::Noun => 'n',
            Pos::Verb => 'v',
            Pos::Adj => 'a',
            Pos::Adv => 'r',
        }
    }

    /// Suffix used by the per-POS file names (`index.noun`, `verb.exc`, ...).
    pub fn file_suffix(self) -> &'static str {
        match self {
            Pos::Noun => "noun",
            Pos::Verb => "verb",
            Pos::Adj => "adj",
            Pos::Adv => "adv",
        }
    }

    /// Numeric code used in sense keys (1 = noun ... 4 = adverb).
    pub fn wordnet_code(self) -> u8 {
        match self {
            Pos::Noun => 1,
            Pos::Verb => 2,
            Pos::Adj => 3,
            Pos::Adv => 4,
        }
    }

    /// Dense index for per-POS tables.
    pub fn index(self) -> usize {
        self.wordnet_code() as usize - 1
    }

    pub fn index_file(self) -> String {
        format!("index.{}", self.file_suffix())
    }

    pub fn data_file(self) -> String {
        format!("data.{}", self.file_suffix())
    }

    pub fn exception_file(self) -> String {
        format!("{}.exc", self.file_suffix())
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

/// `(offset, pos)` pair uniquely identifying a synset within the WordNet files.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SynsetId {
    pub pos: Pos,
    pub offset: u32,
}

impl fmt::Display for SynsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}-{}", self.offset, self.pos.to_char())
    }
}

/// Raw `ss_type` marker from `data.*`, including adjective satellites.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SynsetType {
    Noun,
    Verb,
    Adj,
    Adv,
    AdjSatellite,
}

impl SynsetType {
    /// Parse the `ss_type` character from a data line.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(SynsetType::Noun),
            'v' => Some(SynsetType::Verb),
            'a' => Some(SynsetType::Adj),
            's' => Some(SynsetType::AdjSatellite),
            'r' => Some(SynsetType::Adv),
            _ => None,
        }
    }

    pub fn pos(self) -> Pos {
        match self {
            SynsetType::Noun => Pos::Noun,
            SynsetType::Verb => Pos::Verb,
            SynsetType::Adj | SynsetType::AdjSatellite => Pos::Adj,
            SynsetType::Adv => Pos::Adv,
        }
    }

    /// Numeric `ss_type` used in sense keys; satellites are 5.
    pub fn sense_key_code(self) -> u8 {
        match self {
            SynsetType::AdjSatellite => 5,
            other => other.pos().wordnet_code(),
        }
    }
}

/// Syntactic marker an adjective lemma may carry in `data.adj`
/// (`(a)`, `(p)`, `(ip)`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AdjPosition {
    /// `(a)`: prenominal.
    Attributive,
    /// `(p)`: predicate.
    Predicative,
    /// `(ip)`: immediately postnominal.
    ImmediatePostnominal,
}

impl AdjPosition {
    /// Split a trailing position marker off a data-line lemma.
    ///
    /// Returns the bare lemma and the marker if one was present.
    pub fn strip_marker(lemma: &str) -> (&str, Option<Self>) {
        for (marker, position) in [
            ("(ip)", AdjPosition::ImmediatePostnominal),
            ("(a)", AdjPosition::Attributive),
            ("(p)", AdjPosition::Predicative),
        ] {
            if let Some(bare) = lemma.strip_suffix(marker) {
                return (bare, Some(position));
            }
        }
        (lemma, None)
    }
}

/// Typed pointer symbol from a data line.
///
/// The same symbol may mean different things for different parts of speech
/// (`\` is a pertainym on adjectives and "derived from" on adverbs), so
/// parsing always takes the source synset's POS.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RelationType {
    Antonym,
    Hypernym,
    InstanceHypernym,
    Hyponym,
    InstanceHyponym,
    MemberHolonym,
    SubstanceHolonym,
    PartHolonym,
    MemberMeronym,
    SubstanceMeronym,
    PartMeronym,
    Attribute,
    DerivationallyRelated,
    DomainOfTopic,
    MemberOfTopicDomain,
    DomainOfRegion,
    MemberOfRegionDomain,
    DomainOfUsage,
    MemberOfUsageDomain,
    Domain,
    DomainMember,
    Entailment,
    Cause,
    AlsoSee,
    VerbGroup,
    SimilarTo,
    ParticipleOf,
    Pertainym,
    DerivedFrom,
}

impl RelationType {
    /// Decode a pointer symbol as written in `data.<pos>`.
    pub fn parse(symbol: &str, pos: Pos) -> Option<Self> {
        use RelationType::*;
        let kind = match symbol {
            "!" => Antonym,
            "@" => Hypernym,
            "@i" => InstanceHypernym,
            "~" => Hyponym,
            "~i" => InstanceHyponym,
            "#m" => MemberHolonym,
            "#s" => SubstanceHolonym,
            "#p" => PartHolonym,
            "%m" => MemberMeronym,
            "%s" => SubstanceMeronym,
            "%p" => PartMeronym,
            "=" => Attribute,
            "+" => DerivationallyRelated,
            ";c" => DomainOfTopic,
            "-c" => MemberOfTopicDomain,
            ";r" => DomainOfRegion,
            "-r" => MemberOfRegionDomain,
            ";u" => DomainOfUsage,
            "-u" => MemberOfUsageDomain,
            ";" => Domain,
            "-" => DomainMember,
            "*" => Entailment,
            ">" => Cause,
            "^" => AlsoSee,
            "$" => VerbGroup,
            "&" => SimilarTo,
            "<" => ParticipleOf,
            "\\" if pos == Pos::Adv => DerivedFrom,
            "\\" => Pertainym,
            _ => return None,
        };
        Some(kind)
    }

    /// Symbol written in data files for this relation.
    pub fn symbol(self) -> &'static str {
        use RelationType::*;
        match self {
            Antonym => "!",
            Hypernym => "@",
            InstanceHypernym => "@i",
            Hyponym => "~",
            InstanceHyponym => "~i",
            MemberHolonym => "#m",
            SubstanceHolonym => "#s",
            PartHolonym => "#p",
            MemberMeronym => "%m",
            SubstanceMeronym => "%s",
            PartMeronym => "%p",
            Attribute => "=",
            DerivationallyRelated => "+",
            DomainOfTopic => ";c",
            MemberOfTopicDomain => "-c",
            DomainOfRegion => ";r",
            MemberOfRegionDomain => "-r",
            DomainOfUsage => ";u",
            MemberOfUsageDomain => "-u",
            Domain => ";",
            DomainMember => "-",
            Entailment => "*",
            Cause => ">",
            AlsoSee => "^",
            VerbGroup => "$",
            SimilarTo => "&",
            ParticipleOf => "<",
            Pertainym | DerivedFrom => "\\",
        }
    }
}

/// Decode the four-hex source/target field used in pointer blocks.
///
/// High byte is the source word number, low byte is the target word number.
/// Zero indicates "not specified" per WordNet conventions.
pub fn decode_st(hex4: &str) -> (Option<u16>, Option<u16>) {
    if hex4.len() != 4 {
        return (None, None);
    }

    match u16::from_str_radix(hex4, 16) {
        Ok(val) => {
            let src = val >> 8;
            let dst = val & 0x00FF;
            let src = if src == 0 { None } else { Some(src) };
            let dst = if dst == 0 { None } else { Some(dst) };
            (src, dst)
        }
        Err(_) => (None, None),
    }
}

//! # Feature Templater
//!
//! Lays token profiles out over a ±2 window and emits the feature families
//! in a fixed declared order. Disabling a family removes its fields from
//! each line; it never adds or removes lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::corpus::Sentence;
use crate::error::{ChunkerError, Result};
use crate::features::extractor::{FeatureExtractor, TokenProfile};
use crate::features::FeatureSet;
use crate::placeholder::Placeholder;

/// Value used for neighbours before the first token.
pub const BOS: &str = "BOS";
/// Value used for neighbours after the last token.
pub const EOS: &str = "EOS";

/// Independently toggle-able groups of features, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureFamily {
    Identity,
    Orthography,
    Pos,
    PosNgrams,
    ContextWords,
    ClosedClass,
    Boundary,
    Structure,
    Coordination,
    Sequence,
}

impl FeatureFamily {
    pub const ALL: [FeatureFamily; 10] = [
        FeatureFamily::Identity,
        FeatureFamily::Orthography,
        FeatureFamily::Pos,
        FeatureFamily::PosNgrams,
        FeatureFamily::ContextWords,
        FeatureFamily::ClosedClass,
        FeatureFamily::Boundary,
        FeatureFamily::Structure,
        FeatureFamily::Coordination,
        FeatureFamily::Sequence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Orthography => "orthography",
            Self::Pos => "pos",
            Self::PosNgrams => "pos-ngrams",
            Self::ContextWords => "context-words",
            Self::ClosedClass => "closed-class",
            Self::Boundary => "boundary",
            Self::Structure => "structure",
            Self::Coordination => "coordination",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureFamily {
    type Err = ChunkerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.name()).collect();
                ChunkerError::InvalidConfig(format!(
                    "unknown feature family {s:?} (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}

/// Configuration for the templater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Enabled families. Emission order is always [`FeatureFamily::ALL`] order.
    pub families: Vec<FeatureFamily>,
    /// Character lengths of the `pre{n}=` / `suf{n}=` features.
    pub affix_lengths: Vec<usize>,
    /// Marker and prefix for the sequence features.
    pub placeholder: Placeholder,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            families: FeatureFamily::ALL.to_vec(),
            affix_lengths: vec![2, 3],
            placeholder: Placeholder::default(),
        }
    }
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable exactly the given families.
    pub fn with_families(mut self, families: impl IntoIterator<Item = FeatureFamily>) -> Self {
        self.families = families.into_iter().collect();
        self
    }

    /// Disable one family.
    pub fn without(mut self, family: FeatureFamily) -> Self {
        self.families.retain(|f| *f != family);
        self
    }

    pub fn with_affix_lengths(mut self, lengths: Vec<usize>) -> Self {
        self.affix_lengths = lengths;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn is_enabled(&self, family: FeatureFamily) -> bool {
        self.families.contains(&family)
    }

    pub fn validate(&self) -> Result<()> {
        if self.affix_lengths.contains(&0) {
            return Err(ChunkerError::InvalidConfig(
                "affix lengths must be positive".into(),
            ));
        }
        self.placeholder.validate()
    }
}

/// Sentence-level feature builder.
#[derive(Debug, Clone)]
pub struct Templater {
    config: TemplateConfig,
    extractor: FeatureExtractor,
}

impl Templater {
    /// # Errors
    ///
    /// Returns `ChunkerError::InvalidConfig` for unusable settings.
    pub fn new(config: TemplateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: FeatureExtractor::new()?,
        })
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// One feature set per token, in order.
    pub fn sentence_features(&self, sentence: &Sentence) -> Vec<FeatureSet> {
        let profiles: Vec<TokenProfile> = sentence
            .tokens()
            .iter()
            .map(|t| self.extractor.profile(t))
            .collect();
        (0..profiles.len())
            .map(|i| self.token_features(&profiles, i))
            .collect()
    }

    /// Features for token `i` given the profiles of its whole sentence.
    pub fn token_features(&self, profiles: &[TokenProfile], i: usize) -> FeatureSet {
        let window = Window { profiles, i };
        let mut set = FeatureSet::new();
        for family in FeatureFamily::ALL {
            if !self.config.is_enabled(family) {
                continue;
            }
            match family {
                FeatureFamily::Identity => self.extractor.push_identity(window.cur(), &mut set),
                FeatureFamily::Orthography => self.extractor.push_orthography(
                    window.cur(),
                    &self.config.affix_lengths,
                    &mut set,
                ),
                FeatureFamily::Pos => push_pos(&window, &mut set),
                FeatureFamily::PosNgrams => push_pos_ngrams(&window, &mut set),
                FeatureFamily::ContextWords => push_context_words(&window, &mut set),
                FeatureFamily::ClosedClass => push_closed_class(&window, &mut set),
                FeatureFamily::Boundary => push_boundary(&window, &mut set),
                FeatureFamily::Structure => push_structure(&window, &mut set),
                FeatureFamily::Coordination => push_coordination(&window, &mut set),
                FeatureFamily::Sequence => self.push_sequence(&window, &mut set),
            }
        }
        set
    }

    /// `PrevBIO=@@`, `PrevBIO+pos=@@+POS`, `PrevBIO+p1pos=@@+P1POS`
    fn push_sequence(&self, w: &Window<'_>, set: &mut FeatureSet) {
        let prefix = &self.config.placeholder.prefix;
        set.push_prev_label(prefix.clone(), None);
        set.push_prev_label(format!("{prefix}+pos"), Some(w.cur().pos.clone()));
        set.push_prev_label(format!("{prefix}+p1pos"), Some(w.pos(-1).to_string()));
    }
}

/// A token and its sentence, with boundary-safe neighbour access.
struct Window<'a> {
    profiles: &'a [TokenProfile],
    i: usize,
}

impl<'a> Window<'a> {
    fn cur(&self) -> &'a TokenProfile {
        &self.profiles[self.i]
    }

    fn at(&self, offset: isize) -> Option<&'a TokenProfile> {
        self.i
            .checked_add_signed(offset)
            .and_then(|j| self.profiles.get(j))
    }

    fn edge(offset: isize) -> &'static str {
        if offset < 0 { BOS } else { EOS }
    }

    fn pos(&self, offset: isize) -> &'a str {
        self.at(offset).map_or(Self::edge(offset), |p| p.pos.as_str())
    }

    fn coarse(&self, offset: isize) -> &'a str {
        self.at(offset)
            .map_or(Self::edge(offset), |p| p.coarse.as_str())
    }

    fn word(&self, offset: isize) -> &'a str {
        self.at(offset)
            .map_or(Self::edge(offset), |p| p.text.as_str())
    }

    fn lower(&self, offset: isize) -> &'a str {
        self.at(offset)
            .map_or(Self::edge(offset), |p| p.lower.as_str())
    }

    fn test(&self, offset: isize, f: impl Fn(&TokenProfile) -> bool) -> bool {
        self.at(offset).is_some_and(f)
    }
}

fn push_pos(w: &Window<'_>, set: &mut FeatureSet) {
    set.push_value("pos", w.pos(0));
    set.push_value("cpos", w.coarse(0));
    set.push_value("p2pos", w.pos(-2));
    set.push_value("p1pos", w.pos(-1));
    set.push_value("n1pos", w.pos(1));
    set.push_value("n2pos", w.pos(2));
    set.push_value("p2cpos", w.coarse(-2));
    set.push_value("p1cpos", w.coarse(-1));
    set.push_value("n1cpos", w.coarse(1));
    set.push_value("n2cpos", w.coarse(2));
}

fn push_pos_ngrams(w: &Window<'_>, set: &mut FeatureSet) {
    let (p2, p1, c, n1, n2) = (w.pos(-2), w.pos(-1), w.pos(0), w.pos(1), w.pos(2));
    set.push_value("p2pos+p1pos", format!("{p2}+{p1}"));
    set.push_value("p1pos+pos", format!("{p1}+{c}"));
    set.push_value("pos+n1pos", format!("{c}+{n1}"));
    set.push_value("n1pos+n2pos", format!("{n1}+{n2}"));
    set.push_value("p2pos+p1pos+pos", format!("{p2}+{p1}+{c}"));
    set.push_value("p1pos+pos+n1pos", format!("{p1}+{c}+{n1}"));
    set.push_value("pos+n1pos+n2pos", format!("{c}+{n1}+{n2}"));
}

fn push_context_words(w: &Window<'_>, set: &mut FeatureSet) {
    set.push_value("p1w", w.word(-1));
    set.push_value("p1wl", w.lower(-1));
    set.push_value("n1w", w.word(1));
    set.push_value("n1wl", w.lower(1));
}

fn push_closed_class(w: &Window<'_>, set: &mut FeatureSet) {
    set.push_flag("det", w.cur().determiner);
    set.push_flag("p1det", w.test(-1, |p| p.determiner));
    set.push_flag("prep", w.cur().preposition);
    set.push_flag("p1prep", w.test(-1, |p| p.preposition));
}

fn push_boundary(w: &Window<'_>, set: &mut FeatureSet) {
    let last = w.profiles.len() - 1;
    set.push_flag("BOS", w.i == 0);
    set.push_flag("BOS2", w.i == 1);
    set.push_flag("EOS", w.i == last);
    set.push_flag("EOS2", w.i + 1 == last);
}

fn push_structure(w: &Window<'_>, set: &mut FeatureSet) {
    set.push_flag("p1NNP", w.test(-1, TokenProfile::is_proper_noun));
    set.push_flag("n1NNP", w.test(1, TokenProfile::is_proper_noun));
    set.push_flag(
        "commaBetweenNouns",
        w.cur().text == "," && w.test(-1, TokenProfile::is_noun) && w.test(1, TokenProfile::is_noun),
    );
}

fn push_coordination(w: &Window<'_>, set: &mut FeatureSet) {
    let cur = w.cur();
    set.push_flag(
        "adjBeforeNoun",
        cur.is_adjective() && w.test(1, TokenProfile::is_noun),
    );
    set.push_flag(
        "moreMostBefore",
        (cur.is_adjective() || cur.is_noun())
            && w.test(-1, |p| p.lower == "more" || p.lower == "most"),
    );
    set.push_flag("quantPrev3", (1..=3).any(|d| w.test(-d, |p| p.quantifier)));
    set.push_flag("symBefore", w.test(-1, |p| p.symbol));

    if cur.is_conjunction() {
        let parallel = match (w.at(-1), w.at(1)) {
            (Some(p), Some(n)) => p.coarse == n.coarse,
            _ => false,
        };
        set.push_flag("ccParallel", parallel);
        set.push_flag("ccAfterVerb", w.test(-1, TokenProfile::is_verb));
        set.push_flag(
            "ccNearComma",
            (1..=3).any(|d| w.test(-d, |p| p.text == ",") || w.test(d, |p| p.text == ",")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence() -> Sentence {
        Sentence::from_pairs([
            ("The", "DT"),
            ("big", "JJ"),
            ("dog", "NN"),
            ("and", "CC"),
            ("cat", "NN"),
            ("slept", "VBD"),
        ])
    }

    fn render(set: &FeatureSet) -> Vec<String> {
        set.render("@@")
    }

    fn only(family: FeatureFamily) -> Templater {
        Templater::new(TemplateConfig::new().with_families([family])).unwrap()
    }

    #[test]
    fn test_one_feature_set_per_token() {
        let templater = Templater::new(TemplateConfig::default()).unwrap();
        let sets = templater.sentence_features(&sentence());
        assert_eq!(sets.len(), 6);
        assert!(sets.iter().all(FeatureSet::has_placeholder));
    }

    #[test]
    fn test_pos_window_uses_boundary_values() {
        let sets = only(FeatureFamily::Pos).sentence_features(&sentence());
        let first = render(&sets[0]);
        assert!(first.contains(&"p2pos=BOS".to_string()));
        assert!(first.contains(&"p1cpos=BOS".to_string()));
        assert!(first.contains(&"n1pos=JJ".to_string()));
        let last = render(&sets[5]);
        assert!(last.contains(&"n1pos=EOS".to_string()));
        assert!(last.contains(&"n2cpos=EOS".to_string()));
        assert!(last.contains(&"cpos=V".to_string()));
    }

    #[test]
    fn test_value_family_counts_are_stable() {
        let sets = only(FeatureFamily::Pos).sentence_features(&sentence());
        assert!(sets.iter().all(|s| s.len() == 10));
        let sets = only(FeatureFamily::PosNgrams).sentence_features(&sentence());
        assert!(sets.iter().all(|s| s.len() == 7));
        assert_eq!(render(&sets[0])[4], "p2pos+p1pos+pos=BOS+BOS+DT");
    }

    #[test]
    fn test_boundary_flags() {
        let sets = only(FeatureFamily::Boundary).sentence_features(&sentence());
        assert_eq!(render(&sets[0]), vec!["BOS"]);
        assert_eq!(render(&sets[1]), vec!["BOS2"]);
        assert!(sets[2].is_empty());
        assert_eq!(render(&sets[4]), vec!["EOS2"]);
        assert_eq!(render(&sets[5]), vec!["EOS"]);

        let single = Sentence::from_pairs([("Hi", "UH")]);
        let sets = only(FeatureFamily::Boundary).sentence_features(&single);
        assert_eq!(render(&sets[0]), vec!["BOS", "EOS"]);
    }

    #[test]
    fn test_coordination_cues() {
        let sets = only(FeatureFamily::Coordination).sentence_features(&sentence());
        assert_eq!(render(&sets[1]), vec!["adjBeforeNoun"]);
        assert_eq!(render(&sets[3]), vec!["ccParallel"]);
    }

    fn clause() -> Sentence {
        Sentence::from_pairs([
            ("The", "DT"),
            ("cat", "NN"),
            ("sat", "VBD"),
            ("and", "CC"),
            (",", ","),
            ("of", "IN"),
            ("x", "NN"),
        ])
    }

    #[test]
    fn test_context_words_use_boundary_values() {
        let sets = only(FeatureFamily::ContextWords).sentence_features(&sentence());
        assert_eq!(
            render(&sets[0]),
            vec!["p1w=BOS", "p1wl=BOS", "n1w=big", "n1wl=big"]
        );
        assert_eq!(
            render(&sets[5]),
            vec!["p1w=cat", "p1wl=cat", "n1w=EOS", "n1wl=EOS"]
        );
        let s = Sentence::from_pairs([("Big", "JJ"), ("Dogs", "NNS")]);
        let sets = only(FeatureFamily::ContextWords).sentence_features(&s);
        assert_eq!(
            render(&sets[1]),
            vec!["p1w=Big", "p1wl=big", "n1w=EOS", "n1wl=EOS"]
        );
    }

    #[test]
    fn test_closed_class_flags() {
        let sets = only(FeatureFamily::ClosedClass).sentence_features(&clause());
        assert_eq!(render(&sets[0]), vec!["det"]);
        assert_eq!(render(&sets[1]), vec!["p1det"]);
        assert!(sets[2].is_empty());
        assert_eq!(render(&sets[5]), vec!["prep"]);
        assert_eq!(render(&sets[6]), vec!["p1prep"]);
    }

    #[test]
    fn test_conjunction_after_verb_near_comma() {
        let sets = only(FeatureFamily::Coordination).sentence_features(&clause());
        assert_eq!(render(&sets[3]), vec!["ccAfterVerb", "ccNearComma"]);
    }

    #[test]
    fn test_quantifier_and_symbol_cues() {
        let s = Sentence::from_pairs([("$", "$"), ("5", "CD"), ("more", "JJR"), ("people", "NNS")]);
        let sets = only(FeatureFamily::Coordination).sentence_features(&s);
        assert_eq!(render(&sets[1]), vec!["symBefore"]);
        assert_eq!(render(&sets[2]), vec!["adjBeforeNoun", "quantPrev3"]);
        assert_eq!(render(&sets[3]), vec!["moreMostBefore", "quantPrev3"]);
    }

    #[test]
    fn test_structure_cues() {
        let s = Sentence::from_pairs([("John", "NNP"), ("dogs", "NNS"), (",", ","), ("cats", "NNS")]);
        let sets = only(FeatureFamily::Structure).sentence_features(&s);
        assert_eq!(render(&sets[1]), vec!["p1NNP"]);
        assert_eq!(render(&sets[0]), Vec::<String>::new());
        assert_eq!(render(&sets[2]), vec!["commaBetweenNouns"]);
    }

    #[test]
    fn test_sequence_features() {
        let sets = only(FeatureFamily::Sequence).sentence_features(&sentence());
        assert_eq!(
            render(&sets[0]),
            vec!["PrevBIO=@@", "PrevBIO+pos=@@+DT", "PrevBIO+p1pos=@@+BOS"]
        );
        assert_eq!(render(&sets[2])[2], "PrevBIO+p1pos=@@+JJ");
    }

    #[test]
    fn test_disabling_family_drops_only_its_fields() {
        let full = Templater::new(TemplateConfig::default()).unwrap();
        let ablated = Templater::new(TemplateConfig::default().without(FeatureFamily::Sequence))
            .unwrap();
        let a = full.sentence_features(&sentence());
        let b = ablated.sentence_features(&sentence());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.len(), y.len() + 3);
            assert!(!y.has_placeholder());
        }
    }

    #[test]
    fn test_family_names_roundtrip() {
        for family in FeatureFamily::ALL {
            assert_eq!(family.name().parse::<FeatureFamily>().unwrap(), family);
        }
        assert!("colour".parse::<FeatureFamily>().is_err());
    }

    #[test]
    fn test_rejects_zero_affix() {
        let config = TemplateConfig::new().with_affix_lengths(vec![0]);
        assert!(Templater::new(config).is_err());
    }
}

//! Token-local feature extraction.

use crate::corpus::Token;
use crate::error::Result;
use crate::features::FeatureSet;
use crate::features::lexicon::{
    coarse_pos, is_determiner, is_preposition, is_quantifier_word, is_symbol_tag,
};
use crate::features::orthography::{
    Orthography, has_digit, has_hyphen, is_all_caps, is_punctuation, is_title_case, prefix,
    suffix, word_shape,
};

/// Everything about a token that does not depend on its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProfile {
    pub text: String,
    pub lower: String,
    pub pos: String,
    pub coarse: String,
    pub shape: String,
    pub title: bool,
    pub all_caps: bool,
    pub hyphen: bool,
    pub digit: bool,
    pub number: bool,
    pub punct: bool,
    pub determiner: bool,
    pub preposition: bool,
    pub quantifier: bool,
    pub symbol: bool,
}

impl TokenProfile {
    pub fn is_noun(&self) -> bool {
        self.coarse == "N"
    }

    pub fn is_adjective(&self) -> bool {
        self.coarse == "J"
    }

    pub fn is_verb(&self) -> bool {
        self.coarse == "V"
    }

    pub fn is_proper_noun(&self) -> bool {
        self.pos.starts_with("NNP")
    }

    pub fn is_conjunction(&self) -> bool {
        self.pos == "CC"
    }
}

/// Builds [`TokenProfile`]s and the identity/orthography feature families.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    orthography: Orthography,
}

impl FeatureExtractor {
    /// # Errors
    ///
    /// Returns `ChunkerError::RegexError` if the orthographic patterns fail to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            orthography: Orthography::new()?,
        })
    }

    pub fn profile(&self, token: &Token) -> TokenProfile {
        let text = token.text.as_str();
        let lower = text.to_lowercase();
        TokenProfile {
            shape: word_shape(text),
            title: is_title_case(text),
            all_caps: is_all_caps(text),
            hyphen: has_hyphen(text),
            digit: has_digit(text),
            number: self.orthography.is_number(text),
            punct: is_punctuation(text),
            determiner: is_determiner(&lower),
            preposition: is_preposition(&lower),
            quantifier: token.pos == "CD" || token.pos == "PDT" || is_quantifier_word(&lower),
            symbol: is_symbol_tag(&token.pos),
            coarse: coarse_pos(&token.pos).to_string(),
            pos: token.pos.clone(),
            text: text.to_string(),
            lower,
        }
    }

    /// `w=`, `wl=`
    pub fn push_identity(&self, profile: &TokenProfile, set: &mut FeatureSet) {
        set.push_value("w", &profile.text);
        set.push_value("wl", &profile.lower);
    }

    /// `shape=`, `pre{n}=`, `suf{n}=` and the orthographic flags.
    pub fn push_orthography(
        &self,
        profile: &TokenProfile,
        affix_lengths: &[usize],
        set: &mut FeatureSet,
    ) {
        set.push_value("shape", &profile.shape);
        for &n in affix_lengths {
            set.push_value(&format!("pre{n}"), prefix(&profile.lower, n));
        }
        for &n in affix_lengths {
            set.push_value(&format!("suf{n}"), suffix(&profile.lower, n));
        }
        set.push_flag("title", profile.title);
        set.push_flag("allcaps", profile.all_caps);
        set.push_flag("hyphen", profile.hyphen);
        set.push_flag("hasdigit", profile.digit);
        set.push_flag("number", profile.number);
        set.push_flag("punct", profile.punct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new().unwrap()
    }

    #[test]
    fn test_profile() {
        let p = extractor().profile(&Token::new("The", "DT", 0));
        assert_eq!(p.lower, "the");
        assert_eq!(p.coarse, "DT");
        assert_eq!(p.shape, "Xx");
        assert!(p.determiner);
        assert!(p.title);
        assert!(!p.preposition);
    }

    #[test]
    fn test_quantifier_from_pos() {
        let p = extractor().profile(&Token::new("1,000", "CD", 0));
        assert!(p.quantifier);
        assert!(p.number);
        assert!(!p.punct);
    }

    #[test]
    fn test_identity_and_orthography() {
        let ex = extractor();
        let p = ex.profile(&Token::new("Well-Known", "JJ", 0));
        let mut set = FeatureSet::new();
        ex.push_identity(&p, &mut set);
        ex.push_orthography(&p, &[2, 3], &mut set);
        assert_eq!(
            set.render("@@"),
            vec![
                "w=Well-Known",
                "wl=well-known",
                "shape=Xx-Xx",
                "pre2=we",
                "pre3=wel",
                "suf2=wn",
                "suf3=own",
                "title",
                "hyphen",
            ]
        );
    }
}

//! Closed-class word lists and POS coarsening.

/// Determiners and possessive pronouns that open noun groups.
const DETERMINERS: &[&str] = &[
    "a", "all", "an", "another", "any", "both", "each", "either", "every", "her", "his", "its",
    "my", "neither", "no", "our", "some", "that", "the", "their", "these", "this", "those",
    "your",
];

const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "as", "at",
    "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite",
    "down", "during", "except", "for", "from", "in", "inside", "into", "like", "near", "of",
    "off", "on", "onto", "out", "outside", "over", "per", "since", "than", "through",
    "throughout", "to", "toward", "towards", "under", "until", "up", "upon", "via", "with",
    "within", "without",
];

const QUANTIFIERS: &[&str] = &[
    "all", "both", "each", "every", "few", "fewer", "least", "less", "many", "more", "most",
    "much", "several", "some",
];

/// POS tags that mark currency and other symbols.
const SYMBOL_TAGS: &[&str] = &["$", "#", "SYM"];

/// Lists are sorted so lookups can binary search.
fn contains(list: &[&str], lower: &str) -> bool {
    list.binary_search(&lower).is_ok()
}

pub fn is_determiner(lower: &str) -> bool {
    contains(DETERMINERS, lower)
}

pub fn is_preposition(lower: &str) -> bool {
    contains(PREPOSITIONS, lower)
}

pub fn is_quantifier_word(lower: &str) -> bool {
    contains(QUANTIFIERS, lower)
}

pub fn is_symbol_tag(pos: &str) -> bool {
    SYMBOL_TAGS.contains(&pos)
}

/// Collapse a Penn Treebank tag into a coarse class.
///
/// Noun, adjective, adverb and verb subtypes fold into `N`, `J`, `R` and `V`;
/// every other tag is its own class.
pub fn coarse_pos(pos: &str) -> &str {
    if pos.starts_with("NN") {
        "N"
    } else if pos.starts_with("JJ") {
        "J"
    } else if pos.starts_with("RB") {
        "R"
    } else if pos.starts_with("VB") {
        "V"
    } else {
        pos
    }
}

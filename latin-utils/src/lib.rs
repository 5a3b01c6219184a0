pub mod simplify;
pub mod text_cleanup;

use std::collections::HashSet;
use std::sync::LazyLock;

#[derive(
    Clone, Copy, Debug, serde::Serialize, serde::Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd,
)]
pub enum PartOfSpeech {
    #[serde(rename = "ADJ")]
    Adj, // adjective
    #[serde(rename = "ADP")]
    Adp, // adposition
    #[serde(rename = "ADV")]
    Adv, // adverb
    #[serde(rename = "AUX")]
    Aux, // auxiliary
    #[serde(rename = "CCONJ")]
    Cconj, // coordinating conjunction
    #[serde(rename = "DET")]
    Det, // determiner
    #[serde(rename = "INTJ")]
    Intj, // interjection
    #[serde(rename = "NOUN")]
    Noun, // noun
    #[serde(rename = "NUM")]
    Num, // numeral
    #[serde(rename = "PART")]
    Part, // particle
    #[serde(rename = "PRON")]
    Pron, // pronoun
    #[serde(rename = "PROPN")]
    Propn, // proper noun
    #[serde(rename = "PUNCT")]
    Punct, // punctuation
    #[serde(rename = "SCONJ")]
    Sconj, // subordinating conjunction
    #[serde(rename = "SYM")]
    Sym, // symbol
    #[serde(rename = "VERB")]
    Verb, // verb
    #[serde(rename = "X")]
    X, // other
}

impl PartOfSpeech {
    /// Parse a universal POS tag as emitted by the annotator. Unknown tags
    /// return `None` and the word is filtered out upstream.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let pos = match tag {
            "ADJ" => PartOfSpeech::Adj,
            "ADP" => PartOfSpeech::Adp,
            "ADV" => PartOfSpeech::Adv,
            "AUX" => PartOfSpeech::Aux,
            "CCONJ" => PartOfSpeech::Cconj,
            "DET" => PartOfSpeech::Det,
            "INTJ" => PartOfSpeech::Intj,
            "NOUN" => PartOfSpeech::Noun,
            "NUM" => PartOfSpeech::Num,
            "PART" => PartOfSpeech::Part,
            "PRON" => PartOfSpeech::Pron,
            "PROPN" => PartOfSpeech::Propn,
            "PUNCT" => PartOfSpeech::Punct,
            "SCONJ" => PartOfSpeech::Sconj,
            "SYM" => PartOfSpeech::Sym,
            "VERB" => PartOfSpeech::Verb,
            "X" => PartOfSpeech::X,
            _ => return None,
        };
        Some(pos)
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            PartOfSpeech::Adj => "ADJ",
            PartOfSpeech::Adp => "ADP",
            PartOfSpeech::Adv => "ADV",
            PartOfSpeech::Aux => "AUX",
            PartOfSpeech::Cconj => "CCONJ",
            PartOfSpeech::Det => "DET",
            PartOfSpeech::Intj => "INTJ",
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Num => "NUM",
            PartOfSpeech::Part => "PART",
            PartOfSpeech::Pron => "PRON",
            PartOfSpeech::Propn => "PROPN",
            PartOfSpeech::Punct => "PUNCT",
            PartOfSpeech::Sconj => "SCONJ",
            PartOfSpeech::Sym => "SYM",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::X => "X",
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Latin functors, pronouns, conjunctions, and forms of "to be"/"to be able".
/// This is a closed list; changing it changes which lemmas reach the reports.
pub static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "et", "in", "de", "cum", "ad", "per", "a", "ab", "ex", "sub", "sed", "ut", "non", "autem",
        "nam", "ne", "nec", "vel", "enim", "atque", "quoque", "quod", "quia", "si", "quoniam",
        "dum", "postquam", "antequam", "ubi", "ita", "tamen", "ergo", "inter", "contra", "propter",
        "super", "is", "hic", "ille", "qui", "quae", "quis", "an", "aut", "etiam", "igitur", "sum",
        "esse", "fui", "possum", "idem", "ipse", "quidem", "meus", "tuus", "suus", "noster",
        "vester", "se", "sui", "ego", "nos", "tu", "vos",
    ])
});

pub fn is_stopword(lemma: &str) -> bool {
    STOPWORDS.contains(lemma)
}

//! Corpus cleanup applied before the text is handed to the annotator.
//!
//! Classical editions are full of praenomen and numeral abbreviations
//! ("A. Hirtius", "LIV."), editorial punctuation, and section numbers, none of
//! which the tagger handles well. Scrubbing keeps letters (macronized vowels
//! and the æ/œ digraphs included) and collapses everything else to spaces.

use regex::Regex;
use std::sync::LazyLock;

// Capital-letter runs followed by a period: praenomina (A., D., L., M., ...)
// and Roman numerals used as section markers.
static ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[ADFIKLMNOPRUVX]+\.").unwrap());
static NON_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\sāēīōūæœ]").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Scrub a raw corpus down to annotator-ready text.
pub fn scrub_corpus(text: &str) -> String {
    let text = ABBREVIATION.replace_all(text, "");
    let text = NON_LETTER.replace_all(&text, " ");
    let text = DIGITS.replace_all(&text, "");
    SPACES.replace_all(&text, " ").trim().to_string()
}

//! Lemma simplification used for hapax grouping.
//!
//! The simplified form is a grouping key, not a citation form. The enclitic
//! strip is deliberately lossy: a lemma that genuinely ends in "que", "ve",
//! or "ne" loses those letters too. Known limitation, kept because hapax
//! grouping in existing outputs depends on it.

use crate::PartOfSpeech;
use regex::Regex;
use std::sync::LazyLock;

static ENCLITIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(que|ve|ne)$").unwrap());

/// Collapse inflection/enclitic noise in a lemma.
///
/// - lower-cases,
/// - removes one trailing enclitic ("-que", "-ve", "-ne"),
/// - for proper nouns, removes a trailing ablative "e"
///   (e.g. "proconsule" -> "proconsul").
///
/// May return the empty string for degenerate input; callers tolerate that.
pub fn simplify_lemma(lemma: &str, pos: PartOfSpeech) -> String {
    let lemma = lemma.to_lowercase();
    let mut simplified = ENCLITIC.replace(&lemma, "").into_owned();
    if pos == PartOfSpeech::Propn && simplified.ends_with('e') {
        simplified.pop();
    }
    simplified
}

//! Annotation adapter: sends the scrubbed corpus to an external UDPipe-style
//! annotator and turns its output into a stream of (surface, lemma, POS)
//! triples.
//!
//! The annotator is an external collaborator. If it is unreachable or returns
//! something we cannot parse, the whole run aborts; there is no degraded mode.

use anyhow::{Context, Result};
use latin_utils::{PartOfSpeech, is_stopword};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_ANNOTATOR_URL: &str = "https://lindat.mff.cuni.cz/services/udpipe/api/process";
pub const DEFAULT_ANNOTATOR_MODEL: &str = "latin";

// Lemmas must be pure Latin letters, macronized vowels and digraphs included.
static LATIN_LEMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Zāēīōūæœ]+$").unwrap());

/// One annotated word as produced by the annotator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedWord {
    pub text: String,
    pub lemma: String,
    pub upos: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub words: Vec<AnnotatedWord>,
}

/// A single valid occurrence in the corpus, after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTriple {
    pub token: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
}

/// Client for a UDPipe-compatible REST annotator.
pub struct AnnotatorClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl AnnotatorClient {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            model,
        }
    }

    /// Annotate the whole corpus in one blocking call.
    ///
    /// The service returns a JSON envelope whose `result` field holds the
    /// CoNLL-U analysis.
    pub async fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>> {
        let resp = self
            .client
            .post(&self.url)
            .form(&[
                ("model", self.model.as_str()),
                ("tokenizer", ""),
                ("tagger", ""),
                ("output", "conllu"),
                ("data", text),
            ])
            .send()
            .await
            .context("annotation service unreachable")?
            .error_for_status()
            .context("annotation service rejected the request")?;

        let value: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse annotation service response")?;
        let conllu = value["result"]
            .as_str()
            .context("annotation service response has no `result` field")?;

        Ok(parse_conllu(conllu))
    }
}

/// Parse CoNLL-U text into sentences of (form, lemma, UPOS) words.
///
/// Multiword-token ranges ("3-4") and empty nodes ("5.1") are skipped; the
/// plain word lines they cover carry the lemma and tag we need.
pub fn parse_conllu(text: &str) -> Vec<AnnotatedSentence> {
    let mut sentences = Vec::new();
    let mut words = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !words.is_empty() {
                sentences.push(AnnotatedSentence {
                    words: std::mem::take(&mut words),
                });
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            log::warn!("malformed CoNLL-U line skipped: {line}");
            continue;
        }
        if fields[0].contains('-') || fields[0].contains('.') {
            continue;
        }
        words.push(AnnotatedWord {
            text: fields[1].to_string(),
            lemma: fields[2].to_string(),
            upos: fields[3].to_string(),
        });
    }
    if !words.is_empty() {
        sentences.push(AnnotatedSentence { words });
    }

    sentences
}

/// Flatten annotated sentences into the ordered token-triple stream,
/// dropping punctuation, symbols, numbers, unrecognized tags, non-Latin
/// lemmas, and (optionally) stopwords.
pub fn extract_triples(sentences: &[AnnotatedSentence], drop_stopwords: bool) -> Vec<TokenTriple> {
    let mut triples = Vec::new();
    for sentence in sentences {
        for word in &sentence.words {
            let token = word.text.trim().to_lowercase();
            let lemma = word.lemma.trim().to_lowercase();
            let Some(pos) = PartOfSpeech::from_tag(&word.upos) else {
                continue;
            };
            if lemma.is_empty()
                || matches!(
                    pos,
                    PartOfSpeech::Punct | PartOfSpeech::Sym | PartOfSpeech::Num | PartOfSpeech::X
                )
            {
                continue;
            }
            if !LATIN_LEMMA.is_match(&lemma) {
                continue;
            }
            if drop_stopwords && is_stopword(&lemma) {
                continue;
            }
            triples.push(TokenTriple { token, lemma, pos });
        }
    }
    triples
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONLLU: &str = "\
# newdoc
# sent_id = 1
# text = Gallia est omnis divisa
1\tGallia\tGallia\tPROPN\t_\t_\t0\troot\t_\t_
2\test\tsum\tAUX\t_\t_\t1\tcop\t_\t_
3\tomnis\tomnis\tADJ\t_\t_\t1\tamod\t_\t_
4\tdivisa\tdivido\tVERB\t_\t_\t1\tacl\t_\t_

# sent_id = 2
1-2\tarmaque\t_\t_\t_\t_\t_\t_\t_\t_
1\tarma\tarmum\tNOUN\t_\t_\t0\troot\t_\t_
2\tque\tque\tCCONJ\t_\t_\t1\tcc\t_\t_
3\t,\t,\tPUNCT\t_\t_\t1\tpunct\t_\t_
4\tXII\tXII\tNUM\t_\t_\t1\tnummod\t_\t_
";

    fn sentence(words: &[(&str, &str, &str)]) -> AnnotatedSentence {
        AnnotatedSentence {
            words: words
                .iter()
                .map(|(text, lemma, upos)| AnnotatedWord {
                    text: text.to_string(),
                    lemma: lemma.to_string(),
                    upos: upos.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_conllu_sentences_and_words() {
        let sentences = parse_conllu(SAMPLE_CONLLU);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].words.len(), 4);
        assert_eq!(sentences[0].words[0].text, "Gallia");
        assert_eq!(sentences[0].words[1].lemma, "sum");
        assert_eq!(sentences[0].words[3].upos, "VERB");
    }

    #[test]
    fn test_parse_conllu_skips_multiword_ranges() {
        let sentences = parse_conllu(SAMPLE_CONLLU);
        // The "1-2 armaque" range line is skipped, its parts are kept
        let forms: Vec<&str> = sentences[1].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(forms, vec!["arma", "que", ",", "XII"]);
    }

    #[test]
    fn test_extract_triples_filters_nonwords() {
        let sentences = parse_conllu(SAMPLE_CONLLU);
        let triples = extract_triples(&sentences, false);
        // PUNCT and NUM are dropped, everything else kept and lowercased
        let lemmas: Vec<&str> = triples.iter().map(|t| t.lemma.as_str()).collect();
        assert_eq!(
            lemmas,
            vec!["gallia", "sum", "omnis", "divido", "armum", "que"]
        );
        assert_eq!(triples[0].token, "gallia");
        assert_eq!(triples[0].pos, PartOfSpeech::Propn);
    }

    #[test]
    fn test_extract_triples_drops_stopwords() {
        let sentences = parse_conllu(SAMPLE_CONLLU);
        let triples = extract_triples(&sentences, true);
        let lemmas: Vec<&str> = triples.iter().map(|t| t.lemma.as_str()).collect();
        // "sum" is a stopword; "que" survives because it is not in the list
        assert_eq!(lemmas, vec!["gallia", "omnis", "divido", "armum", "que"]);
    }

    #[test]
    fn test_extract_triples_drops_bad_lemmas() {
        let sentences = vec![sentence(&[
            ("rēx", "rēx", "NOUN"),
            ("", "", "NOUN"),
            ("Dr.", "dr.", "NOUN"),
            ("word", "wo3rd", "NOUN"),
            ("странно", "странно", "NOUN"),
        ])];
        let triples = extract_triples(&sentences, false);
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].lemma, "rēx");
    }

    #[test]
    fn test_extract_triples_drops_unrecognized_pos() {
        let sentences = vec![sentence(&[
            ("bellum", "bellum", "NOUN"),
            ("bellum", "bellum", "BOGUS"),
            ("bellum", "bellum", "X"),
        ])];
        let triples = extract_triples(&sentences, false);
        assert_eq!(triples.len(), 1);
    }
}

//! Headword dictionary resolver.
//!
//! The dictionary is a directory of per-letter JSON files ("ls_A.json",
//! "ls_B.json", ...), each a list of entries with a `key`, a `senses` list
//! (strings, possibly nested one level), optional free-text `main_notes`, and
//! an optional declension/conjugation tag. Partitions are small; each is
//! parsed whole on first use and cached for the rest of the run.
//!
//! "No match" is a normal outcome here, not an error. Only unreadable or
//! corrupt partition files abort the run.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// Standalone 1-4 digit numerals are internal cross-reference numbers.
static CROSSREF_NUMERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,4}\b").unwrap());

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Sense {
    Text(String),
    Group(Vec<Sense>),
    // Some entries carry non-string sense material; it never qualifies.
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LexiconEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub senses: Vec<Sense>,
    #[serde(default)]
    pub main_notes: Option<String>,
    #[serde(default)]
    pub declension: Option<String>,
}

/// A successful lookup: a usable definition plus the entry's
/// declension/conjugation tag, when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gloss {
    pub definition: String,
    pub declension: Option<String>,
}

pub struct Lexicon {
    dir: PathBuf,
    // letter -> parsed entries; None caches "no partition file for this letter"
    partitions: HashMap<char, Option<Vec<LexiconEntry>>>,
}

impl Lexicon {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            partitions: HashMap::new(),
        }
    }

    /// Look a lemma up in the headword dictionary.
    ///
    /// Pure with respect to the dictionary contents: the same lemma always
    /// yields the same gloss. Returns `Ok(None)` when the partition file does
    /// not exist, no key matches, or the matched entry has no usable text.
    pub fn lookup(&mut self, lemma: &str) -> Result<Option<Gloss>> {
        let norm = normalize_key(lemma);
        let Some(letter) = norm.chars().next() else {
            return Ok(None);
        };
        let letter = letter.to_ascii_uppercase();

        if !self.partitions.contains_key(&letter) {
            let loaded = self.load_partition(letter)?;
            self.partitions.insert(letter, loaded);
        }
        let Some(entries) = self.partitions[&letter].as_ref() else {
            return Ok(None);
        };

        for entry in entries {
            let key = entry.key.to_lowercase();
            // Keys disambiguate homographs with numeric suffixes ("do1",
            // "do2"); a bare query matches either.
            if norm != key && key.trim_end_matches(|c: char| c.is_ascii_digit()) != norm {
                continue;
            }
            if let Some(text) = first_usable_sense(&entry.senses) {
                return Ok(Some(Gloss {
                    definition: clean_definition(text),
                    declension: entry.declension.clone(),
                }));
            }
            if let Some(notes) = entry.main_notes.as_deref()
                && !notes.is_empty()
            {
                return Ok(Some(Gloss {
                    definition: clean_definition(notes),
                    declension: entry.declension.clone(),
                }));
            }
            // An entry matched but had no usable text
            return Ok(None);
        }
        Ok(None)
    }

    fn load_partition(&self, letter: char) -> Result<Option<Vec<LexiconEntry>>> {
        let path = self.dir.join(format!("ls_{letter}.json"));
        if !path.exists() {
            log::debug!("no dictionary partition for letter {letter}");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read dictionary partition {}", path.display()))?;
        let entries: Vec<LexiconEntry> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dictionary partition {}", path.display()))?;
        log::debug!("loaded {} entries from partition {letter}", entries.len());
        Ok(Some(entries))
    }
}

/// Fold a lemma to the dictionary's key alphabet: NFKD-decompose, drop
/// whatever is not ASCII (macron combining marks, digraphs), lower-case.
pub fn normalize_key(lemma: &str) -> String {
    lemma
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
}

/// First sense string, at the top level or one level down, whose length is
/// strictly between 5 and 300 characters.
fn first_usable_sense(senses: &[Sense]) -> Option<&str> {
    for sense in senses {
        match sense {
            Sense::Text(s) if usable_length(s) => return Some(s),
            Sense::Group(group) => {
                for sub in group {
                    if let Sense::Text(s) = sub
                        && usable_length(s)
                    {
                        return Some(s);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn usable_length(s: &str) -> bool {
    let len = s.chars().count();
    len > 5 && len < 300
}

fn clean_definition(s: &str) -> String {
    CROSSREF_NUMERAL.replace_all(s, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lexicon_with(partitions: &[(&str, &str)]) -> (TempDir, Lexicon) {
        let dir = TempDir::new().unwrap();
        for (letter, json) in partitions {
            std::fs::write(dir.path().join(format!("ls_{letter}.json")), json).unwrap();
        }
        let lexicon = Lexicon::new(dir.path().to_path_buf());
        (dir, lexicon)
    }

    #[test]
    fn test_exact_key_match() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "S",
            r#"[{"key": "silva", "senses": ["a wood, forest"], "declension": "1st"}]"#,
        )]);
        let gloss = lexicon.lookup("silva").unwrap().unwrap();
        assert_eq!(gloss.definition, "a wood, forest");
        assert_eq!(gloss.declension.as_deref(), Some("1st"));
    }

    #[test]
    fn test_numeric_suffix_key_match() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "D",
            r#"[{"key": "do1", "senses": ["to give, bestow"], "declension": "1st conj."}]"#,
        )]);
        let gloss = lexicon.lookup("do").unwrap().unwrap();
        assert_eq!(gloss.definition, "to give, bestow");
    }

    #[test]
    fn test_diacritics_normalized_before_lookup() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "A",
            r#"[{"key": "actus", "senses": ["a driving, impulse"]}]"#,
        )]);
        // Macron decomposes under NFKD; the combining mark is dropped
        let gloss = lexicon.lookup("āctus").unwrap().unwrap();
        assert_eq!(gloss.definition, "a driving, impulse");
        assert_eq!(gloss.declension, None);
    }

    #[test]
    fn test_missing_partition_is_no_match() {
        let (_dir, mut lexicon) = lexicon_with(&[]);
        assert_eq!(lexicon.lookup("silva").unwrap(), None);
    }

    #[test]
    fn test_sense_length_bounds_are_exclusive() {
        let five = "x".repeat(5);
        let six = "x".repeat(6);
        let (_dir, mut lexicon) = lexicon_with(&[(
            "A",
            &format!(r#"[{{"key": "abc", "senses": ["{five}", "{six}"]}}]"#),
        )]);
        // Length 5 is rejected, 6 is the first qualifying sense
        assert_eq!(lexicon.lookup("abc").unwrap().unwrap().definition, six);

        let len_299 = "y".repeat(299);
        let len_300 = "z".repeat(300);
        let (_dir2, mut lexicon) = lexicon_with(&[(
            "B",
            &format!(r#"[{{"key": "bcd", "senses": ["{len_300}", "{len_299}"]}}]"#),
        )]);
        assert_eq!(lexicon.lookup("bcd").unwrap().unwrap().definition, len_299);
    }

    #[test]
    fn test_nested_senses() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "T",
            r#"[{"key": "terra", "senses": [["ab", ["too deep"], "the earth, land"], "a country"]}]"#,
        )]);
        // "ab" is too short; the depth-2 list never qualifies; the first
        // usable string one level down wins over the later top-level one
        let gloss = lexicon.lookup("terra").unwrap().unwrap();
        assert_eq!(gloss.definition, "the earth, land");
    }

    #[test]
    fn test_main_notes_fallback() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "V",
            r#"[{"key": "vir", "senses": ["man"], "main_notes": "a man, as opposed to a woman"}]"#,
        )]);
        // The only sense is too short, so the notes field is used
        let gloss = lexicon.lookup("vir").unwrap().unwrap();
        assert_eq!(gloss.definition, "a man, as opposed to a woman");
    }

    #[test]
    fn test_entry_with_no_usable_text() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "Q",
            r#"[{"key": "qua", "senses": ["tiny"], "main_notes": ""}]"#,
        )]);
        assert_eq!(lexicon.lookup("qua").unwrap(), None);
    }

    #[test]
    fn test_crossref_numerals_stripped() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "C",
            r#"[{"key": "castra", "senses": ["a camp, cf. 123 below"]}]"#,
        )]);
        let gloss = lexicon.lookup("castra").unwrap().unwrap();
        assert_eq!(gloss.definition, "a camp, cf.  below");
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "D",
            r#"[{"key": "do1", "senses": ["to give, bestow"]},
                {"key": "do2", "senses": ["second homograph"]}]"#,
        )]);
        assert_eq!(
            lexicon.lookup("do").unwrap().unwrap().definition,
            "to give, bestow"
        );
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let (_dir, mut lexicon) = lexicon_with(&[(
            "S",
            r#"[{"key": "silva", "senses": ["a wood, forest"], "declension": "1st"}]"#,
        )]);
        let first = lexicon.lookup("silva").unwrap();
        let second = lexicon.lookup("silva").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_partition_is_fatal() {
        let (_dir, mut lexicon) = lexicon_with(&[("S", "not json at all")]);
        assert!(lexicon.lookup("silva").is_err());
    }

    #[test]
    fn test_empty_lemma_is_no_match() {
        let (_dir, mut lexicon) = lexicon_with(&[]);
        assert_eq!(lexicon.lookup("").unwrap(), None);
        // A lemma that normalizes to nothing behaves the same
        assert_eq!(lexicon.lookup("\u{0304}").unwrap(), None);
    }
}

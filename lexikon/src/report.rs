//! Report building: merges the frequency tables with dictionary resolution
//! into the resolved, missing, and hapax datasets, and writes them as CSV.

use crate::annotate::TokenTriple;
use crate::frequencies::{FrequencyTables, LemmaPos};
use crate::lexicon::{Gloss, Lexicon};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use latin_utils::{PartOfSpeech, simplify::simplify_lemma};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Placeholder definition for items the dictionary could not resolve.
pub const DEF_NOT_FOUND: &str = "not found";

/// Case-ending suffixes tried when a NOUN/ADJ lemma has no direct match.
/// The order is load-bearing: the first suffix that yields a resolvable stem
/// decides which definition wins. Do not reorder.
const FALLBACK_SUFFIXES: [&str; 8] = ["ae", "am", "as", "is", "os", "orum", "um", "a"];

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub token: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub freq: u32,
    pub declension: String,
    pub definition: String,
}

#[derive(Debug, Clone)]
pub struct MissingRow {
    pub token: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub freq: u32,
}

#[derive(Debug, Default)]
pub struct Reports {
    /// The main report: every thresholded item, unresolved ones carrying the
    /// `DEF_NOT_FOUND` sentinel. Sorted by descending frequency.
    pub resolved: Vec<ReportRow>,
    /// Thresholded items with no definition even after fallback.
    /// Sorted by descending frequency.
    pub missing: Vec<MissingRow>,
    /// One row per corpus occurrence of a simplified lemma seen exactly once,
    /// in encounter order.
    pub hapax: Vec<ReportRow>,
}

/// Direct lookup, then the fixed suffix-stripping chain for nouns and
/// adjectives. Stops at the first success.
fn resolve_with_fallback(
    lexicon: &mut Lexicon,
    lemma: &str,
    pos: PartOfSpeech,
) -> Result<Option<Gloss>> {
    if let Some(gloss) = lexicon.lookup(lemma)? {
        return Ok(Some(gloss));
    }
    if !matches!(pos, PartOfSpeech::Noun | PartOfSpeech::Adj) {
        return Ok(None);
    }
    for suffix in FALLBACK_SUFFIXES {
        // Guard against truncating very short stems into nonsense
        if lemma.chars().count() <= suffix.len() + 2 {
            continue;
        }
        if let Some(stem) = lemma.strip_suffix(suffix)
            && let Some(gloss) = lexicon.lookup(stem)?
        {
            return Ok(Some(gloss));
        }
    }
    Ok(None)
}

pub fn build_reports(
    triples: &[TokenTriple],
    tables: &FrequencyTables,
    lexicon: &mut Lexicon,
    min_freq: u32,
) -> Result<Reports> {
    let mut reports = Reports::default();

    let items: Vec<(&LemmaPos, u32)> = tables
        .by_lemma_pos
        .iter()
        .filter(|&(_, &count)| count >= min_freq)
        .map(|(key, &count)| (key, count))
        .collect();

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lemmas ({per_sec}, {eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    for (key, count) in items {
        pb.inc(1);
        let token = tables
            .representative_surface(key)
            .unwrap_or(key.lemma.as_str())
            .to_string();
        let gloss = resolve_with_fallback(lexicon, &key.lemma, key.pos)?;
        let (definition, declension) = match gloss {
            Some(gloss) => (gloss.definition, gloss.declension),
            None => {
                reports.missing.push(MissingRow {
                    token: token.clone(),
                    lemma: key.lemma.clone(),
                    pos: key.pos,
                    freq: count,
                });
                (DEF_NOT_FOUND.to_string(), None)
            }
        };
        reports.resolved.push(ReportRow {
            token,
            lemma: key.lemma.clone(),
            pos: key.pos,
            freq: count,
            declension: declension.unwrap_or_else(|| "-".to_string()),
            definition,
        });
    }
    pb.finish();

    reports.resolved.sort_by_key(|row| Reverse(row.freq));
    reports.missing.sort_by_key(|row| Reverse(row.freq));

    // Hapax legomena: simplified lemmas with a corpus-wide total of exactly
    // one occurrence, regardless of the threshold and of POS. Direct lookup
    // only, no suffix fallback.
    let hapax_lemmas: HashSet<&str> = tables
        .simplified
        .iter()
        .filter(|&(_, &count)| count == 1)
        .map(|(lemma, _)| lemma.as_str())
        .collect();

    for triple in triples {
        if !hapax_lemmas.contains(simplify_lemma(&triple.lemma, triple.pos).as_str()) {
            continue;
        }
        let gloss = lexicon.lookup(&triple.lemma)?;
        let (definition, declension) = match gloss {
            Some(gloss) => (gloss.definition, gloss.declension),
            None => (DEF_NOT_FOUND.to_string(), None),
        };
        reports.hapax.push(ReportRow {
            token: triple.token.clone(),
            lemma: triple.lemma.clone(),
            pos: triple.pos,
            freq: 1,
            declension: declension.unwrap_or_else(|| "-".to_string()),
            definition,
        });
    }

    Ok(reports)
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_csv(path: &Path, header: &str, rows: &[Vec<String>]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}")?;
    for row in rows {
        let line = row
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_main_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    write_csv(
        path,
        "Token,Lemma,POS,Freq,Declension,Definition",
        &rows
            .iter()
            .map(|row| {
                vec![
                    row.token.clone(),
                    row.lemma.clone(),
                    row.pos.as_tag().to_string(),
                    row.freq.to_string(),
                    row.declension.clone(),
                    row.definition.clone(),
                ]
            })
            .collect::<Vec<_>>(),
    )
}

pub fn write_missing_report(path: &Path, rows: &[MissingRow]) -> Result<()> {
    write_csv(
        path,
        "Token,Lemma,POS,Freq",
        &rows
            .iter()
            .map(|row| {
                vec![
                    row.token.clone(),
                    row.lemma.clone(),
                    row.pos.as_tag().to_string(),
                    row.freq.to_string(),
                ]
            })
            .collect::<Vec<_>>(),
    )
}

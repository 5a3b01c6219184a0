//! Frequency aggregation over the token-triple stream.
//!
//! Three tables come out of a single ordered pass (plus one gated pass for
//! surface forms): per-(lemma, POS) counts, POS-agnostic simplified-lemma
//! counts used for hapax detection, and per-surface counts used to pick a
//! representative surface form. `IndexMap` keeps first-seen order, which is
//! what makes the representative tie-break deterministic.

use crate::annotate::TokenTriple;
use indexmap::IndexMap;
use latin_utils::{PartOfSpeech, simplify::simplify_lemma};

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct LemmaPos {
    pub lemma: String,
    pub pos: PartOfSpeech,
}

#[derive(Debug, Default)]
pub struct FrequencyTables {
    /// Every triple counted by (lemma, POS).
    pub by_lemma_pos: IndexMap<LemmaPos, u32>,
    /// Every triple counted by simplified lemma, across POS boundaries.
    /// Never gated by the frequency threshold.
    pub simplified: IndexMap<String, u32>,
    /// Surface-form counts, populated only for keys meeting the threshold.
    pub surface_counts: IndexMap<LemmaPos, IndexMap<String, u32>>,
}

impl FrequencyTables {
    pub fn build(triples: &[TokenTriple], min_freq: u32) -> Self {
        let mut tables = FrequencyTables::default();

        for triple in triples {
            let key = LemmaPos {
                lemma: triple.lemma.clone(),
                pos: triple.pos,
            };
            *tables.by_lemma_pos.entry(key).or_insert(0) += 1;
            *tables
                .simplified
                .entry(simplify_lemma(&triple.lemma, triple.pos))
                .or_insert(0) += 1;
        }

        // Below-threshold keys never need a representative surface form,
        // so only gated keys get a surface table.
        for triple in triples {
            let key = LemmaPos {
                lemma: triple.lemma.clone(),
                pos: triple.pos,
            };
            if tables.by_lemma_pos.get(&key).copied().unwrap_or(0) >= min_freq {
                *tables
                    .surface_counts
                    .entry(key)
                    .or_default()
                    .entry(triple.token.clone())
                    .or_insert(0) += 1;
            }
        }

        tables
    }

    /// The surface form seen most often for this key; ties go to the form
    /// encountered first.
    pub fn representative_surface(&self, key: &LemmaPos) -> Option<&str> {
        let counts = self.surface_counts.get(key)?;
        let mut best: Option<(&str, u32)> = None;
        for (surface, &count) in counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((surface, count)),
            }
        }
        best.map(|(surface, _)| surface)
    }
}

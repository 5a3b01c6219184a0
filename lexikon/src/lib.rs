pub mod annotate;
pub mod frequencies;
pub mod lexicon;
pub mod report;
pub mod translate;

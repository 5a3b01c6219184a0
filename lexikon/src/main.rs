use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;

use lexikon::annotate::{AnnotatorClient, DEFAULT_ANNOTATOR_MODEL, DEFAULT_ANNOTATOR_URL, extract_triples};
use lexikon::frequencies::FrequencyTables;
use lexikon::lexicon::Lexicon;
use lexikon::report::{self, DEF_NOT_FOUND, write_main_report, write_missing_report};
use lexikon::translate::DefinitionTranslator;

/// Lemma frequency dictionary for a Latin corpus, with definitions,
/// declension/conjugation classes, and a separate hapax legomena report.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Remove Latin stopwords from all reports
    #[arg(long)]
    no_stopwords: bool,

    /// Minimum frequency for inclusion in the main report
    /// (hapax reporting is unaffected)
    #[arg(long, default_value_t = 5)]
    minfreq: u32,

    /// Translate resolved definitions via the OpenAI API, with on-disk caching
    #[arg(long)]
    translate: bool,

    /// Corpus text file
    #[arg(long, default_value = "de_bello_gallico.txt")]
    input: PathBuf,

    /// Directory holding the per-letter headword dictionary files
    #[arg(long, default_value = "lewis-short-json")]
    lexicon_dir: PathBuf,

    /// UDPipe-compatible annotation endpoint
    #[arg(long, default_value = DEFAULT_ANNOTATOR_URL)]
    annotator_url: String,

    /// Directory to write the CSV reports into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read corpus {}", args.input.display()))?;
    let text = latin_utils::text_cleanup::scrub_corpus(&raw);

    println!("Analyzing text...");
    let annotator = AnnotatorClient::new(args.annotator_url, DEFAULT_ANNOTATOR_MODEL.to_string());
    let sentences = annotator.annotate(&text).await?;
    println!(
        "Analysis complete: {} sentences.",
        sentences.len()
    );

    let triples = extract_triples(&sentences, args.no_stopwords);
    log::info!("{} valid token occurrences", triples.len());

    let tables = FrequencyTables::build(&triples, args.minfreq);

    println!("Resolving definitions...");
    let mut lexicon = Lexicon::new(args.lexicon_dir.clone());
    let mut reports = report::build_reports(&triples, &tables, &mut lexicon, args.minfreq)?;

    if args.translate {
        println!("Translating definitions...");
        let translator = DefinitionTranslator::new(PathBuf::from(".cache/translations/"))?;
        let translations = futures::stream::iter(
            reports
                .resolved
                .iter()
                .enumerate()
                .filter(|(_, row)| row.definition != DEF_NOT_FOUND)
                .map(|(index, row)| {
                    let translator = &translator;
                    let definition = row.definition.clone();
                    async move {
                        let translated = match translator.translate(&definition).await {
                            Ok(t) => t,
                            Err(e) => {
                                eprintln!("Error translating definition '{definition}': {e}");
                                format!("{definition} [translation failed]")
                            }
                        };
                        (index, translated)
                    }
                }),
        )
        .buffered(8)
        .collect::<Vec<_>>()
        .await;

        // Drop the translator to consolidate its cache to disk
        drop(translator);

        for (index, translated) in translations {
            reports.resolved[index].definition = translated;
        }
    }

    std::fs::create_dir_all(&args.out_dir)?;
    let suffix = if args.no_stopwords { "_nostop" } else { "" };

    let main_path = args.out_dir.join(format!("lemma_definitions{suffix}.csv"));
    write_main_report(&main_path, &reports.resolved)?;
    println!("Main report: {} rows -> {}", reports.resolved.len(), main_path.display());

    if !reports.missing.is_empty() {
        let missing_path = args.out_dir.join(format!("missing_definitions{suffix}.csv"));
        write_missing_report(&missing_path, &reports.missing)?;
        println!(
            "{}/{} without a definition after fallback -> {}",
            reports.missing.len(),
            reports.resolved.len(),
            missing_path.display()
        );
    }

    if !reports.hapax.is_empty() {
        let hapax_path = args.out_dir.join(format!("hapax_legomena{suffix}.csv"));
        write_main_report(&hapax_path, &reports.hapax)?;
        println!(
            "{} hapax legomena -> {}",
            reports.hapax.len(),
            hapax_path.display()
        );
    }

    println!("Done.");
    Ok(())
}

//! ARCA CLI - Command-line interface
//!
//! Usage:
//!   arca convert <sources>... --out catalogo.csv
//!   arca enrich --input catalogo.csv --thesaurus tesauro.json --out enriquecido.csv
//!   arca graph --input enriquecido.csv --out grafo.ttl
//!   arca pipeline <sources>... --thesaurus tesauro.json --out-csv enriquecido.csv --out-ttl grafo.ttl

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arca_core::{AppConfig, CatalogRecord, EnrichedRecord, InferenceProvider};
use arca_enrich::{Enricher, ThesaurusIndex};
use arca_ingest::{combine_catalogs, SourceSpec};

#[derive(Parser)]
#[command(name = "arca")]
#[command(about = "Archival catalog standardization and enrichment")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine catalog sources into one standardized CSV with normalized dates
    Convert {
        /// Source files (.xlsx, .xls, .csv)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Worksheet name to read from each workbook (first sheet if omitted)
        #[arg(long)]
        sheet: Option<String>,

        /// Output CSV path
        #[arg(long, default_value = "catalogo_estandarizado.csv")]
        out: PathBuf,
    },
    /// Enrich a standardized catalog with keywords, categories, and URIs
    Enrich {
        /// Standardized catalog CSV
        #[arg(long)]
        input: PathBuf,

        /// Controlled vocabulary JSON (overrides configuration)
        #[arg(long)]
        thesaurus: Option<PathBuf>,

        /// Output CSV path
        #[arg(long, default_value = "catalogo_enriquecido.csv")]
        out: PathBuf,
    },
    /// Build the document-entity Turtle graph from an enriched catalog
    Graph {
        /// Enriched catalog CSV
        #[arg(long)]
        input: PathBuf,

        /// Output Turtle path
        #[arg(long, default_value = "catalogo_grafo.ttl")]
        out: PathBuf,
    },
    /// Run convert, enrich, and graph in one pass
    Pipeline {
        /// Source files (.xlsx, .xls, .csv)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Worksheet name to read from each workbook
        #[arg(long)]
        sheet: Option<String>,

        /// Controlled vocabulary JSON (overrides configuration)
        #[arg(long)]
        thesaurus: Option<PathBuf>,

        /// Output CSV path
        #[arg(long, default_value = "catalogo_enriquecido.csv")]
        out_csv: PathBuf,

        /// Output Turtle path
        #[arg(long, default_value = "catalogo_grafo.ttl")]
        out_ttl: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_thesaurus(config: &AppConfig, override_path: Option<&Path>) -> anyhow::Result<ThesaurusIndex> {
    let path = override_path.or(config.thesaurus.path.as_deref());

    match path {
        Some(path) => {
            let index = ThesaurusIndex::load(path, &config.thesaurus.language)
                .with_context(|| format!("loading thesaurus {}", path.display()))?;
            info!(labels = index.len(), path = %path.display(), "thesaurus loaded");
            Ok(index)
        }
        None => {
            warn!("no thesaurus configured; lugar/evento mentions will stay unresolved");
            Ok(ThesaurusIndex::default())
        }
    }
}

fn source_specs(sources: &[PathBuf], sheet: Option<&str>) -> Vec<SourceSpec> {
    sources
        .iter()
        .map(|path| {
            let spec = SourceSpec::new(path);
            match sheet {
                Some(name) => spec.with_sheet(name),
                None => spec,
            }
        })
        .collect()
}

async fn load_records(
    sources: &[PathBuf],
    sheet: Option<&str>,
    enricher: &Enricher<impl InferenceProvider>,
) -> anyhow::Result<Vec<CatalogRecord>> {
    let table = combine_catalogs(&source_specs(sources, sheet))?;
    let mut records = arca_ingest::to_records(&table);
    info!(records = records.len(), "catalog combined");

    let normalized = enricher.normalize_dates(&mut records).await;
    info!(normalized, "dates normalized");

    Ok(records)
}

async fn enrich_records(
    records: Vec<CatalogRecord>,
    enricher: &Enricher<impl InferenceProvider>,
) -> Vec<EnrichedRecord> {
    let (enriched, summary) = enricher.enrich_all(records).await;
    info!(
        records = summary.records,
        with_keywords = summary.with_keywords,
        with_uris = summary.with_uris,
        extraction_failures = summary.extraction_failures,
        "enrichment finished"
    );
    println!(
        "Registros con al menos una keyword: {} de {} ({} con URI)",
        summary.with_keywords, summary.records, summary.with_uris
    );
    enriched
}

fn write_graph(enriched: &[EnrichedRecord], config: &AppConfig, out: &Path) -> anyhow::Result<()> {
    let graph = arca_graph::assemble(enriched, &config.pipeline);
    arca_graph::turtle::write_turtle(&graph, out)?;
    info!(triples = graph.triple_count(), path = %out.display(), "graph written");
    println!("Grafo guardado en {} con {} triples", out.display(), graph.triple_count());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Convert { sources, sheet, out } => {
            let provider = arca_llm::create_provider(&config.llm)?;
            let enricher = Enricher::new(
                provider,
                ThesaurusIndex::default(),
                config.pipeline.clone(),
            );

            let records = load_records(&sources, sheet.as_deref(), &enricher).await?;
            let table = arca_ingest::records_to_table(&records);
            arca_ingest::csv_io::write_table(&out, &table)?;
            println!("Catálogo estandarizado guardado en {}", out.display());
        }

        Commands::Enrich {
            input,
            thesaurus,
            out,
        } => {
            let provider = arca_llm::create_provider(&config.llm)?;
            let index = load_thesaurus(&config, thesaurus.as_deref())?;
            let enricher = Enricher::new(provider, index, config.pipeline.clone());

            let table = arca_ingest::csv_io::read_table(&input)?;
            let records = arca_ingest::to_records(&table);
            let enriched = enrich_records(records, &enricher).await;

            let table = arca_ingest::enriched_to_table(&enriched);
            arca_ingest::csv_io::write_table(&out, &table)?;
            println!("Catálogo enriquecido guardado en {}", out.display());
        }

        Commands::Graph { input, out } => {
            let table = arca_ingest::csv_io::read_table(&input)?;
            let enriched = arca_ingest::to_enriched_records(&table);
            write_graph(&enriched, &config, &out)?;
        }

        Commands::Pipeline {
            sources,
            sheet,
            thesaurus,
            out_csv,
            out_ttl,
        } => {
            let provider = arca_llm::create_provider(&config.llm)?;
            let index = load_thesaurus(&config, thesaurus.as_deref())?;
            let enricher = Enricher::new(provider, index, config.pipeline.clone());

            let records = load_records(&sources, sheet.as_deref(), &enricher).await?;
            let enriched = enrich_records(records, &enricher).await;

            let table = arca_ingest::enriched_to_table(&enriched);
            arca_ingest::csv_io::write_table(&out_csv, &table)?;
            println!("Catálogo enriquecido guardado en {}", out_csv.display());

            write_graph(&enriched, &config, &out_ttl)?;
        }
    }

    Ok(())
}

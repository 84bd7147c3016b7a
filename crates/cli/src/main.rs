use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cli::dataset::Dataset;
use cli::encoder::HashEncoder;
use cli::eval::{RetrievalMetrics, evaluate, overlap_at_k};
use console::style;
use core_types::config::{AppConfig, load_config};
use core_types::{DocId, SearchMode};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use semantic_index::MultiVectorIndex;
use serde::Serialize;

/// Multi-vector MaxSim index: demo and retrieval evaluation.
#[derive(Parser, Debug)]
#[command(name = "multivec", version, about = "Multi-vector late-interaction search")]
struct Cli {
    /// Config file (TOML). Environment overrides still apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index two short documents and search them in both modes.
    Demo {},
    /// Evaluate Recall@k and MRR on a BEIR-style dataset directory.
    Eval {
        /// Directory holding corpus.jsonl, queries.jsonl and qrels/.
        #[arg(long)]
        data_dir: PathBuf,
        /// Qrels split to score against.
        #[arg(long, default_value = "dev")]
        split: String,
        #[arg(short, long, default_value_t = 100)]
        k: usize,
        #[arg(long)]
        max_docs: Option<usize>,
        #[arg(long)]
        max_queries: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Both)]
        mode: ModeArg,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Exact,
    Approximate,
    Both,
}

impl ModeArg {
    fn modes(self) -> &'static [SearchMode] {
        match self {
            Self::Exact => &[SearchMode::Exact],
            Self::Approximate => &[SearchMode::Approximate],
            Self::Both => &[SearchMode::Exact, SearchMode::Approximate],
        }
    }
}

struct EvalArgs {
    data_dir: PathBuf,
    split: String,
    k: usize,
    max_docs: Option<usize>,
    max_queries: Option<usize>,
    mode: ModeArg,
    json: bool,
}

fn main() -> Result<()> {
    let opts = Cli::parse();
    let cfg = load_config(opts.config.as_deref())?;
    let _guard = cli::init_tracing_with_config(&cfg.logging)?;
    tracing::debug!(version = cli::VERSION, ?cfg, "starting");

    match opts.command {
        Commands::Demo {} => run_demo(&cfg),
        Commands::Eval {
            data_dir,
            split,
            k,
            max_docs,
            max_queries,
            mode,
            json,
        } => run_eval(
            &cfg,
            &EvalArgs {
                data_dir,
                split,
                k,
                max_docs,
                max_queries,
                mode,
                json,
            },
        ),
    }
}

fn run_demo(cfg: &AppConfig) -> Result<()> {
    let index = MultiVectorIndex::from_config(&cfg.index, &cfg.hnsw)?;
    let encoder = HashEncoder::new(cfg.index.dim);

    let docs = [
        ("doc1", "What is Python programming?"),
        ("doc2", "How to learn machine learning?"),
    ];
    for (doc_id, text) in docs {
        index.add_document(doc_id, &encoder.encode(text))?;
        println!("{} {doc_id}: {text}", style("indexed").green());
    }

    let query_text = "Python programming tutorial";
    let query = encoder.encode(query_text);
    println!("\n{} {query_text}", style("Query:").cyan().bold());

    for mode in [SearchMode::Exact, SearchMode::Approximate] {
        let hits = index.search(&query, 2, mode, None)?;
        println!("{}", style(format!("{mode:?} results:")).bold());
        for hit in hits {
            println!("  {}: {:.4}", hit.doc_id, hit.score);
        }
    }

    let stats = index.stats();
    println!(
        "\n{} {} docs, {} vectors, {:.2} vectors/doc, dim {}, backend {}",
        style("Index stats:").cyan(),
        stats.num_documents,
        stats.num_vectors,
        stats.avg_vectors_per_doc,
        stats.dim,
        stats.index_type
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct ModeReport {
    mode: SearchMode,
    #[serde(flatten)]
    metrics: RetrievalMetrics,
    search_secs: f64,
}

#[derive(Debug, Serialize)]
struct EvalReport {
    num_documents: usize,
    num_vectors: usize,
    backend: String,
    index_secs: f64,
    modes: Vec<ModeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approximate_overlap: Option<f64>,
}

fn progress(len: usize, label: &'static str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(label);
    pb
}

fn run_eval(cfg: &AppConfig, args: &EvalArgs) -> Result<()> {
    let mut dataset = load_dataset(&args.data_dir, &args.split)?;
    if let Some(n) = args.max_docs {
        dataset.truncate_corpus(n);
    }
    if let Some(n) = args.max_queries {
        dataset.truncate_queries(n);
    }

    let encoder = HashEncoder::new(cfg.index.dim);
    let index = MultiVectorIndex::from_config(&cfg.index, &cfg.hnsw)?;

    let started = Instant::now();
    let pb = progress(dataset.corpus.len(), "indexing", args.json);
    for (doc_id, text) in &dataset.corpus {
        index.add_document(DocId::from(doc_id.as_str()), &encoder.encode(text))?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    let index_time = started.elapsed();
    let stats = index.stats();
    tracing::info!(
        docs = stats.num_documents,
        vectors = stats.num_vectors,
        secs = index_time.as_secs_f64(),
        "index built"
    );

    let encoded: Vec<(&String, Vec<Vec<f32>>)> = dataset
        .queries
        .iter()
        .map(|(id, text)| (id, encoder.encode(text)))
        .collect();

    let mut modes = Vec::new();
    let mut runs: Vec<IndexMap<String, Vec<String>>> = Vec::new();
    for &mode in args.mode.modes() {
        let (results, elapsed) = search_all(&index, &encoded, args.k, mode, args.json)?;
        modes.push(ModeReport {
            mode,
            metrics: evaluate(&results, &dataset.qrels, args.k),
            search_secs: elapsed.as_secs_f64(),
        });
        runs.push(results);
    }
    let approximate_overlap = match runs.as_slice() {
        [exact, approximate] => Some(overlap_at_k(exact, approximate, args.k)),
        _ => None,
    };

    let report = EvalReport {
        num_documents: stats.num_documents,
        num_vectors: stats.num_vectors,
        backend: stats.index_type,
        index_secs: index_time.as_secs_f64(),
        modes,
        approximate_overlap,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn load_dataset(dir: &Path, split: &str) -> Result<Dataset> {
    Dataset::load(dir, split).with_context(|| format!("failed to load dataset from {}", dir.display()))
}

fn search_all(
    index: &MultiVectorIndex,
    queries: &[(&String, Vec<Vec<f32>>)],
    k: usize,
    mode: SearchMode,
    hidden: bool,
) -> Result<(IndexMap<String, Vec<String>>, Duration)> {
    let label = match mode {
        SearchMode::Exact => "exact",
        SearchMode::Approximate => "approx",
    };
    let pb = progress(queries.len(), label, hidden);
    let started = Instant::now();
    let mut results = IndexMap::with_capacity(queries.len());
    for (query_id, vectors) in queries {
        let hits = index.search(vectors, k, mode, None)?;
        let ids = hits.into_iter().map(|hit| hit.doc_id.0).collect();
        results.insert((*query_id).clone(), ids);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok((results, started.elapsed()))
}

fn print_report(report: &EvalReport) {
    println!(
        "{} {} docs, {} vectors ({} backend) in {:.2}s",
        style("Indexed").green().bold(),
        report.num_documents,
        report.num_vectors,
        report.backend,
        report.index_secs
    );
    for m in &report.modes {
        println!(
            "{:<12} Recall@{}: {:.4}  MRR: {:.4}  queries: {} ({} judged)  ({:.2}s)",
            style(format!("{:?}", m.mode)).cyan(),
            m.metrics.k,
            m.metrics.recall_at_k,
            m.metrics.mrr,
            m.metrics.num_queries,
            m.metrics.judged_queries,
            m.search_secs
        );
    }
    if let Some(overlap) = report.approximate_overlap {
        println!(
            "{} {:.4}",
            style("Approximate/exact top-k overlap:").yellow(),
            overlap
        );
    }
}

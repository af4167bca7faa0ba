use anyhow::Context;
use assetx_core::curator::{DEFAULT_MAX_ITEMS, DEFAULT_MAX_PER_TERM, DEFAULT_SEED};
use assetx_core::{
    CurationConfig, Curator, Engine, ImageSource, QueryNormalization, ResolverConfig,
    ScoredResult, Scorer, ScoringWeights,
};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Term-indexed retrieval and subset curation for 3D asset catalogs
#[derive(Parser, Debug)]
#[command(name = "assetx")]
#[command(about = "Search a 3D asset catalog and curate reproducible subsets", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a reduced catalog: top assets per term, capped, with every third screenshot
    Subset {
        /// Source catalog directory (metadata.csv + screenshots/)
        src: PathBuf,

        /// Destination directory
        dst: PathBuf,

        /// Seed of the shuffle applied when the keep-set exceeds --max-items
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Assets kept from the head of each term's ranking
        #[arg(long, default_value_t = DEFAULT_MAX_PER_TERM)]
        max_per_term: usize,

        /// Upper bound on the number of kept assets
        #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
        max_items: usize,

        /// Screenshot file extension
        #[arg(long, default_value = "png")]
        extension: String,
    },

    /// Rank catalog rows for a term and pick a representative image
    Query {
        /// Catalog directory
        datadir: PathBuf,

        /// Search term
        term: String,

        /// Number of top results to show with their images
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Seed for the representative image draw (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Trim surrounding whitespace from the term before scoring
        #[arg(long)]
        trim_query: bool,

        /// Screenshot file extension
        #[arg(long, default_value = "png")]
        extension: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Summarize the catalog's categories
    Categories {
        /// Catalog directory
        datadir: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct QueryHit {
    #[serde(flatten)]
    result: ScoredResult,
    images: Vec<PathBuf>,
}

#[derive(Serialize)]
struct QueryOutput {
    term: String,
    total: usize,
    results: Vec<QueryHit>,
    representative: Option<PathBuf>,
}

fn run_subset(
    src: PathBuf,
    dst: PathBuf,
    config: CurationConfig,
    extension: &str,
) -> anyhow::Result<()> {
    let engine = Engine::load(ResolverConfig::new(&src).with_extension(extension))
        .with_context(|| format!("loading catalog from {}", src.display()))?;
    let curation = Curator::new(&engine, config)?.run()?;

    let report = assetx_storage::export(
        &curation,
        config,
        engine.store().row_count(),
        &src,
        &dst,
    )?;

    if !curation.skipped.is_empty() {
        warn!("{} kept assets had no usable screenshots", curation.skipped.len());
    }
    info!(
        "Subset written to {}: {} rows, {} images ({} copy failures)",
        dst.display(),
        report.table_rows,
        report.images_copied,
        report.failures.len()
    );
    Ok(())
}

/// Representative image, `None` when the drawn asset's images are unavailable
fn representative_image<S: ImageSource, R: Rng>(
    engine: &Engine<S>,
    term: &str,
    rng: &mut R,
) -> anyhow::Result<Option<PathBuf>> {
    match engine.select_representative_image(term, rng) {
        Ok(image) => Ok(image),
        Err(e) if e.is_recoverable() => {
            warn!("No representative image for '{}': {}", term, e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_query(
    datadir: PathBuf,
    term: String,
    limit: usize,
    seed: Option<u64>,
    normalization: QueryNormalization,
    extension: &str,
    json: bool,
) -> anyhow::Result<()> {
    let engine = Engine::load(ResolverConfig::new(&datadir).with_extension(extension))
        .with_context(|| format!("loading catalog from {}", datadir.display()))?
        .with_scorer(Scorer::new(ScoringWeights::default(), normalization));

    let ranked = engine.ranked_results(&term);
    let total = ranked.len();
    let results: Vec<QueryHit> = ranked
        .into_iter()
        .take(limit)
        .map(|result| {
            let images = engine.images().images_for(&result.full_id).unwrap_or_else(|e| {
                warn!("No images for {}: {}", result.full_id, e);
                Vec::new()
            });
            QueryHit { result, images }
        })
        .collect();

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let representative = representative_image(&engine, &term, &mut rng)?;

    let output = QueryOutput { term, total, results, representative };
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("--TERM: {}", output.term);
    println!("matched rows: {}", output.total);
    for hit in &output.results {
        println!(
            "{:>8} {} (row {})",
            hit.result.score, hit.result.full_id, hit.result.row_index
        );
        for path in &hit.images {
            println!("  * {}", path.display());
        }
    }
    match &output.representative {
        Some(path) => println!("IMAGE: {}", path.display()),
        None => println!("IMAGE: none"),
    }
    Ok(())
}

fn run_categories(datadir: PathBuf, json: bool) -> anyhow::Result<()> {
    let store = assetx_core::TabularStore::open(&datadir)
        .with_context(|| format!("loading catalog from {}", datadir.display()))?;
    let summary = store.category_summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("--categories--");
    for category in &summary.categories {
        println!("{}", category);
    }
    println!("--other--\nrows without a category: {}", summary.missing);
    println!("--top_level--");
    for category in &summary.top_level {
        println!("{}", category);
    }
    println!("top level count {}", summary.top_level.len());
    println!(
        "unusual: {}",
        summary.unusual.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries query/category output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Subset { src, dst, seed, max_per_term, max_items, extension } => {
            let config = CurationConfig { max_per_term, max_items, seed };
            run_subset(src, dst, config, &extension)
        }
        Command::Query { datadir, term, limit, seed, trim_query, extension, json } => {
            let normalization = if trim_query {
                QueryNormalization::LowercaseTrim
            } else {
                QueryNormalization::LowercaseOnly
            };
            run_query(datadir, term, limit, seed, normalization, &extension, json)
        }
        Command::Categories { datadir, json } => run_categories(datadir, json),
    }
}

use clap::{ArgGroup, Parser};
use dotplot::loaders::{load_anchor_blocks, load_clusters, load_feature_table, load_gff, load_pairs};
use dotplot::{DotPlot, DotplotError, PlotStyle};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dotplot")]
#[command(about = "Draw a whole-genome triangular dot plot.", long_about = None)]
#[command(group(ArgGroup::new("coordinates").required(true).args(["genes", "gff"])))]
#[command(group(ArgGroup::new("relations").required(true).args(["pairs", "clusters"])))]
struct Args {
    // Coordinate Input
    /// Gene coordinates as a tab-separated table: chromosome, gene, start, stop.
    #[arg(short = 'g', long = "genes", value_name = "FILE")]
    genes: Option<PathBuf>,

    /// Gene coordinates from a GFF3 file.
    #[arg(long = "gff", value_name = "FILE")]
    gff: Option<PathBuf>,

    /// GFF3 feature type to keep.
    #[arg(long = "feature-type", value_name = "STRING", default_value = "gene")]
    feature_type: String,

    /// GFF3 attribute holding the gene id.
    #[arg(long = "attribute", value_name = "KEY", default_value = "ID")]
    attribute: String,

    // Relationship Input
    /// Gene pairs, two whitespace-separated ids per line.
    #[arg(short = 'p', long = "pairs", value_name = "FILE")]
    pairs: Option<PathBuf>,

    /// Gene clusters, one cluster per line; every pair within a cluster is plotted.
    #[arg(short = 'c', long = "clusters", value_name = "FILE")]
    clusters: Option<PathBuf>,

    /// Collinearity file with `## Alignment` blocks; its pairs are drawn as anchors.
    #[arg(short = 'a', long = "anchors", value_name = "FILE")]
    anchors: Option<PathBuf>,

    /// Ignore chromosomes/scaffolds not longer than N bp.
    #[arg(short = 'm', long = "min-length", value_name = "N", default_value_t = 0)]
    min_length: u64,

    // Output
    /// Write the plot to this FILE (SVG or a raster format based on extension).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Write pairs that could not be placed on the axis to this FILE (TSV).
    #[arg(short = 'U', long = "unresolved", value_name = "FILE")]
    unresolved: Option<PathBuf>,

    // Visualization Options
    /// Width in pixels of the output image.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 2000)]
    width: u32,

    /// Height in pixels of the output image (default: half the width).
    #[arg(short = 'y', long = "height", value_name = "N")]
    height: Option<u32>,

    /// Radius in pixels of a plotted point.
    #[arg(long = "point-size", value_name = "FLOAT", default_value_t = 1.0)]
    point_size: f64,

    /// Opacity of non-anchor points.
    #[arg(long = "alpha", value_name = "FLOAT", default_value_t = 0.2)]
    alpha: f64,

    /// Width in pixels of the chromosome boundary lines.
    #[arg(long = "line-width", value_name = "FLOAT", default_value_t = 1.0)]
    line_width: f64,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

impl Args {
    fn style(&self) -> PlotStyle {
        PlotStyle {
            width: self.width,
            height: self.height.unwrap_or((self.width / 2).max(1)),
            point_radius: self.point_size,
            alpha: self.alpha.clamp(0.0, 1.0),
            line_width: self.line_width,
            ..PlotStyle::default()
        }
    }
}

fn run(args: &Args) -> Result<(), DotplotError> {
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| DotplotError::ThreadPool(e.to_string()))?;
    }

    let features = match (&args.genes, &args.gff) {
        (Some(path), _) => load_feature_table(path)?,
        (None, Some(path)) => {
            let gff = load_gff(path, &args.feature_type, &args.attribute)?;
            if gff.missing_attribute > 0 {
                warn!(
                    "{} {} features have no {} attribute and were dropped",
                    gff.missing_attribute, args.feature_type, args.attribute
                );
            }
            gff.records
        }
        (None, None) => unreachable!("clap requires one coordinate input"),
    };

    let pairs = match (&args.pairs, &args.clusters) {
        (Some(path), _) => load_pairs(path)?,
        (None, Some(path)) => load_clusters(path)?,
        (None, None) => unreachable!("clap requires one relationship input"),
    };

    let anchors = args.anchors.as_deref().map(load_anchor_blocks).transpose()?;

    let plot = DotPlot::build(&features, &pairs, anchors.as_ref(), args.min_length)?;

    let summary = plot.hits.summary;
    info!("Hits: {}", summary);
    if summary.accepted == 0 {
        warn!("All relationships fall on filtered elements; the plot only shows the grid.");
    } else if summary.unresolved > 0 {
        warn!(
            "Went from {} to {} relationships, {} reference unknown or filtered genes",
            summary.total, summary.accepted, summary.unresolved
        );
    }

    if let Some(ref path) = args.unresolved {
        plot.hits.write_unresolved(path)?;
    }

    dotplot::write_plot(&plot.projection, &args.style(), &args.out)
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    info!("Starting dot plot...");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}

//! A command-line front end that renders each level of a Hi-C contact matrix
//! to a PNG file.
//!
//! ```shell
//! cargo run --release --bin=hicview --features=binaries -- \
//!     --dump contacts.txt.gz pair chr1 chr2 -o chr1-chr2.png
//! ```
//!
//! Contacts are served either from a contact dump on disk (`--dump`) or from
//! a running contact service (`--url`). Every request the viewer makes is
//! answered synchronously, so the images reflect exactly what an interactive
//! viewer would show once all of its fetches complete.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Args as ClapArgs;
use clap::Parser;
use clap::Subcommand;
use clap_verbosity_flag::Verbosity;
use hicmatrix::contact::Normalization;
use hicmatrix::dump;
use hicmatrix::genome::Locus;
use hicmatrix::overlay::Overlay;
use hicmatrix::raster::Raster;
use hicmatrix::session::Config;
use hicmatrix::source;
use hicmatrix::source::Http;
use hicmatrix::source::Memory;
use hicmatrix::source::Source;
use hicmatrix::Session;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The color breakpoint markers are drawn in.
const MARKER: [u8; 4] = [0, 0, 255, 255];

/// Where contacts come from.
#[derive(ClapArgs)]
#[group(required = true, multiple = false)]
struct Origin {
    /// A contact dump (optionally gzip-compressed).
    #[arg(long)]
    dump: Option<PathBuf>,

    /// The base URL of a contact service.
    #[arg(long)]
    url: Option<String>,
}

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    origin: Origin,

    /// The normalization method.
    #[arg(short, long, default_value_t = Normalization::None)]
    normalization: Normalization,

    /// The value at which colors saturate.
    #[arg(short, long, default_value_t = 50.0)]
    cutoff: f64,

    /// If desired, set the cutoff to this quantile of the loaded values
    /// instead (e.g., `0.95`).
    #[arg(short, long)]
    auto_cutoff: Option<f64>,

    /// The pixels per bin at the whole-genome level.
    #[arg(long, default_value_t = 1)]
    bin_px: u32,

    /// The pixel size of the chromosome-pair and detail images.
    #[arg(long, default_value_t = 800)]
    size_px: u32,

    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the chromosomes and resolution ladders of the dataset.
    Summary,

    /// Renders the whole-genome level.
    Genome {
        /// The output PNG.
        #[arg(short, long)]
        output: PathBuf,

        /// If desired, a JSON list of breakpoints to mark.
        #[arg(short, long)]
        breakpoints: Option<PathBuf>,
    },

    /// Renders one chromosome against another.
    Pair {
        /// The chromosome along the horizontal axis.
        x: String,

        /// The chromosome along the vertical axis.
        y: String,

        /// The output PNG.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Renders a window of one chromosome against a window of another.
    Detail {
        /// The horizontal window (e.g., `chr1:1000000-2000000`).
        x: Locus,

        /// The vertical window.
        y: Locus,

        /// The output PNG.
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Connects to the contact origin.
fn connect(origin: &Origin) -> Result<Box<dyn Source>> {
    match (&origin.dump, &origin.url) {
        (Some(path), _) => {
            info!("loading contact dump from {}", path.display());

            let reader = dump::Reader::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            let memory = Memory::from_reader(reader.into_inner())
                .with_context(|| format!("reading {}", path.display()))?;

            info!("loaded {} binned contacts", memory.len());
            Ok(Box::new(memory))
        }
        (None, Some(url)) => {
            info!("using the contact service at {url}");
            Ok(Box::new(Http::new(url.clone())))
        }
        (None, None) => bail!("either `--dump` or `--url` must be given"),
    }
}

/// Writes a raster out as a PNG.
fn save(raster: Raster, path: &Path) -> Result<()> {
    let (width, height) = (raster.width(), raster.height());

    raster
        .into_image()
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;

    info!("wrote {width}x{height} image to {}", path.display());
    Ok(())
}

/// Reports the notices the session has recorded.
fn report(session: &mut Session) {
    for notice in session.take_notices() {
        warn!("{notice}");
    }
}

/// Applies `--auto-cutoff`, if given, to the values of the active level.
fn cutoff(session: &mut Session, args: &Args) {
    if let Some(quantile) = args.auto_cutoff {
        match session.auto_cutoff(quantile) {
            Some(cutoff) => info!("cutoff set to {cutoff}"),
            None => warn!("no values loaded; keeping the cutoff at {}", session.cutoff()),
        }
    }
}

/// Prints the dataset summary as a table.
fn summary(source: &dyn Source) -> Result<()> {
    let summary = source.summary()?;
    let dataset = summary.validate()?;

    let mut builder = Builder::default();
    builder.push_record(["Chromosome", "Length"]);

    for chromosome in dataset.genome().iter() {
        builder.push_record([chromosome.name().to_string(), chromosome.length().to_string()]);
    }

    let table = builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::right())
        .to_string();

    println!("{table}");

    let ladder = |entries: &[u64]| {
        entries
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("base-pair resolutions: {}", ladder(&summary.base_resolution_ladder));

    if !summary.fragment_resolution_ladder.is_empty() {
        println!("fragment resolutions: {}", ladder(&summary.fragment_resolution_ladder));
    }

    if let Some(enzyme) = dataset.enzyme() {
        println!("restriction enzyme: {enzyme}");
    }

    Ok(())
}

/// Creates a session for the dataset behind `source`.
fn open(source: &dyn Source, args: &Args) -> Result<Session> {
    let config = Config::builder()
        .normalization(args.normalization)
        .cutoff(args.cutoff)
        .whole_genome_bin_px(args.bin_px)
        .chromosome_pair_max_px(args.size_px)
        .detail_width_px(args.size_px)
        .try_build()?;

    let summary = source.summary().context("fetching the dataset summary")?;
    Ok(Session::try_new(&summary, config)?)
}

fn run(args: Args) -> Result<()> {
    let backend = connect(&args.origin)?;

    match &args.command {
        Command::Summary => summary(backend.as_ref()),
        Command::Genome {
            output,
            breakpoints,
        } => {
            let mut session = open(backend.as_ref(), &args)?;
            let actions = session.start();
            source::drive(&mut session, backend.as_ref(), actions);
            report(&mut session);
            cutoff(&mut session, &args);

            let mut raster = session.whole_genome_raster();

            if let Some(path) = breakpoints {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let overlay = Overlay::from_json(&json)?;

                for marker in overlay.markers(session.layout()) {
                    raster.fill(
                        marker.x as f64 - 1.0,
                        marker.y as f64 - 1.0,
                        3.0,
                        3.0,
                        MARKER,
                    );
                }
            }

            save(raster, output)
        }
        Command::Pair { x, y, output } => {
            let mut session = open(backend.as_ref(), &args)?;
            let actions = session.select_pair(x, y)?;
            source::drive(&mut session, backend.as_ref(), actions);
            report(&mut session);
            cutoff(&mut session, &args);

            let raster = session
                .chromosome_pair()
                .and_then(|view| view.raster())
                .cloned()
                .with_context(|| format!("no contacts were loaded for {x} against {y}"))?;

            save(raster, output)
        }
        Command::Detail { x, y, output } => {
            let mut session = open(backend.as_ref(), &args)?;
            let actions = session.launch_detail(x.clone(), y.clone())?;
            source::drive(&mut session, backend.as_ref(), actions);
            report(&mut session);
            cutoff(&mut session, &args);

            let detail = session.detail().context("the detail level was not opened")?;

            if detail.unmapped() > 0 {
                warn!("{} contacts had no fragment mapping", detail.unmapped());
            }

            let raster = detail
                .raster()
                .cloned()
                .with_context(|| format!("no contacts were loaded for {x} against {y}"))?;

            save(raster, output)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(args)
}

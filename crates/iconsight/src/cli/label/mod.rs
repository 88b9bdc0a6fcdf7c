//! The `iconsight label` command: label every icon in a page manifest.

mod manifest;
mod progress;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use iconsight_core::classifier::debug::DebugDirSink;
use iconsight_core::{
    BatchReport, Config, EnsembleLabeler, IconRecord, OutputFormat as CoreOutputFormat,
    OutputWriter,
};

use progress::ProgressObserver;

/// Arguments for the `label` command.
#[derive(Args, Debug, Default)]
pub struct LabelArgs {
    /// Page manifest: a JSON array of element descriptors
    #[arg(required = true)]
    pub manifest: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Primary (noun) model: ONNX file path or URL
    #[arg(long, env = "ICONSIGHT_PRIMARY_MODEL")]
    pub primary_model: Option<String>,

    /// Secondary (qualifier) model: ONNX file path or URL
    #[arg(long, env = "ICONSIGHT_SECONDARY_MODEL")]
    pub secondary_model: Option<String>,

    /// Class-name taxonomy JSON file
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,

    /// Maximum icons labeled concurrently (0 = unbounded)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Raster canvas resolution in pixels
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Write each classifier input as a PNG into this directory
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the label command.
pub async fn execute(args: LabelArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let manifest_path =
        PathBuf::from(shellexpand::tilde(&args.manifest.to_string_lossy()).into_owned());
    if !manifest_path.is_file() {
        anyhow::bail!(
            "Manifest does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            manifest_path
        );
    }

    let manifest = manifest::load(&manifest_path, config.discovery.max_icon_dimension)?;
    tracing::info!(
        "Found {} icon(s) in {:?}",
        manifest.icons.len() + manifest.rejected.len(),
        manifest_path
    );

    let mut icons = manifest.icons;
    let report = if icons.is_empty() {
        BatchReport::default()
    } else {
        let observer = Arc::new(if args.no_progress {
            ProgressObserver::hidden()
        } else {
            ProgressObserver::new()
        });
        let mut labeler = EnsembleLabeler::from_config(&config)?.with_observer(observer);
        if let Some(dir) = &args.debug_dir {
            labeler = labeler.with_debug_sink(Arc::new(DebugDirSink::new(dir)?));
            tracing::info!("Writing classifier inputs to {:?}", dir);
        }
        labeler.label_batch(&mut icons).await?
    };

    let mut records = IconRecord::collect(&icons, &report);
    let rejected = manifest.rejected.len();
    records.extend(manifest.rejected);
    write_records(&records, &args)?;

    print_summary(&report, rejected);
    Ok(())
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &LabelArgs) {
    if let Some(primary) = &args.primary_model {
        config.models.primary = primary.clone();
    }
    if let Some(secondary) = &args.secondary_model {
        config.models.secondary = secondary.clone();
    }
    if let Some(taxonomy) = &args.taxonomy {
        config.models.taxonomy = taxonomy.clone();
    }
    if let Some(parallel) = args.parallel {
        config.labeling.max_concurrency = parallel;
    }
    if let Some(resolution) = args.resolution {
        config.raster.resolution = resolution;
    }
    if args.no_progress {
        // Nothing to render, so no reason to wait.
        config.labeling.startup_delay_ms = 0;
    }
}

fn write_records(records: &[IconRecord], args: &LabelArgs) -> anyhow::Result<()> {
    let format = args.format.into();
    if let Some(path) = &args.output {
        let file = File::create(path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), format, true);
        writer.write_all(records)?;
        writer.flush()?;
        tracing::info!("Output written to {:?}", path);
    } else {
        let stdout = std::io::stdout();
        let mut writer = OutputWriter::new(stdout.lock(), format, true);
        writer.write_all(records)?;
        writer.flush()?;
    }
    Ok(())
}

/// Print a formatted summary table after labeling.
fn print_summary(report: &BatchReport, rejected: usize) {
    let labeled = report.labeled();
    let skipped = report.skipped();
    let failed = report.failed() + rejected;
    let total = labeled + skipped + failed;
    let elapsed = report.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        (labeled + report.failed()) as f64 / elapsed
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Labeled:      {:>8}", labeled);
    if skipped > 0 {
        eprintln!("    Skipped:      {:>8}", skipped);
    }
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed);
    eprintln!("    Rate:         {:>7.1} icons/sec", rate);
    eprintln!("  ====================================");
}

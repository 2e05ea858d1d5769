use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use atlas_toolbox_core::prelude::*;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-toolbox",
    about = "Pack sprites into texture atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress=false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, global = true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, global = true, help_heading = "Logging/UX")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack one directory (or file) of sprites into a single atlas
    Pack(PackArgs),
    /// Pack every subdirectory of the input into its own atlas on a worker
    /// pool
    Batch(BatchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png + metadata)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug, Clone)]
struct BatchArgs {
    /// Input directory; each subdirectory becomes one atlas
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Worker thread count (0 = available parallelism)
    #[arg(long, default_value_t = 0, help_heading = "Workers")]
    workers: usize,
    /// Block new jobs while in-flight sprite data exceeds this many MiB
    /// (0 disables)
    #[arg(long, default_value_t = 0, help_heading = "Workers")]
    memory_limit_mb: u64,
    /// Stop dequeuing jobs after the first failure
    #[arg(long, default_value_t = false, help_heading = "Workers")]
    abort_on_error: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug, Clone)]
struct CommonArgs {
    /// YAML config file; overrides all algorithm-related options
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob); only matching files are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob)
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Algorithms
    /// Method: maxrects | guillotine | shelf | shelf_ffdh | skyline |
    /// simple_row | auto
    #[arg(long, default_value = "maxrects", help_heading = "Algorithms")]
    method: String,
    /// MaxRects heuristic: auto|baf|bssf|bl
    #[arg(long, default_value = "baf", help_heading = "Algorithms")]
    heuristic: String,
    /// Time budget for auto portfolio (ms)
    #[arg(long, help_heading = "Algorithms")]
    time_budget: Option<u64>,
    /// Evaluate auto candidates in parallel (requires core feature
    /// `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Algorithms")]
    parallel: bool,

    // Sizing
    /// Fixed atlas width (requires --height; disables automatic sizing)
    #[arg(long, help_heading = "Sizing")]
    width: Option<u32>,
    /// Fixed atlas height (requires --width)
    #[arg(long, help_heading = "Sizing")]
    height: Option<u32>,
    /// Lower bound for bounded size search (requires --max-size)
    #[arg(long, help_heading = "Sizing")]
    min_size: Option<u32>,
    /// Upper bound for bounded size search (requires --min-size)
    #[arg(long, help_heading = "Sizing")]
    max_size: Option<u32>,
    /// Round page dimensions up to powers of two (per axis)
    #[arg(long, default_value_t = false, help_heading = "Sizing")]
    pow2: bool,

    // Image Processing
    /// Border padding (around the entire page)
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    border_padding: u32,
    /// Padding between frames
    #[arg(long, default_value_t = 2, help_heading = "Image Processing")]
    texture_padding: u32,
    /// Allow rotation (90 deg)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    allow_rotation: bool,
    /// Collapse mirrored sprites to one bitmap plus flip metadata
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    flip_dedup: bool,
    /// Trim transparent borders
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Image Processing")]
    trim: bool,
    /// Trim alpha threshold (0..=255)
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    trim_threshold: u8,
    /// Fully transparent sprites under trim: keep | skip | abort
    #[arg(long, default_value = "keep", help_heading = "Image Processing")]
    transparent_policy: String,
    /// Sort order: area_desc|max_side_desc|height_desc|width_desc|name_asc|none
    #[arg(long, default_value = "area_desc", help_heading = "Image Processing")]
    sort_order: String,

    // Export
    /// Metadata format: json-hash | json-array | plist | sparrow-xml
    #[arg(long, default_value = "json-hash", help_heading = "Export")]
    metadata: String,
    /// Compute placements and write metadata only (no PNG)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_only: bool,
    /// Print the effective configuration (JSON) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match cli.command {
        Commands::Pack(args) => run_pack(&args, show_progress),
        Commands::Batch(args) => run_batch_cmd(&args, show_progress),
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(common: &CommonArgs) -> anyhow::Result<PackerConfig> {
    if let Some(path) = &common.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: PackerConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        return Ok(cfg);
    }

    let size = match (common.width, common.height, common.min_size, common.max_size) {
        (Some(w), Some(h), None, None) => SizePolicy::Manual {
            width: w,
            height: h,
        },
        (None, None, Some(min), Some(max)) => SizePolicy::MinMax { min, max },
        (None, None, None, None) => SizePolicy::Automatic,
        _ => anyhow::bail!(
            "size options conflict: use --width with --height, or --min-size with --max-size"
        ),
    };
    let method: PackMethod = common
        .method
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown method: {}", common.method))?;
    let mr_heuristic: MaxRectsHeuristic = common
        .heuristic
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown heuristic: {}", common.heuristic))?;
    let transparent_policy: TransparentPolicy = common
        .transparent_policy
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown transparent policy: {}", common.transparent_policy))?;
    let sort_order: SortOrder = common
        .sort_order
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", common.sort_order))?;
    let format: MetadataFormat = common
        .metadata
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown metadata format: {}", common.metadata))?;

    Ok(PackerConfig {
        method,
        mr_heuristic,
        size,
        power_of_two: common.pow2,
        border_padding: common.border_padding,
        texture_padding: common.texture_padding,
        allow_rotation: common.allow_rotation,
        allow_flip_dedup: common.flip_dedup,
        trim: common.trim,
        trim_threshold: common.trim_threshold,
        transparent_policy,
        sort_order,
        format,
        time_budget_ms: common.time_budget,
        parallel: common.parallel,
    })
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(&args.common)?;
    if args.common.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;

    let paths = gather_paths(&args.input, &args.common.include, &args.common.exclude)?;
    anyhow::ensure!(!paths.is_empty(), "no input images under {}", args.input.display());
    let inputs = load_sprites(&args.input, &paths, show_progress)?;
    info!(count = inputs.len(), "loaded input sprites");

    let out = pack_sprites(inputs, cfg.clone())?;
    write_output(&out, &cfg, &args.out_dir, &args.name, args.common.layout_only)?;
    info!("{}", out.stats().summary());
    Ok(())
}

fn run_batch_cmd(args: &BatchArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(&args.common)?;
    if args.common.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;

    let mut groups: Vec<PathBuf> = fs::read_dir(&args.input)
        .with_context(|| format!("read input dir {}", args.input.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    groups.sort();
    anyhow::ensure!(!groups.is_empty(), "no subdirectories under {}", args.input.display());

    let mut jobs: Vec<BatchJob> = Vec::with_capacity(groups.len());
    for dir in &groups {
        let paths = gather_paths(dir, &args.common.include, &args.common.exclude)?;
        if paths.is_empty() {
            continue;
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "atlas".into());
        jobs.push(BatchJob {
            name,
            sprites: load_sprites(dir, &paths, false)?,
        });
    }
    anyhow::ensure!(!jobs.is_empty(), "no images in any subdirectory");

    let bar = if show_progress {
        let bar = ProgressBar::new(jobs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };
    let ctx = match &bar {
        Some(bar) => {
            let bar = bar.clone();
            let sink: Arc<dyn ProgressSink> = Arc::new(move |ev: ProgressEvent| {
                if let ProgressEvent::JobFinished { name, ok, .. } = ev {
                    bar.set_message(if ok { name } else { format!("{name} FAILED") });
                    bar.inc(1);
                }
            });
            RunContext::with_progress(sink)
        }
        None => RunContext::new(),
    };

    let opts = BatchOptions {
        workers: args.workers,
        memory_limit_bytes: args.memory_limit_mb * 1024 * 1024,
        abort_on_error: args.abort_on_error,
    };
    let report = run_batch(jobs, &cfg, &opts, &ctx);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let mut failed = 0usize;
    for job in &report.jobs {
        match &job.result {
            Ok(out) => {
                write_output(out, &cfg, &args.out_dir, &job.name, args.common.layout_only)?;
            }
            Err(e) => {
                failed += 1;
                error!(job = %job.name, "failed: {e}");
            }
        }
    }
    info!(
        total = report.jobs.len(),
        succeeded = report.succeeded(),
        failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "batch done"
    );
    anyhow::ensure!(failed == 0, "{failed} of {} atlases failed", report.jobs.len());
    Ok(())
}

fn write_output(
    out: &PackOutput,
    cfg: &PackerConfig,
    out_dir: &Path,
    name: &str,
    layout_only: bool,
) -> anyhow::Result<()> {
    let png_name = format!("{name}.png");
    if !layout_only {
        let png_path = out_dir.join(&png_name);
        out.rgba
            .save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
    }
    let ext = match cfg.format {
        MetadataFormat::JsonHash | MetadataFormat::JsonArray => "json",
        MetadataFormat::Plist => "plist",
        MetadataFormat::SparrowXml => "xml",
    };
    let meta_path = out_dir.join(format!("{name}.{ext}"));
    let rendered = render_metadata(&out.atlas, cfg.format, &png_name)?;
    fs::write(&meta_path, rendered).with_context(|| format!("write {}", meta_path.display()))?;
    info!(
        atlas = name,
        width = out.atlas.width,
        height = out.atlas.height,
        method = %out.atlas.method,
        "atlas written"
    );
    Ok(())
}

fn gather_paths(input: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let include_set = build_globset(include)?;
    let exclude_set = build_globset(exclude)?;
    let mut out = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if !ext_ok {
            continue;
        }
        let rel = path.strip_prefix(input).unwrap_or(path);
        if let Some(set) = &include_set {
            if !set.is_match(rel) {
                continue;
            }
        }
        if let Some(set) = &exclude_set {
            if set.is_match(rel) {
                continue;
            }
        }
        out.push(path.to_path_buf());
    }
    Ok(out)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).with_context(|| format!("bad glob pattern {p}"))?);
    }
    Ok(Some(builder.build()?))
}

fn load_sprites(
    root: &Path,
    paths: &[PathBuf],
    show_progress: bool,
) -> anyhow::Result<Vec<InputSprite>> {
    let bar = if show_progress && paths.len() > 1 {
        Some(ProgressBar::new(paths.len() as u64))
    } else {
        None
    };
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let image = ImageReader::open(path)
            .with_context(|| format!("open {}", path.display()))?
            .decode()
            .with_context(|| format!("decode {}", path.display()))?;
        out.push(InputSprite {
            key: sprite_key(root, path),
            image,
        });
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(out)
}

/// Key = path relative to the input root, extension stripped, `/` separators.
fn sprite_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let no_ext = rel.with_extension("");
    no_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

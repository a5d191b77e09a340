mod config;
mod summary;

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use asphalt_runtime::{
    FileAssetSource, FrameGovernor, IncrementalScheduler, LoaderEvent, MapPipeline, StylePipeline,
};
use clap::Parser;
use hashbrown::HashMap;

use crate::config::AppConfig;
use crate::summary::SummarySink;

const DEFAULT_CONFIG: &str = "asphalt.toml";

#[derive(Parser, Debug)]
#[command(name = "asphalt", about = "Load a chunked map and style into render-ready mesh tiles")]
struct Args {
    /// TOML configuration file; `asphalt.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the assets.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Map file name under the asset root.
    #[arg(long)]
    map: Option<String>,
    /// Style file name under the asset root.
    #[arg(long)]
    style: Option<String>,
    /// Write the texture atlas here as a PAM image.
    #[arg(long)]
    dump_atlas: Option<PathBuf>,
    /// Log filter, e.g. `info` or `runtime=trace`.
    #[arg(long)]
    log: Option<String>,
    /// Build the atlas in one parallel step.
    #[arg(long)]
    parallel_atlas: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));
    let mut cfg = match &config_path {
        Some(path) => match config::load_config_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(root) = args.root {
        cfg.assets.root = root;
    }
    if let Some(map) = args.map {
        cfg.assets.map = map;
    }
    if let Some(style) = args.style {
        cfg.assets.style = style;
    }
    cfg.style.parallel_atlas |= args.parallel_atlas;

    let filter = args
        .log
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| cfg.log_filter.clone());
    env_logger::Builder::new().parse_filters(&filter).init();

    match run(&cfg, args.dump_atlas.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: "app", "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &AppConfig, dump_atlas: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let source =
        FileAssetSource::new(&cfg.assets.root).with_read_chunk(cfg.fetch.read_chunk_bytes);
    let mut style = StylePipeline::fetch(&source, &cfg.assets.style, cfg.style_settings()?)?;
    if cfg.style.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.style.threads)
            .thread_name(|i| format!("atlas-{}", i))
            .build()?;
        style = style.with_pool(Arc::new(pool));
    }
    let map = MapPipeline::fetch(&source, &cfg.assets.map, cfg.map_settings()?)?;

    let mut scheduler = IncrementalScheduler::new(FrameGovernor::new(cfg.scheduler.governor()));
    scheduler.add("style", style).add("map", map);

    let mut sink = if dump_atlas.is_some() {
        SummarySink::keeping_atlas()
    } else {
        SummarySink::default()
    };
    let frame = cfg.scheduler.target_frame();
    let started = Instant::now();
    let mut stage_labels: HashMap<String, String> = HashMap::new();
    let mut failures = 0;
    let mut frames = 0u64;
    'frames: loop {
        let frame_start = Instant::now();
        frames += 1;
        for event in scheduler.drive() {
            match event {
                LoaderEvent::Progress { name, percent, label } => {
                    if stage_labels.get(&name) != Some(&label) {
                        log::info!(target: "app", "{}: {}", name, label);
                        stage_labels.insert(name.clone(), label.clone());
                    }
                    log::debug!(target: "app", "{}: {} {:.0}%", name, label, percent);
                }
                LoaderEvent::Loaded { name, product } => product.deliver(&name, &mut sink),
                LoaderEvent::Failed { name, error } => {
                    log::error!(target: "app", "{} failed: {}", name, error);
                    failures += 1;
                }
                LoaderEvent::AllLoaded => break 'frames,
            }
        }
        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }
    log::info!(
        target: "app",
        "loaded in {:.2}s over {} frames ({} steps/frame at the end)",
        started.elapsed().as_secs_f64(),
        frames,
        scheduler.governor().steps_per_frame()
    );
    sink.report();

    if let (Some(path), Some(atlas)) = (dump_atlas, sink.kept_atlas()) {
        let mut out = BufWriter::new(File::create(path)?);
        summary::write_pam(&mut out, atlas)?;
        out.flush()?;
        log::info!(target: "app", "atlas written to {}", path.display());
    }
    if failures > 0 {
        return Err(format!("{} asset(s) failed to load", failures).into());
    }
    Ok(())
}

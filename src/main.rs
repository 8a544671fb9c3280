use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use theory_localizer::backfill::backfill_tier_files;
use theory_localizer::chat::run_console;
use theory_localizer::generate::generate_tables;
use theory_localizer::pipeline::{
    fill_directory, fill_table_file, init_default_config, ConfigOverrides, FillOptions,
    LocalizerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "theory-localizer")]
#[command(about = "Theory/terminology JSON -> localization CSVs, filled by a local LLM", long_about = None)]
struct Args {
    /// Generate default config + prompt files, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write config/prompt files (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite existing config/prompt files when used with --init-config
    #[arg(long)]
    force: bool,

    /// Config file path (default: search for theory-localizer.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding tier_N.json and terminology.json
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Directory the CSV tables are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Fill every CSV in the output directory instead of generating tables
    #[arg(long)]
    translate: bool,

    /// Fill a single CSV (a bare file name is looked up in the output directory)
    #[arg(long, value_name = "CSV")]
    translate_file: Option<PathBuf>,

    /// Retranslate every target cell, not just the empty ones
    #[arg(long)]
    redo_all: bool,

    /// Stop the backend after --translate-file finishes
    #[arg(long)]
    shutdown_backend: bool,

    /// Rewrite tier files so every record has all six fields, then exit
    #[arg(long)]
    backfill_tiers: bool,

    /// Value for fields added by --backfill-tiers (default: the record's base)
    #[arg(long, value_name = "TEXT")]
    fill_value: Option<String>,

    /// Interactive chat console against the backend
    #[arg(long)]
    chat: bool,

    /// Backend host (e.g. http://localhost:11434)
    #[arg(long)]
    host: Option<String>,

    /// Backend model name
    #[arg(long)]
    model: Option<String>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if args.init_config {
        let dir = args.init_config_dir.clone().unwrap_or_else(|| cwd.clone());
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        info!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let cfg = LocalizerConfig::resolve(
        &cwd,
        ConfigOverrides {
            config: args.config.clone(),
            config_dir: args.config_dir.clone(),
            output_dir: args.output_dir.clone(),
            host: args.host.clone(),
            model: args.model.clone(),
        },
    )
    .context("build config")?;
    if let Some(p) = cfg.config_path.as_ref() {
        info!("Config: {}", p.display());
    }

    if args.backfill_tiers {
        let reports = backfill_tier_files(&cfg.config_dir, args.fill_value.as_deref())?;
        let changed: usize = reports.iter().map(|r| r.changed).sum();
        info!("Backfilled {changed} records across {} tier files", reports.len());
        return Ok(());
    }

    if args.chat {
        let translator = cfg.build_translator()?;
        info!("Chatting with {} at {}", cfg.ollama.model, cfg.ollama.host);
        let stdin = std::io::stdin();
        run_console(&translator, cfg.chat_temperature, stdin.lock(), std::io::stdout())?;
        return Ok(());
    }

    if let Some(file) = args.translate_file.clone() {
        let path = if file.exists() {
            file
        } else {
            cfg.output_dir.join(file)
        };
        let translator = cfg.build_translator()?;
        let opts = FillOptions {
            force_retranslate: args.redo_all,
            keep_backend_alive: !args.shutdown_backend,
        };
        fill_table_file(&path, &translator, opts)?;
        return Ok(());
    }

    if args.translate {
        let translator = cfg.build_translator()?;
        info!("Translating tables in {}", cfg.output_dir.display());
        let done = fill_directory(&cfg.output_dir, &translator, args.redo_all)?;
        let failed: usize = done.iter().map(|(_, s)| s.failed).sum();
        if failed > 0 {
            warn!("{failed} cells could not be translated; rerun to retry them");
        }
        info!("Translated {} tables", done.len());
        return Ok(());
    }

    info!("Generating tables from {}", cfg.config_dir.display());
    let tables = generate_tables(&cfg.generate_options())?;
    let rows: usize = tables.iter().map(|t| t.rows).sum();
    info!(
        "Generated {} tables ({rows} rows) in {}",
        tables.len(),
        cfg.output_dir.display()
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,theory_localizer={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

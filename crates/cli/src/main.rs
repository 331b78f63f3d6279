use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use media_renamer_core::{
    app_paths, collect_assets, enrich_details, load_config, parse_pattern, save_config,
    AppConfig, AssetOutcome, BatchRequest, BatchResult, DetailFields, EngineOptions,
    MediaProbe, MediaType, MetadataExtractor, OmdbClient, ProbeBackend, RenameEngine,
    RunControl, ScanOptions, UndoOutcome, UndoResult,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "media-renamer")]
#[command(about = "Rename media files from metadata-driven name patterns, with undo")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rename every file of a directory once
    Rename(BatchArgs),
    /// Interactive session: rename, undo and inspect history
    Session(BatchArgs),
    /// Print the track facts read from one file
    Probe(ProbeArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    /// Write the default configuration file
    Init,
}

#[derive(Debug, Args)]
struct ProbeArgs {
    file: PathBuf,
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Working directory holding the files to rename
    #[arg(long)]
    dir: PathBuf,
    /// movie, series, anime, music, audiobook or ebook
    #[arg(long)]
    media_type: Option<MediaType>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u16).range(1800..=2100))]
    year: Option<u16>,
    #[arg(long)]
    season: Option<u32>,
    #[arg(long)]
    episode: Option<u32>,
    #[arg(long)]
    artist: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    pattern: Option<String>,
    #[arg(long)]
    language: Option<String>,
    /// Move renamed files into --destination
    #[arg(long = "move", default_value_t = false)]
    move_files: bool,
    #[arg(long)]
    destination: Option<PathBuf>,
    /// OMDb API key used to normalize movie title and year
    #[arg(long)]
    omdb_key: Option<String>,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, default_value_t = false)]
    parallel_probe: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Mediainfo,
    Ffprobe,
}

impl From<BackendArg> for ProbeBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Auto => ProbeBackend::Auto,
            BackendArg::Mediainfo => ProbeBackend::MediaInfo,
            BackendArg::Ffprobe => ProbeBackend::Ffprobe,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Session(args) => cmd_session(args),
        Commands::Probe(args) => cmd_probe(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("media_renamer=debug,media_renamer_core=debug")
        } else {
            EnvFilter::new("media_renamer=info,media_renamer_core=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

/// Resolved settings for one directory; the asset list is rescanned per run.
struct Session {
    engine: RenameEngine,
    template: BatchRequest,
    dir: PathBuf,
    scan: ScanOptions,
    output: OutputFormat,
}

impl Session {
    fn from_args(args: BatchArgs) -> Result<Self> {
        let config = load_config()?;
        let pattern = args.pattern.unwrap_or_else(|| config.pattern.clone());
        parse_pattern(&pattern).with_context(|| format!("invalid pattern: {pattern}"))?;

        let media_type = args.media_type.unwrap_or(config.media_type);
        let mut details = DetailFields {
            title: args.title,
            year: args.year.map(|y| y.to_string()),
            season: args.season.map(|s| s.to_string()),
            episode: args.episode.map(|e| e.to_string()),
            artist: args.artist,
            author: args.author,
        };
        if details.is_empty() {
            tracing::warn!("no detail fields given; only track facts and language will be used");
        }

        if media_type == MediaType::Movie {
            if let Some(key) = args.omdb_key.or_else(|| config.omdb_api_key.clone()) {
                let client = OmdbClient::new(key)?;
                enrich_details(&client, &mut details);
            }
        }

        let destination = args.destination.or_else(|| config.destination.clone());
        if args.move_files && destination.is_none() {
            anyhow::bail!("--move needs --destination (or `destination` in the config file)");
        }

        let engine = RenameEngine::local(MediaProbe::new(config.probe_backend)).with_options(
            EngineOptions {
                max_filename_len: config.max_filename_len,
            },
        );

        Ok(Self {
            engine,
            template: BatchRequest {
                assets: Vec::new(),
                media_type,
                details,
                pattern,
                language: args.language.unwrap_or_else(|| config.language.clone()),
                move_files: args.move_files,
                destination,
                parallel_probe: args.parallel_probe,
            },
            dir: args.dir,
            scan: ScanOptions {
                recursive: args.recursive,
                include_hidden: args.include_hidden || config.include_hidden,
            },
            output: args.output,
        })
    }

    fn rename(&self) -> Result<BatchResult> {
        let (assets, stats) = collect_assets(&self.dir, self.scan)?;
        tracing::debug!(
            scanned = stats.scanned_files,
            hidden = stats.skipped_hidden,
            sidecars = stats.skipped_sidecars,
            "scanned working directory"
        );

        let request = BatchRequest {
            assets,
            ..self.template.clone()
        };
        let progress = |index: usize, total: usize| {
            eprint!("\r[{index}/{total}]");
            if index == total {
                eprintln!();
            }
        };
        let control = RunControl::default().with_progress(&progress);
        let result = self.engine.run(&request, &control)?;
        self.print_batch(&result)?;
        Ok(result)
    }

    fn undo(&self) -> Result<()> {
        let result = self.engine.undo_last();
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table => print_undo(&result),
        }
        Ok(())
    }

    fn print_batch(&self, result: &BatchResult) -> Result<()> {
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
            OutputFormat::Table => print_table(result),
        }
        Ok(())
    }
}

fn cmd_rename(args: BatchArgs) -> Result<()> {
    let session = Session::from_args(args)?;
    let result = session.rename()?;
    if result.batch_id.is_some() {
        eprintln!("undo history lives in this process only; use `session` to undo interactively");
    }
    Ok(())
}

fn cmd_session(args: BatchArgs) -> Result<()> {
    let session = Session::from_args(args)?;
    let stdin = io::stdin();
    print_session_help();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            "rename" | "r" => {
                if let Err(err) = session.rename() {
                    eprintln!("error: {err:#}");
                }
            }
            "undo" | "u" => session.undo()?,
            "history" | "h" => {
                let history = session.engine.history();
                if history.is_empty() {
                    println!("no batches to undo");
                }
                for batch in history.iter().rev() {
                    println!(
                        "#{} {} ({} files)",
                        batch.id,
                        batch.created_at.format("%Y-%m-%d %H:%M:%S"),
                        batch.actions
                    );
                }
            }
            "help" | "?" => print_session_help(),
            "quit" | "exit" | "q" => break,
            other => eprintln!("unknown command: {other} (try `help`)"),
        }
    }

    Ok(())
}

fn print_session_help() {
    println!("commands: rename | undo | history | help | quit");
}

fn cmd_probe(args: ProbeArgs) -> Result<()> {
    let backend = match args.backend {
        Some(backend) => backend.into(),
        None => load_config()?.probe_backend,
    };
    let metadata = MediaProbe::new(backend)
        .extract(&args.file)
        .with_context(|| format!("cannot read media info: {}", args.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = save_config(&AppConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn print_table(result: &BatchResult) {
    println!("original -> final (outcome)");
    for entry in &result.entries {
        let target = entry
            .final_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let outcome = match &entry.outcome {
            AssetOutcome::Succeeded { unchanged: true } => "unchanged".to_string(),
            AssetOutcome::Succeeded { unchanged: false } => "ok".to_string(),
            AssetOutcome::Skipped(reason) => format!("skipped: {reason}"),
            AssetOutcome::Failed(reason) => format!("failed: {reason}"),
        };
        println!(
            "{} -> {} ({})",
            entry.original_path.display(),
            target,
            outcome
        );
    }

    println!(
        "\nsummary: succeeded={} skipped={} failed={}{}",
        result.counts.succeeded,
        result.counts.skipped,
        result.counts.failed,
        if result.cancelled { " (cancelled)" } else { "" }
    );
}

fn print_undo(result: &UndoResult) {
    let UndoResult::Reverted { batch_id, entries } = result else {
        println!("nothing to undo");
        return;
    };
    println!("undo batch #{batch_id}");
    for entry in entries {
        let outcome = match &entry.outcome {
            UndoOutcome::Restored => "restored".to_string(),
            UndoOutcome::Unchanged => "unchanged".to_string(),
            UndoOutcome::Failed(reason) => format!("failed: {reason}"),
        };
        println!(
            "{} -> {} ({})",
            entry.action.final_path.display(),
            entry.action.original_path.display(),
            outcome
        );
    }
    println!(
        "\nsummary: restored={} failed={}",
        result.restored(),
        result.failed()
    );
}

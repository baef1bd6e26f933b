use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use djimeta::{
    BatchExporter, BatchReport, DEFAULT_BATCH_PATH, DEFAULT_EXPORT_DIR, DEFAULT_EXTRACTION_TIMEOUT,
    DEFAULT_FRAME_SENTINEL, DEFAULT_INPUT_DIR, DEFAULT_INTERVAL, ExportOptions, ProgressCallback,
    ProgressInfo, sample_caption_dump,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

#[cfg(feature = "native")]
use djimeta::{FfmpegCaptionSource, FfprobeInspector, NativeInspector};

const CLI_AFTER_HELP: &str = "Examples:\n  djimeta --input dji_videos/ --export src_vid_info/ --interval 3\n  djimeta export -i flights/ --vid-format mp4,mov --eq out/data.json --progress\n  djimeta inspect dump.vtt --interval 1 --json\n  djimeta completions zsh > _djimeta";

#[derive(Debug, Parser)]
#[command(
    name = "djimeta",
    version,
    about = "Export DJI flight telemetry from video caption tracks",
    after_help = CLI_AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    /// Export options used when no subcommand is given.
    #[command(flatten)]
    export: ExportArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Args, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Debug, Args, Clone)]
struct ExportArgs {
    /// Directory containing the DJI videos.
    #[arg(short, long, default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Directory receiving one metadata JSON per video.
    #[arg(short, long, default_value = DEFAULT_EXPORT_DIR)]
    export: PathBuf,

    /// Keep one record every N caption cues (0 or less keeps all).
    #[arg(long, visible_alias = "int", default_value_t = DEFAULT_INTERVAL, allow_negative_numbers = true)]
    interval: i64,

    /// Path of the batch JSON document.
    #[arg(long = "export-query", visible_alias = "eq", default_value = DEFAULT_BATCH_PATH)]
    export_query: PathBuf,

    /// Video formats to include (mp4, mov, avi, mpg, mkv). Defaults to all.
    #[arg(long, value_delimiter = ',')]
    vid_format: Vec<String>,

    /// Seconds allowed for one caption extraction.
    #[arg(long, default_value_t = DEFAULT_EXTRACTION_TIMEOUT.as_secs())]
    timeout: u64,

    /// Token identifying telemetry lines in the caption track.
    #[arg(long, default_value = DEFAULT_FRAME_SENTINEL)]
    sentinel: String,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Export videos concurrently (requires the `rayon` feature).
    #[arg(long)]
    parallel: bool,

    /// Probe videos in-process instead of running ffprobe (requires the `native` feature).
    #[arg(long)]
    native_probe: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export telemetry for every video in a directory.
    #[command(
        about = "Export telemetry for a directory of videos",
        after_help = "Examples:\n  djimeta export -i dji_videos/ -e src_vid_info/\n  djimeta export --interval 1 --eq data/all.json --progress"
    )]
    Export(ExportArgs),

    /// Parse a caption dump already on disk.
    #[command(
        about = "Parse and sample a WebVTT caption dump",
        after_help = "Examples:\n  ffmpeg -i DJI_0001.MP4 -map s:0 -f webvtt dump.vtt\n  djimeta inspect dump.vtt --interval 3"
    )]
    Inspect {
        /// Caption dump (WebVTT text).
        input: PathBuf,

        /// Keep one record every N caption cues.
        #[arg(long, default_value_t = DEFAULT_INTERVAL, allow_negative_numbers = true)]
        interval: i64,

        /// Token identifying telemetry lines.
        #[arg(long, default_value = DEFAULT_FRAME_SENTINEL)]
        sentinel: String,

        /// Print the sampled records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(name) = info.current_video.as_deref().and_then(Path::file_name) {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
        if info.total == Some(info.current) {
            self.bar.finish_with_message("done");
        }
    }
}

fn export_options(args: &ExportArgs) -> Result<ExportOptions, Box<dyn std::error::Error>> {
    let mut options = ExportOptions::new()
        .with_input_dir(&args.input)
        .with_export_dir(&args.export)
        .with_batch_path(&args.export_query)
        .with_interval(args.interval)
        .with_sentinel(args.sentinel.clone())
        .with_timeout(Duration::from_secs(args.timeout));

    if !args.vid_format.is_empty() {
        options = options.with_extensions(&args.vid_format);
    }

    if args.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    Ok(options)
}

#[cfg(feature = "native")]
fn build_exporter(args: &ExportArgs, options: ExportOptions) -> BatchExporter {
    let captions = FfmpegCaptionSource::new().with_timeout(options.timeout());
    if args.native_probe {
        BatchExporter::new(options, captions, NativeInspector::new())
    } else {
        BatchExporter::new(options, captions, FfprobeInspector::new())
    }
}

#[cfg(not(feature = "native"))]
fn build_exporter(args: &ExportArgs, options: ExportOptions) -> BatchExporter {
    if args.native_probe {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--native-probe requires building with the `native` feature; using ffprobe".yellow()
        );
    }
    BatchExporter::with_ffmpeg(options)
}

fn run_export(args: &ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = export_options(args)?;
    let exporter = build_exporter(args, options);

    let report = if args.parallel {
        run_parallel(&exporter)?
    } else {
        exporter.run()?
    };

    print_report(&report);
    Ok(())
}

#[cfg(feature = "rayon")]
fn run_parallel(exporter: &BatchExporter) -> Result<BatchReport, Box<dyn std::error::Error>> {
    Ok(exporter.run_parallel()?)
}

#[cfg(not(feature = "rayon"))]
fn run_parallel(exporter: &BatchExporter) -> Result<BatchReport, Box<dyn std::error::Error>> {
    eprintln!(
        "{} {}",
        "warning:".yellow().bold(),
        "--parallel requires building with the `rayon` feature; exporting sequentially".yellow()
    );
    Ok(exporter.run()?)
}

fn print_report(report: &BatchReport) {
    for summary in &report.exported {
        println!(
            "{} {} -> {}",
            "saved".green().bold(),
            summary.video.display(),
            summary.output_path.display()
        );
        if !summary.report.is_clean() {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!(
                    "{}: {} malformed telemetry line(s) skipped",
                    summary.video.display(),
                    summary.report.rejected_count()
                )
                .yellow()
            );
        }
    }

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "failed:".red().bold(),
            failure.video.display(),
            failure.error
        );
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{} of {} video(s) written to {}",
            report.document.video_count(),
            report.attempted(),
            report.batch_path.display()
        )
        .green()
    );
}

fn run_inspect(
    input: &Path,
    interval: i64,
    sentinel: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dump = fs::read_to_string(input)?;
    let (records, report) = sample_caption_dump(&dump, sentinel, interval);

    if json {
        let payload = json!({
            "frame_info": records,
            "time_marks": report.time_marks,
            "telemetry_lines": report.telemetry_lines,
            "rejected": report.rejected_count(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for record in &records {
            println!(
                "{} gps={} alt={} dst={} {} {}",
                record.second,
                record.gps.join(" "),
                record.altitude,
                record.distance_from_home,
                record.horizontal_speed,
                record.vertical_speed,
            );
        }
        print!("{report}");
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        None => run_export(&cli.export)?,
        Some(Commands::Export(args)) => run_export(&args)?,
        Some(Commands::Inspect {
            input,
            interval,
            sentinel,
            json,
        }) => run_inspect(&input, interval, &sentinel, json)?,
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "djimeta", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

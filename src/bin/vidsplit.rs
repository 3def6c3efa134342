use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidsplit::{
    ArchiveLayout, FfmpegLogLevel, FrameSource, ProgressCallback, ProgressInfo, SplitOptions,
    SplitOutcome, SplitReport, VideoCodec, VideoFile, VideoSplitter, find_videos, parse_timecodes,
    render_tree,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidsplit split talk.mp4 --timecodes \"00:00-00:02, 00:05-00:07\" --step 5\n  vidsplit batch videos/ --timecodes \"00:10-00:20\" --codec mjpg --progress\n  vidsplit list videos/\n  vidsplit probe talk.mp4 --json\n  vidsplit completions zsh > _vidsplit";

#[derive(Debug, Parser)]
#[command(
    name = "vidsplit",
    version,
    about = "Split videos into sub-clips and JPEG stills from timecodes",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while splitting.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Parser, Clone)]
struct SplitArgs {
    /// Text containing one or more MM:SS-MM:SS ranges.
    #[arg(long, short = 't')]
    timecodes: String,

    /// Save every Nth frame of each part as a still.
    #[arg(long, default_value_t = 1)]
    step: u64,

    /// Clip codec: mp4v | avc1 | h264 | xvid | mjpg.
    #[arg(long, default_value = "mp4v")]
    codec: String,

    /// JPEG quality for stills (1-100).
    #[arg(long, default_value_t = vidsplit::DEFAULT_QUALITY)]
    quality: u8,

    /// Root output directory.
    #[arg(long, default_value = vidsplit::DEFAULT_OUTPUT_ROOT)]
    out: PathBuf,

    /// Skip writing the zip archive.
    #[arg(long)]
    no_archive: bool,

    /// Keep relative paths inside the archive instead of flattening.
    #[arg(long)]
    preserve_paths: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Split one video.
    #[command(
        about = "Split a video into parts",
        after_help = "Examples:\n  vidsplit split talk.mp4 --timecodes \"00:00-00:02, 00:05-00:07\" --step 5\n  vidsplit split talk.mp4 -t \"01:00-01:30\" --codec mjpg --no-archive"
    )]
    Split {
        /// Input video path.
        input: PathBuf,
        #[command(flatten)]
        args: SplitArgs,
    },

    /// Split every supported video in a folder.
    #[command(about = "Split every video in a folder")]
    Batch {
        /// Folder containing the videos.
        folder: PathBuf,
        #[command(flatten)]
        args: SplitArgs,
    },

    /// Show a folder's subdirectories and the videos it contains.
    #[command(about = "List subfolders and videos")]
    List {
        /// Folder to list.
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Print video stream properties.
    #[command(about = "Print video properties", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output properties as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the ranges found in a timecode string.
    #[command(about = "Parse timecodes")]
    Parse {
        /// Text containing MM:SS-MM:SS ranges.
        timecodes: String,

        /// Output intervals as machine-readable JSON.
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

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if global.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .init();

    if let Some(level) = &global.log_level {
        let parsed = FfmpegLogLevel::from_name(level)
            .ok_or(format!("unsupported --log-level: {level}"))?;
        vidsplit::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn split_options(
    args: &SplitArgs,
    global: &GlobalOptions,
) -> Result<SplitOptions, Box<dyn std::error::Error>> {
    let codec = VideoCodec::from_identifier(&args.codec)?;
    let layout = if args.preserve_paths {
        ArchiveLayout::Preserve
    } else {
        ArchiveLayout::Flatten
    };

    let mut options = SplitOptions::new()
        .with_frame_step(args.step)
        .with_codec(codec)
        .with_quality(args.quality)
        .with_output_root(&args.out)
        .with_archive(!args.no_archive)
        .with_archive_layout(layout);

    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    options.validate()?;
    Ok(options)
}

/// Drives an indicatif bar from part-level progress reports.
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
        if info.completed_parts <= 1 {
            self.bar.reset();
        }
        self.bar.set_length(info.total_parts as u64);
        self.bar.set_position(info.completed_parts as u64);
        self.bar.set_message(info.status.clone());
        if info.completed_parts >= info.total_parts {
            self.bar.finish();
        }
    }
}

fn print_report(report: &SplitReport) {
    for segment in &report.segments {
        let line = format!(
            "  part {}: {} → {} frame(s), {} still(s)",
            segment.index + 1,
            segment.interval,
            segment.decoded_frames,
            segment.still_frames.len()
        );
        if let Some(error) = &segment.clip_error {
            println!("{line}");
            eprintln!("{} {}", "warning:".yellow().bold(), format!("no clip: {error}").yellow());
        } else if segment.truncated {
            println!("{line} {}", "(truncated)".yellow());
        } else {
            println!("{line}");
        }
    }

    match report.archive_path() {
        Some(path) => println!("{} {}", "archive".green().bold(), path.display()),
        None => println!("{} {}", "output".green().bold(), report.video_dir.display()),
    }
}

fn print_outcome(outcome: &SplitOutcome) {
    match outcome {
        SplitOutcome::Completed(report) => {
            if report.segments.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("no MM:SS-MM:SS ranges found for {}", report.video.display()).yellow()
                );
                return;
            }
            println!("{} {}", "split".green().bold(), report.video.display());
            print_report(report);
        }
        SplitOutcome::AlreadyDone { video, archive } => {
            println!("{} {} (already done)", "skip".cyan().bold(), video.display());
            if let Some(path) = archive {
                println!("  {}", path.display());
            }
        }
    }
}

fn probe(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let video = VideoFile::open(input)?;
    let properties = video.properties();
    if json {
        let payload = json!({
            "path": input.display().to_string(),
            "width": properties.width,
            "height": properties.height,
            "fps": properties.frames_per_second,
            "frame_count": properties.frame_count,
            "duration_seconds": properties.duration().as_secs_f64(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Resolution: {}x{}", properties.width, properties.height);
        println!("Frame rate: {:.3} fps", properties.frames_per_second);
        println!("Frames: {}", properties.frame_count);
        println!("Duration: {:?}", properties.duration());
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Split { input, args } => {
            let mut splitter = VideoSplitter::new(split_options(&args, &cli.global)?)?;
            let outcome = splitter.split_video(&input, &args.timecodes)?;
            print_outcome(&outcome);
        }
        Commands::Batch { folder, args } => {
            let mut splitter = VideoSplitter::new(split_options(&args, &cli.global)?)?;
            let report = splitter.split_folder(&folder, &args.timecodes)?;
            for outcome in &report.outcomes {
                print_outcome(outcome);
            }
            for (video, error) in &report.failures {
                eprintln!("{} {}: {error}", "failed:".red().bold(), video.display());
            }
            if report.outcomes.is_empty() && report.failures.is_empty() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("no videos found in {}", folder.display()).yellow()
                );
            }
            if !report.failures.is_empty() {
                return Err(format!("{} video(s) failed", report.failures.len()).into());
            }
        }
        Commands::List { folder } => {
            println!("{}", render_tree(&folder)?);
            let videos = find_videos(&folder)?;
            if videos.is_empty() {
                println!("No videos found.");
            }
            for video in videos {
                let name = video
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("🎞  {name}");
            }
        }
        Commands::Probe { input, json } => probe(&input, json)?,
        Commands::Parse { timecodes, json } => {
            let intervals = parse_timecodes(&timecodes);
            if json {
                let payload: Vec<_> = intervals
                    .iter()
                    .map(|interval| {
                        json!({
                            "start_seconds": interval.start.as_secs(),
                            "end_seconds": interval.end.as_secs(),
                            "display": interval.to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if intervals.is_empty() {
                println!("No MM:SS-MM:SS ranges found.");
            } else {
                for (index, interval) in intervals.iter().enumerate() {
                    println!("part {}: {interval} ({:?})", index + 1, interval.length());
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidsplit", &mut std::io::stdout());
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

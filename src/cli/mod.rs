//! # CLI Module
//!
//! Command-line interface for the media uploader.
//!
//! ## Usage
//! ```bash
//! # Preview what would be uploaded
//! nas-upload scan /media/sdcard/DCIM /mnt/nas/photos
//!
//! # Upload, replacing same-named files whose size differs
//! nas-upload transfer /media/sdcard/DCIM /mnt/nas/photos --overwrite
//!
//! # Reuse the folders from last time
//! nas-upload transfer
//!
//! # JSON plan for scripting
//! nas-upload scan --output json
//! ```

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use nas_media_uploader::config::{Settings, SettingsStore};
use nas_media_uploader::core::catalog::CatalogConfig;
use nas_media_uploader::core::jobs::{ScanJob, ScanRequest, TransferJob};
use nas_media_uploader::core::planner::ScanSummary;
use nas_media_uploader::core::transfer::{TransferControl, TransferReport};
use nas_media_uploader::core::Disposition;
use nas_media_uploader::error::Result;
use nas_media_uploader::events::{EventChannel, JobObserver};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

/// NAS Media Uploader - Sort photos and videos into date folders
#[derive(Parser, Debug)]
#[command(name = "nas-upload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the source and show what a transfer would do
    Scan {
        #[command(flatten)]
        job: JobArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Scan, then copy new files into date folders
    Transfer {
        #[command(flatten)]
        job: JobArgs,

        /// Start without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Folder to read media from (defaults to the saved source)
    source: Option<PathBuf>,

    /// Folder to sort media into (defaults to the saved target)
    target: Option<PathBuf>,

    /// Replace same-named files whose size differs
    #[arg(long, overrides_with = "no_overwrite")]
    overwrite: bool,

    /// Keep same-named files at the target untouched
    #[arg(long)]
    no_overwrite: bool,

    /// Ignore files and folders starting with a dot
    #[arg(long)]
    skip_hidden: bool,

    /// Descend into symbolically linked folders
    #[arg(long)]
    follow_symlinks: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the saved settings
    Show,
    /// Print where settings are stored
    Path,
    /// Change saved settings
    Set {
        #[arg(long)]
        source: Option<PathBuf>,

        #[arg(long)]
        target: Option<PathBuf>,

        #[arg(long)]
        overwrite: Option<bool>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = SettingsStore::open_default()?;

    match cli.command {
        Commands::Scan { job, output } => run_scan(&store, job, output),
        Commands::Transfer { job, yes } => run_transfer(&store, job, yes),
        Commands::Config { action } => run_config(&store, action),
    }
}

/// Resolved job inputs plus the settings they came from
struct Resolved {
    request: ScanRequest,
    settings: Settings,
}

fn resolve(store: &SettingsStore, job: JobArgs) -> Result<Resolved> {
    let saved = store.load()?;

    let source = job.source.or_else(|| saved.source()).unwrap_or_else(|| {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no SOURCE given and none saved (see `nas-upload config set --source`)",
            )
            .exit()
    });
    let target = job.target.or_else(|| saved.target()).unwrap_or_else(|| {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no TARGET given and none saved (see `nas-upload config set --target`)",
            )
            .exit()
    });

    let overwrite = if job.overwrite {
        true
    } else if job.no_overwrite {
        false
    } else {
        saved.overwrite_duplicates
    };

    let mut request = ScanRequest::new(&source, &target, overwrite);
    request.catalog = CatalogConfig {
        follow_symlinks: job.follow_symlinks,
        include_hidden: !job.skip_hidden,
    };

    let settings = Settings {
        source_directory: source.to_string_lossy().into_owned(),
        target_directory: target.to_string_lossy().into_owned(),
        overwrite_duplicates: overwrite,
    };

    Ok(Resolved { request, settings })
}

fn remember(store: &SettingsStore, settings: &Settings) {
    match store.load() {
        Ok(saved) if saved == *settings => {}
        _ => {
            if let Err(e) = store.save(settings) {
                tracing::warn!("Could not save settings: {}", e);
            }
        }
    }
}

fn run_scan(store: &SettingsStore, job: JobArgs, output: OutputFormat) -> Result<()> {
    let Resolved { request, settings } = resolve(store, job)?;
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        print_header(&term, &request);
    }

    let summary = scan(request, pretty)?;
    remember(store, &settings);

    match output {
        OutputFormat::Pretty => print_plan(&term, &summary),
        OutputFormat::Json => print_json_plan(&summary),
    }

    Ok(())
}

fn run_transfer(store: &SettingsStore, job: JobArgs, yes: bool) -> Result<()> {
    let Resolved { request, settings } = resolve(store, job)?;
    let term = Term::stderr();

    print_header(&term, &request);
    let summary = scan(request, true)?;
    remember(store, &settings);
    print_summary(&term, &summary);

    if summary.total == 0 {
        return Ok(());
    }
    if summary.is_up_to_date() {
        term.write_line(&format!(
            "  {} Everything is already on the target.",
            style("✓").green()
        ))
        .ok();
        return Ok(());
    }
    if !yes && !confirm(&term) {
        term.write_line(&format!("{}", style("Nothing was copied.").dim()))
            .ok();
        return Ok(());
    }

    term.write_line(&format!(
        "{}",
        style("Type p + Enter to pause, r to resume, c to cancel.").dim()
    ))
    .ok();

    let control = TransferControl::new();
    spawn_key_listener(control.clone());

    let (sender, receiver) = EventChannel::new();
    let job = TransferJob::spawn_with_control(summary, sender, control);

    let mut view = TransferView::new();
    receiver.dispatch(&mut view);
    let report = job.join()?;

    print_report(&term, &report);
    Ok(())
}

fn run_config(store: &SettingsStore, action: ConfigAction) -> Result<()> {
    let term = Term::stdout();

    match action {
        ConfigAction::Show => {
            let settings = store.load()?;
            print_settings(&term, &settings);
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
        ConfigAction::Set {
            source,
            target,
            overwrite,
        } => {
            let mut settings = store.load()?;
            if let Some(source) = source {
                settings.source_directory = source.to_string_lossy().into_owned();
            }
            if let Some(target) = target {
                settings.target_directory = target.to_string_lossy().into_owned();
            }
            if let Some(overwrite) = overwrite {
                settings.overwrite_duplicates = overwrite;
            }
            store.save(&settings)?;
            print_settings(&term, &settings);
        }
    }

    Ok(())
}

/// Run a scan job to completion, drawing progress if asked
fn scan(request: ScanRequest, show_progress: bool) -> Result<ScanSummary> {
    let (sender, receiver) = EventChannel::new();
    let job = ScanJob::spawn(request, sender);

    let mut view = ScanView::new(show_progress);
    receiver.dispatch(&mut view);
    view.finish();

    Ok(job.join()?)
}

fn confirm(term: &Term) -> bool {
    term.write_str(&format!("{} ", style("Start transfer? [y/N]").bold()))
        .ok();
    match term.read_line() {
        Ok(answer) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

/// Map p / r / c lines on stdin to the transfer control.
///
/// The thread is detached; it ends with the process.
fn spawn_key_listener(control: TransferControl) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "p" => control.request_pause(),
                "r" => control.request_resume(),
                "c" => {
                    control.request_cancel();
                    break;
                }
                "" => {}
                other => tracing::debug!("Ignoring input {:?}", other),
            }
        }
    });
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// Progress display for the scan phases
struct ScanView {
    bar: Option<ProgressBar>,
    warnings: usize,
}

impl ScanView {
    fn new(show: bool) -> Self {
        let bar = show.then(|| {
            let pb = ProgressBar::new(0);
            pb.set_style(bar_style(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ));
            pb
        });
        Self { bar, warnings: 0 }
    }

    fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

impl JobObserver for ScanView {
    fn on_scan_progress(&mut self, current: usize, total: usize, label: &str) {
        if let Some(pb) = &self.bar {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
            pb.set_message(label.to_string());
        }
    }

    fn on_scan_warning(&mut self, path: &Path, message: &str) {
        self.warnings += 1;
        if let Some(pb) = &self.bar {
            pb.println(format!(
                "  {} {}: {}",
                style("!").yellow(),
                path.display(),
                message
            ));
        }
    }

    fn on_job_failed(&mut self, message: &str) {
        if let Some(pb) = &self.bar {
            pb.println(format!("{} {}", style("✗").red().bold(), message));
        }
    }
}

/// Progress bar and status log for a running transfer
struct TransferView {
    bar: ProgressBar,
}

impl TransferView {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {percent}% {msg}",
        ));
        Self { bar }
    }
}

impl JobObserver for TransferView {
    fn on_transfer_progress(&mut self, processed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(processed as u64);
    }

    fn on_status_message(&mut self, text: &str) {
        self.bar.println(format!("  {}", text));
        self.bar.set_message(text.to_string());
    }

    fn on_file_processed(&mut self, _index: usize, path: &Path, success: bool) {
        if !success {
            tracing::debug!("Transfer failed for {}", path.display());
        }
    }

    fn on_transfer_complete(&mut self, _cancelled: bool) {
        self.bar.finish_and_clear();
    }

    fn on_job_failed(&mut self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

fn print_header(term: &Term, request: &ScanRequest) {
    term.write_line(&format!(
        "{} {}",
        style("NAS Media Uploader").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} {}",
        style("from").dim(),
        request.source_root.display()
    ))
    .ok();
    term.write_line(&format!(
        "  {}   {}",
        style("to").dim(),
        request.destination_root.display()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_summary(term: &Term, summary: &ScanSummary) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    if summary.total == 0 {
        term.write_line("  No photos or videos found in the source folder.")
            .ok();
        return;
    }

    term.write_line(&format!(
        "  {} media files found",
        style(summary.total).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} will upload",
        style(summary.will_upload).green()
    ))
    .ok();
    if summary.overwrite_duplicates {
        term.write_line(&format!(
            "  {} will overwrite",
            style(summary.will_overwrite).yellow()
        ))
        .ok();
    }
    term.write_line(&format!(
        "  {} already on the target",
        style(summary.will_skip).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} to copy",
        style(format_bytes(summary.bytes_to_transfer)).yellow()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_plan(term: &Term, summary: &ScanSummary) {
    print_summary(term, summary);

    for descriptor in &summary.descriptors {
        let marker = match descriptor.disposition() {
            Disposition::WillUpload => style("+").green().to_string(),
            Disposition::WillOverwrite => style("~").yellow().to_string(),
            Disposition::WillSkip => style("=").dim().to_string(),
            Disposition::Unclassified => style("?").red().to_string(),
        };
        term.write_line(&format!(
            "  {} {:<12} {:<40} {}",
            marker,
            descriptor.date_folder(),
            descriptor.file_name(),
            style(format_bytes(descriptor.size_bytes())).dim()
        ))
        .ok();
    }

    if !summary.descriptors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("Nothing was copied. Run `nas-upload transfer` to upload.").dim()
        ))
        .ok();
    }
}

fn print_json_plan(summary: &ScanSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Could not render plan as JSON: {}", e),
    }
}

fn print_report(term: &Term, report: &TransferReport) {
    term.write_line("").ok();
    let headline = if report.cancelled {
        format!("{} Transfer Cancelled", style("■").yellow().bold())
    } else {
        format!("{} Transfer Complete", style("✓").green().bold())
    };
    term.write_line(&headline).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} copied, {} overwritten, {} skipped, {} failed",
        style(report.copied).green(),
        style(report.overwritten).yellow(),
        style(report.skipped).dim(),
        style(report.failed).red()
    ))
    .ok();
    term.write_line(&format!(
        "  {} written in {:.1}s",
        style(format_bytes(report.bytes_copied)).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    let errors = report.errors();
    if !errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Errors:").bold().underlined()))
            .ok();
        for error in errors {
            term.write_line(&format!("  {} {}", style("✗").red(), error))
                .ok();
        }
    }
}

fn print_settings(term: &Term, settings: &Settings) {
    let show = |value: &str| {
        if value.is_empty() {
            style("(not set)".to_string()).dim().to_string()
        } else {
            value.to_string()
        }
    };
    term.write_line(&format!("source:    {}", show(&settings.source_directory)))
        .ok();
    term.write_line(&format!("target:    {}", show(&settings.target_directory)))
        .ok();
    term.write_line(&format!("overwrite: {}", settings.overwrite_duplicates))
        .ok();
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

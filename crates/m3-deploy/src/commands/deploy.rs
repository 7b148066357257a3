use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use colored::Colorize;
use m3_archive::{
    deploy, load_catalog, ArchiveFormat, ArchiveWriter, DeploymentReport, WriteOptions,
};
use m3_mod_core::ModDescriptor;
use miette::Result;

use crate::{
    errors::CliError,
    println_pad,
    utils::{
        classification_rules, config, format_size, load_deployment_set,
        progress::TerminalProgress,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[value(name = "7z")]
    SevenZip,
    Zip,
}

impl From<OutputFormat> for ArchiveFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::SevenZip => ArchiveFormat::SevenZip,
            OutputFormat::Zip => ArchiveFormat::Zip,
        }
    }
}

#[derive(Debug)]
pub struct DeployModsArgs {
    pub mods: Vec<String>,
    pub output: String,
    pub format: OutputFormat,
    pub no_multithreading: bool,
    pub catalog: Option<String>,
    pub individual_extensions: Vec<String>,
}

pub fn deploy_mods(args: DeployModsArgs) -> Result<()> {
    let cfg = config::load_config();
    let set = load_deployment_set(&args.mods)?;
    let rules = classification_rules(&args.individual_extensions, &cfg);
    let format = ArchiveFormat::from(args.format);
    let output = resolve_output_path(&args.output, format);

    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        if !parent.as_std_path().exists() {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|e| CliError::directory_creation_failed(parent.to_path_buf(), e))?;
        }
    }

    println!(
        "{} {}",
        "📦 Deploying:".bright_blue().bold(),
        set.mods()
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
            .bright_cyan()
            .bold()
    );

    let mut writer = ArchiveWriter::new(WriteOptions {
        multithreaded: cfg.multithreaded_compression && !args.no_multithreading,
    })
    .with_progress(Arc::new(TerminalProgress::new(Duration::from_millis(
        cfg.progress_cooldown_ms,
    ))));

    let catalog_path = args
        .catalog
        .map(Utf8PathBuf::from)
        .or(cfg.third_party_catalog);
    if let Some(path) = catalog_path {
        let catalog =
            load_catalog(&path).map_err(|e| CliError::catalog_load_failed(path.clone(), e))?;
        writer = writer.with_catalog(Arc::new(catalog));
    }

    let report = deploy(&set, &rules, format, &output, &writer).map_err(CliError::from)?;
    drop(writer);

    print_report(&output, &report);
    Ok(())
}

/// Appends the format's extension when the output has none.
fn resolve_output_path(output: &str, format: ArchiveFormat) -> Utf8PathBuf {
    let path = Utf8PathBuf::from(output);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(format.extension())
    }
}

fn print_report(output: &Utf8PathBuf, report: &DeploymentReport) {
    println!(
        "{}\n{} {}",
        "✅ Archive created successfully!".bright_green().bold(),
        "📍 Path:".bright_green(),
        output.as_str().bright_white().bold()
    );
    println_pad!(
        "{} {}  {} {}  {} {}  {} {:.1}s",
        "Entries:".bright_white(),
        report.entries_written,
        "Size:".bright_white(),
        format_size(report.total_size),
        "Threads:".bright_white(),
        report.threads,
        "Time:".bright_white(),
        report.elapsed.as_secs_f64()
    );

    if report.submission_candidates.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        "⚠ These mods use DLC folders unknown to the third-party catalog:"
            .bright_yellow()
            .bold()
    );
    for candidate in &report.submission_candidates {
        println_pad!(
            "{} {} {} {}",
            "•".bright_cyan(),
            candidate.mod_name.bright_cyan().bold(),
            format!("({})", candidate.game).dimmed(),
            candidate.unknown_dlc_folders.join(", ")
        );
    }
    println_pad!(
        "{}",
        "Consider submitting them so other tools can identify the mods.".bright_yellow()
    );
}

use colored::Colorize;
use m3_archive::{collect, compression_threads, plan, CompressionClass, DeploymentPlan};
use miette::{IntoDiagnostic, Result};

use crate::{
    errors::CliError,
    println_pad,
    utils::{classification_rules, config, format_size, load_deployment_set},
};

#[derive(Debug)]
pub struct PlanModsArgs {
    pub mods: Vec<String>,
    pub json: bool,
    pub individual_extensions: Vec<String>,
}

pub fn plan_mods(args: PlanModsArgs) -> Result<()> {
    let cfg = config::load_config();
    let set = load_deployment_set(&args.mods)?;
    let rules = classification_rules(&args.individual_extensions, &cfg);

    let references = collect(&set);
    let plan = plan(&set, &references, &rules).map_err(CliError::from)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan).into_diagnostic()?);
        return Ok(());
    }

    let threads = compression_threads(
        cfg.multithreaded_compression,
        plan.total_size,
        num_cpus::get(),
    );

    println!(
        "{} {} {}",
        "🗂️  Archive layout:".bright_blue().bold(),
        format!("{} entries", plan.mappings.len()).bright_cyan().bold(),
        format!("({}, {} threads)", format_size(plan.total_size), threads).dimmed()
    );

    println_pad!("\n{}", "Directories:".bright_magenta().bold());
    for dir in plan.directories() {
        println_pad!("  {} {}", "📁".bright_cyan(), dir.in_archive_path);
    }

    println_pad!("\n{}", "Files:".bright_magenta().bold());
    for file in plan.files() {
        let class = plan
            .class_of(&file.in_archive_path)
            .map(class_label)
            .unwrap_or_default();
        println_pad!("  {:<10} {}", class, file.in_archive_path);
    }

    if !plan.embedded_tlk.is_empty() {
        println_pad!("\n{}", "Embedded TLK merges:".bright_magenta().bold());
        for merge in &plan.embedded_tlk {
            println_pad!(
                "  {} {} {} {}",
                "•".bright_cyan(),
                merge.mod_name.bright_cyan().bold(),
                "→".dimmed(),
                merge.archive_folder()
            );
        }
    }

    print_class_summary(&plan);
    Ok(())
}

fn class_label(class: CompressionClass) -> String {
    match class {
        CompressionClass::NoCompress => class.to_string().bright_yellow().to_string(),
        CompressionClass::IndividualCompress => class.to_string().bright_green().to_string(),
        CompressionClass::SolidCompress => class.to_string().bright_blue().to_string(),
    }
}

fn print_class_summary(plan: &DeploymentPlan) {
    println!();
    for class in [
        CompressionClass::SolidCompress,
        CompressionClass::IndividualCompress,
        CompressionClass::NoCompress,
    ] {
        println_pad!(
            "{} {}",
            format!("{class}:").bright_white(),
            plan.files_of_class(class).len()
        );
    }
}

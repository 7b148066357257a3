use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use m3_archive::ClassificationRules;
use miette::Result;

fn update_config(update: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config();
    update(&mut cfg);
    config::save_config(&cfg).map_err(|e| miette::miette!("Failed to save config: {}", e))
}

fn print_entry(name: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{}:", name).bright_white(), value);
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    print_entry("config_file", config_path);
    print_entry("multithreaded_compression", cfg.multithreaded_compression);

    match &cfg.third_party_catalog {
        Some(path) => {
            let status = if path.as_std_path().is_file() {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            print_entry("third_party_catalog", format!("{} {}", path, status));
        }
        None => print_entry("third_party_catalog", "(not set)".bright_yellow()),
    }

    if cfg.individual_compress_extensions.is_empty() {
        print_entry("individual_compress_extensions", "(none)".bright_yellow());
    } else {
        print_entry(
            "individual_compress_extensions",
            cfg.individual_compress_extensions.join(", "),
        );
    }
    print_entry("progress_cooldown_ms", cfg.progress_cooldown_ms);

    println!();
    Ok(())
}

pub fn set_catalog(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !path.as_std_path().is_file() {
        eprintln!(
            "  {}",
            "The path must point to a third-party mod catalog JSON file.".bright_yellow()
        );
        return Err(miette::miette!("Catalog file not found: {}", path));
    }

    update_config(|cfg| cfg.third_party_catalog = Some(path.clone()))?;

    println!("{}", "✓ Catalog set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );
    Ok(())
}

pub fn set_multithreading(enabled: bool) -> Result<()> {
    update_config(|cfg| cfg.multithreaded_compression = enabled)?;

    let state = if enabled { "enabled" } else { "disabled" };
    println!(
        "{}",
        format!("✓ Multithreaded compression {}", state)
            .bright_green()
            .bold()
    );
    Ok(())
}

pub fn set_individual_extensions(extensions: Vec<String>) -> Result<()> {
    let normalized: Vec<String> = ClassificationRules::with_individual_extensions(&extensions)
        .individual_extensions()
        .map(str::to_string)
        .collect();

    update_config(|cfg| cfg.individual_compress_extensions = normalized.clone())?;

    if normalized.is_empty() {
        println!(
            "{}",
            "✓ All compressible files will be packed solid".bright_green().bold()
        );
    } else {
        println!(
            "{} {}",
            "✓ Individually compressed extensions:".bright_green().bold(),
            normalized.join(", ").bright_white()
        );
    }
    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    config::save_config(&AppConfig::default())
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    Ok(())
}

use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{deploy_mods, plan_mods, DeployModsArgs, OutputFormat, PlanModsArgs};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pack one or more mods into a single archive
    Deploy {
        /// Mod folders to deploy, each containing a moddesc.ini
        #[arg(short, long = "mod", required = true, num_args = 1..)]
        mods: Vec<String>,

        /// The archive file to create
        #[arg(short, long)]
        output: String,

        /// The archive format
        #[arg(long, value_enum, default_value = "7z")]
        format: OutputFormat,

        /// Compress with a single thread
        #[arg(long)]
        no_multithreading: bool,

        /// Third-party mod catalog (JSON) used for the submission report
        #[arg(long)]
        catalog: Option<String>,

        /// Extensions compressed individually instead of solid (overrides config)
        #[arg(long = "individual-ext")]
        individual_extensions: Vec<String>,
    },
    /// Show the archive layout of one or more mods without writing anything
    Plan {
        /// Mod folders to plan, each containing a moddesc.ini
        #[arg(short, long = "mod", required = true, num_args = 1..)]
        mods: Vec<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Extensions compressed individually instead of solid (overrides config)
        #[arg(long = "individual-ext")]
        individual_extensions: Vec<String>,
    },
    /// Manage the CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Reset the configuration to defaults
    Reset,
    /// Set the third-party mod catalog file
    SetCatalog {
        /// Path to the catalog JSON file
        path: String,
    },
    /// Enable or disable multithreaded compression
    SetMultithreading {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set the extensions that are compressed individually
    SetIndividualExtensions {
        extensions: Vec<String>,
    },
}

fn parse_args() -> Args {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "m3_deploy=info,m3_archive=warn,m3_mod_project=warn".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let args = parse_args();

    match args.command {
        Commands::Deploy {
            mods,
            output,
            format,
            no_multithreading,
            catalog,
            individual_extensions,
        } => deploy_mods(DeployModsArgs {
            mods,
            output,
            format,
            no_multithreading,
            catalog,
            individual_extensions,
        }),
        Commands::Plan {
            mods,
            json,
            individual_extensions,
        } => plan_mods(PlanModsArgs {
            mods,
            json,
            individual_extensions,
        }),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Reset => commands::config::reset_config(),
            ConfigAction::SetCatalog { path } => commands::config::set_catalog(path),
            ConfigAction::SetMultithreading { enabled } => {
                commands::config::set_multithreading(enabled)
            }
            ConfigAction::SetIndividualExtensions { extensions } => {
                commands::config::set_individual_extensions(extensions)
            }
        },
    }
}

use akiba_cli::commands::config::ConfigCommand;
use akiba_cli::commands::identify::IdentifyArgs;
use akiba_cli::commands::local_mapping::LocalMappingArgs;
use akiba_cli::commands::rename::RenameArgs;
use akiba_cli::commands::{config, identify, local_mapping, rename};
use akiba_cli::config::ConfigManager;
use akiba_cli::error::CliResult;
use akiba_cli::terminal::Reporter;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

#[derive(Parser)]
#[command(name = "akiba")]
#[command(author, version, about = "Anime file identification and renaming against AniDB", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify episode files and rename them into the library
    Rename(RenameArgs),

    /// Resolve a show directory to its ids and list its episodes
    Identify(IdentifyArgs),

    /// Manage local mapping entries
    LocalMapping(LocalMappingArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("akiba_core", log::LevelFilter::Debug)
            .filter_module("akiba_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(error) = run(cli.command).await {
        eprint!("{}", error.format_for_user(cli.debug));
        std::process::exit(error.exit_code() as i32);
    }
}

async fn run(command: Commands) -> CliResult<()> {
    let manager = ConfigManager::new();
    let reporter = Reporter::new();

    match command {
        Commands::Rename(args) => {
            let config = manager.load()?;
            rename::run(args, &config, &reporter).await
        }
        Commands::Identify(args) => {
            let config = manager.load()?;
            identify::run(args, &config, &reporter).await
        }
        Commands::LocalMapping(args) => {
            let config = manager.load()?;
            local_mapping::run(args, &config, &reporter).await
        }
        Commands::Config { command } => config::run(command, &manager).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use effort_timer::config::{Config, get_config_path};
use effort_timer::duration::parse_duration;
use effort_timer::{DeferredQueue, Entry, Notifier, RestTimer};

use crate::session::{Session, Terminal, whole_minutes};

#[derive(Parser)]
#[command(name = "effort-timer")]
#[command(about = "Rest timer armed from effort estimates", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/effort-timer/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (the default)
    Session,
    /// Start a rest timer and wait for it
    Start {
        /// Duration such as 25, 25m, 1m30s or 1:30
        #[arg(long)]
        duration: Option<String>,
    },
    /// Run the effort gate for one activity, then wait for any rest timer
    ClockIn {
        /// Effort to record before the gate runs; prompts when omitted
        #[arg(long)]
        effort: Option<String>,
        /// Heading of the activity
        #[arg(default_value = "Untitled")]
        heading: String,
    },
    /// Print the configuration
    Config {
        /// Print only the file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(get_config_path);
    let config = Config::load_or_default(&config_path);

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Config { path } => {
            if path {
                println!("{}", config_path.display());
            } else {
                println!("# {}", config_path.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        Commands::Session => {
            let mut term = Terminal::spawn()?;
            session(config, config_path).run(&mut term)?;
        }
        Commands::Start { duration } => {
            let minutes = match duration {
                Some(duration) => Some(whole_minutes(parse_duration(&duration)?)),
                None => None,
            };
            let mut term = Terminal::spawn()?;
            let mut session = session(config, config_path);
            session.start(minutes, &mut term);
            session.wait(&mut term);
        }
        Commands::ClockIn { effort, heading } => {
            let mut term = Terminal::spawn()?;
            let mut session = session(config, config_path).with_entry(Entry::new(heading));
            session.clock_in(effort.as_deref(), &mut term);
            session.wait(&mut term);
        }
    }
    Ok(())
}

fn session(config: Config, config_path: PathBuf) -> Session<DeferredQueue> {
    let notifier = Notifier::from_config(&config.notifier);
    let timer = RestTimer::new(DeferredQueue::new(), notifier);
    Session::new(timer, config, config_path)
}

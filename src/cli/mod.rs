pub mod process;
pub mod report;

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use process::{kill_previous_servers, restart_server};
use report::{print_history, print_stats, print_status};
use tracing::level_filters::LevelFilter;

use crate::{
    config::Config,
    daemon::start_daemon,
    store::file_store::FilePrefsStore,
    tracker::{history::MAX_HISTORY_DAYS, parse_goal, StepTracker, TrackerSettings},
    utils::{
        clock::DefaultClock,
        dir::resolve_application_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Steptrack", version, long_about = None)]
#[command(about = "Application for counting daily steps", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrackingState {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {},
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {},
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Show today's steps and progress towards the goal")]
    Status {},
    #[command(about = "Show steps for the last days")]
    History {
        #[arg(short, long, default_value_t = 7, value_parser = days_range(), help = "Amount of days including today")]
        days: u32,
    },
    #[command(about = "Show total, average, max and min steps for the last days")]
    Stats {
        #[arg(short, long, default_value_t = 30, value_parser = days_range(), help = "Amount of days including today")]
        days: u32,
    },
    #[command(about = "Change the daily goal")]
    Goal {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    #[command(about = "Enable or disable background tracking")]
    Tracking { state: TrackingState },
}

fn days_range() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=MAX_HISTORY_DAYS as i64)
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = resolve_application_path(args.dir)?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Init {} => {
            open_tracker(&app_dir)?
                .set_background_tracking(true)
                .await?;
            restart_server(&app_dir)?;
            Ok(())
        }
        Commands::Stop {} => {
            kill_previous_servers(&env::current_exe()?)?;
            Ok(())
        }
        Commands::Serve {} => {
            start_daemon(app_dir).await?;
            Ok(())
        }
        Commands::Status {} => {
            let tracker = open_tracker(&app_dir)?;
            print_status(&tracker.summary().await?);
            Ok(())
        }
        Commands::History { days } => {
            let tracker = open_tracker(&app_dir)?;
            let history = tracker.history(days).await?;
            let goal = tracker.daily_goal().await?;
            print_history(&history, goal, tracker.today());
            Ok(())
        }
        Commands::Stats { days } => {
            let tracker = open_tracker(&app_dir)?;
            print_stats(&tracker.stats(days).await?);
            Ok(())
        }
        Commands::Goal { value } => {
            let tracker = open_tracker(&app_dir)?;
            let goal = parse_goal(&value)?;
            tracker.set_goal(goal).await?;
            println!("Daily goal set to {goal} steps");
            Ok(())
        }
        Commands::Tracking { state } => {
            let tracker = open_tracker(&app_dir)?;
            match state {
                TrackingState::On => {
                    tracker.set_background_tracking(true).await?;
                    restart_server(&app_dir)?;
                }
                TrackingState::Off => {
                    tracker.set_background_tracking(false).await?;
                    kill_previous_servers(&env::current_exe()?)?;
                    println!("Background tracking stopped");
                }
            }
            Ok(())
        }
    }
}

fn open_tracker(app_dir: &Path) -> Result<StepTracker<FilePrefsStore>> {
    let config = Config::load(app_dir)?;
    Ok(StepTracker::new(
        FilePrefsStore::in_dir(app_dir)?,
        Box::new(DefaultClock),
        TrackerSettings::from(&config),
    ))
}

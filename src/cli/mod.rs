pub mod output;
pub mod summary;
pub mod timer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use summary::{SummaryCommand, process_summary_command};
use timer::run_timer;
use tracing::{level_filters::LevelFilter, warn};

use crate::{
    config::{ensure_default_config, load_config},
    storage::{LogBackend, local::LocalBackend},
    timer::ShortSessionPolicy,
    tracker::{StudyTracker, TrackerError},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{CLI_PREFIX, enable_logging},
    },
};

#[derive(Parser, Debug)]
#[command(name = "studylog", version, long_about = None)]
#[command(about = "Track study time for exam preparation", long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print logs to stderr")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Time a study session. Press Enter or Ctrl-C to stop and record it")]
    Timer {
        #[arg(short, long, help = "Subject label or its short name, e.g. 憲法")]
        subject: String,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(long, help = "Override what happens to sessions shorter than the minimum")]
        policy: Option<ShortSessionPolicy>,
    },
    #[command(about = "Record minutes studied without the timer")]
    Add {
        #[arg(short, long, help = "Subject label or its short name, e.g. 憲法")]
        subject: String,
        #[arg(short, long, allow_negative_numbers = true)]
        minutes: i64,
        #[arg(short, long)]
        notes: Option<String>,
    },
    #[command(about = "Delete an entry by the position shown in `list`")]
    Delete { position: usize },
    #[command(about = "List every recorded entry")]
    List,
    #[command(about = "Show today's total, goal progress and per subject totals")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "List configured subjects")]
    Subjects,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    ensure_default_config(&dir)?;
    let config = load_config(&dir)?;
    let settings = config.settings()?;
    let backend = LocalBackend::open(&dir.join(&config.log_file), settings.zone)?;
    let tracker = StudyTracker::new(backend, settings, Box::new(DefaultClock));

    match args.commands {
        Commands::Timer {
            subject,
            notes,
            policy,
        } => {
            let tracker = match policy {
                Some(policy) => tracker.with_short_session_policy(policy),
                None => tracker,
            };
            run_timer(&tracker, &subject, notes).await
        }
        Commands::Add {
            subject,
            minutes,
            notes,
        } => {
            let entry = tracker.add_manual(&subject, minutes, notes).await?;
            println!(
                "Recorded {} minutes of {}",
                entry.duration_minutes, entry.subject
            );
            Ok(())
        }
        Commands::Delete { position } => delete_entry(&tracker, position).await,
        Commands::List => {
            output::print_entries(&tracker.entries().await);
            Ok(())
        }
        Commands::Summary { command } => process_summary_command(&tracker, command).await,
        Commands::Subjects => {
            output::print_subjects(tracker.settings().subjects.iter());
            Ok(())
        }
    }
}

/// `position` is 1-based as printed by `list`.
async fn delete_entry<B: LogBackend>(tracker: &StudyTracker<B>, position: usize) -> Result<()> {
    let Some(index) = position.checked_sub(1) else {
        anyhow::bail!("Positions start at 1");
    };
    match tracker.delete(index).await {
        Ok(entry) => {
            println!(
                "Deleted {} minutes of {} from {}",
                entry.duration_minutes,
                entry.subject,
                entry.timestamp.format("%Y-%m-%d %H:%M")
            );
            Ok(())
        }
        Err(e @ TrackerError::NotFound { .. }) => {
            // The log may have changed since it was listed, so show what is there now.
            warn!("Delete target vanished: {e}");
            eprintln!("{e}. Current entries:");
            output::print_entries(&tracker.entries().await);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

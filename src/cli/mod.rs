pub mod day;
pub mod output;
pub mod report;
pub mod settings;
pub mod transfer;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use report::ReportCommand;
use settings::{AliasCommand, MeetingCommand, ProjectsCommand};
use tracing::{debug, level_filters::LevelFilter};
use transfer::ExportFormat;

use crate::{
    engine::{
        day::{DayBook, DayRecord},
        error::TrackError,
    },
    storage::{
        entities::Settings,
        json_store::{JsonStore, Store},
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, create_dir},
        logging::{enable_logging, CLI_PREFIX},
        percentage::Amount,
        time::parse_date,
    },
};

#[derive(Parser, Debug)]
#[command(name = "timetrack", version, long_about = None)]
#[command(about = "Track how your working day is split between projects", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

/// Date a day command applies to. Defaults to today.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TargetDate {
    #[arg(
        short,
        long = "date",
        help = "Date to operate on. Examples are \"15-03-2025\", \"15/03/2025\", \"2025-03-15\", \"yesterday\""
    )]
    date: Option<String>,
}

impl TargetDate {
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate> {
        match &self.date {
            None => Ok(today),
            Some(v) => parse_date(v, today).map_err(|e| {
                Args::command()
                    .error(clap::error::ErrorKind::ValueValidation, e.to_string())
                    .into()
            }),
        }
    }
}

fn project_name(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("project name cannot be empty".to_string());
    }
    Ok(value.to_string())
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show how a day is allocated. This is the default command")]
    Status {
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(
        about = "Track time for a project. Amount is hours of an 8 hour day (2.5) or a percentage (30%)"
    )]
    Add {
        #[arg(value_parser = project_name)]
        project: String,
        amount: Amount,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(about = "Change the time of a project that was already tracked")]
    Edit {
        #[arg(value_parser = project_name)]
        project: String,
        amount: Amount,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(about = "Give all remaining time of a day to a project")]
    Fill {
        #[arg(value_parser = project_name)]
        project: String,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(alias = "remove", about = "Remove a project from a day")]
    Rm {
        #[arg(value_parser = project_name)]
        project: String,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(about = "Remove the last added or edited project")]
    Undo {
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(alias = "ex", about = "Exclude time spent on a one-off meeting")]
    Exclude {
        name: String,
        amount: Amount,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(about = "Remove an excluded meeting from a day")]
    Rmex {
        name: String,
        #[command(flatten)]
        target: TargetDate,
    },
    #[command(about = "Delete everything stored for a day")]
    Clear {
        #[command(flatten)]
        target: TargetDate,
        #[arg(short, long, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(alias = "cal", alias = "calendar", about = "Display recent days as a table")]
    Show {
        #[arg(default_value_t = 7, help = "Number of days to show")]
        days: usize,
    },
    #[command(about = "Manage recurring meetings")]
    Meeting {
        #[command(subcommand)]
        command: MeetingCommand,
    },
    #[command(about = "Manage the list of known projects")]
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
    #[command(about = "Manage short aliases for projects")]
    Alias {
        #[command(subcommand)]
        command: AliasCommand,
    },
    #[command(about = "Import days from a timesheet CSV")]
    Import { file: PathBuf },
    #[command(about = "Export tracked time")]
    Export {
        #[arg(value_enum, default_value_t = ExportFormat::Week)]
        format: ExportFormat,
        file: Option<PathBuf>,
    },
    #[command(about = "Summaries of tracked time")]
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

/// Loaded application state. Every command works on this snapshot and saves it back whole.
pub struct Session<S> {
    store: S,
    pub settings: Settings,
    pub book: DayBook,
    pub today: NaiveDate,
}

impl<S: Store> Session<S> {
    /// Loads the state and makes sure today's obligations are stored, so that later changes to
    /// recurring meetings don't rewrite it.
    pub async fn open(store: S, clock: &impl Clock) -> Result<Self> {
        let settings = store.load_settings().await?;
        let mut book = store.load_days().await?;
        let today = clock.today();

        if !book.contains(today) {
            let day = DayRecord::materialize(today, &settings.obligations);
            if day.excluded_percent() > 0. {
                debug!("Storing obligations for {today}");
                book.insert(day);
                store.save_days(&book).await?;
            }
        }

        Ok(Self {
            store,
            settings,
            book,
            today,
        })
    }

    pub async fn save_days(&self) -> Result<()> {
        self.store.save_days(&self.book).await
    }

    pub async fn save_settings(&self) -> Result<()> {
        self.store.save_settings(&self.settings).await
    }

    /// Suffix naming the date when it isn't today.
    pub fn on_date(&self, date: NaiveDate) -> String {
        if date == self.today {
            String::new()
        } else {
            format!(" on {date}")
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => create_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let session = Session::open(JsonStore::new(app_dir)?, &DefaultClock).await?;
    let command = args.commands.unwrap_or(Commands::Status {
        target: TargetDate::default(),
    });
    process_command(command, session).await
}

async fn process_command<S: Store>(command: Commands, mut session: Session<S>) -> Result<()> {
    let session = &mut session;
    let result = match command {
        Commands::Status { target } => {
            let date = target.resolve(session.today)?;
            day::status(session, date);
            Ok(())
        }
        Commands::Add {
            project,
            amount,
            target,
        } => day::add(session, &project, amount, target.resolve(session.today)?).await,
        Commands::Edit {
            project,
            amount,
            target,
        } => day::edit(session, &project, amount, target.resolve(session.today)?).await,
        Commands::Fill { project, target } => {
            day::fill(session, &project, target.resolve(session.today)?).await
        }
        Commands::Rm { project, target } => {
            day::remove(session, &project, target.resolve(session.today)?).await
        }
        Commands::Undo { target } => day::undo(session, target.resolve(session.today)?).await,
        Commands::Exclude {
            name,
            amount,
            target,
        } => day::exclude(session, &name, amount, target.resolve(session.today)?).await,
        Commands::Rmex { name, target } => {
            day::remove_exclusion(session, &name, target.resolve(session.today)?).await
        }
        Commands::Clear { target, yes } => {
            day::clear(session, target.resolve(session.today)?, yes).await
        }
        Commands::Show { days } => {
            output::calendar::print_calendar(&session.book, days);
            Ok(())
        }
        Commands::Meeting { command } => settings::process_meeting_command(session, command).await,
        Commands::Projects { command } => {
            settings::process_projects_command(session, command).await
        }
        Commands::Alias { command } => settings::process_alias_command(session, command).await,
        Commands::Import { file } => transfer::import(session, &file).await,
        Commands::Export { format, file } => transfer::export(session, format, file).await,
        Commands::Report { command } => {
            report::process_report_command(session, command);
            Ok(())
        }
    };

    notify(result)
}

/// Engine failures are reported to the user, anything else is a real error.
fn notify(result: Result<()>) -> Result<()> {
    match result {
        Err(e) => match e.downcast::<TrackError>() {
            Ok(track_error) => {
                output::print_track_error(&track_error);
                Ok(())
            }
            Err(e) => Err(e),
        },
        ok => ok,
    }
}

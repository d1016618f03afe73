use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use habit_core::calendar::{weeks, DayCell};
use habit_core::config::parse_locale;
use habit_core::{DayStatus, EngineConfig, HabitService, HabitSummary};
use tracing::{debug, info};

use crate::store::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "habits", about = "Habit calendar, toggles and streaks")]
pub struct Cli {
    /// JSON file holding one habit record.
    #[arg(long, short)]
    pub file: PathBuf,
    /// Reference day (YYYY-MM-DD); defaults to the local date.
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,
    /// Account creation day; overrides the record and HABIT_DEFAULT_EPOCH.
    #[arg(long, value_parser = parse_date)]
    pub epoch: Option<NaiveDate>,
    /// Locale for weekday names, e.g. de_DE; overrides HABIT_LOCALE.
    #[arg(long)]
    pub locale: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render one month as a grid.
    Calendar {
        /// Month as YYYY-MM; defaults to the month of `--today`.
        #[arg(long)]
        month: Option<String>,
    },
    /// Print totals and streaks.
    Summary,
    /// Print the state of one day.
    Status {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Click a day cell and write the result back to the file.
    Toggle {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub today: NaiveDate,
    pub epoch: Option<NaiveDate>,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut engine = EngineConfig::from_env();
        if let Some(name) = &cli.locale {
            let locale =
                parse_locale(name).with_context(|| format!("unknown locale `{name}`"))?;
            engine = engine.with_locale(locale);
        }
        Ok(Self {
            engine,
            today: cli.today.unwrap_or_else(|| Local::now().date_naive()),
            epoch: cli.epoch,
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_cli(&cli)?;
    let store = JsonFileStore::new(&cli.file);
    let record = store.load_record()?;
    let epoch = config
        .epoch
        .unwrap_or_else(|| record.epoch(&config.engine));
    let id = store.habit_id();
    let habit = record.into_habit(&config.engine);
    info!(habit = %id, %epoch, today = %config.today, "loaded habit");

    let title = if habit.title.is_empty() {
        id.clone()
    } else {
        habit.title.clone()
    };
    let service = HabitService::builder()
        .config(config.engine.clone())
        .epoch(epoch)
        .add_habit(id.clone(), habit)
        .with_store(Box::new(store))
        .build();

    match cli.command {
        Command::Calendar { month } => {
            let (year, month) = match month {
                Some(raw) => {
                    parse_month(&raw).with_context(|| format!("invalid month `{raw}`"))?
                }
                None => (config.today.year(), config.today.month()),
            };
            let cells = service.month_grid(&id, year, month, config.today)?;
            debug!(cells = cells.len(), "rendering month");
            print!("{}", render_month(&title, year, month, &cells));
        }
        Command::Summary => {
            let summary = service.summary(&id, config.today)?;
            print!("{}", render_summary(&title, &summary));
        }
        Command::Status { date } => {
            let state = service.classify(&id, date, config.today)?;
            let interactive = if state.is_interactive() {
                ""
            } else {
                ", read-only"
            };
            println!("{date}: {state}{interactive}");
        }
        Command::Toggle { date } => {
            let mark = service.toggle_day(&id, date, config.today)?;
            let state = service.classify(&id, date, config.today)?;
            println!("{date}: wrote {mark}, now {state}");
        }
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

pub fn parse_month(value: &str) -> Option<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()?;
    Some((first.year(), first.month()))
}

fn symbol(status: DayStatus) -> char {
    match status {
        DayStatus::Completed => 'x',
        DayStatus::Missed => '!',
        DayStatus::Planned => 'o',
        DayStatus::PlannedFuture => '+',
        DayStatus::NotScheduled => '.',
        DayStatus::NotScheduledFuture => ' ',
        DayStatus::Inactive => '~',
    }
}

pub fn render_month(title: &str, year: i32, month: u32, cells: &[DayCell]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title} ({year:04}-{month:02})");
    let _ = writeln!(out, " Mo  Tu  We  Th  Fr  Sa  Su");
    for row in weeks(cells) {
        let line: String = row
            .iter()
            .map(|cell| match cell {
                Some(cell) => format!(
                    "{:>2}{}{}",
                    cell.date.day(),
                    symbol(cell.state.status),
                    if cell.state.today { '<' } else { ' ' }
                ),
                None => "    ".to_string(),
            })
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }
    let _ = writeln!(
        out,
        "x done  ! missed  o planned  + upcoming  . off  ~ before start  < today"
    );
    out
}

pub fn render_summary(title: &str, summary: &HabitSummary) -> String {
    format!(
        "{title}\n  completed: {}\n  missed:    {}\n  current streak: {}\n  longest streak: {}\n",
        summary.total_completed,
        summary.total_missed,
        summary.current_streak,
        summary.longest_streak
    )
}

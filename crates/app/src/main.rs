mod config;

use std::fmt;

use prep_core::model::{Letter, QuestionId, RoomId, User, UserId};
use services::navigation::{self, Route, RouteOutcome};
use services::question_bank::ANSWER_MILESTONE;
use services::{AppServices, Clock, QuestionFilter, StatusFilter};
use storage::LocalStore;
use storage::sqlite::SqliteKv;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidQuestionId { raw: String },
    InvalidLetter { raw: String },
    InvalidStatus { raw: String },
    InvalidRoom { raw: String },
    InvalidDbUrl { raw: String },
    UnknownUser(UserId),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid question id: {raw}"),
            ArgsError::InvalidLetter { raw } => write!(f, "invalid letter (A-E): {raw}"),
            ArgsError::InvalidStatus { raw } => {
                write!(f, "invalid --status value (all|solved|unsolved): {raw}")
            }
            ArgsError::InvalidRoom { raw } => write!(f, "invalid --room value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnknownUser(id) => write!(f, "no user with id {id}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- seed      [--db <sqlite_url>]");
    eprintln!(
        "  cargo run -p app -- questions [--discipline <d>] [--board <b>] [--status all|solved|unsolved]"
    );
    eprintln!("  cargo run -p app -- answer    <question-id> <letter>");
    eprintln!("  cargo run -p app -- stats");
    eprintln!("  cargo run -p app -- rooms     [--room <slug>]");
    eprintln!("  cargo run -p app -- routes");
    eprintln!();
    eprintln!("Every command also accepts --db <sqlite_url> and --user <uuid>.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, PREP_LOG, PREP_USER_ID, PREP_POLL_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Seed,
    Questions,
    Answer,
    Stats,
    Rooms,
    Routes,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "seed" => Some(Self::Seed),
            "questions" => Some(Self::Questions),
            "answer" => Some(Self::Answer),
            "stats" => Some(Self::Stats),
            "rooms" => Some(Self::Rooms),
            "routes" => Some(Self::Routes),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    db_url: Option<String>,
    user: Option<UserId>,
    filter: QuestionFilter,
    room: Option<RoomId>,
    positional: Vec<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    parsed.user = Some(id);
                }
                "--discipline" => {
                    parsed.filter = parsed
                        .filter
                        .with_discipline(require_value(args, "--discipline")?);
                }
                "--board" => {
                    parsed.filter = parsed.filter.with_board(require_value(args, "--board")?);
                }
                "--status" => {
                    let value = require_value(args, "--status")?;
                    let status: StatusFilter = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidStatus { raw: value.clone() })?;
                    parsed.filter = parsed.filter.with_status(status);
                }
                "--room" => {
                    let value = require_value(args, "--room")?;
                    let room = RoomId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidRoom { raw: value })?;
                    parsed.room = Some(room);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => parsed.positional.push(arg),
            }
        }

        Ok(parsed)
    }

    fn answer_target(&self) -> Result<(QuestionId, Letter), ArgsError> {
        let mut positional = self.positional.iter();
        let raw_id = positional.next().ok_or(ArgsError::MissingArgument {
            name: "question-id",
        })?;
        let raw_letter = positional
            .next()
            .ok_or(ArgsError::MissingArgument { name: "letter" })?;
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra.clone()));
        }
        let id = raw_id
            .parse()
            .map_err(|_| ArgsError::InvalidQuestionId { raw: raw_id.clone() })?;
        let letter = raw_letter
            .parse()
            .map_err(|_| ArgsError::InvalidLetter {
                raw: raw_letter.clone(),
            })?;
        Ok((id, letter))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.starts_with("sqlite::memory:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open services and resolve the acting user.
async fn open(
    db_url: &str,
    requested: Option<UserId>,
) -> Result<(AppServices, User), Box<dyn std::error::Error>> {
    let services = AppServices::new_sqlite(db_url, Clock::system()).await?;
    let user = match requested {
        Some(id) => services
            .sign_in_as(id)
            .await?
            .ok_or(ArgsError::UnknownUser(id))?,
        None => services.current_user().await?,
    };
    debug!(user = %user.id, role = %user.role, "acting user resolved");
    Ok((services, user))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(&config.log_filter);

    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if cmd != Command::Answer {
        if let Some(extra) = args.positional.first() {
            return Err(ArgsError::UnknownArg(extra.clone()).into());
        }
    }

    let db_url = normalize_sqlite_url(args.db_url.clone().unwrap_or(config.db_url));
    prepare_sqlite_file(&db_url)?;
    debug!(db = %db_url, command = ?cmd, "starting");

    let requested = args.user.or(config.user_id);

    match cmd {
        Command::Seed => {
            let kv = SqliteKv::connect(&db_url).await?;
            kv.migrate().await?;
            let written = LocalStore::new(kv).materialize_seeds().await?;
            info!(count = written.len(), "seed complete");
            for key in &written {
                println!("seeded {key}");
            }
            if written.is_empty() {
                println!("all collections already present");
            }
        }
        Command::Questions => {
            let (services, user) = open(&db_url, requested).await?;
            let session = services
                .question_bank()
                .start_session(user.id, args.filter.clone())
                .await?;
            println!("{} question(s)", session.len());
            for q in session.questions() {
                let mark = if session.is_solved(q.id()) { "x" } else { " " };
                println!("[{mark}] {}  {} / {}", q.id(), q.discipline(), q.board());
            }
        }
        Command::Answer => {
            let (id, letter) = args.answer_target()?;
            let (services, user) = open(&db_url, requested).await?;
            let bank = services.question_bank();
            let mut session = bank.start_session(user.id, QuestionFilter::all()).await?;
            if !session.jump_to(id, Clock::system().now()) {
                return Err(ArgsError::InvalidQuestionId { raw: id.to_string() }.into());
            }
            session.select(letter)?;
            let outcome = bank.submit(&mut session, user.id).await?;
            let verdict = if outcome.attempt.is_correct() {
                "correct"
            } else {
                "wrong"
            };
            println!("{verdict} ({} answer(s) on record)", outcome.total_attempts);
            if outcome.milestone_reached {
                println!("milestone: {ANSWER_MILESTONE} questions answered");
            }
        }
        Command::Stats => {
            let (services, user) = open(&db_url, requested).await?;
            let report = services.stats().report_for(user.id).await?;
            let s = report.summary;
            println!(
                "{}: {} answered, {} correct, {} wrong, {}% accuracy",
                user.name,
                s.total,
                s.correct,
                s.wrong,
                s.accuracy_percent()
            );
            for row in &report.by_discipline {
                println!(
                    "  {}: {}/{} ({}%)",
                    row.discipline,
                    row.summary.correct,
                    row.summary.total,
                    row.summary.accuracy_percent()
                );
            }
            for attempt in &report.recent {
                let mark = if attempt.is_correct() { "ok" } else { "x" };
                println!("  {} {} {mark}", attempt.answered_at(), attempt.question_id());
            }
        }
        Command::Rooms => {
            let (services, _) = open(&db_url, requested).await?;
            if let Some(room) = args.room {
                let feed = services.chat_feed(Some(room.clone()), config.poll_interval);
                let mut rx = feed.subscribe();
                rx.changed().await?;
                let snapshot = rx.borrow_and_update().clone();
                feed.shutdown().await;
                println!("#{room}: {} message(s)", snapshot.messages.len());
                for message in &snapshot.messages {
                    println!("  {}: {}", message.author_name(), message.text());
                }
            } else {
                for room in services.chat().rooms().await? {
                    println!("#{}  {}", room.id, room.name);
                }
            }
        }
        Command::Routes => {
            let (_, user) = open(&db_url, requested).await?;
            for route in Route::ALL {
                let state = match navigation::resolve(route.path(), user.role) {
                    RouteOutcome::View(_) => "open",
                    RouteOutcome::Denied(_) => navigation::ADMIN_DENIED_MESSAGE,
                    RouteOutcome::NotFound => "missing",
                };
                println!("{:<12} {:<16} {state}", route.path(), route.label());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn question_filters_are_collected() {
        let args = parse(&["--discipline", "Direito Penal", "--status", "solved"]).unwrap();
        assert_eq!(args.filter.discipline(), Some("Direito Penal"));
        assert_eq!(args.filter.status(), StatusFilter::Solved);
        assert!(args.filter.board().is_none());
    }

    #[test]
    fn answer_target_needs_id_and_letter() {
        let id = "00000000-0000-0000-0000-000000000100";
        let (parsed, letter) = parse(&[id, "b"]).unwrap().answer_target().unwrap();
        assert_eq!(parsed, QuestionId::from_u128(0x100));
        assert_eq!(letter, Letter::B);

        assert!(matches!(
            parse(&[id]).unwrap().answer_target(),
            Err(ArgsError::MissingArgument { name: "letter" })
        ));
        assert!(matches!(
            parse(&[id, "Z"]).unwrap().answer_target(),
            Err(ArgsError::InvalidLetter { .. })
        ));
    }

    #[test]
    fn bad_flags_are_rejected() {
        assert!(matches!(parse(&["--db"]), Err(ArgsError::MissingValue { flag: "--db" })));
        assert!(matches!(parse(&["--status", "maybe"]), Err(ArgsError::InvalidStatus { .. })));
        assert!(matches!(parse(&["--user", "joao"]), Err(ArgsError::InvalidUserId { .. })));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        let url = normalize_sqlite_url("sqlite:data/prep.sqlite3".into());
        assert!(url.starts_with("sqlite:///") || url.starts_with("sqlite://"));
        assert!(url.ends_with("data/prep.sqlite3"));
    }
}

mod calc;
mod quiz;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use services::{Clock, ExamConfig, ExamLoopService, ExamSetup, ProgressService};
use storage::bank::load_question_bank;
use storage::repository::Storage;
use study_core::model::{Badge, ModuleId, QuestionCount, StudyProgress};

const DEFAULT_DB_URL: &str = "sqlite://study.sqlite3";
const DEFAULT_BANK_PATH: &str = "data/sample_bank.json";

#[derive(Debug)]
pub(crate) enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidCount { raw: String },
    InvalidModules { raw: String },
    InvalidTranche { raw: String },
    InvalidDbUrl { raw: String },
    UnknownCalculator(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidCount { raw } => {
                write!(f, "invalid --count value: {raw} (expected 5, 10, 15 or 20)")
            }
            ArgsError::InvalidModules { raw } => write!(f, "invalid --modules value: {raw}"),
            ArgsError::InvalidTranche { raw } => {
                write!(f, "invalid --tranche value: {raw} (expected name=amount)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnknownCalculator(name) => write!(f, "unknown calculator: {name}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub(crate) fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub(crate) fn parse_value<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study exam     [--count <5|10|15|20>] [--modules <id,id,..>] [--seed <n>]");
    eprintln!("                 [--db <sqlite_url>] [--bank <path>]");
    eprintln!("  study progress [--db <sqlite_url>]");
    eprintln!("  study reset    [--db <sqlite_url>]");
    eprintln!("  study calc fisher    --nominal <rate> --inflation <rate>");
    eprintln!("  study calc roe       --income <amount> --assets <amount> --equity <amount>");
    eprintln!("  study calc waterfall --pool <amount> --default-rate <rate> --recovery <rate>");
    eprintln!("                       --tranche <name=amount> [--tranche ..]  # senior first");
    eprintln!();
    eprintln!("Rates are fractions: 0.05 means 5%.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --bank {DEFAULT_BANK_PATH}");
    eprintln!("  --count 10, all modules");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_BANK, STUDY_SECONDS_PER_QUESTION (0 disables), RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Exam,
    Progress,
    Reset,
    Calc,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "exam" => Some(Self::Exam),
            "progress" => Some(Self::Progress),
            "reset" => Some(Self::Reset),
            "calc" => Some(Self::Calc),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    bank_path: PathBuf,
    count: Option<QuestionCount>,
    modules: Vec<ModuleId>,
    seed: Option<u64>,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut bank_path = std::env::var("STUDY_BANK")
            .ok()
            .map_or_else(|| PathBuf::from(DEFAULT_BANK_PATH), PathBuf::from);
        let mut count = None;
        let mut modules = Vec::new();
        let mut seed = None;

        while let Some(arg) = args.next() {
            match (arg.as_str(), cmd) {
                ("--db", _) => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                ("--bank", Command::Exam) => {
                    bank_path = PathBuf::from(require_value(args, "--bank")?);
                }
                ("--count", Command::Exam) => {
                    let value = require_value(args, "--count")?;
                    let parsed = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .and_then(|n| QuestionCount::try_from(n).ok())
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                    count = Some(parsed);
                }
                ("--modules", Command::Exam) => {
                    let value = require_value(args, "--modules")?;
                    modules = parse_modules(&value)?;
                }
                ("--seed", Command::Exam) => {
                    seed = Some(parse_value(args, "--seed")?);
                }
                ("--help" | "-h", _) => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            bank_path,
            count,
            modules,
            seed,
        })
    }
}

fn parse_modules(raw: &str) -> Result<Vec<ModuleId>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<ModuleId>()
                .map_err(|_| ArgsError::InvalidModules {
                    raw: raw.to_string(),
                })
        })
        .collect()
}

fn seconds_per_question() -> Result<u32, ArgsError> {
    match std::env::var("STUDY_SECONDS_PER_QUESTION") {
        Ok(raw) => raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
            flag: "STUDY_SECONDS_PER_QUESTION",
            raw,
        }),
        Err(_) => Ok(ExamConfig::default().seconds_per_question),
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn open_storage(db_url: &str) -> Result<Storage, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    let storage = Storage::sqlite(db_url).await?;
    log::debug!("opened progress store at {db_url}");
    Ok(storage)
}

fn report_usage<E: fmt::Display>(err: E) -> E {
    eprintln!("{err}");
    print_usage();
    err
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means an exam with default settings.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Exam,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Exam,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    match cmd {
        Command::Calc => calc::run(&mut iter).map_err(report_usage),
        Command::Progress => {
            let parsed = Args::parse(cmd, &mut iter).map_err(report_usage)?;
            let storage = open_storage(&parsed.db_url).await?;
            let snapshot = ProgressService::new(storage.progress).snapshot().await?;
            print_progress(&snapshot);
            Ok(())
        }
        Command::Reset => {
            let parsed = Args::parse(cmd, &mut iter).map_err(report_usage)?;
            let storage = open_storage(&parsed.db_url).await?;
            ProgressService::new(storage.progress).reset().await?;
            println!("Study progress reset.");
            Ok(())
        }
        Command::Exam => {
            let parsed = Args::parse(cmd, &mut iter).map_err(report_usage)?;
            let config = ExamConfig::default().with_seconds_per_question(seconds_per_question()?);
            let bank = load_question_bank(&parsed.bank_path)?;
            let storage = open_storage(&parsed.db_url).await?;

            let mut exam_loop =
                ExamLoopService::new(Clock::system(), Arc::clone(&storage.progress))
                    .with_config(config);
            if let Some(seed) = parsed.seed {
                exam_loop = exam_loop.with_seed(seed);
            }

            let count = parsed.count.unwrap_or(config.default_count);
            let setup = if parsed.modules.is_empty() {
                ExamSetup::for_bank(&bank, count)
            } else {
                ExamSetup::new(count, parsed.modules)
            };
            quiz::run(&exam_loop, &bank, setup).await
        }
    }
}

fn print_progress(progress: &StudyProgress) {
    println!(
        "Questions answered: {} ({} correct, {:.1}%)",
        progress.total_questions(),
        progress.correct_answers(),
        progress.accuracy()
    );
    println!("Points:             {}", progress.points());
    println!(
        "Streak:             {} (best {})",
        progress.current_streak(),
        progress.best_streak()
    );
    match progress.last_exam_date() {
        Some(date) => println!("Last exam:          {}", date.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Last exam:          never"),
    }

    println!();
    println!("Badges:");
    for badge in Badge::ALL {
        let mark = if progress.has_badge(badge) { "x" } else { " " };
        println!("  [{mark}] {}", badge.title());
    }

    if !progress.exam_history().is_empty() {
        println!();
        println!("Recent exams:");
        for result in progress.exam_history().iter().rev() {
            println!(
                "  {}  {:>2}/{:<2}  {:>5.1}%  +{} pts",
                result.date().format("%Y-%m-%d %H:%M"),
                result.correct_count(),
                result.question_count(),
                result.percentage(),
                result.points_earned()
            );
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_are_comma_separated() {
        let parsed = parse_modules("1, 3,,4").unwrap();
        assert_eq!(
            parsed,
            vec![ModuleId::new(1), ModuleId::new(3), ModuleId::new(4)]
        );
        assert!(matches!(
            parse_modules("1,two"),
            Err(ArgsError::InvalidModules { .. })
        ));
    }

    #[test]
    fn exam_flags_are_parsed() {
        let mut args = ["--count", "15", "--modules", "2", "--seed", "7", "--db", "sqlite::memory:"]
            .into_iter()
            .map(String::from);
        let parsed = Args::parse(Command::Exam, &mut args).unwrap();
        assert_eq!(parsed.count, Some(QuestionCount::Fifteen));
        assert_eq!(parsed.modules, vec![ModuleId::new(2)]);
        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn unsupported_count_is_rejected() {
        let mut args = ["--count", "12"].into_iter().map(String::from);
        assert!(matches!(
            Args::parse(Command::Exam, &mut args),
            Err(ArgsError::InvalidCount { .. })
        ));
    }

    #[test]
    fn exam_only_flags_are_unknown_elsewhere() {
        let mut args = ["--seed", "1"].into_iter().map(String::from);
        assert!(matches!(
            Args::parse(Command::Progress, &mut args),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/study.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/study.sqlite3"));
    }
}

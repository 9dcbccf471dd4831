use std::fmt;
use std::sync::Arc;

use recall_core::model::{FlashcardId, LessonId, UserId};
use remote::{HttpProgressApi, RemoteConfig};
use services::{ProgressStore, SharedIdentity};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingBaseUrl,
    MissingUser,
    MissingLesson,
    MissingFlashcard,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingBaseUrl => {
                write!(f, "no base url: pass --base-url or set RECALL_PROGRESS_URL")
            }
            ArgsError::MissingUser => write!(f, "no user: pass --user or set RECALL_USER"),
            ArgsError::MissingLesson => write!(f, "complete-lesson requires --lesson <id>"),
            ArgsError::MissingFlashcard => {
                write!(f, "master-flashcard requires --flashcard <id>")
            }
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
    eprintln!("  cargo run -p app -- show             --user <id> [--base-url <url>]");
    eprintln!("  cargo run -p app -- complete-lesson  --lesson <id> --user <id> [--base-url <url>]");
    eprintln!("  cargo run -p app -- master-flashcard --flashcard <id> --user <id> [--base-url <url>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RECALL_PROGRESS_URL, RECALL_USER, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Show,
    CompleteLesson,
    MasterFlashcard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "show" => Some(Self::Show),
            "complete-lesson" => Some(Self::CompleteLesson),
            "master-flashcard" => Some(Self::MasterFlashcard),
            _ => None,
        }
    }
}

struct Args {
    config: RemoteConfig,
    user: UserId,
    lesson: Option<LessonId>,
    flashcard: Option<FlashcardId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = RemoteConfig::from_env();
        let mut user = std::env::var("RECALL_USER").ok();
        let mut lesson = None;
        let mut flashcard = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    config = Some(RemoteConfig::new(require_value(args, "--base-url")?));
                }
                "--user" => user = Some(require_value(args, "--user")?),
                "--lesson" => lesson = Some(require_value(args, "--lesson")?),
                "--flashcard" => flashcard = Some(require_value(args, "--flashcard")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let config = config.ok_or(ArgsError::MissingBaseUrl)?;
        let user = match user {
            Some(id) if !id.trim().is_empty() => UserId::new(id),
            _ => return Err(ArgsError::MissingUser),
        };

        Ok(Self {
            config,
            user,
            lesson: lesson.map(LessonId::new),
            flashcard: flashcard.map(FlashcardId::new),
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_progress(store: &ProgressStore) {
    let lessons = store.completed_lessons();
    let flashcards = store.mastered_flashcards();

    println!("completed lessons ({}):", lessons.len());
    for lesson in &lessons {
        println!("  {lesson}");
    }
    println!("mastered flashcards ({}):", flashcards.len());
    for flashcard in &flashcards {
        println!("  {flashcard}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            ArgsError::UnknownArg(first)
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let api = HttpProgressApi::new(&parsed.config)?;
    let identity = SharedIdentity::signed_in(parsed.user.clone());
    let store = ProgressStore::new(Arc::new(identity), Arc::new(api));

    store.sync_identity().await;

    match cmd {
        Command::Show => {
            println!("progress for {}", parsed.user);
            print_progress(&store);
        }
        Command::CompleteLesson => {
            let lesson = parsed.lesson.ok_or(ArgsError::MissingLesson)?;
            store.mark_lesson_complete(lesson.clone()).await?;
            println!("lesson {lesson} recorded as completed for {}", parsed.user);
            print_progress(&store);
        }
        Command::MasterFlashcard => {
            let flashcard = parsed.flashcard.ok_or(ArgsError::MissingFlashcard)?;
            store.mark_flashcard_mastered(flashcard.clone()).await?;
            println!(
                "flashcard {flashcard} recorded as mastered for {}",
                parsed.user
            );
            print_progress(&store);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::fmt;
use std::io::{self, BufRead, Write};

use practice_core::model::{QuestionKind, QuestionSource, TranscriptId, VideoId};
use practice_core::{CatalogFilter, PracticeSession, QuestionView, SessionPhase, SubmitOutcome};
use practice_services::{ApiConfig, AppServices, Clock, PracticeSessionService};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  practice catalog [--query <text>] [--kind <kind>]");
    eprintln!("  practice set --video <id> --kind <kind>");
    eprintln!("  practice qa --transcript <id> [--generate <kind>]");
    eprintln!();
    eprintln!("Kinds: novice, factual, fill_blanks, mcq");
    eprintln!();
    eprintln!("While answering:");
    eprintln!("  :next  :reset  :reveal  :generate <kind>  :quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PRACTICE_API_URL, PRACTICE_DISABLED_KINDS, PRACTICE_ACCESS_TOKEN,");
    eprintln!("  PRACTICE_REFRESH_TOKEN, PRACTICE_HTTP_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Catalog(CatalogFilter),
    Set { video_id: VideoId, kind: QuestionKind },
    Qa {
        transcript_id: TranscriptId,
        generate: Option<QuestionKind>,
    },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(first) = args.next() else {
            return Ok(None);
        };
        match first.as_str() {
            "--help" | "-h" => Ok(None),
            "catalog" => Self::parse_catalog(&mut args).map(Some),
            "set" => Self::parse_set(&mut args).map(Some),
            "qa" => Self::parse_qa(&mut args).map(Some),
            _ => Err(ArgsError::UnknownCommand(first)),
        }
    }

    fn parse_catalog(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut filter = CatalogFilter::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--query" => filter.query = require_value(args, "--query")?,
                "--kind" => {
                    filter.kind = Some(QuestionKind::from(require_value(args, "--kind")?.as_str()));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self::Catalog(filter))
    }

    fn parse_set(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut video_id = None;
        let mut kind = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--video" => video_id = Some(VideoId::new(require_value(args, "--video")?)),
                "--kind" => kind = Some(QuestionKind::from(require_value(args, "--kind")?.as_str())),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self::Set {
            video_id: video_id.ok_or(ArgsError::MissingFlag { flag: "--video" })?,
            kind: kind.ok_or(ArgsError::MissingFlag { flag: "--kind" })?,
        })
    }

    fn parse_qa(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut transcript_id = None;
        let mut generate = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--transcript" => {
                    transcript_id = Some(TranscriptId::new(require_value(args, "--transcript")?));
                }
                "--generate" => {
                    generate = Some(QuestionKind::from(require_value(args, "--generate")?.as_str()));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self::Qa {
            transcript_id: transcript_id.ok_or(ArgsError::MissingFlag {
                flag: "--transcript",
            })?,
            generate,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(Some(command)) => command,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    let config = ApiConfig::from_env();
    log::debug!("using backend at {}", config.base_url);
    let services = AppServices::http(config, Clock::default())?;
    if !services.auth().is_authenticated() {
        log::warn!("no credentials configured; requests go out unauthenticated");
    }

    match command {
        Command::Catalog(filter) => {
            let sets = services.catalog().load().await?;
            let shown = filter.apply(&sets);
            if shown.is_empty() {
                println!("No practice sets found.");
            }
            for set in shown {
                println!(
                    "[{}] {}  ({} questions, {})",
                    set.display_id,
                    set.title,
                    set.question_count,
                    set.progress_label()
                );
                println!("      practice set --video {} --kind {}", set.video_id, set.kind);
            }
            Ok(())
        }
        Command::Set { video_id, kind } => {
            let source = QuestionSource::practice_set(video_id, kind);
            practice(&services.sessions(), source, None).await
        }
        Command::Qa {
            transcript_id,
            generate,
        } => {
            let source = QuestionSource::Transcript(transcript_id);
            practice(&services.sessions(), source, generate).await
        }
    }
}

async fn practice(
    sessions: &PracticeSessionService,
    source: QuestionSource,
    generate: Option<QuestionKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let opened = sessions.open(source).await;
    println!("{}", opened.heading());
    let mut session = opened.session;

    if let Some(kind) = generate {
        generate_into(sessions, &mut session, kind).await;
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        match session.phase() {
            SessionPhase::Complete => {
                println!("Set complete. {}", session.score_label());
                break;
            }
            SessionPhase::Error(err) => {
                println!("{err}");
                if !session.accepts_network() {
                    break;
                }
            }
            SessionPhase::Loading => break,
            SessionPhase::Ready | SessionPhase::Answering | SessionPhase::Feedback { .. } => {
                if let Some(view) = session.current_view() {
                    render(&view);
                }
                println!("{}", session.score_label());
            }
        }

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let input = line.trim();

        match input {
            ":quit" | ":q" => break,
            ":next" => {
                if !session.advance() {
                    println!("Answer this question first.");
                }
            }
            ":reset" => session.reset(),
            ":reveal" => {
                let reveal = !session.answers_revealed();
                session.reveal_answers(reveal);
            }
            _ if input.starts_with(":generate") => {
                let kind = input.trim_start_matches(":generate").trim();
                let kind = if kind.is_empty() {
                    session.requested_kind().clone()
                } else {
                    QuestionKind::from(kind)
                };
                generate_into(sessions, &mut session, kind).await;
            }
            answer => {
                let Some(question_id) = session.current_question().map(|q| q.id().clone()) else {
                    continue;
                };
                match sessions.submit(&mut session, &question_id, answer).await {
                    Ok(SubmitOutcome::Accepted(feedback)) => println!("{}", feedback.message()),
                    Ok(SubmitOutcome::Ignored(reason)) => log::debug!("answer ignored: {reason:?}"),
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    println!(
        "Progress: {:.0}% complete",
        sessions.percent_complete(session.source())
    );
    Ok(())
}

async fn generate_into(
    sessions: &PracticeSessionService,
    session: &mut PracticeSession,
    kind: QuestionKind,
) {
    match sessions.generate(session, kind.clone()).await {
        Ok(added) => println!("Added {added} {} questions.", kind.display_name()),
        Err(err) => println!("{err}"),
    }
}

fn render(view: &QuestionView<'_>) {
    println!();
    println!(
        "[{}/{}] ({}) {}",
        view.position,
        view.total,
        view.kind.display_name(),
        view.text
    );
    for (index, option) in view.options.iter().enumerate() {
        let label = char::from(b'a' + u8::try_from(index % 26).unwrap_or(0));
        println!("   {label}) {option}");
    }
    if let Some(submitted) = view.submitted {
        println!("   your answer: {submitted}");
    }
    if let Some(feedback) = view.feedback {
        println!("   {}", feedback.message());
    } else if let Some(answer) = view.answer {
        println!("   answer: {answer}");
    }
    if view.in_flight {
        println!("   submitting...");
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

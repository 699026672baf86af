use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::EnvFilter;

use quiz_core::model::{AnswerStatus, QuizReview, SessionState};
use quiz_core::Clock;
use services::{
    PdfTextExtractor, QuizFlowService, SessionTicker, StaticQuizGenerator, TickEvent,
};
use storage::repository::InMemorySessionStore;

#[derive(Debug)]
enum ArgsError {
    MissingPdfPath,
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingPdfPath => write!(f, "a PDF file path is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
struct Args {
    pdf_path: String,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- <pdf-file>");
    eprintln!();
    eprintln!("Commands during the quiz:");
    eprintln!("  1-4        select an answer for the current question");
    eprintln!("  n / p      next / previous question");
    eprintln!("  g <n>      jump to question n");
    eprintln!("  m          mark / unmark the current question for review");
    eprintln!("  s          submit the test");
    eprintln!("  q          quit and discard the session");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG   tracing filter (default: info)");
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut pdf_path = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ if pdf_path.is_none() => pdf_path = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self {
            pdf_path: pdf_path.ok_or(ArgsError::MissingPdfPath)?,
        })
    }
}

/// Where the user goes after the results screen.
enum Next {
    Restart,
    Quit,
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let pdf_bytes = std::fs::read(&args.pdf_path)?;

    let flow = Arc::new(QuizFlowService::new(
        Clock::default_clock(),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(PdfTextExtractor::new()),
        Arc::new(StaticQuizGenerator::new()),
    ));

    // A boundary failure here surfaces one message and leaves no session.
    let mut session = match flow.create_quiz(pdf_bytes).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Could not create a quiz from that file: {err}");
            eprintln!("Please try again with a different PDF.");
            std::process::exit(1);
        }
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match run_session(&flow, session, &mut input).await? {
            Next::Quit => {
                flow.discard().await?;
                break;
            }
            Next::Restart => match flow.restart().await? {
                Some(fresh) => session = fresh,
                None => {
                    // Stored quiz went missing or unusable: back to the start.
                    eprintln!("No stored quiz to restart from.");
                    break;
                }
            },
        }
    }

    Ok(())
}

/// Drive one session from first question to the results screen.
async fn run_session(
    flow: &Arc<QuizFlowService>,
    session: SessionState,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<Next, Box<dyn std::error::Error>> {
    let mut remaining = session.remaining_seconds(flow.now());
    let session = Arc::new(Mutex::new(session));
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let ticker = SessionTicker::spawn(Arc::clone(flow), Arc::clone(&session), events_tx);

    render_question(&*session.lock().await, remaining);

    let review = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TickEvent::Remaining(secs)) => remaining = secs,
                Some(TickEvent::Expired) | None => {
                    // Forced submission already sealed the session; a second
                    // submit only derives the review.
                    println!("\nTime is up! Submitting your answers.");
                    let mut guard = session.lock().await;
                    break flow.submit(&mut guard).await?;
                }
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    ticker.cancel().await;
                    return Ok(Next::Quit);
                };
                let mut guard = session.lock().await;
                match handle_command(flow, &mut guard, line.trim()).await? {
                    Command::Continue => render_question(&guard, remaining),
                    Command::Submit => {
                        let review = flow.submit(&mut guard).await?;
                        drop(guard);
                        ticker.cancel().await;
                        break review;
                    }
                    Command::Quit => {
                        drop(guard);
                        ticker.cancel().await;
                        return Ok(Next::Quit);
                    }
                }
            }
        }
    };

    render_review(&review);
    println!("\n[r] restart quiz  [q] quit");
    while let Some(line) = input.next_line().await? {
        match line.trim() {
            "r" => return Ok(Next::Restart),
            "q" => return Ok(Next::Quit),
            _ => println!("[r] restart quiz  [q] quit"),
        }
    }
    Ok(Next::Quit)
}

enum Command {
    Continue,
    Submit,
    Quit,
}

async fn handle_command(
    flow: &QuizFlowService,
    session: &mut SessionState,
    line: &str,
) -> Result<Command, Box<dyn std::error::Error>> {
    match line {
        "1" | "2" | "3" | "4" => {
            // Single-digit commands map to option indices 0..=3.
            let option = line.parse::<usize>().unwrap_or(1) - 1;
            flow.select_answer(session, option).await?;
        }
        "n" => flow.next(session).await?,
        "p" => flow.previous(session).await?,
        "m" => {
            flow.toggle_mark(session).await?;
        }
        "s" => return Ok(Command::Submit),
        "q" => return Ok(Command::Quit),
        other => {
            if let Some(raw) = other.strip_prefix("g ") {
                match raw.trim().parse::<usize>() {
                    Ok(number) if number >= 1 => {
                        let target = number - 1;
                        if target < session.questions().len() {
                            flow.go_to(session, target).await?;
                        } else {
                            println!("No question {number}.");
                        }
                    }
                    _ => println!("Usage: g <question number>"),
                }
            } else if !other.is_empty() {
                println!("Unknown command: {other} (1-4, n, p, g <n>, m, s, q)");
            }
        }
    }
    Ok(Command::Continue)
}

fn render_question(session: &SessionState, remaining: u64) {
    let question = session.current_question();
    let progress = session.progress();

    println!();
    println!(
        "── Time left {}  |  attempted {}  skipped {}  marked {} ──",
        format_mmss(remaining),
        progress.attempted,
        progress.skipped,
        progress.marked
    );
    println!(
        "Q{}/{}: {}{}",
        session.current_index() + 1,
        progress.total,
        question.prompt(),
        if session.is_marked() { "  [marked]" } else { "" }
    );
    for (index, option) in question.options().iter().enumerate() {
        let selected = session.current_answer() == Some(index);
        println!(
            "  {} {}. {}",
            if selected { ">" } else { " " },
            index + 1,
            option
        );
    }
}

fn render_review(review: &QuizReview) {
    let summary = &review.summary;
    println!();
    println!("══ Results ══");
    println!("Score: {} / {}", summary.correct, summary.total());
    println!(
        "Time taken: {}  |  wrong {}  skipped {}  marked {}",
        format_mmss(u64::try_from(summary.elapsed_secs).unwrap_or(0)),
        summary.wrong,
        summary.skipped,
        summary.marked
    );

    for entry in &review.entries {
        let (tag, show_correct) = match entry.status {
            AnswerStatus::Correct => ("correct", false),
            AnswerStatus::Wrong => ("wrong", true),
            AnswerStatus::Skipped => ("skipped", true),
        };
        println!();
        println!(
            "Q{}: {} [{}{}]",
            entry.position + 1,
            entry.prompt,
            tag,
            if entry.marked { ", marked" } else { "" }
        );
        match &entry.selected {
            Some(selected) => println!("  Your answer: {selected}"),
            None => println!("  Your answer: Not Answered"),
        }
        if show_correct {
            println!("  Correct answer: {}", entry.correct);
        }
    }
}

fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmss_pads_both_fields() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(61), "01:01");
        assert_eq!(format_mmss(1200), "20:00");
        assert_eq!(format_mmss(1800), "30:00");
    }

    #[test]
    fn args_require_a_pdf_path() {
        let err = Args::parse(std::iter::empty()).unwrap_err();
        assert!(matches!(err, ArgsError::MissingPdfPath));

        let args = Args::parse(["notes.pdf".to_owned()].into_iter()).unwrap();
        assert_eq!(args.pdf_path, "notes.pdf");

        let err = Args::parse(["a.pdf".to_owned(), "b.pdf".to_owned()].into_iter()).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(_)));
    }
}

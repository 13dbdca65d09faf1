//! The `avalia take` command: an interactive exam session on stdin.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use avalia_core::clock::{ExamClock, SharedBook};
use avalia_core::exam::{
    format_remaining, ExamEvent, ExamResult, ExamSession, SessionBook, SessionKey,
    SubmissionCause,
};
use avalia_core::i18n::{lookup, Locale, TranslationKey};
use avalia_core::identity::Role;
use avalia_core::model::{option_label, Availability, ExamDefinition};
use avalia_core::parser;

use super::{load_settings, require_role, Global};

const HELP: &str = "commands: n (next), p (previous), g <n> (go to), a <option> (answer), s (submit), q (quit)";

/// One line of student input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Event(ExamEvent),
    Answer(String),
    Quit,
    Help,
}

fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    match cmd {
        "n" | "next" => Ok(Input::Event(ExamEvent::Next)),
        "p" | "prev" | "previous" => Ok(Input::Event(ExamEvent::Previous)),
        "g" | "goto" => {
            let number: usize = arg
                .parse()
                .map_err(|_| anyhow!("'g' expects a question number, got '{arg}'"))?;
            if number == 0 {
                anyhow::bail!("question numbers start at 1");
            }
            Ok(Input::Event(ExamEvent::GoTo(number - 1)))
        }
        "a" | "answer" if !arg.is_empty() => Ok(Input::Answer(arg.to_string())),
        "a" | "answer" => Err(anyhow!("'a' expects an option")),
        "s" | "submit" => Ok(Input::Event(ExamEvent::Submit)),
        "q" | "quit" => Ok(Input::Quit),
        "" | "h" | "help" | "?" => Ok(Input::Help),
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

/// Turn a typed answer into a `SelectAnswer` for the current question.
///
/// Option text is taken as-is; a single letter picks the option by position.
/// Anything else is rejected before it reaches the session.
fn answer_event(exam: &ExamDefinition, session: &ExamSession, given: &str) -> Result<ExamEvent> {
    let question_id = session.current_question_id();
    let question = exam
        .question(question_id)
        .ok_or_else(|| anyhow!("question {question_id} is not part of exam {}", exam.id))?;
    let option = if question.accepts(given) {
        given
    } else {
        question
            .option_by_label(given)
            .ok_or_else(|| anyhow!("'{given}' is not an option of question {question_id}"))?
    };
    Ok(ExamEvent::SelectAnswer {
        question_id: question_id.to_string(),
        option: option.to_string(),
    })
}

fn render(exam: &ExamDefinition, session: &ExamSession, locale: Locale) {
    let t = |key: &str| lookup(key, locale).to_string();
    let index = session.current_question_index();
    let Some(question) = exam.questions.get(index) else {
        return;
    };

    println!();
    println!(
        "{} {} {} {} | {}: {} | {}/{}",
        t("sim.question"),
        index + 1,
        t("sim.of"),
        session.question_count(),
        t("sim.timeRemaining"),
        format_remaining(session.remaining_seconds()),
        session.answered_count(),
        session.question_count()
    );
    println!("{}", question.prompt);
    let selected = session.answer(&question.id);
    for (i, option) in question.options.iter().enumerate() {
        let mark = if selected == Some(option.as_str()) { "*" } else { " " };
        println!(" {mark} {}) {option}", option_label(i));
    }
    if question.options.is_empty() {
        if let Some(text) = selected {
            println!("   > {text}");
        }
    }
}

/// Snapshot of the stored session. The lock is released on return.
fn current(book: &SharedBook, key: &SessionKey) -> Result<ExamSession> {
    let guard = book.lock().map_err(|_| anyhow!("session book lock poisoned"))?;
    guard
        .get(key)
        .cloned()
        .ok_or_else(|| anyhow!("no session for {key}"))
}

fn apply(book: &SharedBook, key: &SessionKey, event: &ExamEvent) -> Result<ExamSession> {
    let mut guard = book.lock().map_err(|_| anyhow!("session book lock poisoned"))?;
    Ok(guard.apply(key, event)?.clone())
}

pub async fn execute(
    exam_path: PathBuf,
    student: Option<String>,
    tick_ms: Option<u64>,
    global: &Global,
) -> Result<()> {
    let config = load_settings(global, None)?;
    require_role(&config.viewer, Role::can_take_exams, "take exams")?;
    let student = match student {
        Some(student) => student,
        None if !config.viewer.id.trim().is_empty() => config.viewer.id.clone(),
        None => anyhow::bail!("--student is required when the config has no viewer id"),
    };
    let locale = config.locale;
    let period = tick_ms
        .map(|ms| Duration::from_millis(ms.max(1)))
        .unwrap_or_else(|| config.tick_interval());

    let exam = parser::parse_exam(&exam_path)?;
    let availability = exam.availability(chrono::Local::now().date_naive());
    if availability != Availability::Active {
        eprintln!(
            "WARNING: exam {} is {}",
            exam.id,
            availability.label(locale).to_lowercase()
        );
    }

    let book: SharedBook = Arc::new(Mutex::new(SessionBook::new()));
    let key = SessionKey::new(&exam.id, &student);
    {
        let mut guard = book.lock().map_err(|_| anyhow!("session book lock poisoned"))?;
        guard.start(&exam, &student)?;
    }
    tracing::info!(exam = %exam.id, student = %student, "exam started");

    println!("{} ({})", exam.title, exam.subject);
    println!("{HELP}");
    render(&exam, &current(&book, &key)?, locale);

    let mut clock = ExamClock::spawn(book.clone(), key.clone(), period);
    let mut remaining = clock.remaining();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let input = match parse_input(&line) {
                    Ok(input) => input,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                let outcome = match input {
                    Input::Quit => break,
                    Input::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Input::Event(event) => apply(&book, &key, &event),
                    Input::Answer(given) => current(&book, &key)
                        .and_then(|session| answer_event(&exam, &session, &given))
                        .and_then(|event| apply(&book, &key, &event)),
                };
                match outcome {
                    Ok(session) if session.is_submitted() => break,
                    Ok(session) => render(&exam, &session, locale),
                    Err(e) => eprintln!("{e}"),
                }
            }
            changed = remaining.changed() => {
                if changed.is_err() || *remaining.borrow() == 0 {
                    break;
                }
            }
        }
    }

    clock.cancel();

    let session = current(&book, &key)?;
    if !session.is_submitted() {
        book.lock()
            .map_err(|_| anyhow!("session book lock poisoned"))?
            .remove(&key);
        tracing::info!(exam = %exam.id, student = %student, "session abandoned");
        println!("Session abandoned, nothing was submitted.");
        return Ok(());
    }

    let result = ExamResult::compute(&session, &exam)?;
    if result.cause == Some(SubmissionCause::TimeExpired) {
        println!("Time is up, the exam was submitted automatically.");
    }
    println!(
        "{}: {}/10 ({}/{}) | {}: {}/{}",
        lookup("sim.score", locale),
        result.grade,
        result.correct,
        result.total,
        lookup("sim.questionsAnswered", locale),
        result.answered,
        result.total
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("n").unwrap(), Input::Event(ExamEvent::Next));
        assert_eq!(
            parse_input(" p ").unwrap(),
            Input::Event(ExamEvent::Previous)
        );
        assert_eq!(
            parse_input("g 3").unwrap(),
            Input::Event(ExamEvent::GoTo(2))
        );
        assert_eq!(
            parse_input("a 1/2").unwrap(),
            Input::Answer("1/2".to_string())
        );
        assert_eq!(
            parse_input("a Sao Paulo").unwrap(),
            Input::Answer("Sao Paulo".to_string())
        );
        assert_eq!(parse_input("s").unwrap(), Input::Event(ExamEvent::Submit));
        assert_eq!(parse_input("q").unwrap(), Input::Quit);
        assert_eq!(parse_input("").unwrap(), Input::Help);
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse_input("g").is_err());
        assert!(parse_input("g 0").is_err());
        assert!(parse_input("g two").is_err());
        assert!(parse_input("a").is_err());
        assert!(parse_input("x").is_err());
    }
}

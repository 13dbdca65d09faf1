//! The `avalia` command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "avalia",
    version,
    about = "Student evaluations and simulated exams for AVALIA+"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this role: administrator, teacher, student, parent, secretary
    #[arg(long, global = true)]
    role: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample data files
    Init,

    /// Validate exam, evaluation and answer-sheet files
    Validate {
        /// Path to a data file or directory (defaults to the configured data_dir)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Show a student's performance report with trends
    Evaluate {
        /// Evaluation TOML file, or a directory for class statistics
        #[arg(long)]
        evaluation: PathBuf,

        /// Re-rate a criterion before reporting (e.g. "participation=excellent")
        #[arg(long = "rate")]
        rates: Vec<String>,

        /// Replace a criterion comment (e.g. "sociability=Helps classmates")
        #[arg(long = "comment")]
        comments: Vec<String>,

        /// Display language: pt, en
        #[arg(long)]
        lang: Option<String>,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output directory (written files instead of stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Grade recorded answer sheets of an exam
    Grade {
        /// Exam TOML file
        #[arg(long)]
        exam: PathBuf,

        /// Answer-sheet TOML file
        #[arg(long)]
        sheets: PathBuf,

        /// Display language: pt, en
        #[arg(long)]
        lang: Option<String>,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output directory (written files instead of stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Take an exam interactively with a live countdown
    Take {
        /// Exam TOML file
        #[arg(long)]
        exam: PathBuf,

        /// Student enrolment number (defaults to the configured viewer id)
        #[arg(long)]
        student: Option<String>,

        /// Clock period in milliseconds (overrides the config)
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Search the question bank across all exams
    Questions {
        /// Exam file or directory (defaults to the configured data_dir)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Text to find in the prompt or topic
        #[arg(long)]
        search: Option<String>,

        /// Difficulty: easy, medium, hard
        #[arg(long)]
        difficulty: Option<String>,

        /// Subject, or part of it
        #[arg(long)]
        subject: Option<String>,

        /// Only questions shared with other teachers
        #[arg(long)]
        shared: bool,

        /// Display language: pt, en
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("avalia=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let global = commands::Global {
        config: cli.config,
        role: cli.role,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { data } => commands::validate::execute(data, &global),
        Commands::Evaluate {
            evaluation,
            rates,
            comments,
            lang,
            format,
            output,
        } => commands::evaluate::execute(
            evaluation, rates, comments, lang, format, output, &global,
        ),
        Commands::Grade {
            exam,
            sheets,
            lang,
            format,
            output,
        } => commands::grade::execute(exam, sheets, lang, format, output, &global),
        Commands::Take {
            exam,
            student,
            tick_ms,
        } => commands::take::execute(exam, student, tick_ms, &global).await,
        Commands::Questions {
            data,
            search,
            difficulty,
            subject,
            shared,
            lang,
        } => commands::questions::execute(
            data, search, difficulty, subject, shared, lang, &global,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

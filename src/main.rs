//! trivia CLI - Answer trivia questions from a REST API.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;
use trivia_quiz::display::Renderer;
use trivia_quiz::models::normalize_base_url;
use trivia_quiz::{
    Config, Diagnostic, DiagnosticLog, QuestionId, QuizSession, ScoreSummary, SelectOutcome,
    TriviaClient,
};

#[derive(Parser)]
#[command(name = "trivia")]
#[command(version)]
#[command(about = "Answer trivia questions served by a REST API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "trivia.toml")]
    config: PathBuf,

    /// API base URL, overriding the config file
    #[arg(long, global = true, env = "TRIVIA_API_BASE")]
    base_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively: answer each question, then check
    Play,

    /// Fetch questions and print them
    Questions {
        /// Print normalized questions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch questions, answer them from the command line, and check
    Check {
        /// Answer as ID=TEXT; repeat for each question
        #[arg(short, long = "answer", value_name = "ID=TEXT")]
        answers: Vec<String>,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# trivia-quiz configuration file

[api]
# Can also be overridden with --base-url or TRIVIA_API_BASE
base_url = "http://localhost:8080/api"
# timeout_secs = 30   # unset: wait as long as the server takes
# user_agent = "trivia-quiz"

[display]
decode_html_entities = true
debug_capacity = 20
"#;
    println!("{example}");
}

/// Resolved runtime settings.
struct Settings {
    config: Config,
    base_url: String,
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let config = Config::from_file_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    let base_url = match &cli.base_url {
        Some(url) => normalize_base_url(url),
        None => config.resolve_base_url(),
    }
    .context("Failed to resolve API base URL")?;

    Ok(Settings { config, base_url })
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Show the status line, keep the detail in the log.
fn report(log: &mut DiagnosticLog, diagnostic: Diagnostic) {
    if diagnostic.rate_limited {
        eprintln!("{}", style(&diagnostic.status).red().bold());
        if let Some(delay) = diagnostic.retry_after.as_ref().and_then(|r| r.delay) {
            eprintln!("Server asks to wait {}s before retrying.", delay.as_secs());
        }
    } else {
        eprintln!("{}", style(&diagnostic.status).red());
    }
    debug!(detail = %diagnostic.detail, "Diagnostic recorded");
    log.push(diagnostic);
}

fn print_results(session: &QuizSession, renderer: &Renderer, score: ScoreSummary) {
    println!();
    for (i, outcome) in session.outcomes().iter().enumerate() {
        println!("{}", renderer.outcome_line(i, outcome));
    }
    println!("\nScore: {score}");
}

async fn play(client: &TriviaClient, config: &Config) -> Result<()> {
    let renderer = Renderer::from_config(&config.display);
    let theme = ColorfulTheme::default();
    let mut session = QuizSession::new();
    let mut log = DiagnosticLog::new(config.display.debug_capacity);

    'round: loop {
        let pb = spinner("Loading questions...");
        let loaded = session.load_questions(client).await;
        pb.finish_and_clear();

        match loaded {
            Ok(0) => {
                println!("No questions to show.");
                if !Confirm::with_theme(&theme)
                    .with_prompt("Load again?")
                    .default(true)
                    .interact()?
                {
                    break 'round;
                }
                continue 'round;
            }
            Ok(count) => println!("Loaded {count} questions.\n"),
            Err(e) => {
                report(&mut log, Diagnostic::load_failure(&e));
                if !Confirm::with_theme(&theme)
                    .with_prompt("Try loading again?")
                    .default(true)
                    .interact()?
                {
                    break 'round;
                }
                continue 'round;
            }
        }

        // Answer until everything is answered or the user accepts a partial submission
        let questions = session.questions().to_vec();
        loop {
            for (i, question) in questions.iter().enumerate() {
                if session.selection(&question.id).is_some() {
                    continue;
                }
                if question.answers.is_empty() {
                    println!("{}", renderer.question_block(i, question));
                    continue;
                }

                let mut items: Vec<String> = question
                    .answers
                    .iter()
                    .map(|a| renderer.text(a).into_owned())
                    .collect();
                items.push("(skip)".to_string());

                let choice = Select::with_theme(&theme)
                    .with_prompt(renderer.question_title(i, question))
                    .items(&items)
                    .default(0)
                    .interact()?;
                if let Some(answer) = question.answers.get(choice) {
                    session.select_answer(&question.id, answer);
                }
            }

            let answerable_left = questions
                .iter()
                .any(|q| !q.answers.is_empty() && session.selection(&q.id).is_none());
            if session.all_answered() || !answerable_left {
                break;
            }
            let unanswered = questions.len() - session.answered_count();
            if Confirm::with_theme(&theme)
                .with_prompt(format!("{unanswered} question(s) unanswered. Submit anyway?"))
                .default(false)
                .interact()?
            {
                break;
            }
        }

        let score = loop {
            let pb = spinner("Checking answers...");
            let submitted = session.submit_answers(client).await;
            pb.finish_and_clear();

            match submitted {
                Ok(score) => break score,
                Err(e) => {
                    report(&mut log, Diagnostic::submit_failure(&e, &session.answer_payload()));
                    if !Confirm::with_theme(&theme)
                        .with_prompt("Retry submission?")
                        .default(true)
                        .interact()?
                    {
                        break 'round;
                    }
                }
            }
        };
        print_results(&session, &renderer, score);

        if !Confirm::with_theme(&theme)
            .with_prompt("Play another round?")
            .default(true)
            .interact()?
        {
            break 'round;
        }
        session.reset();
    }

    if !log.is_empty() {
        debug!(records = log.len(), "Session diagnostics:\n{}", log.render());
    }
    Ok(())
}

async fn list_questions(client: &TriviaClient, config: &Config, json: bool) -> Result<()> {
    let mut session = QuizSession::new();
    if let Err(e) = session.load_questions(client).await {
        let diagnostic = Diagnostic::load_failure(&e);
        debug!(detail = %diagnostic.detail, "Load failed");
        return Err(e).context(diagnostic.status);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(session.questions())?);
        return Ok(());
    }

    let renderer = Renderer::from_config(&config.display);
    if session.questions().is_empty() {
        println!("No questions to show.");
    }
    for (i, question) in session.questions().iter().enumerate() {
        println!("{}\n", renderer.question_block(i, question));
    }
    Ok(())
}

/// Apply one `ID=TEXT` argument. Text may be given raw or entity-decoded.
fn apply_answer(session: &mut QuizSession, renderer: &Renderer, arg: &str) -> Result<()> {
    let Some((id, text)) = arg.split_once('=') else {
        bail!("Invalid answer '{arg}': expected ID=TEXT");
    };
    let id = QuestionId::Text(id.trim().to_string());

    let resolved = session
        .questions()
        .iter()
        .find(|q| q.id.matches(&id))
        .and_then(|q| {
            q.answers
                .iter()
                .find(|a| a.as_str() == text || renderer.text(a) == text)
                .cloned()
        })
        .unwrap_or_else(|| text.to_string());

    match session.select_answer(&id, &resolved) {
        SelectOutcome::Recorded { .. } => {}
        SelectOutcome::UnknownQuestion => warn!(question_id = %id, "No such question, skipping"),
        SelectOutcome::UnknownAnswer => {
            warn!(question_id = %id, answer = text, "Not an option for this question, skipping")
        }
        SelectOutcome::Locked => warn!(question_id = %id, "Session already checked"),
    }
    Ok(())
}

async fn check(client: &TriviaClient, config: &Config, answers: &[String]) -> Result<()> {
    let renderer = Renderer::from_config(&config.display);
    let mut session = QuizSession::new();

    if let Err(e) = session.load_questions(client).await {
        let diagnostic = Diagnostic::load_failure(&e);
        debug!(detail = %diagnostic.detail, "Load failed");
        return Err(e).context(diagnostic.status);
    }

    for arg in answers {
        apply_answer(&mut session, &renderer, arg)?;
    }
    info!(
        answered = session.answered_count(),
        total = session.questions().len(),
        "Submitting"
    );

    let score = match session.submit_answers(client).await {
        Ok(score) => score,
        Err(e) => {
            let diagnostic = Diagnostic::submit_failure(&e, &session.answer_payload());
            debug!(detail = %diagnostic.detail, "Submit failed");
            return Err(e).context(diagnostic.status);
        }
    };

    print_results(&session, &renderer, score);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Example => {
            print_example_config();
            return Ok(());
        }

        Commands::Validate => {
            let settings = load_settings(&cli)?;
            if !cli.config.exists() {
                info!("No config file at {:?}, using defaults", cli.config);
            }
            info!("Configuration is valid");
            info!("  API base: {}", settings.base_url);
            match settings.config.api.timeout_secs {
                Some(secs) => info!("  Timeout: {secs}s"),
                None => info!("  Timeout: none"),
            }
            info!(
                "  Decode HTML entities: {}",
                settings.config.display.decode_html_entities
            );
            return Ok(());
        }

        Commands::Play => {
            let settings = load_settings(&cli)?;
            let client = TriviaClient::from_config(&settings.base_url, &settings.config.api)?;
            play(&client, &settings.config).await?;
        }

        Commands::Questions { json } => {
            let settings = load_settings(&cli)?;
            let client = TriviaClient::from_config(&settings.base_url, &settings.config.api)?;
            list_questions(&client, &settings.config, *json).await?;
        }

        Commands::Check { answers } => {
            let settings = load_settings(&cli)?;
            let client = TriviaClient::from_config(&settings.base_url, &settings.config.api)?;
            check(&client, &settings.config, answers).await?;
        }
    }

    Ok(())
}

//! wayfare - chat with the travel booking agent from the terminal

mod commands;
mod config;
mod render;
mod utils;

use clap::Parser;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use wayfare_chat::{ChatSession, HttpTransport, InteractionChoice, TurnOutcome};
use wayfare_wire::{AgentClient, TravelApi};

use crate::config::Settings;
use crate::render::EventPrinter;

/// wayfare - travel booking agent client
#[derive(Parser, Debug)]
#[command(name = "wayfare")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Streaming agent endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Base URL of the REST API
    #[arg(long)]
    base_url: Option<String>,

    /// History sent with each request (full, latest)
    #[arg(long)]
    history: Option<String>,

    /// Frame vocabulary of the service (auto, delta, message)
    #[arg(long)]
    dialect: Option<String>,

    /// Notice language (zh, en)
    #[arg(long)]
    locale: Option<String>,

    /// Run in non-interactive mode with a single message
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn overrides(&self) -> config::Config {
        config::Config {
            endpoint: self.endpoint.clone(),
            base_url: self.base_url.clone(),
            history: self.history.clone(),
            dialect: self.dialect.clone(),
            locale: self.locale.clone(),
            strip_finish_marker: None,
        }
    }
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing; stays quiet unless asked so logs don't interleave with the chat
    let filter = if args.verbose {
        EnvFilter::new("wayfare=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Merge config with CLI args (CLI takes precedence)
    let cfg = config::Config::load();
    let settings = Settings::resolve(&args.overrides(), &cfg)?;
    tracing::debug!("Settings: {:?}", settings);

    let client = AgentClient::new(settings.endpoint.clone()).with_history_mode(settings.history);
    let transport = Arc::new(HttpTransport::new(client));
    let session = ChatSession::new(transport, settings.chat_config());
    let api = TravelApi::new(settings.base_url.clone());

    // Non-interactive mode
    if let Some(command) = args.command {
        return run_command(&session, &settings, &command).await;
    }

    run_interactive(&session, &settings, &api).await
}

/// Drive one turn: print its events, stop it on Ctrl-C
async fn run_turn<F>(
    session: &ChatSession,
    settings: &Settings,
    turn: F,
) -> wayfare_chat::Result<TurnOutcome>
where
    F: Future<Output = wayfare_chat::Result<TurnOutcome>>,
{
    let mut receiver = session.subscribe();
    let locale = settings.locale;

    // Spawn event handler
    let printer = tokio::spawn(async move {
        let mut printer = EventPrinter::new(io::stdout(), locale);
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = printer.handle(&event) {
                        tracing::debug!("Failed to print event: {}", e);
                    }
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Display fell behind, skipped {} events", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::pin!(turn);
    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            _ = tokio::signal::ctrl_c() => {
                if session.is_busy() {
                    session.stop();
                }
            }
        }
    };

    if result.is_ok() {
        printer.await.ok();
    } else {
        printer.abort();
    }
    result
}

async fn run_command(session: &ChatSession, settings: &Settings, text: &str) -> anyhow::Result<()> {
    println!("wayfare> {}", text);
    println!();

    let outcome = run_turn(session, settings, session.send(text)).await?;
    if outcome == TurnOutcome::AwaitingInteraction {
        print_choices(&session.interaction_choices());
    }
    if outcome.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_interactive(
    session: &ChatSession,
    settings: &Settings,
    api: &TravelApi,
) -> anyhow::Result<()> {
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&io::stderr()) {
        let short_id: String = session.session_id().chars().take(8).collect();
        eprintln!("wayfare ({}) session: {}", settings.endpoint, short_id);
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        let Some(line) = read_line(&mut input, "> ").await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(result) = commands::execute_command(line, session, settings) {
            match result {
                commands::CommandResult::Clear => {
                    session.clear();
                    println!("Started a new conversation.");
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::Api(request) => {
                    println!("{}", commands::BookingCommand::run(api, &request).await);
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        println!();
        let mut outcome = run_turn(session, settings, session.send(line)).await;

        // Keep answering for as long as the agent keeps asking
        while let Ok(TurnOutcome::AwaitingInteraction) = outcome {
            let choices = session.interaction_choices();
            match ask_choice(&mut input, &choices).await? {
                Some(choice) => {
                    println!();
                    outcome = run_turn(session, settings, session.resolve_with(&choice)).await;
                }
                None => break,
            }
        }

        if let Err(e) = outcome {
            println!("{}", e);
        }
        println!();
    }

    Ok(())
}

/// Print a prompt and read one line. `None` on EOF or Ctrl-C.
async fn read_line(input: &mut Input, prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    tokio::select! {
        line = input.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(None)
        }
    }
}

fn print_choices(choices: &[InteractionChoice]) {
    for (i, choice) in choices.iter().enumerate() {
        let text = if choice.summary.is_empty() {
            &choice.label
        } else {
            &choice.summary
        };
        println!("  {}) {}", i + 1, text);
    }
}

/// List the choices and read a pick. `None` leaves the interaction pending.
async fn ask_choice(
    input: &mut Input,
    choices: &[InteractionChoice],
) -> anyhow::Result<Option<InteractionChoice>> {
    if choices.is_empty() {
        return Ok(None);
    }
    print_choices(choices);

    loop {
        let prompt = format!("Choose 1-{} (empty to type a new message): ", choices.len());
        let Some(answer) = read_line(input, &prompt).await? else {
            return Ok(None);
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => return Ok(Some(choices[n - 1].clone())),
            _ => println!("Not a valid choice: {}", answer),
        }
    }
}

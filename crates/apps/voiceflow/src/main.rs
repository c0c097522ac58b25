//! Voiceflow - a voice-driven Gmail reader
//!
//! This is the command-line entry point. Typed lines stand in for speech
//! transcripts in `listen` mode, and spoken replies are printed.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::io::BufRead;
use std::sync::Arc;

use mail::{
    Category, EmailId, FetchError, FetchOptions, FileSessionStore, GeminiModel, GmailAuth,
    GmailClient, GoogleCredentials, Mailbox, SessionStore, Settings, VoiceController,
    contextual_response, fetch_emails, summarize_email,
};

mod terminal;

use terminal::TerminalSpeaker;

#[derive(Parser)]
#[command(name = "voiceflow")]
#[command(about = "Voice-driven Gmail reader", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with Google
    Login,

    /// Sign out and forget the session
    Logout,

    /// Show whether a session is active
    Status,

    /// List recent emails
    Inbox {
        /// Folder to list
        #[arg(long, default_value = "inbox")]
        category: String,
    },

    /// Print one email
    Show { id: String },

    /// Summarize one email with the assistant
    Summarize { id: String },

    /// Ask the assistant about recent emails
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Read commands line by line, as if spoken
    Listen,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;
    let sessions = FileSessionStore::new()?;

    match cli.cmd {
        Command::Login => {
            let auth = GmailAuth::new(load_credentials()?);
            auth.login(&sessions)?;
            println!("Signed in.");
            Ok(())
        }

        Command::Logout => {
            sessions.clear_session()?;
            info!("Signed out");
            println!("Signed out.");
            Ok(())
        }

        Command::Status => {
            match sessions.get_session()? {
                Some(session) => println!(
                    "Signed in until {}",
                    session.expires_at.with_timezone(&chrono::Local).format("%H:%M:%S")
                ),
                None => println!("Not signed in. Run `voiceflow login`."),
            }
            match GoogleCredentials::load() {
                Ok(creds) => println!("Google credentials: {}", creds.source),
                Err(_) => println!("Google credentials: not configured"),
            }
            Ok(())
        }

        Command::Inbox { category } => {
            let category = parse_category(&category)?;
            let mut mailbox = load_mailbox(&sessions, &settings)?;
            mailbox.set_category(category);
            terminal::print_list(&mailbox);
            Ok(())
        }

        Command::Show { id } => {
            let mut mailbox = load_mailbox(&sessions, &settings)?;
            let id = EmailId::new(id);
            if !mailbox.select(&id) {
                bail!("No email with id {}", id);
            }
            if let Some(email) = mailbox.selected() {
                terminal::print_email(email);
            }
            Ok(())
        }

        Command::Summarize { id } => {
            let mailbox = load_mailbox(&sessions, &settings)?;
            let email = mailbox
                .get(&EmailId::new(&id))
                .with_context(|| format!("No email with id {}", id))?;
            let model = GeminiModel::from_env(&settings.model)?;
            let summary = summarize_email(&model, &email.body)?;
            println!("{}", summary.summary);
            Ok(())
        }

        Command::Ask { question } => {
            let mailbox = load_mailbox(&sessions, &settings)?;
            let model = GeminiModel::from_env(&settings.model)?;
            let request = mail::ContextualRequest {
                query: question.join(" "),
                context: None,
                email_metadata: mailbox
                    .emails()
                    .iter()
                    .map(|e| mail::EmailMetadata::from_email(e, settings.snippet_chars))
                    .collect(),
            };
            let answer = contextual_response(&model, &request)?;
            println!("{}", answer.response);
            Ok(())
        }

        Command::Listen => listen(&sessions, &settings),
    }
}

fn load_credentials() -> Result<GoogleCredentials> {
    GoogleCredentials::load().map_err(|e| {
        if let Some(path) = GoogleCredentials::default_credentials_path() {
            warn!(
                "To configure Google sign-in, either:\n\
                 1. Place your Google OAuth credentials at: {}\n\
                 2. Or set environment variables: GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
                path.display()
            );
        }
        e
    })
}

fn parse_category(name: &str) -> Result<Category> {
    Category::ALL
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(name))
        .with_context(|| format!("Unknown category '{}' (expected inbox, sent or draft)", name))
}

/// Fetch recent emails into a fresh mailbox
fn load_mailbox(sessions: &dyn SessionStore, settings: &Settings) -> Result<Mailbox> {
    let client = GmailClient::new();
    let outcome = match fetch_emails(&client, sessions, &FetchOptions::from(settings)) {
        Ok(outcome) => outcome,
        Err(FetchError::Unauthorized) => bail!("Not signed in. Run `voiceflow login`."),
        Err(e) => return Err(e.into()),
    };

    let mut mailbox = Mailbox::new();
    mailbox.set_emails(outcome.emails);
    if mailbox.is_empty() {
        info!("No emails matched '{}'", settings.query);
    }
    Ok(mailbox)
}

/// Interactive loop: each line is a transcript
fn listen(sessions: &dyn SessionStore, settings: &Settings) -> Result<()> {
    let mailbox = load_mailbox(sessions, settings)?;
    let model = Arc::new(GeminiModel::from_env(&settings.model)?);
    let speaker = Arc::new(TerminalSpeaker);
    let mut controller =
        VoiceController::new(mailbox, model, speaker).with_snippet_chars(settings.snippet_chars);

    terminal::print_list(controller.mailbox());
    println!("Say something (type it), `:open <id>` to select an email, Ctrl-D to quit.");

    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read input")?;

        if let Some(id) = line.trim().strip_prefix(":open ") {
            if controller.mailbox_mut().select(&EmailId::new(id.trim())) {
                if let Some(email) = controller.mailbox().selected() {
                    terminal::print_email(email);
                }
            } else {
                warn!("No email with id {}", id.trim());
            }
            continue;
        }

        if let Some(command) = controller.handle_transcript(&line)
            && command.category().is_some()
        {
            terminal::print_list(controller.mailbox());
        }
    }

    info!("Goodbye");
    Ok(())
}

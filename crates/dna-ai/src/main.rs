//! The DNA AI chat in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::error::Error;
use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use dna_ai::client::reveal::TypingReveal;
use dna_ai::client::{ClientBuilder, ConversationClient, Message, Sender};
use dna_ai::entry::{Entry, EntryReader};
use dna_ai::voice::CommandSynthesizer;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, BufReader};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum ViewEvent {
    Message(Message),
    Idle,
}

const BAR_CHAR: &str = "▎";
const PROXY_URL_VAR: &str = "DNA_AI_PROXY_URL";
const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let proxy_url = env::var(PROXY_URL_VAR)
        .unwrap_or_else(|_| DEFAULT_PROXY_URL.to_owned());
    debug!("talking to {proxy_url}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let client = ClientBuilder::with_proxy_url(&proxy_url)
        .with_speech_synthesizer(CommandSynthesizer::detect().await)
        .on_message({
            let event_tx = event_tx.clone();
            move |msg| {
                event_tx.send(ViewEvent::Message(msg.clone())).ok();
            }
        })
        .on_idle(move || {
            event_tx.send(ViewEvent::Idle).ok();
        })
        .build();

    match run(&client, &mut event_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("{} {err}", "error:".bright_red());
            ExitCode::FAILURE
        }
    }
}

async fn run(
    client: &ConversationClient,
    event_rx: &mut mpsc::UnboundedReceiver<ViewEvent>,
) -> Result<(), Box<dyn Error>> {
    // The greeting is announced before any command is handled.
    client.snapshot().await?;
    while let Ok(event) = event_rx.try_recv() {
        if let ViewEvent::Message(msg) = event {
            show_message(&msg).await;
        }
    }
    println!("{}", "Type /help for commands.".dimmed());

    let mut reader = EntryReader::new(BufReader::new(io::stdin()));
    loop {
        prompt("> ");
        let Some(text) = reader.next_entry(|| prompt(". ")).await? else {
            break;
        };

        match Entry::parse(&text) {
            Entry::Quit => break,
            Entry::Help => print_help(),
            Entry::ToggleVoice => {
                let snapshot = client.snapshot().await?;
                if !snapshot.can_speak {
                    print_notice("Voice output is not available here.");
                    continue;
                }
                let enabled = !snapshot.voice_output;
                client.set_voice_output(enabled)?;
                print_notice(if enabled {
                    "Voice output on."
                } else {
                    "Voice output off."
                });
            }
            Entry::Replay => {
                let snapshot = client.snapshot().await?;
                if !snapshot.can_speak {
                    print_notice("Voice output is not available here.");
                    continue;
                }
                let latest = snapshot
                    .transcript
                    .messages()
                    .iter()
                    .rev()
                    .find(|msg| msg.sender() == Sender::Assistant);
                if let Some(msg) = latest {
                    client.replay(msg.id())?;
                }
            }
            Entry::Message(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                client.send_message(text)?;
                if !wait_for_reply(event_rx).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Shows a spinner until the turn ends. Returns `false` if the client is
/// gone.
async fn wait_for_reply(
    event_rx: &mut mpsc::UnboundedReceiver<ViewEvent>,
) -> bool {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let mut progress_bar = None;
    loop {
        // Create a new progress bar if it has been finished.
        progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(progress_style.clone());
                progress_bar.set_message("DNA AI is typing...");
                progress_bar
            })
            .inc(1);

        let sleep = sleep(Duration::from_millis(100));
        let event = select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return false;
                };
                event
            },
            _ = sleep => {
                continue;
            }
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        match event {
            ViewEvent::Message(msg) => {
                // The user's own text is already on screen.
                if msg.sender() == Sender::Assistant {
                    show_message(&msg).await;
                }
            }
            ViewEvent::Idle => return true,
        }
    }
}

async fn show_message(msg: &Message) {
    print!("{}🤖 ", BAR_CHAR.bright_cyan());

    let mut reveal = TypingReveal::default();
    let mut shown_rx = reveal.subscribe();
    reveal.set_text(msg.text());

    let mut printed = 0;
    while !reveal.is_complete() {
        if shown_rx.changed().await.is_err() {
            break;
        }
        let shown = shown_rx.borrow_and_update().clone();
        let delta = &shown[printed..];
        print!("{}", delta.bright_white());
        std::io::stdout().flush().ok();
        printed = shown.len();
    }
    println!();
}

fn prompt(text: &str) {
    print!("{text}");
    std::io::stdout().flush().ok();
}

fn print_notice(text: &str) {
    println!("{}{}", BAR_CHAR.bright_yellow(), text.dimmed());
}

fn print_help() {
    let commands = [
        ("/voice", "turn spoken replies on or off"),
        ("/replay", "speak the latest reply again"),
        ("/quit", "leave the chat"),
    ];
    for (command, description) in commands {
        let command = format!("{command:<8}");
        println!("  {} {}", command.bright_white(), description.dimmed());
    }
    println!("  {}", "End a line with \\ to continue on the next one.".dimmed());
}

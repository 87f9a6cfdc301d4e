//! Terminal client of the search assistant.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lang_search::core::{DispatchEvent, Role, Turn};
use lang_search::{AssistantBuilder, Config};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", "error:".bright_red().bold());
            return ExitCode::FAILURE;
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let session = AssistantBuilder::from_config(&config)
        .on_event(move |event| {
            event_tx.send(event).ok();
        })
        .build();
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{} {err}", "error:".bright_red().bold());
            return ExitCode::FAILURE;
        }
    };

    for turn in session.transcript().all() {
        print_turn(turn);
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("Searching... Please wait.");

        let reply = {
            let mut submit = pin!(session.submit_query(query));
            loop {
                select! {
                    reply = &mut submit => {
                        break reply.cloned();
                    }
                    Some(event) = event_rx.recv() => {
                        show_event(&progress_bar, event);
                    }
                    _ = sleep(Duration::from_millis(100)) => {
                        progress_bar.inc(1);
                    }
                }
            }
        };

        drain_events(&progress_bar, &mut event_rx);
        // Finish the progress bar before printing anything else.
        progress_bar.finish_and_clear();
        if let Some(reply) = reply {
            print_turn(&reply);
        }
    }

    ExitCode::SUCCESS
}

/// Shows the events sent while the query was completing.
fn drain_events(
    progress_bar: &ProgressBar,
    event_rx: &mut mpsc::UnboundedReceiver<DispatchEvent>,
) {
    while let Ok(event) = event_rx.try_recv() {
        show_event(progress_bar, event);
    }
}

fn show_event(progress_bar: &ProgressBar, event: DispatchEvent) {
    match event {
        DispatchEvent::RateLimited { wait } => {
            progress_bar.set_message(format!(
                "Waiting {:.1}s before searching...",
                wait.as_secs_f64()
            ));
        }
        DispatchEvent::ToolCall { name, arguments } => {
            let query = arguments["query"].as_str().unwrap_or_default();
            progress_bar.println(format!(
                "{}🔍 {} {}",
                BAR_CHAR.bright_yellow(),
                name.bold(),
                query.dimmed()
            ));
            progress_bar.set_message("Searching... Please wait.");
        }
        DispatchEvent::ToolResult { name, success } => {
            if !success {
                progress_bar.println(format!(
                    "{}⚠️  {name} failed",
                    BAR_CHAR.bright_yellow()
                ));
            }
        }
        DispatchEvent::MessageDelta(_) => {
            progress_bar.set_message("Writing the answer...");
        }
    }
}

fn print_turn(turn: &Turn) {
    match turn.role() {
        Role::Assistant => println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            turn.content().bright_white()
        ),
        Role::User => println!("> {}", turn.content()),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_events() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        event_tx
            .send(DispatchEvent::MessageDelta("Rust".to_owned()))
            .unwrap();
        event_tx
            .send(DispatchEvent::ToolResult {
                name: "web_search".to_owned(),
                success: false,
            })
            .unwrap();

        let progress_bar = ProgressBar::hidden();
        drain_events(&progress_bar, &mut event_rx);
        assert!(event_rx.try_recv().is_err());

        // Nothing is left over for the next query.
        event_tx
            .send(DispatchEvent::MessageDelta("next".to_owned()))
            .unwrap();
        assert_eq!(
            event_rx.try_recv().unwrap(),
            DispatchEvent::MessageDelta("next".to_owned())
        );
    }
}

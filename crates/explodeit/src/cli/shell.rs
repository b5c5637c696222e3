//! Interactive session.
//!
//! Keeps one session alive across several generations so history can be
//! listed, selected and cleared.

use super::AppContext;
use super::generate::generate_and_save;
use super::progress::print_summary;
use explodeit::{ArtifactWriter, render_article};
use std::io::Write as _;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  generate <topic>   build an entry for <topic>
  surprise           build an entry for a random object
  video on|off       toggle the animation stage
  history            list past entries
  select <n>         select entry <n> from the history list
  show               print the selected entry's article
  totals             session cost and units
  clear              empty the history
  key <KEY>          save an API key
  help               this text
  quit               leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Generate(String),
    Surprise,
    Video(bool),
    History,
    Select(usize),
    Show,
    Totals,
    Clear,
    Key(String),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match (word, rest) {
            ("", _) => Self::Empty,
            ("generate" | "g", "") => Self::Invalid("generate needs a topic".to_string()),
            ("generate" | "g", topic) => Self::Generate(topic.to_string()),
            ("surprise" | "s", _) => Self::Surprise,
            ("video", "on") => Self::Video(true),
            ("video", "off") => Self::Video(false),
            ("history" | "h", _) => Self::History,
            ("select", n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Select(n),
                _ => Self::Invalid(format!("not a history number: {n:?}")),
            },
            ("show", _) => Self::Show,
            ("totals", _) => Self::Totals,
            ("clear", _) => Self::Clear,
            ("key", key) if !key.is_empty() => Self::Key(key.to_string()),
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", _) => Self::Quit,
            _ => Self::Invalid(format!("unknown command: {line}")),
        }
    }
}

fn prompt() {
    print!("explodeit> ");
    let _ = std::io::stdout().flush();
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_shell(context: &AppContext, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = context.pipeline.session();
    let writer = ArtifactWriter::new(out);
    let mut with_video = true;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    prompt();
    while let Some(line) = lines.next_line().await? {
        match ShellCommand::parse(&line) {
            ShellCommand::Generate(topic) => {
                if let Err(e) = generate_and_save(context, Some(&topic), with_video, out).await {
                    eprintln!("Error: {e}");
                }
            }
            ShellCommand::Surprise => {
                if let Err(e) = generate_and_save(context, None, with_video, out).await {
                    eprintln!("Error: {e}");
                }
            }
            ShellCommand::Video(enabled) => {
                with_video = enabled;
                println!("Animation {}", if enabled { "on" } else { "off" });
            }
            ShellCommand::History => {
                let snapshot = session.snapshot().await;
                if snapshot.history.is_empty() {
                    println!("No entries yet");
                }
                for (n, item) in snapshot.history.iter().enumerate() {
                    let marker = if snapshot.selected.as_ref() == Some(item.id()) {
                        '*'
                    } else {
                        ' '
                    };
                    println!(
                        "{marker} {:>2}. {} (${:.4})",
                        n + 1,
                        item.prompt(),
                        item.total_cost()
                    );
                }
            }
            ShellCommand::Select(n) => {
                let snapshot = session.snapshot().await;
                match snapshot.history.get(n - 1) {
                    Some(item) => {
                        session.select(item.id()).await?;
                        print_summary(item);
                    }
                    None => eprintln!("No entry {n}"),
                }
            }
            ShellCommand::Show => {
                let snapshot = session.snapshot().await;
                match snapshot.selected_item() {
                    Some(item) => {
                        println!("{}", render_article(item));
                        println!("Files: {}", writer.item_dir(item).display());
                    }
                    None => println!("Nothing selected"),
                }
            }
            ShellCommand::Totals => {
                let totals = session.totals().await;
                println!(
                    "{} calls, {} input / {} output units, ~${:.4}",
                    totals.calls, totals.input_tokens, totals.output_tokens, totals.cost
                );
            }
            ShellCommand::Clear => {
                session.clear_history().await;
                println!("History cleared");
            }
            ShellCommand::Key(key) => {
                match context
                    .pipeline
                    .save_api_key(&context.credentials, &key)
                    .await
                {
                    Ok(()) => println!("Key saved"),
                    Err(e) => eprintln!("Error: {}", e.summary()),
                }
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
            ShellCommand::Invalid(message) => eprintln!("{message}"),
        }
        prompt();
    }
    Ok(())
}

//! Interactive list screen.
//!
//! Shows the live list and redraws it on every snapshot. Lines typed on
//! stdin stand in for the add button and the long-press menu. Snapshots,
//! input and notices are all handled in one task; remote calls run in the
//! background and report back through a notice channel. Quitting waits for
//! calls still in flight.

use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use itemsync::{
    HttpRemote, ItemActions, ListenerEvent, LocalListStore, Notice, NoticeSink, RemoteStore,
    SyncListener,
};

use super::render::{print_screen, ToastPrinter};

/// Watch the list and edit it interactively
#[derive(Args)]
pub struct WatchCommand {}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput {
    Add { id: String, name: String },
    Edit { position: usize, id: String, name: String },
    Delete { position: usize },
    List,
    Help,
    Quit,
    Empty,
}

impl ShellInput {
    /// Parses a line. Positions are 1-based as shown on screen; names are
    /// the rest of the line. Missing fields parse as empty strings so that
    /// validation, not the parser, reports them.
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "" => Ok(ShellInput::Empty),
            "add" | "a" => {
                let (id, name) = split_field(rest);
                Ok(ShellInput::Add { id, name })
            }
            "edit" | "update" | "e" => {
                let (position, rest) = split_field(rest);
                let position = parse_position(&position)?;
                let (id, name) = split_field(&rest);
                Ok(ShellInput::Edit { position, id, name })
            }
            "delete" | "del" | "d" => Ok(ShellInput::Delete {
                position: parse_position(rest)?,
            }),
            "list" | "ls" => Ok(ShellInput::List),
            "help" | "?" => Ok(ShellInput::Help),
            "quit" | "exit" | "q" => Ok(ShellInput::Quit),
            other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
        }
    }
}

fn split_field(text: &str) -> (String, String) {
    match text.trim().split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

fn parse_position(text: &str) -> Result<usize, String> {
    match text.trim().parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(format!("Invalid list position '{}'", text.trim())),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  add <id> <name>            add an item");
    println!("  edit <#> <new id> <name>   update the item at position #");
    println!("  delete <#>                 delete the item at position #");
    println!("  list                       redraw the list");
    println!("  quit                       leave");
}

impl WatchCommand {
    pub async fn run(&self, remote: &HttpRemote) -> Result<(), Box<dyn std::error::Error>> {
        print_help();
        let input = BufReader::new(tokio::io::stdin());
        run_session(remote, input, &mut ToastPrinter).await?;
        Ok(())
    }
}

/// Runs the screen until `quit` or end of input.
///
/// Remote calls run as tasks in a [`JoinSet`]; on the way out every pending
/// call is awaited and its notice delivered before returning.
async fn run_session<R, I, T>(remote: &R, input: I, toasts: &mut T) -> std::io::Result<()>
where
    R: RemoteStore + Clone + Send + Sync + 'static,
    I: AsyncBufRead + Unpin,
    T: NoticeSink,
{
    let mut store = LocalListStore::new();
    let mut listener = SyncListener::new();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<Notice>();
    let mut pending: JoinSet<()> = JoinSet::new();

    listener.subscribe(remote, toasts).await;

    let mut lines = input.lines();

    loop {
        tokio::select! {
            event = listener.next_event() => {
                if let ListenerEvent::Replaced { .. } = listener.apply(event, &mut store, toasts) {
                    print_screen(store.items());
                }
            }
            Some(notice) = notice_rx.recv() => {
                toasts.notify(notice);
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                log_join_error(joined);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let input = match ShellInput::parse(&line) {
                    Ok(input) => input,
                    Err(message) => {
                        eprintln!("{}", message);
                        continue;
                    }
                };
                let remote = remote.clone();
                let mut sink = notice_tx.clone();
                match input {
                    ShellInput::Quit => break,
                    ShellInput::Empty => {}
                    ShellInput::Help => print_help(),
                    ShellInput::List => print_screen(store.items()),
                    ShellInput::Add { id, name } => {
                        pending.spawn(async move {
                            let _ = ItemActions::new(&remote, &mut sink).add(&id, &name).await;
                        });
                    }
                    ShellInput::Edit { position, id, name } => {
                        let Some(original) = store.get(position - 1).cloned() else {
                            eprintln!("No item at position {}", position);
                            continue;
                        };
                        pending.spawn(async move {
                            let _ = ItemActions::new(&remote, &mut sink)
                                .update(&original, &id, &name)
                                .await;
                        });
                    }
                    ShellInput::Delete { position } => {
                        let Some(item) = store.get(position - 1).cloned() else {
                            eprintln!("No item at position {}", position);
                            continue;
                        };
                        pending.spawn(async move {
                            let _ = ItemActions::new(&remote, &mut sink).delete(&item).await;
                        });
                    }
                }
            }
        }
    }

    if !pending.is_empty() {
        tracing::debug!(count = pending.len(), "Waiting for pending remote calls");
    }
    while let Some(joined) = pending.join_next().await {
        log_join_error(joined);
    }
    drop(notice_tx);
    while let Some(notice) = notice_rx.recv().await {
        toasts.notify(notice);
    }

    Ok(())
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::warn!(error = %e, "Remote call task failed");
    }
}

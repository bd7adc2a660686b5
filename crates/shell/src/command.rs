// Command parsing for the queue shell

use anyhow::{bail, Context, Result};

/// One parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a fresh queue, freeing any existing one
    New,
    /// Free the current queue
    Free,
    /// Insert `count` copies of `value` at the head
    InsertHead { value: String, count: usize },
    /// Insert `count` copies of `value` at the tail
    InsertTail { value: String, count: usize },
    /// Remove the head into the shell buffer, optionally checking the result
    RemoveHead { expected: Option<String> },
    /// Remove the head without copying it out
    RemoveHeadQuiet,
    /// Print the size, optionally checking it
    Size { expected: Option<usize> },
    Reverse,
    Show,
    /// Refuse the next `count` storage reservations
    Fail { count: usize },
    /// Print the allocation ledger as JSON
    Stats,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  new                 create a new queue (frees the current one)
  free                free the current queue
  ih <str> [n]        insert <str> at head, n times (default 1)
  it <str> [n]        insert <str> at tail, n times (default 1)
  rh [expected]       remove from head, optionally compare with <expected>
  rhq                 remove from head without reporting the value
  size [expected]     print queue size, optionally compare with <expected>
  reverse             reverse the queue in place
  show                print the queue
  fail <n>            make the next n storage reservations fail
  stats               print the allocation ledger as JSON
  help                show this text
  quit                leave the shell
Lines starting with '#' are comments.";

/// Parse one input line
///
/// # Returns
/// `None` for blank lines and comments
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name {
        "new" => no_args(name, &args, Command::New)?,
        "free" => no_args(name, &args, Command::Free)?,
        "ih" | "it" => {
            let (value, count) = match args.as_slice() {
                [value] => (*value, 1),
                [value, count] => (*value, parse_count(count)?),
                _ => bail!("{} expects <str> [n]", name),
            };
            let value = value.to_string();
            if name == "ih" {
                Command::InsertHead { value, count }
            } else {
                Command::InsertTail { value, count }
            }
        }
        "rh" => match args.as_slice() {
            [] => Command::RemoveHead { expected: None },
            [expected] => Command::RemoveHead {
                expected: Some(expected.to_string()),
            },
            _ => bail!("rh expects at most one argument"),
        },
        "rhq" => no_args(name, &args, Command::RemoveHeadQuiet)?,
        "size" => match args.as_slice() {
            [] => Command::Size { expected: None },
            [expected] => Command::Size {
                expected: Some(parse_count(expected)?),
            },
            _ => bail!("size expects at most one argument"),
        },
        "reverse" => no_args(name, &args, Command::Reverse)?,
        "show" => no_args(name, &args, Command::Show)?,
        "fail" => match args.as_slice() {
            [count] => Command::Fail {
                count: parse_count(count)?,
            },
            _ => bail!("fail expects <n>"),
        },
        "stats" => no_args(name, &args, Command::Stats)?,
        "help" => no_args(name, &args, Command::Help)?,
        "quit" | "exit" => no_args(name, &args, Command::Quit)?,
        other => bail!("unknown command '{}'", other),
    };

    Ok(Some(command))
}

fn no_args(name: &str, args: &[&str], command: Command) -> Result<Command> {
    if !args.is_empty() {
        bail!("{} takes no arguments", name);
    }
    Ok(command)
}

fn parse_count(text: &str) -> Result<usize> {
    text.parse()
        .with_context(|| format!("'{}' is not a non-negative number", text))
}

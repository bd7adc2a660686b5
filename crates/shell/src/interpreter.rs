// Interpreter - runs shell commands against an optional queue

use crate::command::{parse_line, Command, HELP};
use anyhow::Result;
use colored::Colorize;
use queue_core::handle;
use queue_core::port::AccountingStorage;
use queue_core::{QueueError, TextQueue, TextValue};
use std::io::{BufRead, Write};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Values printed by `show` before the rest is elided
const SHOW_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Outcome of a whole session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub commands: usize,
    /// Rejected lines, unmet expectations and a leak at teardown
    pub failures: usize,
    pub leaked: bool,
}

/// Command interpreter holding at most one queue
///
/// Every queue operation goes through [`queue_core::handle`], so commands are
/// legal whether or not a queue currently exists. All storage is reserved
/// through one `AccountingStorage`, which lets `fail` inject refusals and lets
/// `finish` detect leaks.
pub struct Interpreter<W: Write> {
    queue: Option<TextQueue>,
    storage: Rc<AccountingStorage>,
    buffer: Vec<u8>,
    out: W,
    commands: usize,
    failures: usize,
}

impl<W: Write> Interpreter<W> {
    /// # Arguments
    /// * `buffer_size` - capacity of the removal buffer, terminator included
    /// * `out` - where command output goes
    pub fn new(buffer_size: usize, out: W) -> Self {
        Self {
            queue: None,
            storage: Rc::new(AccountingStorage::new()),
            buffer: vec![0; buffer_size],
            out,
            commands: 0,
            failures: 0,
        }
    }

    /// Run every line of `input`, stopping early on `quit`
    pub fn run(&mut self, input: impl BufRead) -> Result<()> {
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;

            match parse_line(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    if self.execute(command)? == Flow::Quit {
                        info!(line = line_no, "quit requested");
                        break;
                    }
                }
                Err(err) => {
                    warn!(line = line_no, error = %err, "rejected command");
                    self.fail(format!("line {}: {}", line_no, err))?;
                }
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        self.commands += 1;
        debug!(?command, "executing");

        match command {
            Command::New => {
                handle::destroy(self.queue.take());
                match handle::create(self.storage.clone()) {
                    Ok(queue) => self.queue = Some(queue),
                    Err(err) => self.report(err)?,
                }
                self.show()?;
            }
            Command::Free => {
                handle::destroy(self.queue.take());
                self.show()?;
            }
            Command::InsertHead { value, count } => self.insert(&value, count, true)?,
            Command::InsertTail { value, count } => self.insert(&value, count, false)?,
            Command::RemoveHead { expected } => self.remove_head(expected)?,
            Command::RemoveHeadQuiet => {
                if let Err(err) = handle::remove_head(self.queue.as_mut(), None) {
                    self.report(err)?;
                }
                self.show()?;
            }
            Command::Size { expected } => {
                if self.queue.is_none() {
                    writeln!(self.out, "{} Calling size on null queue", "WARNING:".yellow())?;
                }
                let size = handle::size(self.queue.as_ref());
                writeln!(self.out, "Queue size = {}", size)?;
                if let Some(expected) = expected {
                    if size != expected {
                        self.fail(format!(
                            "Computed queue size as {}, but correct value is {}",
                            size, expected
                        ))?;
                    }
                }
            }
            Command::Reverse => {
                handle::reverse(self.queue.as_mut());
                self.show()?;
            }
            Command::Show => self.show()?,
            Command::Fail { count } => {
                self.storage.fail_next(count);
                writeln!(self.out, "Next {} allocation(s) will fail", count)?;
            }
            Command::Stats => {
                let stats = serde_json::to_string_pretty(&self.storage.stats())?;
                writeln!(self.out, "{}", stats)?;
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Free the queue and check that every reservation came back
    pub fn finish(mut self) -> Result<Summary> {
        handle::destroy(self.queue.take());

        let stats = self.storage.stats();
        let leaked = !stats.is_balanced();
        if leaked {
            warn!(live = stats.live(), "storage still held after teardown");
            writeln!(
                self.out,
                "{} storage still held after teardown: {}",
                "ERROR:".red().bold(),
                serde_json::to_string(&stats)?
            )?;
        }
        self.out.flush()?;

        Ok(Summary {
            commands: self.commands,
            failures: self.failures + usize::from(leaked),
            leaked,
        })
    }

    fn insert(&mut self, value: &str, count: usize, at_head: bool) -> Result<()> {
        for inserted in 0..count {
            let result = if at_head {
                handle::insert_head(self.queue.as_mut(), value.as_bytes())
            } else {
                handle::insert_tail(self.queue.as_mut(), value.as_bytes())
            };

            if let Err(err) = result {
                self.report(err)?;
                if inserted > 0 {
                    writeln!(self.out, "Inserted {} of {} copies", inserted, count)?;
                }
                break;
            }
        }
        self.show()
    }

    fn remove_head(&mut self, expected: Option<String>) -> Result<()> {
        match handle::remove_head(self.queue.as_mut(), Some(self.buffer.as_mut_slice())) {
            Ok(()) => {
                let removed = removed_text(&self.buffer);
                writeln!(self.out, "Removed {} from queue", String::from_utf8_lossy(removed))?;

                if let Some(expected) = expected {
                    let expected = truncated(expected.as_bytes(), self.buffer.len());
                    if removed != expected {
                        let message = format!(
                            "Removed value {} != expected value {}",
                            String::from_utf8_lossy(removed),
                            String::from_utf8_lossy(expected)
                        );
                        self.fail(message)?;
                    }
                }
            }
            Err(err) => {
                self.report(err)?;
                if let Some(expected) = expected {
                    self.fail(format!("Expected to remove {}, but nothing was removed", expected))?;
                }
            }
        }
        self.show()
    }

    fn show(&mut self) -> Result<()> {
        let Some(queue) = self.queue.as_ref() else {
            writeln!(self.out, "q = NULL")?;
            return Ok(());
        };

        let mut line = String::from("q = [");
        for (index, value) in queue.iter().take(SHOW_LIMIT).enumerate() {
            if index > 0 {
                line.push(' ');
            }
            line.push_str(&value.to_string_lossy());
        }
        if queue.len() > SHOW_LIMIT {
            line.push_str(" ...");
        }
        line.push(']');

        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    /// Queue errors are expected outcomes in a fault-testing shell, not failures
    fn report(&mut self, err: QueueError) -> Result<()> {
        debug!(error = %err, "queue operation failed");
        writeln!(self.out, "{} {}", "WARNING:".yellow(), err)?;
        Ok(())
    }

    fn fail(&mut self, message: String) -> Result<()> {
        self.failures += 1;
        writeln!(self.out, "{} {}", "ERROR:".red().bold(), message)?;
        Ok(())
    }
}

/// Text left in the removal buffer, up to its terminator
fn removed_text(buffer: &[u8]) -> &[u8] {
    TextValue::significant(buffer)
}

/// What a value looks like after a removal into a buffer of `capacity`
fn truncated(text: &[u8], capacity: usize) -> &[u8] {
    &text[..text.len().min(capacity.saturating_sub(1))]
}

//! Console commands read from stdin
//!
//! One command per line; blank lines are ignored by the caller.

use anyhow::{Context, Result, bail};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  r          refresh now
  i <ms>     set refresh interval (milliseconds, saved to settings)
  p          check connectivity
  h          show this help
  q          quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    /// New refresh interval in milliseconds
    SetInterval(u64),
    Probe,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some("r" | "refresh") => Command::Refresh,
            Some("i" | "interval") => {
                let ms = parts.next().context("Missing interval in milliseconds")?;
                let ms = ms
                    .parse::<u64>()
                    .with_context(|| format!("Invalid interval: {}", ms))?;
                Command::SetInterval(ms)
            }
            Some("p" | "probe") => Command::Probe,
            Some("h" | "help" | "?") => Command::Help,
            Some("q" | "quit" | "exit") => Command::Quit,
            Some(other) => bail!("Unknown command: {}", other),
            None => bail!("Empty command"),
        };

        if parts.next().is_some() {
            bail!("Unexpected arguments in: {}", line.trim());
        }
        Ok(command)
    }
}

//! # Local Fleet
//!
//! Terminal front end for the fleet tracker. Renders the projected fleet to
//! stdout after every change and reads commands from stdin. Logs go to
//! stderr.

mod config;
mod provider;
mod render;

use std::str::FromStr;

use anyhow::{Result, anyhow};
use chrono::Utc;
use fleet_tracker::{Session, SessionHandle, Snapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{AppConfig, MapSize, ReplaySource};
use crate::provider::Provider;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env();
    let provider = Provider::new(&config)?;
    let session = Session::new(provider, config.tracker.clone());
    let handle = session.handle();
    let running = tokio::spawn(session.run());

    tokio::spawn(display(handle.snapshots(), config.map));

    if config.replay == ReplaySource::Stdin {
        // stdin carries samples, so there is no one to type `arm`
        handle.arm()?;
        tokio::signal::ctrl_c().await?;
    } else {
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            result = commands(&handle) => result?,
        }
    }

    info!("shutting down");
    handle.shutdown()?;
    running.await?;

    // a blocked stdin read cannot be cancelled and would stall runtime shutdown
    std::process::exit(0)
}

async fn display(mut snapshots: watch::Receiver<Snapshot>, map: MapSize) {
    let mut stdout = tokio::io::stdout();

    while snapshots.changed().await.is_ok() {
        let frame = render::frame(&snapshots.borrow_and_update(), map, Utc::now());
        let written = async {
            stdout.write_all(CLEAR_SCREEN.as_bytes()).await?;
            stdout.write_all(frame.as_bytes()).await?;
            stdout.flush().await
        };
        if let Err(e) = written.await {
            warn!(error = %e, "failed to render");
            return;
        }
    }
}

/// Read commands until `quit` or end of input.
async fn commands(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let input = match line.parse::<Input>() {
            Ok(input) => input,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        match input {
            Input::Arm => handle.arm()?,
            Input::Disarm => handle.disarm()?,
            Input::Toggle => handle.toggle()?,
            Input::Select(id) => handle.select(id)?,
            Input::Clear => handle.clear_selection()?,
            Input::Quit => break,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Arm,
    Disarm,
    Toggle,
    Select(String),
    Clear,
    Quit,
}

impl FromStr for Input {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let input = match (words.next(), words.next()) {
            (Some("arm"), None) => Self::Arm,
            (Some("disarm"), None) => Self::Disarm,
            (Some("toggle"), None) => Self::Toggle,
            (Some("select"), Some(id)) => Self::Select(id.to_string()),
            (Some("clear"), None) => Self::Clear,
            (Some("quit" | "exit"), None) => Self::Quit,
            _ => return Err(anyhow!("unknown command: {}", line.trim())),
        };
        if words.next().is_some() {
            return Err(anyhow!("unexpected arguments: {}", line.trim()));
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Input;

    #[test]
    fn parse_commands() {
        assert_eq!("arm".parse::<Input>().ok(), Some(Input::Arm));
        assert_eq!("  disarm ".parse::<Input>().ok(), Some(Input::Disarm));
        assert_eq!("toggle".parse::<Input>().ok(), Some(Input::Toggle));
        assert_eq!("select v1".parse::<Input>().ok(), Some(Input::Select("v1".to_string())));
        assert_eq!("clear".parse::<Input>().ok(), Some(Input::Clear));
        assert_eq!("quit".parse::<Input>().ok(), Some(Input::Quit));
    }

    #[test]
    fn reject_bad_commands() {
        assert!("select".parse::<Input>().is_err());
        assert!("arm now".parse::<Input>().is_err());
        assert!("select v1 v2".parse::<Input>().is_err());
        assert!("launch".parse::<Input>().is_err());
    }
}

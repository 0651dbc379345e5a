//! Host implementations of the tracker's provider traits: `reqwest` for the
//! store, and a replayed sample feed standing in for a location sensor.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use fleet_sdk::{HttpRequest, Location, LocationEvent, Sample, Subscription, WatchId};
use http::{Request, Response};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{AppConfig, ReplaySource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Provider {
    client: reqwest::Client,
    location: Replay,
}

impl Provider {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building http client")?;
        let location = Replay::new(config.replay.clone(), config.replay_step);
        Ok(Self { client, location })
    }
}

impl fleet_sdk::Provider for Provider {}

impl HttpRequest for Provider {
    async fn fetch(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let request = reqwest::Request::try_from(request).context("converting request")?;
        let response = self.client.execute(request).await.context("sending request")?;

        let mut builder = Response::builder().status(response.status());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response.bytes().await.context("reading response body")?;

        builder.body(body).context("building response")
    }
}

impl Location for Provider {
    fn subscribe(&self) -> Result<Subscription> {
        self.location.subscribe()
    }

    fn unsubscribe(&self, id: WatchId) {
        self.location.unsubscribe(id);
    }
}

/// One line of a replay feed: either a sample or a revocation.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum ReplayLine {
    Sample(Sample),
    Denied { denied: String },
}

#[derive(Clone)]
enum Feed {
    File(PathBuf),

    // shared so a re-arm resumes where the previous watch stopped reading
    Stdin(Arc<tokio::sync::Mutex<Lines<BufReader<Stdin>>>>),
}

/// Location capability that replays newline-delimited JSON samples, one per
/// `step`. A file is replayed from the start on every subscribe.
#[derive(Clone)]
pub struct Replay {
    feed: Option<Feed>,
    step: Duration,
    next_id: Arc<AtomicU64>,
    watches: Arc<Mutex<HashMap<WatchId, JoinHandle<()>>>>,
}

impl Replay {
    pub fn new(source: ReplaySource, step: Duration) -> Self {
        let feed = match source {
            ReplaySource::None => None,
            ReplaySource::Stdin => {
                let lines = BufReader::new(tokio::io::stdin()).lines();
                Some(Feed::Stdin(Arc::new(tokio::sync::Mutex::new(lines))))
            }
            ReplaySource::File(path) => Some(Feed::File(path)),
        };

        Self {
            feed,
            step,
            next_id: Arc::new(AtomicU64::new(1)),
            watches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn subscribe(&self) -> Result<Subscription> {
        let Some(feed) = self.feed.clone() else {
            return Err(anyhow!("no location source configured"));
        };

        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, events) = mpsc::channel(16);
        let task = tokio::spawn(play(feed, self.step, tx));
        self.watches.lock().unwrap_or_else(PoisonError::into_inner).insert(id, task);

        debug!(watch = id.0, "replay started");
        Ok(Subscription { id, events })
    }

    fn unsubscribe(&self, id: WatchId) {
        let task = self.watches.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
        if let Some(task) = task {
            task.abort();
            debug!(watch = id.0, "replay stopped");
        }
    }
}

async fn play(feed: Feed, step: Duration, tx: mpsc::Sender<LocationEvent>) {
    match feed {
        Feed::File(path) => match File::open(&path).await {
            Ok(file) => replay(BufReader::new(file).lines(), step, &tx).await,
            Err(e) => {
                let reason = format!("opening {}: {e}", path.display());
                let _ = tx.send(LocationEvent::Denied(reason)).await;
            }
        },
        Feed::Stdin(lines) => {
            let mut lines = lines.lock().await;
            replay_from(&mut lines, step, &tx).await;
        }
    }
}

async fn replay<R: AsyncBufRead + Unpin>(
    mut lines: Lines<R>, step: Duration, tx: &mpsc::Sender<LocationEvent>,
) {
    replay_from(&mut lines, step, tx).await;
}

async fn replay_from<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>, step: Duration, tx: &mpsc::Sender<LocationEvent>,
) {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to read replay feed");
                return;
            }
        };

        let event = match parse_line(&line) {
            Ok(Some(ReplayLine::Sample(sample))) => {
                tokio::time::sleep(step).await;
                LocationEvent::Sample(sample)
            }
            Ok(Some(ReplayLine::Denied { denied })) => LocationEvent::Denied(denied),
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping replay line");
                continue;
            }
        };

        let denied = matches!(event, LocationEvent::Denied(_));
        if tx.send(event).await.is_err() || denied {
            return;
        }
    }
}

// Blank lines and `#` comments are skipped.
fn parse_line(line: &str) -> Result<Option<ReplayLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).with_context(|| format!("invalid replay line: {line}")).map(Some)
}

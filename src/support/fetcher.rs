// SPDX-License-Identifier: MPL-2.0
//! Asynchronous resource loading with progress reporting.
//!
//! A [`Fetcher`] wraps a single transfer, either an HTTP(S) streaming
//! reqwest GET or a chunked local file read, and reports through its
//! [`EventBus`]: zero or more `progress` events followed by exactly one
//! `complete` or `error` event. An aborted transfer discards partial data
//! and fires nothing.

use crate::error::FetchError;
use crate::support::bus::EventBus;
use futures_util::StreamExt;
use iced::futures::channel::mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Label for transfer progress events.
pub const EVENT_PROGRESS: &str = "progress";
/// Label for the single successful-completion event.
pub const EVENT_COMPLETE: &str = "complete";
/// Label for the single fatal-failure event.
pub const EVENT_ERROR: &str = "error";

const USER_AGENT: &str = concat!("Folio/", env!("CARGO_PKG_VERSION"));
const LOCAL_CHUNK_BYTES: usize = 64 * 1024;

/// Shared flag used to abort an in-flight transfer.
pub type CancellationToken = Arc<AtomicBool>;

/// Expected shape of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Raw bytes (image content).
    Binary,
    /// UTF-8 text.
    Text,
    /// UTF-8 text that the caller will parse as a document (content map).
    Document,
}

/// Payload of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPayload {
    Binary(Vec<u8>),
    Text(String),
}

/// Event published on a fetcher's bus.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Progress { loaded: u64, total: Option<u64> },
    Complete(FetchPayload),
    Failed(FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferState {
    Idle,
    Loading,
    Done,
}

/// A single asynchronous resource transfer.
#[derive(Debug)]
pub struct Fetcher {
    url: String,
    kind: ResponseKind,
    events: EventBus<FetchEvent>,
    cancel: CancellationToken,
    state: TransferState,
}

impl Fetcher {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: ResponseKind) -> Self {
        Self::with_token(url, kind, CancellationToken::default())
    }

    /// Builds a fetcher whose lifetime is controlled by an external token,
    /// so the owner can abort after handing the fetcher to a task.
    #[must_use]
    pub fn with_token(url: impl Into<String>, kind: ResponseKind, cancel: CancellationToken) -> Self {
        Self {
            url: url.into(),
            kind,
            events: EventBus::new(),
            cancel,
            state: TransferState::Idle,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The event registry; subscribe before calling [`Fetcher::load`].
    pub fn events(&mut self) -> &mut EventBus<FetchEvent> {
        &mut self.events
    }

    /// A clone of the cancellation flag.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        Arc::clone(&self.cancel)
    }

    /// Requests cancellation of an in-flight transfer.
    pub fn abort(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Runs the transfer. Publishes `progress` events while data arrives,
    /// then exactly one of `complete` or `error`. Repeated calls collapse:
    /// a fetcher that is loading or done does nothing.
    ///
    /// # Errors
    ///
    /// Returns the same [`FetchError`] that is published, or
    /// [`FetchError::Aborted`] (which publishes nothing).
    pub async fn load(&mut self) -> Result<(), FetchError> {
        if self.state != TransferState::Idle {
            return Ok(());
        }
        self.state = TransferState::Loading;

        let result = if is_remote(&self.url) {
            self.transfer_remote().await
        } else {
            self.transfer_local().await
        };

        self.state = TransferState::Done;

        match result {
            Ok(bytes) => match decode_payload(bytes, self.kind) {
                Ok(payload) => {
                    self.events.publish(EVENT_COMPLETE, &FetchEvent::Complete(payload));
                    Ok(())
                }
                Err(error) => {
                    self.events.publish(EVENT_ERROR, &FetchEvent::Failed(error.clone()));
                    Err(error)
                }
            },
            Err(FetchError::Aborted) => Err(FetchError::Aborted),
            Err(error) => {
                self.events.publish(EVENT_ERROR, &FetchEvent::Failed(error.clone()));
                Err(error)
            }
        }
    }

    async fn transfer_remote(&mut self) -> Result<Vec<u8>, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(self.url.clone()));
        }
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let total = response.content_length();
        let mut received = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            if self.is_cancelled() {
                return Err(FetchError::Aborted);
            }

            let chunk = chunk.map_err(|e| FetchError::Transport(e.to_string()))?;
            received.extend_from_slice(&chunk);

            self.publish_progress(received.len() as u64, total);
        }

        Ok(received)
    }

    async fn transfer_local(&mut self) -> Result<Vec<u8>, FetchError> {
        let mut file = match tokio::fs::File::open(&self.url).await {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(self.url.clone()));
            }
            Err(error) => return Err(FetchError::Transport(error.to_string())),
        };

        let total = file.metadata().await.ok().map(|m| m.len());
        let mut received = Vec::new();
        let mut chunk = vec![0_u8; LOCAL_CHUNK_BYTES];

        loop {
            if self.is_cancelled() {
                return Err(FetchError::Aborted);
            }

            let read = file
                .read(&mut chunk)
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            if read == 0 {
                break;
            }

            received.extend_from_slice(&chunk[..read]);
            self.publish_progress(received.len() as u64, total);
        }

        Ok(received)
    }

    fn publish_progress(&mut self, loaded: u64, total: Option<u64>) {
        self.events
            .publish(EVENT_PROGRESS, &FetchEvent::Progress { loaded, total });
    }

    /// Aborts the transfer and clears all subscriptions.
    pub fn dispose(&mut self) {
        self.abort();
        self.events.dispose();
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn decode_payload(bytes: Vec<u8>, kind: ResponseKind) -> Result<FetchPayload, FetchError> {
    match kind {
        ResponseKind::Binary => Ok(FetchPayload::Binary(bytes)),
        ResponseKind::Text | ResponseKind::Document => String::from_utf8(bytes)
            .map(FetchPayload::Text)
            .map_err(|_| FetchError::Transport("response is not valid UTF-8".to_string())),
    }
}

/// Bridges a transfer into a message stream for the update loop: spawns the
/// transfer and yields every published [`FetchEvent`] in order. The stream
/// ends after the terminal event; an aborted transfer ends it silently.
pub fn stream(
    url: String,
    kind: ResponseKind,
    cancel: CancellationToken,
) -> impl futures_util::Stream<Item = FetchEvent> + Send {
    let (tx, rx) = mpsc::channel::<FetchEvent>(64);

    tokio::spawn(async move {
        let mut fetcher = Fetcher::with_token(url, kind, cancel);

        for label in [EVENT_PROGRESS, EVENT_COMPLETE, EVENT_ERROR] {
            let mut forward = tx.clone();
            fetcher.events().subscribe(label, move |event: &FetchEvent| {
                // A full channel only drops progress granularity; terminal
                // events are sent after the loop drains.
                let _ = forward.try_send(event.clone());
            });
        }

        let _ = fetcher.load().await;
        // Senders drop here, closing the stream.
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn collect_events(fetcher: &mut Fetcher) -> Arc<Mutex<Vec<FetchEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for label in [EVENT_PROGRESS, EVENT_COMPLETE, EVENT_ERROR] {
            let sink = Arc::clone(&seen);
            fetcher.events().subscribe(label, move |event: &FetchEvent| {
                sink.lock().unwrap().push(event.clone());
            });
        }
        seen
    }

    #[tokio::test]
    async fn local_binary_fetch_completes_with_contents() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("blob.bin");
        std::fs::write(&path, [7_u8; 1000]).expect("write blob");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Binary);
        let seen = collect_events(&mut fetcher);

        fetcher.load().await.expect("load succeeds");

        let events = seen.lock().unwrap();
        match events.last() {
            Some(FetchEvent::Complete(FetchPayload::Binary(bytes))) => {
                assert_eq!(bytes.len(), 1000);
                assert!(bytes.iter().all(|b| *b == 7));
            }
            other => panic!("expected Complete, got {other:?}"),
        }

        // At least one progress event, with a known total.
        match events.first() {
            Some(FetchEvent::Progress { loaded, total }) => {
                assert!(*loaded > 0);
                assert_eq!(*total, Some(1000));
            }
            other => panic!("expected Progress first, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_fetch_decodes_utf8() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("map.xml");
        std::fs::write(&path, "<root id=\"root\"/>").expect("write map");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Document);
        let seen = collect_events(&mut fetcher);

        fetcher.load().await.expect("load succeeds");

        match seen.lock().unwrap().last() {
            Some(FetchEvent::Complete(FetchPayload::Text(text))) => {
                assert!(text.contains("root"));
            }
            other => panic!("expected text payload, got {other:?}"),
        };
    }

    #[tokio::test]
    async fn invalid_utf8_text_is_a_transport_error() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("bad.txt");
        std::fs::write(&path, [0xFF, 0xFE, 0xFD]).expect("write bytes");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Text);
        let seen = collect_events(&mut fetcher);

        match fetcher.load().await {
            Err(FetchError::Transport(_)) => {}
            other => panic!("expected Transport error, got {other:?}"),
        }

        assert!(matches!(
            seen.lock().unwrap().last(),
            Some(FetchEvent::Failed(FetchError::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("absent.png");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Binary);
        match fetcher.load().await {
            Err(FetchError::NotFound(url)) => assert!(url.contains("absent.png")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn aborted_transfer_fires_no_events() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("blob.bin");
        std::fs::write(&path, [1_u8; 64]).expect("write blob");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Binary);
        let seen = collect_events(&mut fetcher);

        fetcher.abort();
        match fetcher.load().await {
            Err(FetchError::Aborted) => {}
            other => panic!("expected Aborted, got {other:?}"),
        }

        assert!(seen.lock().unwrap().is_empty(), "no events after abort");
    }

    #[tokio::test]
    async fn repeated_loads_collapse_to_one_transfer() {
        let temp_dir = tempdir().expect("create temp dir");
        let path = temp_dir.path().join("blob.bin");
        std::fs::write(&path, [2_u8; 16]).expect("write blob");

        let mut fetcher = Fetcher::new(path.to_string_lossy(), ResponseKind::Binary);
        let seen = collect_events(&mut fetcher);

        fetcher.load().await.expect("first load");
        fetcher.load().await.expect("second load is a no-op");

        let completions = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, FetchEvent::Complete(_)))
            .count();
        assert_eq!(completions, 1);
    }
}

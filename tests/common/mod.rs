//! Shared test support: a scripted provider, a virtual clock, and a
//! fully wired application state over a temp directory.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use doc_translate::app_state::AppState;
use doc_translate::services::clock::Clock;
use doc_translate::services::provider::{
    ByteStream, DocumentHandle, DocumentStatus, ProviderError, RemoteState, TranslationProvider,
};
use doc_translate::services::registry::JobRegistry;
use doc_translate::services::runner::{JobRunner, RunnerConfig};
use doc_translate::services::storage::FileStore;

/// Virtual clock: `sleep` advances time instantly, yielding so other tasks
/// on the test runtime can interleave.
pub struct TestClock {
    now: Mutex<Duration>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl Clock for TestClock {
    fn monotonic(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        tokio::task::yield_now().await;
    }
}

/// Scripted provider. Poll responses are consumed front to back; the last
/// entry repeats forever (a provider stuck in `translating` is a script of
/// one entry). The fetch script is a chunk sequence so mid-download
/// failures can be simulated.
pub struct MockProvider {
    submit: Mutex<Result<DocumentHandle, String>>,
    panic_on_submit: bool,
    polls: Mutex<VecDeque<Result<DocumentStatus, String>>>,
    fetch: Mutex<Result<Vec<Result<Vec<u8>, String>>, String>>,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            submit: Mutex::new(Ok(DocumentHandle {
                document_id: "id1".to_string(),
                document_key: "key1".to_string(),
            })),
            panic_on_submit: false,
            polls: Mutex::new(VecDeque::from([Ok(done())])),
            fetch: Mutex::new(Ok(vec![Ok(b"hello".to_vec())])),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_submit(message: &str) -> Self {
        let mock = Self::new();
        *mock.submit.lock().unwrap() = Err(message.to_string());
        mock
    }

    pub fn panicking_submit() -> Self {
        Self {
            panic_on_submit: true,
            ..Self::new()
        }
    }

    pub fn with_polls(polls: Vec<Result<DocumentStatus, String>>) -> Self {
        let mock = Self::new();
        *mock.polls.lock().unwrap() = polls.into();
        mock
    }

    /// Fetch fails before the first byte arrives.
    pub fn failing_fetch(message: &str) -> Self {
        let mock = Self::new();
        *mock.fetch.lock().unwrap() = Err(message.to_string());
        mock
    }

    /// Fetch delivers one chunk and then breaks mid-stream.
    pub fn failing_fetch_midstream(message: &str) -> Self {
        let mock = Self::new();
        *mock.fetch.lock().unwrap() =
            Ok(vec![Ok(b"partial".to_vec()), Err(message.to_string())]);
        mock
    }

    pub fn set_fetch(&self, bytes: Vec<u8>) {
        *self.fetch.lock().unwrap() = Ok(vec![Ok(bytes)]);
    }
}

fn api_error(message: &str) -> ProviderError {
    ProviderError::Api {
        status: 500,
        message: message.to_string(),
    }
}

pub fn done() -> DocumentStatus {
    DocumentStatus {
        state: RemoteState::Done,
        seconds_remaining: None,
        message: None,
    }
}

pub fn queued(eta_secs: u64) -> DocumentStatus {
    DocumentStatus {
        state: RemoteState::Queued,
        seconds_remaining: Some(eta_secs),
        message: None,
    }
}

pub fn translating(eta_secs: u64) -> DocumentStatus {
    DocumentStatus {
        state: RemoteState::Translating,
        seconds_remaining: Some(eta_secs),
        message: None,
    }
}

pub fn remote_error(message: &str) -> DocumentStatus {
    DocumentStatus {
        state: RemoteState::Error,
        seconds_remaining: None,
        message: Some(message.to_string()),
    }
}

pub fn unknown_state(raw: &str) -> DocumentStatus {
    DocumentStatus {
        state: RemoteState::Unknown(raw.to_string()),
        seconds_remaining: None,
        message: None,
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn submit_document(
        &self,
        _file: Vec<u8>,
        _filename: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<DocumentHandle, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_submit {
            panic!("scripted provider panic");
        }
        self.submit
            .lock()
            .unwrap()
            .clone()
            .map_err(|m| api_error(&m))
    }

    async fn poll_status(&self, _doc: &DocumentHandle) -> Result<DocumentStatus, ProviderError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().unwrap();
        let next = if polls.len() > 1 {
            polls.pop_front().unwrap()
        } else {
            polls.front().cloned().expect("poll script exhausted")
        };
        next.map_err(|m| api_error(&m))
    }

    async fn fetch_result(&self, _doc: &DocumentHandle) -> Result<ByteStream, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let chunks = self
            .fetch
            .lock()
            .unwrap()
            .clone()
            .map_err(|m| api_error(&m))?;
        let items: Vec<Result<Vec<u8>, ProviderError>> = chunks
            .into_iter()
            .map(|chunk| chunk.map_err(|m| api_error(&m)))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// A complete wired application over a temp upload directory, a scripted
/// provider and a virtual clock.
pub struct Harness {
    pub state: AppState,
    pub registry: Arc<JobRegistry>,
    pub storage: Arc<FileStore>,
    pub provider: Arc<MockProvider>,
    pub clock: Arc<TestClock>,
    // Held so the directory outlives the test.
    pub dir: TempDir,
}

pub fn harness(provider: MockProvider) -> Harness {
    harness_with_config(provider, RunnerConfig::default())
}

pub fn harness_with_config(provider: MockProvider, config: RunnerConfig) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = Arc::new(FileStore::new(dir.path()).expect("file store"));
    let registry = Arc::new(JobRegistry::new());
    let provider = Arc::new(provider);
    let clock = Arc::new(TestClock::new());

    let runner = JobRunner::new(
        Arc::clone(&registry),
        provider.clone() as Arc<dyn TranslationProvider>,
        Arc::clone(&storage),
        clock.clone() as Arc<dyn Clock>,
        config,
    );

    let state = AppState::new(Arc::clone(&registry), Arc::clone(&storage), runner);

    Harness {
        state,
        registry,
        storage,
        provider,
        clock,
        dir,
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use object_store::{
    memory::InMemory, path::Path, GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta,
    ObjectStore, PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use sportsecho_scheduler::{
    api_client::{FixtureRequest, FixturesFetcher},
    config::SyncConfig,
    error::SyncError,
    fixture_store::FixtureStore,
    metrics::MetricsCollector,
    sync_job::{FixtureSyncJob, SyncDeps},
    types::{NewFixture, ScoreUpdate, Sport},
    watermark::WatermarkStore,
};

pub const BUCKET: &str = "sportsecho-test";

/// Serves one canned body per sport and remembers every request.
#[derive(Default)]
pub struct CannedFetcher {
    bodies: HashMap<Sport, String>,
    requests: Mutex<Vec<(Sport, FixtureRequest)>>,
}

impl CannedFetcher {
    pub fn with_body(mut self, sport: Sport, body: &str) -> Self {
        self.bodies.insert(sport, body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<(Sport, FixtureRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FixturesFetcher for CannedFetcher {
    async fn fetch_fixtures(&self, sport: Sport, request: &FixtureRequest) -> Result<String, SyncError> {
        self.requests.lock().unwrap().push((sport, request.clone()));
        Ok(self
            .bodies
            .get(&sport)
            .cloned()
            .unwrap_or_else(|| r#"{"results": 0, "response": []}"#.to_string()))
    }
}

/// In-memory stand-in for the `game` table.
#[derive(Default)]
pub struct RecordingStore {
    pub updates: Mutex<Vec<ScoreUpdate>>,
    pub inserts: Mutex<Vec<NewFixture>>,
    pub lookups: Mutex<usize>,
    /// Answer for every existence check.
    pub report_existing: bool,
}

impl RecordingStore {
    pub fn reporting_existing() -> Self {
        Self {
            report_existing: true,
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<ScoreUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<NewFixture> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    pub fn call_count(&self) -> usize {
        self.updates().len() + self.inserts().len() + self.lookups()
    }
}

#[async_trait]
impl FixtureStore for RecordingStore {
    async fn update_scores(&self, update: &ScoreUpdate) -> Result<u64, SyncError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(1)
    }

    async fn insert_fixture(&self, fixture: &NewFixture) -> Result<(), SyncError> {
        self.inserts.lock().unwrap().push(fixture.clone());
        Ok(())
    }

    async fn fixture_exists(&self, _fixture: &NewFixture) -> Result<bool, SyncError> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.report_existing)
    }
}

/// Object store that serves from `inner` but fails reads, writes or both.
#[derive(Debug)]
pub struct FailingStore {
    inner: Arc<InMemory>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingStore {
    pub fn failing_reads(inner: Arc<InMemory>) -> Self {
        Self {
            inner,
            fail_reads: true,
            fail_writes: false,
        }
    }

    pub fn failing_writes(inner: Arc<InMemory>) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_writes: true,
        }
    }

    fn check(&self, failing: bool, operation: &str) -> object_store::Result<()> {
        if failing {
            return Err(object_store::Error::Generic {
                store: "FailingStore",
                source: format!("{} refused", operation).into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for FailingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FailingStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.check(self.fail_writes, "put")?;
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.check(self.fail_writes, "put_multipart")?;
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> object_store::Result<GetResult> {
        self.check(self.fail_reads, "get")?;
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> object_store::Result<()> {
        self.check(self.fail_writes, "delete")?;
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> object_store::Result<ListResult> {
        self.check(self.fail_reads, "list")?;
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.check(self.fail_writes, "copy")?;
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.check(self.fail_writes, "copy")?;
        self.inner.copy_if_not_exists(from, to).await
    }
}

pub fn watermarks_over(store: FailingStore) -> WatermarkStore {
    WatermarkStore::new(Arc::new(store), BUCKET)
}

pub fn watermarks() -> WatermarkStore {
    WatermarkStore::new(Arc::new(InMemory::new()), BUCKET)
}

pub fn job<F: FixturesFetcher>(
    sport: Sport,
    fetcher: Arc<F>,
    store: Arc<RecordingStore>,
    watermarks: WatermarkStore,
    skip_existing_fixtures: bool,
) -> FixtureSyncJob<F, RecordingStore> {
    let deps = SyncDeps {
        fetcher,
        store,
        watermarks,
        metrics: MetricsCollector::new(),
        config: SyncConfig {
            skip_existing_fixtures,
        },
    };
    FixtureSyncJob::new(sport, deps)
}

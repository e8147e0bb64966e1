//! Single-frame extraction with a per-source cache and request debouncing

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::domain::errors::{CutError, ExecutionError};
use crate::domain::model::{ThumbnailFrame, TimeSpec};
use crate::engine::command::CommandBuilder;
use crate::ports::ExecutePort;

/// Thumbnails within one bucket share a cache entry
pub const CACHE_BUCKET_MS: u64 = 100;

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 320;

/// Cache key time for `timestamp`, rounded down to its bucket so the
/// extraction never lands after the requested time
pub fn bucket(timestamp: TimeSpec) -> TimeSpec {
    let millis = timestamp.as_millis();
    TimeSpec::from_millis(millis / CACHE_BUCKET_MS * CACHE_BUCKET_MS)
}

#[derive(Default)]
struct FrameCache {
    source: Option<PathBuf>,
    frames: HashMap<TimeSpec, ThumbnailFrame>,
}

impl FrameCache {
    /// Drop everything when the source changes
    fn select(&mut self, source: &Path) {
        if self.source.as_deref() != Some(source) {
            self.frames.clear();
            self.source = Some(source.to_path_buf());
        }
    }
}

/// Pulls still frames out of the source through the media tool
pub struct ThumbnailGenerator {
    port: Arc<dyn ExecutePort>,
    builder: CommandBuilder,
    width: u32,
    cache: Mutex<FrameCache>,
}

impl ThumbnailGenerator {
    pub fn new(port: Arc<dyn ExecutePort>, width: u32) -> Self {
        Self {
            port,
            builder: CommandBuilder::default(),
            width: width.max(16),
            cache: Mutex::new(FrameCache::default()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, FrameCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cached_frames(&self) -> usize {
        self.cache().frames.len()
    }

    pub async fn extract(&self, source: &Path, timestamp: TimeSpec) -> Result<ThumbnailFrame, CutError> {
        let key = bucket(timestamp);
        {
            let mut cache = self.cache();
            cache.select(source);
            if let Some(frame) = cache.frames.get(&key) {
                trace!(timestamp = %key, "thumbnail cache hit");
                return Ok(frame.clone());
            }
        }

        let frame = self.capture_frame(source, key).await?;

        let mut cache = self.cache();
        if cache.source.as_deref() == Some(source) {
            cache.frames.insert(key, frame.clone());
        }
        Ok(frame)
    }

    /// Extract at exactly `timestamp`, leaving the cache untouched
    pub async fn extract_exact(&self, source: &Path, timestamp: TimeSpec) -> Result<ThumbnailFrame, CutError> {
        self.capture_frame(source, timestamp).await
    }

    async fn capture_frame(&self, source: &Path, timestamp: TimeSpec) -> Result<ThumbnailFrame, CutError> {
        debug!(source = %source.display(), %timestamp, "extracting thumbnail");
        let args = self.builder.thumbnail(source, timestamp, self.width);
        let output = self.port.capture(&args).await?;

        if !output.success || output.stdout.is_empty() {
            return Err(ExecutionError::NoFrame {
                timestamp,
                stderr_tail: output.stderr_tail,
            }
            .into());
        }

        Ok(ThumbnailFrame {
            timestamp,
            image_data: output.stdout,
        })
    }
}

#[derive(Default)]
struct Pending {
    latest: Option<TimeSpec>,
    in_flight: bool,
}

/// Debounces thumbnail requests for one source.
///
/// At most one extraction runs at a time. Requests arriving meanwhile
/// overwrite each other so only the latest is served next.
pub struct ThumbnailScheduler {
    generator: Arc<ThumbnailGenerator>,
    source: PathBuf,
    pending: Arc<Mutex<Pending>>,
    frames: UnboundedSender<Result<ThumbnailFrame, CutError>>,
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ThumbnailScheduler {
    pub fn new(
        generator: Arc<ThumbnailGenerator>,
        source: impl Into<PathBuf>,
    ) -> (Self, UnboundedReceiver<Result<ThumbnailFrame, CutError>>) {
        let (frames, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            generator,
            source: source.into(),
            pending: Arc::new(Mutex::new(Pending::default())),
            frames,
        };
        (scheduler, receiver)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Queue a frame at `timestamp`; must be called within a tokio runtime
    pub fn request(&self, timestamp: TimeSpec) {
        {
            let mut pending = lock(&self.pending);
            if let Some(dropped) = pending.latest.replace(timestamp) {
                trace!(timestamp = %dropped, "superseded thumbnail request");
            }
            if pending.in_flight {
                return;
            }
            pending.in_flight = true;
        }

        tokio::spawn(drain(
            Arc::clone(&self.generator),
            self.source.clone(),
            Arc::clone(&self.pending),
            self.frames.clone(),
        ));
    }
}

async fn drain(
    generator: Arc<ThumbnailGenerator>,
    source: PathBuf,
    pending: Arc<Mutex<Pending>>,
    frames: UnboundedSender<Result<ThumbnailFrame, CutError>>,
) {
    loop {
        let next = {
            let mut state = lock(&pending);
            match state.latest.take() {
                Some(timestamp) => timestamp,
                None => {
                    state.in_flight = false;
                    return;
                }
            }
        };

        let result = generator.extract(&source, next).await;
        if frames.send(result).is_err() {
            let mut state = lock(&pending);
            state.latest = None;
            state.in_flight = false;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockExecutionAdapter;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn ms(value: u64) -> TimeSpec {
        TimeSpec::from_millis(value)
    }

    #[test]
    fn test_bucket_rounds_down() {
        assert_eq!(bucket(ms(1_049)), ms(1_000));
        assert_eq!(bucket(ms(1_099)), ms(1_000));
        assert_eq!(bucket(ms(1_100)), ms(1_100));
        assert_eq!(bucket(ms(0)), ms(0));
    }

    #[tokio::test]
    async fn test_frame_near_media_end_is_not_past_it() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let generator = ThumbnailGenerator::new(port.clone(), 160);
        let duration = ms(20_070);

        let frame = generator.extract(Path::new("demo.mp4"), duration).await.unwrap();
        assert_eq!(frame.timestamp, ms(20_000));
        assert!(port.captures().iter().all(|t| *t <= duration));
    }

    #[tokio::test]
    async fn test_cache_hits_within_bucket() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let generator = ThumbnailGenerator::new(port.clone(), 160);
        let source = Path::new("demo.mp4");

        let first = generator.extract(source, ms(2_010)).await.unwrap();
        let second = generator.extract(source, ms(2_090)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.timestamp, ms(2_000));
        assert_eq!(port.captures(), vec![ms(2_000)]);
    }

    #[tokio::test]
    async fn test_cache_evicted_on_source_change() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let generator = ThumbnailGenerator::new(port.clone(), 160);

        generator.extract(Path::new("a.mp4"), ms(1_000)).await.unwrap();
        generator.extract(Path::new("a.mp4"), ms(3_000)).await.unwrap();
        assert_eq!(generator.cached_frames(), 2);

        generator.extract(Path::new("b.mp4"), ms(1_000)).await.unwrap();
        assert_eq!(generator.cached_frames(), 1);
        assert_eq!(port.captures().len(), 3);
    }

    #[tokio::test]
    async fn test_exact_extraction_skips_cache() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let generator = ThumbnailGenerator::new(port.clone(), 160);

        let frame = generator.extract_exact(Path::new("demo.mp4"), ms(1_234)).await.unwrap();
        assert_eq!(frame.timestamp, ms(1_234));
        assert_eq!(port.captures(), vec![ms(1_234)]);
        assert_eq!(generator.cached_frames(), 0);
    }

    #[tokio::test]
    async fn test_empty_output_is_no_frame() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]).with_frame_bytes(Vec::new()));
        let generator = ThumbnailGenerator::new(port, 160);

        let err = generator.extract(Path::new("a.mp4"), ms(500)).await.unwrap_err();
        assert!(matches!(err, CutError::Execution(ExecutionError::NoFrame { .. })));
        assert_eq!(generator.cached_frames(), 0);
    }

    #[tokio::test]
    async fn test_scheduler_keeps_only_latest_request() {
        let gate = Arc::new(Semaphore::new(0));
        let port = Arc::new(MockExecutionAdapter::new(vec![]).with_capture_gate(gate.clone()));
        let started = port.capture_started();
        let generator = Arc::new(ThumbnailGenerator::new(port.clone(), 160));
        let (scheduler, mut frames) = ThumbnailScheduler::new(generator, "demo.mp4");

        scheduler.request(ms(1_000));
        started.notified().await;

        scheduler.request(ms(2_000));
        scheduler.request(ms(3_000));
        scheduler.request(ms(4_000));
        gate.add_permits(2);

        let first = frames.recv().await.unwrap().unwrap();
        let second = frames.recv().await.unwrap().unwrap();
        assert_eq!(first.timestamp, ms(1_000));
        assert_eq!(second.timestamp, ms(4_000));
        assert_eq!(port.captures(), vec![ms(1_000), ms(4_000)]);

        let nothing = tokio::time::timeout(Duration::from_millis(50), frames.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_restarts_after_idle() {
        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let generator = Arc::new(ThumbnailGenerator::new(port, 160));
        let (scheduler, mut frames) = ThumbnailScheduler::new(generator, "demo.mp4");

        scheduler.request(ms(1_000));
        assert_eq!(frames.recv().await.unwrap().unwrap().timestamp, ms(1_000));
        scheduler.request(ms(5_000));
        assert_eq!(frames.recv().await.unwrap().unwrap().timestamp, ms(5_000));
    }
}

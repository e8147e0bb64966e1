// Interactive session - Glue between selection, preview, thumbnails and the engine

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::domain::errors::{CutError, PathError};
use crate::domain::model::{CutOutcome, ThumbnailFrame, TimeSpec};
use crate::domain::preview::LoopPreview;
use crate::domain::selection::{DragEnd, Handle, RangeSelector, SelectionState};
use crate::engine::thumbnail::{ThumbnailGenerator, ThumbnailScheduler};
use crate::engine::{CutEngine, CutJob};
use crate::ports::ProbePort;

/// Frames produced for the loaded source
pub type ThumbnailStream = UnboundedReceiver<Result<ThumbnailFrame, CutError>>;

/// User-facing state line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Empty,
    Ready,
    Cutting,
    Done(PathBuf),
    Failed(String),
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Empty => write!(f, "Select a video to begin."),
            SessionStatus::Ready => write!(f, "Preview ready."),
            SessionStatus::Cutting => write!(f, "Cutting..."),
            SessionStatus::Done(path) => write!(f, "Clip ready: {}", path.display()),
            SessionStatus::Failed(reason) => write!(f, "Cut failed: {}", reason),
            SessionStatus::Cancelled => write!(f, "Cut cancelled."),
        }
    }
}

struct LoadedMedia {
    selector: RangeSelector,
    preview: LoopPreview,
    thumbnails: ThumbnailScheduler,
}

/// One user's editing session over a single loaded file at a time
pub struct InteractiveSession {
    engine: CutEngine,
    probe_port: Arc<dyn ProbePort>,
    generator: Arc<ThumbnailGenerator>,
    min_gap: TimeSpec,
    loop_margin: TimeSpec,
    durations: HashMap<PathBuf, TimeSpec>,
    media: Option<LoadedMedia>,
    status: SessionStatus,
}

impl InteractiveSession {
    pub fn new(
        engine: CutEngine,
        probe_port: Arc<dyn ProbePort>,
        generator: Arc<ThumbnailGenerator>,
        min_gap: TimeSpec,
        loop_margin: TimeSpec,
    ) -> Self {
        Self {
            engine,
            probe_port,
            generator,
            min_gap,
            loop_margin,
            durations: HashMap::new(),
            media: None,
            status: SessionStatus::Empty,
        }
    }

    /// Open `source`, selecting all of it.
    ///
    /// Must be called within a tokio runtime. The returned stream yields the
    /// thumbnails requested by later drag and edit operations.
    pub async fn load(&mut self, source: impl Into<PathBuf>) -> Result<ThumbnailStream, CutError> {
        let source = source.into();
        if !source.is_file() {
            return Err(PathError::SourceNotFound { path: source }.into());
        }

        let duration = match self.durations.get(&source) {
            Some(duration) => *duration,
            None => {
                let duration = self.probe_port.probe_duration(&source).await?;
                self.durations.insert(source.clone(), duration);
                duration
            }
        };

        let selector = RangeSelector::new(source.clone(), duration, self.min_gap)?;
        let preview = LoopPreview::new(TimeSpec::ZERO, duration, self.loop_margin);
        let (thumbnails, stream) = ThumbnailScheduler::new(Arc::clone(&self.generator), source.clone());
        thumbnails.request(TimeSpec::ZERO);

        info!(source = %source.display(), %duration, "media loaded");
        self.media = Some(LoadedMedia {
            selector,
            preview,
            thumbnails,
        });
        self.status = SessionStatus::Ready;
        Ok(stream)
    }

    pub fn source(&self) -> Option<&Path> {
        self.media.as_ref().map(|m| m.selector.source())
    }

    pub fn selection(&self) -> Option<SelectionState> {
        self.media.as_ref().map(|m| m.selector.state())
    }

    pub fn preview(&self) -> Option<&LoopPreview> {
        self.media.as_ref().map(|m| &m.preview)
    }

    pub fn preview_mut(&mut self) -> Option<&mut LoopPreview> {
        self.media.as_mut().map(|m| &mut m.preview)
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn begin_drag(&mut self, handle: Handle) {
        if let Some(media) = self.media.as_mut() {
            media.selector.begin_drag(handle);
        }
    }

    /// Move the dragged handle and ask for a thumbnail at its new position
    pub fn drag_to(&mut self, timestamp: TimeSpec) -> Option<TimeSpec> {
        let media = self.media.as_mut()?;
        let position = media.selector.move_active(timestamp)?;
        media.thumbnails.request(position);
        Some(position)
    }

    /// Finish the drag: refresh the thumbnail and restart loop playback
    pub fn end_drag(&mut self) -> Option<DragEnd> {
        let media = self.media.as_mut()?;
        let effects = media.selector.end_drag()?;
        media.thumbnails.request(effects.thumbnail_at);
        let (start, end) = effects.preview_range;
        media.preview.set_range(start, end);
        media.preview.restart(true);
        debug!(%start, %end, "selection settled");
        Some(effects)
    }

    /// Apply a typed start time
    pub fn set_start_text(&mut self, text: &str) -> Result<TimeSpec, CutError> {
        self.set_text(Handle::Start, text)
    }

    /// Apply a typed end time
    pub fn set_end_text(&mut self, text: &str) -> Result<TimeSpec, CutError> {
        self.set_text(Handle::End, text)
    }

    fn set_text(&mut self, handle: Handle, text: &str) -> Result<TimeSpec, CutError> {
        let timestamp = TimeSpec::parse(text)?;
        let media = self.media.as_mut().ok_or(CutError::NoMedia)?;
        let applied = match handle {
            Handle::Start => media.selector.set_start(timestamp)?,
            Handle::End => media.selector.set_end(timestamp)?,
        };
        let state = media.selector.state();
        media.thumbnails.request(applied);
        media.preview.set_range(state.start, state.end);
        media.preview.restart(true);
        Ok(applied)
    }

    /// Snapshot the selection and start cutting it in the background
    pub fn commit_and_submit(
        &mut self,
        destination: Option<PathBuf>,
        allow_overwrite: bool,
    ) -> Result<CutJob, CutError> {
        let media = self.media.as_ref().ok_or(CutError::NoMedia)?;
        let request = media.selector.commit(destination)?.with_overwrite(allow_overwrite);
        self.status = SessionStatus::Cutting;
        Ok(self.engine.submit(request))
    }

    /// Reflect a finished job in the status; the selection is never touched
    pub fn record_outcome(&mut self, result: &Result<CutOutcome, CutError>) {
        self.status = match result {
            Ok(outcome) => SessionStatus::Done(outcome.destination.clone()),
            Err(CutError::Cancelled) => SessionStatus::Cancelled,
            Err(err) => SessionStatus::Failed(err.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockExecutionAdapter, MockProbeAdapter, MockRun};
    use crate::engine::EngineConfig;
    use std::fs;
    use tempfile::TempDir;

    fn ms(value: u64) -> TimeSpec {
        TimeSpec::from_millis(value)
    }

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        probe: Arc<MockProbeAdapter>,
        session: InteractiveSession,
    }

    fn fixture(script: Vec<MockRun>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        fs::write(&source, b"source").unwrap();

        let port = Arc::new(MockExecutionAdapter::new(script));
        let probe = Arc::new(MockProbeAdapter::new(Some(ms(20_000))));
        let session = InteractiveSession::new(
            CutEngine::new(port.clone(), &EngineConfig::default()),
            probe.clone(),
            Arc::new(ThumbnailGenerator::new(port, 160)),
            ms(100),
            ms(120),
        );
        Fixture {
            _dir: dir,
            source,
            probe,
            session,
        }
    }

    #[tokio::test]
    async fn test_load_selects_whole_media_and_sends_first_thumbnail() {
        let mut fx = fixture(vec![]);
        let mut thumbnails = fx.session.load(&fx.source).await.unwrap();

        let state = fx.session.selection().unwrap();
        assert_eq!((state.start, state.end), (ms(0), ms(20_000)));
        assert_eq!(fx.session.status(), &SessionStatus::Ready);
        assert_eq!(thumbnails.recv().await.unwrap().unwrap().timestamp, ms(0));
    }

    #[tokio::test]
    async fn test_duration_is_probed_once_per_path() {
        let mut fx = fixture(vec![]);
        fx.session.load(&fx.source).await.unwrap();
        fx.session.load(&fx.source).await.unwrap();
        assert_eq!(fx.probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_drag_clamps_and_updates_preview() {
        let mut fx = fixture(vec![]);
        fx.session.load(&fx.source).await.unwrap();
        fx.session.set_start_text("00:00:05").unwrap();

        fx.session.begin_drag(Handle::End);
        assert_eq!(fx.session.drag_to(ms(1_000)), Some(ms(5_100)));
        let effects = fx.session.end_drag().unwrap();

        assert_eq!(effects.preview_range, (ms(5_000), ms(5_100)));
        assert_eq!(fx.session.preview().unwrap().range(), (ms(5_000), ms(5_100)));
        assert_eq!(fx.session.drag_to(ms(9_000)), None);
    }

    #[tokio::test]
    async fn test_end_handle_thumbnail_stays_inside_media() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        fs::write(&source, b"source").unwrap();
        let duration = ms(20_070);

        let port = Arc::new(MockExecutionAdapter::new(vec![]));
        let mut session = InteractiveSession::new(
            CutEngine::new(port.clone(), &EngineConfig::default()),
            Arc::new(MockProbeAdapter::new(Some(duration))),
            Arc::new(ThumbnailGenerator::new(port.clone(), 160)),
            ms(100),
            ms(120),
        );
        let mut thumbnails = session.load(&source).await.unwrap();
        assert_eq!(thumbnails.recv().await.unwrap().unwrap().timestamp, ms(0));

        session.begin_drag(Handle::End);
        session.drag_to(ms(30_000));
        let effects = session.end_drag().unwrap();
        assert_eq!(effects.thumbnail_at, duration);

        let frame = thumbnails.recv().await.unwrap().unwrap();
        assert_eq!(frame.timestamp, ms(20_000));
        assert!(port.captures().iter().all(|t| *t <= duration));
    }

    #[tokio::test]
    async fn test_typed_time_past_duration_is_rejected() {
        let mut fx = fixture(vec![]);
        fx.session.load(&fx.source).await.unwrap();
        assert!(matches!(
            fx.session.set_end_text("00:00:25"),
            Err(CutError::Range(_))
        ));
        assert!(matches!(fx.session.set_end_text("abc"), Err(CutError::Parse(_))));
    }

    #[tokio::test]
    async fn test_submit_without_media() {
        let mut fx = fixture(vec![]);
        assert!(matches!(
            fx.session.commit_and_submit(None, false),
            Err(CutError::NoMedia)
        ));
    }

    #[tokio::test]
    async fn test_failed_cut_keeps_selection() {
        let failure = MockRun::Fail {
            code: 1,
            stderr: "boom".to_string(),
        };
        let mut fx = fixture(vec![failure.clone(), failure]);
        fx.session.load(&fx.source).await.unwrap();
        fx.session.set_start_text("5").unwrap();
        fx.session.set_end_text("12").unwrap();
        let before = fx.session.selection().unwrap();

        let job = fx.session.commit_and_submit(None, false).unwrap();
        assert_eq!(fx.session.status(), &SessionStatus::Cutting);
        let result = job.wait().await;
        fx.session.record_outcome(&result);

        assert!(matches!(fx.session.status(), SessionStatus::Failed(_)));
        assert_eq!(fx.session.selection().unwrap(), before);
    }

    #[tokio::test]
    async fn test_successful_cut_reports_destination() {
        let mut fx = fixture(vec![MockRun::Succeed {
            bytes: b"clip".to_vec(),
        }]);
        fx.session.load(&fx.source).await.unwrap();

        let result = fx.session.commit_and_submit(None, false).unwrap().wait().await;
        fx.session.record_outcome(&result);

        let expected = fx.source.with_file_name("demo_clip.mp4");
        assert_eq!(fx.session.status(), &SessionStatus::Done(expected));
    }
}

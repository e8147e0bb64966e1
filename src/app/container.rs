use std::sync::Arc;

use crate::adapters::{FFmpegAdapter, FFprobeAdapter, Settings};
use crate::app::{
    cut_interactor::CutInteractor, inspect_interactor::InspectInteractor,
    session::InteractiveSession,
};
use crate::engine::thumbnail::ThumbnailGenerator;
use crate::engine::CutEngine;
use crate::ports::{ExecutePort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn cut_interactor(&self) -> Arc<CutInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
    fn thumbnail_generator(&self) -> Arc<ThumbnailGenerator>;
    fn new_session(&self) -> InteractiveSession;
}

pub struct DefaultAppContainer {
    settings: Settings,
    engine: CutEngine,
    probe_port: Arc<dyn ProbePort>,
    cut_interactor: Arc<CutInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
    thumbnail_generator: Arc<ThumbnailGenerator>,
}

impl DefaultAppContainer {
    /// Wire the real media tool adapters
    pub fn new(settings: &Settings) -> Self {
        let execute_port: Arc<dyn ExecutePort> =
            Arc::new(FFmpegAdapter::locate(settings.tools.ffmpeg.as_deref()));
        let probe_port: Arc<dyn ProbePort> =
            Arc::new(FFprobeAdapter::locate(settings.tools.ffprobe.as_deref()));
        Self::with_ports(settings, execute_port, probe_port)
    }

    pub fn with_ports(
        settings: &Settings,
        execute_port: Arc<dyn ExecutePort>,
        probe_port: Arc<dyn ProbePort>,
    ) -> Self {
        let engine = CutEngine::new(Arc::clone(&execute_port), &settings.cut);

        let cut_interactor = Arc::new(CutInteractor::new(
            engine.clone(),
            Arc::clone(&probe_port),
        ));
        let inspect_interactor = Arc::new(InspectInteractor::new(Arc::clone(&probe_port)));
        let thumbnail_generator = Arc::new(ThumbnailGenerator::new(
            Arc::clone(&execute_port),
            settings.preview.thumbnail_width,
        ));

        Self {
            settings: settings.clone(),
            engine,
            probe_port,
            cut_interactor,
            inspect_interactor,
            thumbnail_generator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl AppContainer for DefaultAppContainer {
    fn cut_interactor(&self) -> Arc<CutInteractor> {
        Arc::clone(&self.cut_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }

    fn thumbnail_generator(&self) -> Arc<ThumbnailGenerator> {
        Arc::clone(&self.thumbnail_generator)
    }

    fn new_session(&self) -> InteractiveSession {
        InteractiveSession::new(
            self.engine.clone(),
            Arc::clone(&self.probe_port),
            Arc::clone(&self.thumbnail_generator),
            self.settings.preview.min_gap(),
            self.settings.preview.loop_margin(),
        )
    }
}

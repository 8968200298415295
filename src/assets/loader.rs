use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Context as _;

use crate::assets::decode::{PixelBuffer, decode_image};
use crate::assets::source::{FetchMode, ImageSource, read_source};
use crate::foundation::error::{ScatterError, ScatterResult};

/// Resolves [`ImageSource`]s against an asset root and decodes them.
#[derive(Clone, Debug)]
pub struct ImageLoader {
    root: PathBuf,
    mode: FetchMode,
}

impl ImageLoader {
    /// Create a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, mode: FetchMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    /// Read and decode on the calling thread.
    pub fn load_blocking(&self, source: &ImageSource) -> ScatterResult<PixelBuffer> {
        let bytes = read_source(source, self.mode, &self.root)?;
        let buffer = decode_image(&bytes)?;
        tracing::debug!(
            source = %source.describe(),
            width = buffer.width,
            height = buffer.height,
            "image decoded"
        );
        Ok(buffer)
    }

    /// Read and decode on a background thread.
    ///
    /// The result is delivered through the returned [`PendingLoad`]. Dropping the handle
    /// abandons the result; the worker finishes and discards it.
    pub fn spawn(&self, source: ImageSource) -> PendingLoad {
        let (tx, rx) = mpsc::channel();
        let description = source.describe();
        let loader = self.clone();

        let spawned = std::thread::Builder::new()
            .name("pixelscatter-load".to_string())
            .spawn(move || {
                let _ = tx.send(loader.load_blocking(&source));
            })
            .with_context(|| format!("spawn loader thread for '{description}'"));

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "image load not started");
            let (tx, rx) = mpsc::channel();
            let _ = tx.send(Err(ScatterError::from(e)));
            return PendingLoad { description, rx };
        }

        PendingLoad { description, rx }
    }
}

/// In-flight image load.
#[derive(Debug)]
pub struct PendingLoad {
    description: String,
    rx: Receiver<ScatterResult<PixelBuffer>>,
}

impl PendingLoad {
    /// Source description this load was started for.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Take the result if the load has finished; `None` while it is still running.
    pub fn try_take(&mut self) -> Option<ScatterResult<PixelBuffer>> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ScatterError::load(format!(
                "loader for '{}' exited without a result",
                self.description
            )))),
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> ScatterResult<PixelBuffer> {
        self.rx.recv().map_err(|_| {
            ScatterError::load(format!(
                "loader for '{}' exited without a result",
                self.description
            ))
        })?
    }
}

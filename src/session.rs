//! Interactive workflow state.
//!
//! A [`Session`] walks one image through
//! `Idle → ImageLoaded → MatrixExtracted → StyleSelected → Rendering → Rendered`.
//! Renders are keyed by a ticket drawn from a shared counter; a completion
//! whose ticket is no longer current is dropped, so a slow render can never
//! overwrite the result of a newer one.

use crate::config::PipelineConfig;
use crate::error::{QrArtError, Result};
use crate::generation::Quality;
use crate::models::{ArtSettings, QrMatrix, RasterImage};
use crate::pipeline::{Extraction, extract_matrix};
use crate::render::render_art;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Workflow position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded
    Idle,
    /// Source image decoded
    ImageLoaded,
    /// Module matrix recovered
    MatrixExtracted,
    /// Style chosen, ready to render
    StyleSelected,
    /// A render ticket is outstanding
    Rendering,
    /// Output available
    Rendered,
}

impl SessionState {
    /// Lower-case label
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::ImageLoaded => "image loaded",
            SessionState::MatrixExtracted => "matrix extracted",
            SessionState::StyleSelected => "style selected",
            SessionState::Rendering => "rendering",
            SessionState::Rendered => "rendered",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle for one in-flight render
#[derive(Debug, Clone)]
pub struct RenderTicket {
    id: u64,
    current: Arc<AtomicU64>,
    /// Matrix to render
    pub matrix: QrMatrix,
    /// Style settings in effect when the render began
    pub settings: ArtSettings,
}

impl RenderTicket {
    /// Ticket number
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once a newer render or a cancellation superseded this ticket.
    /// Workers may poll this to stop early.
    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.id
    }
}

/// Finished render
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    /// Output image
    pub image: RasterImage,
    /// Verification result for generated output; `None` for procedural art
    pub quality: Option<Quality>,
}

impl RenderedOutput {
    /// Whether the output carries a degraded-quality annotation
    pub fn is_degraded(&self) -> bool {
        matches!(self.quality, Some(Quality::Degraded { .. }))
    }
}

/// One image's trip through load, extract, style and render
pub struct Session {
    config: PipelineConfig,
    state: SessionState,
    image: Option<RasterImage>,
    extraction: Option<Extraction>,
    settings: Option<ArtSettings>,
    output: Option<RenderedOutput>,
    last_error: Option<String>,
    counter: Arc<AtomicU64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Session {
    /// Idle session using `config` for extraction
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            image: None,
            extraction: None,
            settings: None,
            output: None,
            last_error: None,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Source image, once loaded
    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// Extraction result, once available
    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    /// Chosen style settings
    pub fn settings(&self) -> Option<&ArtSettings> {
        self.settings.as_ref()
    }

    /// Latest accepted render
    pub fn output(&self) -> Option<&RenderedOutput> {
        self.output.as_ref()
    }

    /// Message of the error recorded by the last failed step
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn refuse(&self, action: &'static str) -> QrArtError {
        QrArtError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    fn reset(&mut self) {
        // Outstanding tickets become stale
        self.counter.fetch_add(1, Ordering::SeqCst);
        self.image = None;
        self.extraction = None;
        self.settings = None;
        self.output = None;
        self.state = SessionState::Idle;
    }

    /// Decode and load image bytes. Allowed from any state; a decode failure
    /// leaves the session idle with the error recorded.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match RasterImage::decode(bytes) {
            Ok(image) => {
                self.load_image(image);
                Ok(())
            }
            Err(e) => {
                self.reset();
                warn!(error = %e, "image rejected");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Load an already decoded image, discarding previous results
    pub fn load_image(&mut self, image: RasterImage) {
        self.reset();
        debug!(width = image.width(), height = image.height(), "image loaded");
        self.image = Some(image);
        self.last_error = None;
        self.state = SessionState::ImageLoaded;
    }

    /// Recover the matrix of the loaded image. On failure the session
    /// returns to idle with the error recorded.
    pub fn extract(&mut self) -> Result<&Extraction> {
        let Some(image) = self.image.as_ref() else {
            return Err(self.refuse("extract"));
        };
        match extract_matrix(image, &self.config) {
            Ok(extraction) => {
                info!(modules = extraction.matrix.size(), "matrix ready");
                self.last_error = None;
                self.state = SessionState::MatrixExtracted;
                self.output = None;
                self.settings = None;
                Ok(self.extraction.insert(extraction))
            }
            Err(e) => {
                self.reset();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Choose the art style. Allowed once a matrix exists; choosing again
    /// supersedes any render in flight.
    pub fn select_style(&mut self, settings: ArtSettings) -> Result<()> {
        if self.extraction.is_none() {
            return Err(self.refuse("select a style"));
        }
        self.counter.fetch_add(1, Ordering::SeqCst);
        self.settings = Some(settings.clamped());
        self.state = SessionState::StyleSelected;
        Ok(())
    }

    /// Start a render and hand out its ticket. Any earlier ticket becomes
    /// stale.
    pub fn begin_render(&mut self) -> Result<RenderTicket> {
        let (Some(extraction), Some(settings)) = (self.extraction.as_ref(), self.settings) else {
            return Err(self.refuse("render"));
        };
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.state = SessionState::Rendering;
        debug!(ticket = id, "render started");
        Ok(RenderTicket {
            id,
            current: Arc::clone(&self.counter),
            matrix: extraction.matrix.clone(),
            settings,
        })
    }

    /// Deliver a render result. Returns `false` when the ticket is stale and
    /// the result was dropped. A failed render goes back to
    /// [`SessionState::StyleSelected`] with the error recorded.
    pub fn complete_render(
        &mut self,
        ticket: &RenderTicket,
        result: Result<RenderedOutput>,
    ) -> bool {
        if ticket.is_stale() || self.state != SessionState::Rendering {
            debug!(ticket = ticket.id, "stale render dropped");
            return false;
        }
        match result {
            Ok(output) => {
                if output.is_degraded() {
                    warn!(ticket = ticket.id, "render accepted with degraded quality");
                }
                self.output = Some(output);
                self.last_error = None;
                self.state = SessionState::Rendered;
            }
            Err(e) => {
                warn!(ticket = ticket.id, error = %e, "render failed");
                self.last_error = Some(e.to_string());
                self.state = SessionState::StyleSelected;
            }
        }
        true
    }

    /// Abandon the render in flight, if any
    pub fn cancel_render(&mut self) {
        if self.state == SessionState::Rendering {
            self.counter.fetch_add(1, Ordering::SeqCst);
            self.state = SessionState::StyleSelected;
        }
    }

    /// Render procedural art synchronously
    pub fn render(&mut self) -> Result<&RenderedOutput> {
        let ticket = self.begin_render()?;
        let image = render_art(&ticket.matrix, &ticket.settings);
        self.complete_render(
            &ticket,
            Ok(RenderedOutput {
                image,
                quality: None,
            }),
        );
        self.output.as_ref().ok_or_else(|| self.refuse("read output"))
    }
}

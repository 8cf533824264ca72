use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// Maps the HDR lighting target onto the swapchain.
pub struct TonemappingPass {
    exposure: f32,
}

impl TonemappingPass {
    /// Creates the pass with a fixed exposure.
    #[must_use]
    pub fn new(exposure: f32) -> Self {
        Self { exposure }
    }

    /// Exposure pushed to the tonemapping shader.
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }
}

impl Default for TonemappingPass {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RenderPass for TonemappingPass {
    fn name(&self) -> &'static str {
        "tonemapping_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        &["swapchain_attachment"]
    }

    fn execute(&self, _view: &FrameView, backend: &dyn RenderBackend) -> Result<()> {
        backend.submit(
            self.name(),
            &PassSubmission {
                color_attachments: self.color_attachments(),
                depth_stencil_attachment: None,
                primitives: &[],
            },
        )
    }
}

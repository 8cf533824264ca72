use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// Separable convolution over an intermediate target (e.g. shadow blur).
pub struct ConvolutionPass {
    kernel: Vec<f32>,
}

impl ConvolutionPass {
    /// Creates the pass with a 1D kernel applied in both directions.
    #[must_use]
    pub fn new(kernel: Vec<f32>) -> Self {
        Self { kernel }
    }

    /// The convolution kernel.
    #[must_use]
    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }
}

impl RenderPass for ConvolutionPass {
    fn name(&self) -> &'static str {
        "convolution_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        &["convolution_attachment"]
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

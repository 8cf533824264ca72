use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// FXAA over the tonemapped swapchain image.
#[derive(Default)]
pub struct AntialiasingPass;

impl RenderPass for AntialiasingPass {
    fn name(&self) -> &'static str {
        "antialiasing_pass"
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

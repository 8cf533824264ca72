use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// Draws opaque geometry and particle primitives into the lighting target.
#[derive(Default)]
pub struct OpaquePass;

impl RenderPass for OpaquePass {
    fn name(&self) -> &'static str {
        "opaque_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        &["lighting_attachment", "emission_attachment"]
    }

    fn depth_stencil_attachment(&self) -> Option<&'static str> {
        Some("depth_attachment")
    }

    fn execute(&self, view: &FrameView, backend: &dyn RenderBackend) -> Result<()> {
        let visible = view.visible_geometry();
        backend.submit(
            self.name(),
            &PassSubmission {
                color_attachments: self.color_attachments(),
                depth_stencil_attachment: self.depth_stencil_attachment(),
                primitives: &visible,
            },
        )
    }
}

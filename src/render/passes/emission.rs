use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// Resolves emissive surfaces into the bloom source target.
///
/// Culls with the same frustum as the opaque pass; the backend filters for
/// materials with an emission term.
#[derive(Default)]
pub struct EmissionPass;

impl RenderPass for EmissionPass {
    fn name(&self) -> &'static str {
        "emission_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        &["emission_attachment"]
    }

    fn execute(&self, view: &FrameView, backend: &dyn RenderBackend) -> Result<()> {
        let visible = view.visible_geometry();
        backend.submit(
            self.name(),
            &PassSubmission {
                color_attachments: self.color_attachments(),
                depth_stencil_attachment: None,
                primitives: &visible,
            },
        )
    }
}

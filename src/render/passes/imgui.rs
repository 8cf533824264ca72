use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

/// Draws the debug UI over the final image.
///
/// The UI library is single-threaded: the host must order its own UI update
/// before any frame-graph task, and this pass only replays the draw data the
/// update produced.
#[derive(Default)]
pub struct ImguiPass;

impl RenderPass for ImguiPass {
    fn name(&self) -> &'static str {
        "imgui_pass"
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

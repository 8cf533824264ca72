use crate::errors::Result;
use crate::render::{FrameView, PassSubmission, RenderBackend, RenderPass};

static BLOOM_MIP_NAMES: [&str; 6] = [
    "bloom_mip_0",
    "bloom_mip_1",
    "bloom_mip_2",
    "bloom_mip_3",
    "bloom_mip_4",
    "bloom_mip_5",
];

/// One step of the bloom downsample pyramid: reads mip `level - 1` (or the
/// emission target for level 0), writes mip `level`.
pub struct DownsamplingPass {
    level: usize,
}

impl DownsamplingPass {
    /// Downsample into pyramid `level` (`0..6`).
    #[must_use]
    pub fn new(level: usize) -> Self {
        assert!(level < BLOOM_MIP_NAMES.len(), "bloom pyramid has 6 levels");
        Self { level }
    }
}

impl RenderPass for DownsamplingPass {
    fn name(&self) -> &'static str {
        "downsampling_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        std::slice::from_ref(&BLOOM_MIP_NAMES[self.level])
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

/// One step of the bloom upsample chain: accumulates mip `level + 1` back
/// into mip `level` with a tent filter.
pub struct UpsamplingPass {
    level: usize,
}

impl UpsamplingPass {
    /// Upsample into pyramid `level` (`0..5`).
    #[must_use]
    pub fn new(level: usize) -> Self {
        assert!(
            level + 1 < BLOOM_MIP_NAMES.len(),
            "bloom pyramid has 6 levels"
        );
        Self { level }
    }
}

impl RenderPass for UpsamplingPass {
    fn name(&self) -> &'static str {
        "upsampling_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        std::slice::from_ref(&BLOOM_MIP_NAMES[self.level])
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

/// Composites the blurred pyramid over the lighting target.
pub struct BloomPass {
    transparency: f32,
}

impl BloomPass {
    /// `transparency` is the blend factor of the bloom contribution.
    #[must_use]
    pub fn new(transparency: f32) -> Self {
        Self { transparency }
    }

    /// Blend factor of the bloom contribution.
    #[must_use]
    pub fn transparency(&self) -> f32 {
        self.transparency
    }

    /// The standard chain: six downsamples, five upsamples, one composite.
    #[must_use]
    pub fn build_chain(transparency: f32) -> Vec<std::sync::Arc<dyn RenderPass>> {
        let mut chain: Vec<std::sync::Arc<dyn RenderPass>> = Vec::with_capacity(12);
        for level in 0..BLOOM_MIP_NAMES.len() {
            chain.push(std::sync::Arc::new(DownsamplingPass::new(level)));
        }
        for level in (0..BLOOM_MIP_NAMES.len() - 1).rev() {
            chain.push(std::sync::Arc::new(UpsamplingPass::new(level)));
        }
        chain.push(std::sync::Arc::new(BloomPass::new(transparency)));
        chain
    }
}

impl RenderPass for BloomPass {
    fn name(&self) -> &'static str {
        "bloom_pass"
    }

    fn color_attachments(&self) -> &'static [&'static str] {
        &["lighting_attachment"]
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

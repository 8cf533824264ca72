use std::sync::Arc;

use crate::assets::{Resource, ResourceHandle};
use crate::resources::texture::Texture;

/// A compiled graphics pipeline, shared between materials that agree on
/// shaders and state.
///
/// Pipeline compilation itself belongs to the external graphics backend;
/// the engine core only carries the identity the backend compiles from and
/// caches instances by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipeline {
    /// Vertex shader path.
    pub vertex_shader: String,
    /// Fragment shader path; empty for depth-only pipelines.
    pub fragment_shader: String,
    /// Whether the vertex layout carries skinning attributes.
    pub is_skinned: bool,
    /// Whether the pipeline renders particle instances.
    pub is_particle: bool,
    /// Whether the pipeline renders into shadow maps.
    pub is_shadow: bool,
}

/// A material asset: textures plus the graphics pipeline that draws it.
///
/// Loading happens in two stages. The markdown worker publishes the
/// texture set (which starts the texture loads) while pipeline compilation
/// continues in parallel; the material counts as loaded once the pipeline
/// stage attached the compiled pipeline.
#[derive(Default, Clone)]
pub struct Material {
    textures: Vec<ResourceHandle<Texture>>,
    graphics_pipeline: Option<Arc<GraphicsPipeline>>,
}

impl Resource for Material {
    fn is_loaded(&self) -> bool {
        self.graphics_pipeline.is_some()
    }
}

impl Material {
    /// First-stage constructor: textures known, pipeline still compiling.
    #[must_use]
    pub fn with_textures(textures: Vec<ResourceHandle<Texture>>) -> Self {
        Self {
            textures,
            graphics_pipeline: None,
        }
    }

    /// Texture handles in declaration order.
    #[must_use]
    pub fn textures(&self) -> &[ResourceHandle<Texture>] {
        &self.textures
    }

    /// The compiled pipeline, once attached.
    #[must_use]
    pub fn graphics_pipeline(&self) -> Option<&Arc<GraphicsPipeline>> {
        self.graphics_pipeline.as_ref()
    }

    /// Second-stage publish: attaches the compiled pipeline, completing the
    /// load.
    pub fn attach_graphics_pipeline(&mut self, pipeline: Arc<GraphicsPipeline>) {
        self.graphics_pipeline = Some(pipeline);
    }
}

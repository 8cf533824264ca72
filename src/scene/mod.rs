//! Scene graph: primitives with local/global transforms, containers with
//! ordered children, and the scene that registers render primitives with its
//! acceleration structures.
//!
//! Primitives live in a slotmap keyed by [`PrimitiveKey`]; parent links and
//! child lists are keys, so ownership flows strictly downward (a container
//! outlives its descendants by construction) while the parent back-reference
//! stays non-owning.
//!
//! Primitives are not internally thread-safe: a single primitive must not be
//! touched from two threads at once. The acceleration structures and
//! notifiers around them are.

mod camera;
mod graph;
mod primitive;
#[allow(clippy::module_inception)]
mod scene;

pub use camera::Camera;
pub use graph::SceneGraph;
pub use primitive::{
    ContainerData, GeometryAnimation, GeometryData, LightData, ParticleData, Primitive,
    PrimitiveKind,
};
pub use scene::{Scene, SceneDescriptor};

slotmap::new_key_type! {
    /// Handle of one primitive in a [`SceneGraph`].
    pub struct PrimitiveKey;
}

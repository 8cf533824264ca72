//! Asset data types: what resource slots hold once their worker task
//! published.
//!
//! Parsing lives under `assets::formats` and in the per-asset managers;
//! these types are the passive results. Each implements
//! [`crate::assets::Resource`], deriving its loaded state from content.

pub mod container_prototype;
pub mod geometry;
pub mod material;
pub mod texture;

pub use container_prototype::ContainerPrototype;
pub use geometry::{Geometry, Indices, Skeleton, SkinnedVertex, Vertex};
pub use material::{GraphicsPipeline, Material};
pub use texture::{Texture, TextureFormat, TextureKind};

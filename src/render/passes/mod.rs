//! The fixed pass chain: scene drawing, the bloom pyramid, tonemapping,
//! FXAA, emission, convolution and the single-threaded UI overlay.
//!
//! Pass structs only carry wiring: attachment names, the materials the
//! backend draws with, and the culling queries. Pipeline compilation and
//! command recording live behind [`crate::render::RenderBackend`].

mod antialiasing;
mod bloom;
mod convolution;
mod emission;
mod imgui;
mod opaque;
mod tonemapping;

pub use antialiasing::AntialiasingPass;
pub use bloom::{BloomPass, DownsamplingPass, UpsamplingPass};
pub use convolution::ConvolutionPass;
pub use emission::EmissionPass;
pub use imgui::ImguiPass;
pub use opaque::OpaquePass;
pub use tonemapping::TonemappingPass;

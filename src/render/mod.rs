//! Render primitives' frame wiring: the frame-graph task contract and the
//! fixed post-processing pass chain.
//!
//! The GPU frame graph itself is an external collaborator behind
//! [`RenderBackend`]; the core only decides what each pass reads and writes,
//! culls the scene for the passes that draw primitives, and turns the pass
//! chain into tasks between swapchain acquire and present.

mod frame_graph;
pub mod passes;

pub use frame_graph::{
    FrameGraph, FrameView, NullRenderBackend, PassSubmission, RenderBackend, RenderPass,
};

//! Memory facilities: the frame-transient bump arena and the named
//! allocation profiler.
//!
//! Long-lived data (resources, primitives, manager maps) lives in regular
//! heap allocations; everything frame-transient goes through a
//! [`FrameArena`] that is reset in a scoped reset point at the top of the
//! frame.

mod frame_arena;
mod profiler;

pub use frame_arena::{FrameArena, ResetPoint};
pub use profiler::{Allocation, AllocationSubsystem, MemoryDump, MemoryProfiler};

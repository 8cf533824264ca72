//! Physics-facing primitives and the heightfield pipeline.
//!
//! The physics engine itself is an external collaborator behind
//! [`PhysicsBackend`]; the engine core only cooks assets through it, keeps
//! counted references to its objects alive via [`PhysicsHandle`], and wires
//! the simulate/fetch task pair into the frame.

mod backend;
mod handle;
mod height_field;
mod primitives;
mod scene;

pub use backend::{CookedHeightField, NullPhysicsBackend, PhysicsBackend};
pub use handle::{PhysicsHandle, PhysicsRefCounted};
pub use height_field::{HeightField, HeightFieldManager};
pub use primitives::{ControllerData, HeightFieldActorData, HeightFieldShape, RigidActorData};
pub use scene::PhysicsScene;

//! Binary asset formats.
//!
//! All Keel binary files are little-endian. Each format module exposes a
//! single `parse` entry point consumed by the matching resource manager's
//! worker task.

mod kwa;
mod kwg;
mod kwt;
mod reader;

pub use kwa::parse_animation;
pub use kwg::{JOINT_NONE, parse_geometry};
pub use kwt::parse_texture;
pub use reader::BinaryReader;

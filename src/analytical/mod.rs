//! Implements analytical solutions for verification

mod ring_with_fibers;
pub use crate::analytical::ring_with_fibers::*;

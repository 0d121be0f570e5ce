//! Implements the basic structures for a simulation

mod assembly;
mod config;
mod constants;
mod enums;
mod essential;
mod generators;
mod layout;
pub use crate::base::assembly::*;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::enums::*;
pub use crate::base::essential::*;
pub use crate::base::generators::*;
pub use crate::base::layout::*;

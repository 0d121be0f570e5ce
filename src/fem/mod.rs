//! Implements the finite element solution of the coupled fluid-solid problem

mod constraints;
mod coupling;
mod deformed_map;
mod file_io;
mod file_io_vtu;
mod flux;
mod fluid_element;
mod fluid_field;
mod linear_system;
mod solid_element;
mod solver_implicit;
mod state;
pub use crate::fem::constraints::*;
pub use crate::fem::coupling::*;
pub use crate::fem::deformed_map::*;
pub use crate::fem::file_io::*;
pub use crate::fem::flux::*;
pub use crate::fem::fluid_element::*;
pub use crate::fem::fluid_field::*;
pub use crate::fem::linear_system::*;
pub use crate::fem::solid_element::*;
pub use crate::fem::solver_implicit::*;
pub use crate::fem::state::*;

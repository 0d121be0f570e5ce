//! Makes available common structures needed to run a simulation
//!
//! You may write `use ifem::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::analytical::RingWithFibers;
pub use crate::base::{Config, Dof, Essential, Layout, MaterialModel, StructuredMeshes, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::fem::{FileIo, SimState, SolverImplicit};
pub use crate::material::ElasticLaw;
pub use crate::{FnSpaceTime, FnVectorSpaceTime, StrError};

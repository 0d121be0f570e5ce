//! Ifem implements the immersed finite element method for the interaction
//! of an incompressible Navier-Stokes fluid with an immersed elastic body
//!
//! The fluid and the solid are discretized independently. The fluid mesh
//! covers a fixed control volume and carries velocity and pressure unknowns;
//! the solid mesh carries displacement unknowns and is free to move across
//! the fluid mesh. The coupling restricts fluid fields onto the deformed
//! solid quadrature points and spreads the elastic forces back, yielding a
//! single monolithic nonlinear system advanced with the implicit Euler
//! scheme and Newton iterations.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

/// Defines a function of space and time; f(x, t)
pub type FnSpaceTime = fn(&[f64], f64) -> f64;

/// Defines a vector-valued function of space and time; fills `val` given (x, t)
pub type FnVectorSpaceTime = fn(&[f64], f64, &mut [f64]);

pub mod analytical;
pub mod base;
pub mod fem;
pub mod material;
pub mod prelude;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines degrees-of-freedom (DOF) types
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub enum Dof {
    /// Fluid velocity along the first dimension
    Vx,

    /// Fluid velocity along the second dimension
    Vy,

    /// Fluid velocity along the third dimension
    Vz,

    /// Fluid pressure
    P,
}

impl Dof {
    /// Returns the velocity DOF corresponding to a space dimension index
    pub fn velocity(comp: usize) -> Dof {
        match comp {
            0 => Dof::Vx,
            1 => Dof::Vy,
            _ => Dof::Vz,
        }
    }
}

/// Defines the constitutive model of the immersed elastic body
///
/// All models are incompressible neo-Hookean variants characterized by a
/// single shear modulus; they differ in the form of the elastic part of
/// the first Piola-Kirchhoff stress.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum MaterialModel {
    /// Pe = mu (F - inverse(F) transposed)
    NeoHookeanZeroTraction,

    /// Pe = mu F
    NeoHookeanDeviatoric,

    /// Pe = mu F (e ⊗ e) with e the circumferential direction around a center (2D only)
    CircumferentialFiber { xc: f64, yc: f64 },
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use super::Dof;
use crate::StrError;
use gemlab::mesh::{Mesh, PointId};

/// Maps the (point, DOF) pairs of both meshes onto global equation numbers
///
/// The global unknown vector is organized in two blocks:
///
/// ```text
/// [ v0x v0y p0  v1x v1y p1  ...  |  w0x w0y  w1x w1y  ... ]
///   `––––– fluid block –––––´       `––– solid block ––´
/// ```
///
/// The fluid block interleaves velocity components and pressure per fluid
/// point (node-major). The solid block interleaves the displacement
/// components per solid point and starts at `n_vp`.
pub struct Layout {
    /// Space dimension (shared by both meshes)
    pub ndim: usize,

    /// Number of points in the fluid mesh
    pub n_fluid_point: usize,

    /// Number of points in the solid mesh
    pub n_solid_point: usize,

    /// Size of the fluid block = n_fluid_point * (ndim + 1)
    pub n_vp: usize,

    /// Size of the solid block = n_solid_point * ndim
    pub n_w: usize,

    /// Total number of equations = n_vp + n_w
    pub n_equation: usize,
}

impl Layout {
    /// Allocates a new instance from the fluid and solid meshes
    pub fn new(fluid: &Mesh, solid: &Mesh) -> Result<Self, StrError> {
        if fluid.ndim != solid.ndim {
            return Err("fluid and solid meshes must have the same space dimension");
        }
        if fluid.points.is_empty() || fluid.cells.is_empty() {
            return Err("fluid mesh must have points and cells");
        }
        if solid.points.is_empty() || solid.cells.is_empty() {
            return Err("solid mesh must have points and cells");
        }
        let ndim = fluid.ndim;
        let n_fluid_point = fluid.points.len();
        let n_solid_point = solid.points.len();
        let n_vp = n_fluid_point * (ndim + 1);
        let n_w = n_solid_point * ndim;
        Ok(Layout {
            ndim,
            n_fluid_point,
            n_solid_point,
            n_vp,
            n_w,
            n_equation: n_vp + n_w,
        })
    }

    /// Returns the global equation number of a fluid (point, DOF) pair
    pub fn fluid_eq(&self, point: PointId, dof: Dof) -> Result<usize, StrError> {
        if point >= self.n_fluid_point {
            return Err("fluid point id is out of range");
        }
        let local = match dof {
            Dof::Vx => 0,
            Dof::Vy => 1,
            Dof::Vz => {
                if self.ndim == 2 {
                    return Err("cannot use Vz in a 2D simulation");
                }
                2
            }
            Dof::P => self.ndim,
        };
        Ok(point * (self.ndim + 1) + local)
    }

    /// Returns the global equation number of a fluid velocity component (no checks)
    #[inline]
    pub fn velocity_eq(&self, point: PointId, comp: usize) -> usize {
        point * (self.ndim + 1) + comp
    }

    /// Returns the global equation number of a fluid pressure DOF (no checks)
    #[inline]
    pub fn pressure_eq(&self, point: PointId) -> usize {
        point * (self.ndim + 1) + self.ndim
    }

    /// Returns the global equation number of a solid displacement component (no checks)
    #[inline]
    pub fn solid_eq(&self, point: PointId, comp: usize) -> usize {
        self.n_vp + point * self.ndim + comp
    }

    /// Returns the position of a solid displacement component within the solid block (no checks)
    #[inline]
    pub fn solid_local(&self, point: PointId, comp: usize) -> usize {
        point * self.ndim + comp
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

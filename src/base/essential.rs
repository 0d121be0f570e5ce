use super::Dof;
use crate::FnSpaceTime;
use gemlab::mesh::{Feature, Features, PointId};
use std::collections::HashMap;
use std::fmt;

/// Holds essential (Dirichlet) boundary conditions on the fluid mesh
///
/// The value of each condition is a function of space and time evaluated
/// at the point coordinates at the beginning of every timestep.
pub struct Essential {
    /// Maps (point, DOF) pairs to the prescribed value function
    pub all: HashMap<(PointId, Dof), FnSpaceTime>,
}

impl Essential {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        Essential { all: HashMap::new() }
    }

    /// Sets a prescribed value function at points
    pub fn points(&mut self, points: &[PointId], dof: Dof, f: FnSpaceTime) -> &mut Self {
        for point in points {
            self.all.insert((*point, dof), f);
        }
        self
    }

    /// Sets a prescribed value function at all points along edges
    pub fn edges(&mut self, edges: &[&Feature], dof: Dof, f: FnSpaceTime) -> &mut Self {
        for edge in edges {
            for point in &edge.points {
                self.all.insert((*point, dof), f);
            }
        }
        self
    }

    /// Tells whether every velocity component is prescribed on the whole boundary
    ///
    /// When this holds (and no pressure DOF is pinned) the pressure is only
    /// determined up to a constant and the zero-mean constraint is activated.
    pub fn covers_all_velocity(&self, features: &Features, ndim: usize) -> bool {
        for point in &features.points {
            for comp in 0..ndim {
                if !self.all.contains_key(&(*point, Dof::velocity(comp))) {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for Essential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Essential boundary conditions\n").unwrap();
        write!(f, "=============================\n").unwrap();
        let mut keys: Vec<_> = self.all.keys().collect();
        keys.sort();
        for key in keys {
            let (point, dof) = key;
            write!(f, "{:?} : {}\n", point, dof).unwrap();
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

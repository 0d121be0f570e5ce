use crate::base::{Config, Layout};
use crate::StrError;
use gemlab::mesh::Mesh;
use russell_lab::{vec_copy, Vector};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

/// Holds the state of a simulation at a given time
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimState {
    /// Current time
    pub t: f64,

    /// Timestep size
    pub dt: f64,

    /// Global unknown vector [velocities, pressures | displacements]
    pub xi: Vector,

    /// Global unknown vector at the previous timestep
    pub xi_prev: Vector,
}

impl SimState {
    /// Allocates a new instance and applies the initial conditions
    ///
    /// Velocities and displacements are initialized by evaluating the
    /// corresponding functions at the nodal coordinates (the spaces are
    /// nodal Lagrange spaces, so interpolation is nodal assignment).
    pub fn new(fluid: &Mesh, solid: &Mesh, layout: &Layout, config: &Config) -> Result<Self, StrError> {
        let mut xi = Vector::new(layout.n_equation);
        let ndim = layout.ndim;
        if let Some(f) = config.initial_velocity {
            let mut val = vec![0.0; ndim];
            for point in &fluid.points {
                f(&point.coords, 0.0, &mut val);
                for comp in 0..ndim {
                    xi[layout.velocity_eq(point.id, comp)] = val[comp];
                }
            }
        }
        if let Some(f) = config.initial_displacement {
            let mut val = vec![0.0; ndim];
            for point in &solid.points {
                f(&point.coords, 0.0, &mut val);
                for comp in 0..ndim {
                    xi[layout.solid_eq(point.id, comp)] = val[comp];
                }
            }
        }
        let xi_prev = xi.clone();
        Ok(SimState {
            t: 0.0,
            dt: config.dt,
            xi,
            xi_prev,
        })
    }

    /// Copies the current unknowns onto the previous-step unknowns
    pub fn accept_step(&mut self) -> Result<(), StrError> {
        let mut xi_prev = Vector::new(self.xi.dim());
        vec_copy(&mut xi_prev, &self.xi)?;
        self.xi_prev = xi_prev;
        Ok(())
    }

    /// Reads a JSON file containing the state
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| "cannot open file")?;
        let reader = BufReader::new(file);
        let state = serde_json::from_reader(reader).map_err(|_| "cannot parse JSON file")?;
        Ok(state)
    }

    /// Writes a JSON file with the state
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

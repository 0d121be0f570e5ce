use super::{Constraints, SimState};
use crate::base::{assemble_matrix, assemble_vector, Config, Layout};
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::{CellId, Mesh};
use gemlab::shapes::Scratchpad;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Implements the Navier-Stokes residual and Jacobian of one fluid cell
///
/// The local DOFs are ordered node-major with the pressure after the
/// velocity components of each node: [v0x, v0y, p0, v1x, v1y, p1, ...].
/// The momentum residual of a velocity test function N_i (component c) is
///
/// ```text
/// R_i = ∫ [ rho (u̇_c - b_c) N_i - p ∂N_i/∂x_c
///          + Σ_d eta (∂u_c/∂x_d + ∂u_d/∂x_c) ∂N_i/∂x_d
///          + Σ_d rho ∂u_c/∂x_d u_d N_i ] dx
/// ```
///
/// and the continuity residual of a pressure test function is
/// `-∫ (∇·u) N_i dx`. Time derivatives use the backward Euler difference
/// `(xi - xi_prev) / dt`.
pub struct FluidElement<'a> {
    /// Configuration
    config: &'a Config,

    /// Cell id in the fluid mesh
    pub cell_id: CellId,

    /// Scratchpad with the cell coordinates
    pad: Scratchpad,

    /// Integration rule
    gauss: Gauss,

    /// Local-to-global equation map
    pub l2g: Vec<usize>,

    /// Local residual vector
    pub residual: Vector,

    /// Local Jacobian matrix
    pub jacobian: Matrix,

    /// Accumulated cell contribution to the mean pressure
    pub avg_pressure: f64,

    /// Accumulated cell coefficients of the mean-pressure row
    pub pressure_coeff: Vector,

    /// Space dimension
    ndim: usize,

    /// Number of nodes
    nnode: usize,
}

impl<'a> FluidElement<'a> {
    /// Allocates a new instance
    pub fn new(fluid: &Mesh, layout: &Layout, config: &'a Config, cell_id: CellId) -> Result<Self, StrError> {
        let cell = &fluid.cells[cell_id];
        let ndim = fluid.ndim;
        let nnode = cell.points.len();
        let mut pad = Scratchpad::new(ndim, cell.kind)?;
        fluid.set_pad(&mut pad, &cell.points);
        let gauss = Gauss::new_or_sized(cell.kind, config.ngauss_fluid)?;
        let neq_local = nnode * (ndim + 1);
        let mut l2g = vec![0; neq_local];
        for (m, point) in cell.points.iter().enumerate() {
            for c in 0..ndim {
                l2g[m * (ndim + 1) + c] = layout.velocity_eq(*point, c);
            }
            l2g[m * (ndim + 1) + ndim] = layout.pressure_eq(*point);
        }
        Ok(FluidElement {
            config,
            cell_id,
            pad,
            gauss,
            l2g,
            residual: Vector::new(neq_local),
            jacobian: Matrix::new(neq_local, neq_local),
            avg_pressure: 0.0,
            pressure_coeff: Vector::new(neq_local),
            ndim,
            nnode,
        })
    }

    /// Computes the local residual, and optionally the local Jacobian
    pub fn calc(&mut self, state: &SimState, with_jacobian: bool) -> Result<(), StrError> {
        let (ndim, nnode) = (self.ndim, self.nnode);
        let nd1 = ndim + 1;
        let neq_local = nnode * nd1;
        let alpha = 1.0 / state.dt;
        let (rho, eta) = (self.config.rho, self.config.eta);
        self.residual.fill(0.0);
        self.jacobian.fill(0.0);
        self.avg_pressure = 0.0;
        self.pressure_coeff.fill(0.0);
        let mut u = vec![0.0; ndim];
        let mut udot = vec![0.0; ndim];
        let mut force = vec![0.0; ndim];
        let mut gu = Matrix::new(ndim, ndim);
        let mut x_q = Vector::new(ndim);
        for p in 0..self.gauss.npoint() {
            let ksi = self.gauss.coords(p);
            let det = self.pad.calc_gradient(ksi.as_data())?;
            (self.pad.fn_interp)(&mut self.pad.interp, ksi.as_data());
            let jxw = det * self.gauss.weight(p);

            // interpolated fields
            for c in 0..ndim {
                u[c] = 0.0;
                udot[c] = 0.0;
                for d in 0..ndim {
                    gu.set(c, d, 0.0);
                }
            }
            let mut pressure = 0.0;
            for m in 0..nnode {
                let nm = self.pad.interp[m];
                for c in 0..ndim {
                    let eq = self.l2g[m * nd1 + c];
                    u[c] += nm * state.xi[eq];
                    udot[c] += nm * (state.xi[eq] - state.xi_prev[eq]) * alpha;
                    for d in 0..ndim {
                        let value = gu.get(c, d) + state.xi[eq] * self.pad.gradient.get(m, d);
                        gu.set(c, d, value);
                    }
                }
                pressure += nm * state.xi[self.l2g[m * nd1 + ndim]];
            }
            if let Some(f) = self.config.body_force {
                self.pad.calc_coords(&mut x_q, ksi.as_data())?;
                f(x_q.as_data(), state.t, &mut force);
            } else {
                for c in 0..ndim {
                    force[c] = 0.0;
                }
            }

            // residual and Jacobian
            for i in 0..neq_local {
                let m = i / nd1;
                let c = i % nd1;
                let nm = self.pad.interp[m];
                if c < ndim {
                    let mut value = rho * (udot[c] - force[c]) * nm - pressure * self.pad.gradient.get(m, c);
                    for d in 0..ndim {
                        value += eta * (gu.get(c, d) + gu.get(d, c)) * self.pad.gradient.get(m, d);
                        value += rho * gu.get(c, d) * u[d] * nm;
                    }
                    self.residual[i] += value * jxw;
                    if with_jacobian {
                        for j in 0..neq_local {
                            let n = j / nd1;
                            let cj = j % nd1;
                            let nn = self.pad.interp[n];
                            if cj == ndim {
                                let value = self.jacobian.get(i, j) - self.pad.gradient.get(m, c) * nn * jxw;
                                self.jacobian.set(i, j, value);
                            } else {
                                let mut value = eta * self.pad.gradient.get(m, cj) * self.pad.gradient.get(n, c);
                                value += rho * gu.get(c, cj) * nm * nn;
                                if cj == c {
                                    value += rho * alpha * nm * nn;
                                    for d in 0..ndim {
                                        value += eta * self.pad.gradient.get(m, d) * self.pad.gradient.get(n, d);
                                        value += rho * nm * u[d] * self.pad.gradient.get(n, d);
                                    }
                                }
                                self.jacobian.set(i, j, self.jacobian.get(i, j) + value * jxw);
                            }
                        }
                    }
                } else {
                    let mut div = 0.0;
                    for d in 0..ndim {
                        div += gu.get(d, d);
                    }
                    self.residual[i] -= div * nm * jxw;
                    if with_jacobian {
                        for j in 0..neq_local {
                            let n = j / nd1;
                            let cj = j % nd1;
                            if cj < ndim {
                                let value = self.jacobian.get(i, j) - nm * self.pad.gradient.get(n, cj) * jxw;
                                self.jacobian.set(i, j, value);
                            }
                        }
                    }
                    self.pressure_coeff[i] += nm * jxw;
                }
            }
            self.avg_pressure += pressure * jxw;
        }
        Ok(())
    }

    /// Computes the local quantities and assembles them into the global system
    ///
    /// The constrained rows are overwritten before the assembly; the
    /// mean-pressure accumulation goes into the gauge row when active.
    pub fn assemble(
        &mut self,
        rr: &mut Vector,
        kk: Option<&mut CooMatrix>,
        state: &SimState,
        constraints: &Constraints,
    ) -> Result<(), StrError> {
        let with_jacobian = kk.is_some();
        self.calc(state, with_jacobian)?;
        let jacobian = if with_jacobian { Some(&mut self.jacobian) } else { None };
        constraints.apply_local(&mut self.residual, jacobian, &self.l2g, &state.xi);
        assemble_vector(rr, &self.residual, &self.l2g);
        if constraints.gauge_active {
            let factor = constraints.scale / constraints.area;
            rr[constraints.gauge_eq] += self.avg_pressure * factor;
        }
        if let Some(kk) = kk {
            assemble_matrix(kk, &self.jacobian, &self.l2g, &self.l2g)?;
            if constraints.gauge_active {
                let factor = constraints.scale / constraints.area;
                for l in 0..self.l2g.len() {
                    let value = self.pressure_coeff[l] * factor;
                    if value != 0.0 {
                        kk.put(constraints.gauge_eq, self.l2g[l], value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

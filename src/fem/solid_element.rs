use super::{Constraints, DeformedMap, FluidField, SimState};
use crate::base::{Config, Layout};
use crate::material::ElasticLaw;
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::{CellId, Mesh};
use gemlab::shapes::Scratchpad;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Implements the coupling terms carried by one solid cell
///
/// The elastic body is discretized on its own (reference) mesh; its
/// quadrature points are pushed through the deformed map into the fluid
/// mesh at every residual evaluation. Each quadrature point contributes:
///
/// * force rows on the fluid cell containing it (the elastic force, either
///   contracted directly with the fluid test gradients or spread through
///   the mass-projected force density);
/// * velocity-matching rows on the solid DOFs, `Phi_B (ẇ - u(x_q))`,
///   which tie the body velocity to the local fluid velocity;
/// * the excess inertia `Phi_B ẇ` of the body over the displaced fluid.
///
/// The sparsity of the coupled Jacobian follows the deformation: the set
/// of (fluid, solid) cell pairs in contact changes whenever the quadrature
/// points cross fluid cell borders.
pub struct SolidElement<'a> {
    /// Configuration
    config: &'a Config,

    /// Cell id in the solid mesh
    pub cell_id: CellId,

    /// Scratchpad with the reference coordinates of the cell
    pad: Scratchpad,

    /// Integration rule
    gauss: Gauss,

    /// Constitutive model
    law: ElasticLaw,

    /// Global equation numbers of the cell displacements
    pub l2g: Vec<usize>,

    /// Positions of the cell displacements within the solid block
    pub local_block: Vec<usize>,

    /// Space dimension
    ndim: usize,

    /// Number of nodes
    nnode: usize,
}

impl<'a> SolidElement<'a> {
    /// Allocates a new instance
    pub fn new(solid: &Mesh, layout: &Layout, config: &'a Config, cell_id: CellId) -> Result<Self, StrError> {
        let cell = &solid.cells[cell_id];
        let ndim = solid.ndim;
        let nnode = cell.points.len();
        let mut pad = Scratchpad::new(ndim, cell.kind)?;
        solid.set_pad(&mut pad, &cell.points);
        let gauss = Gauss::new_or_sized(cell.kind, config.ngauss_solid)?;
        let law = ElasticLaw::new(config.model, config.mu, ndim)?;
        let mut l2g = vec![0; nnode * ndim];
        let mut local_block = vec![0; nnode * ndim];
        for (m, point) in cell.points.iter().enumerate() {
            for c in 0..ndim {
                l2g[m * ndim + c] = layout.solid_eq(*point, c);
                local_block[m * ndim + c] = layout.solid_local(*point, c);
            }
        }
        Ok(SolidElement {
            config,
            cell_id,
            pad,
            gauss,
            law,
            l2g,
            local_block,
            ndim,
            nnode,
        })
    }

    /// Gathers the local displacements from the global unknowns
    fn local_displacement(&self, ww: &mut Vector, xi: &Vector) {
        for k in 0..self.l2g.len() {
            ww[k] = xi[self.l2g[k]];
        }
    }

    /// Adds the (scaled) mass matrix of the cell to the solid-block matrix
    ///
    /// Accumulates the quadrature sum into a dense local matrix first, so
    /// the sparse store receives one entry per (node, node, component).
    pub fn add_to_mass(&mut self, mass: &mut CooMatrix) -> Result<(), StrError> {
        let (ndim, nnode) = (self.ndim, self.nnode);
        let mut local = Matrix::new(nnode, nnode);
        for p in 0..self.gauss.npoint() {
            let ksi = self.gauss.coords(p);
            let det = self.pad.calc_gradient(ksi.as_data())?;
            (self.pad.fn_interp)(&mut self.pad.interp, ksi.as_data());
            let jxw = det * self.gauss.weight(p);
            for m in 0..nnode {
                for n in 0..nnode {
                    let value = local.get(m, n) + self.config.phi_b * self.pad.interp[m] * self.pad.interp[n] * jxw;
                    local.set(m, n, value);
                }
            }
        }
        for m in 0..nnode {
            for n in 0..nnode {
                for c in 0..ndim {
                    mass.put(self.local_block[m * ndim + c], self.local_block[n * ndim + c], local.get(m, n))?;
                }
            }
        }
        Ok(())
    }

    /// Adds the virtual work of the elastic stress to the force-density vector
    ///
    /// `a_gamma[k] += ∫ Pe : (e_ck ⊗ ∇N_nk) dX` over the reference cell.
    pub fn add_to_a_gamma(&mut self, a_gamma: &mut Vector, xi: &Vector) -> Result<(), StrError> {
        let (ndim, nnode) = (self.ndim, self.nnode);
        let mut ww = Vector::new(nnode * ndim);
        self.local_displacement(&mut ww, xi);
        let mut ff = Matrix::new(ndim, ndim);
        let mut pe = Matrix::new(ndim, ndim);
        let mut x_ref = Vector::new(ndim);
        for p in 0..self.gauss.npoint() {
            let ksi = self.gauss.coords(p);
            let det = self.pad.calc_gradient(ksi.as_data())?;
            let jxw = det * self.gauss.weight(p);
            self.pad.calc_coords(&mut x_ref, ksi.as_data())?;
            ElasticLaw::deformation_gradient(&mut ff, &self.pad.gradient, &ww);
            self.law.stress(&mut pe, &ff, x_ref.as_data())?;
            for k in 0..(nnode * ndim) {
                let (n, c) = (k / ndim, k % ndim);
                let mut value = 0.0;
                for j in 0..ndim {
                    value += pe.get(c, j) * self.pad.gradient.get(n, j);
                }
                a_gamma[self.local_block[k]] += value * jxw;
            }
        }
        Ok(())
    }

    /// Computes the coupling terms of the cell and assembles them into the global system
    ///
    /// `minva` holds the mass-projected force density (spread mode only).
    /// The deformed map must have been updated by the caller.
    pub fn assemble(
        &mut self,
        rr: &mut Vector,
        mut kk: Option<&mut CooMatrix>,
        state: &SimState,
        field: &mut FluidField,
        map: &mut DeformedMap,
        minva: Option<&Vector>,
        constraints: &Constraints,
        layout: &Layout,
    ) -> Result<(), StrError> {
        let (ndim, nnode) = (self.ndim, self.nnode);
        let neq_solid = nnode * ndim;
        let alpha = 1.0 / state.dt;
        let phi_b = self.config.phi_b;
        let semi = self.config.semi_implicit;
        let spread = self.config.use_spread;
        let with_jacobian = kk.is_some();

        let mut ww = Vector::new(neq_solid);
        self.local_displacement(&mut ww, &state.xi);
        let mut ff = Matrix::new(ndim, ndim);
        let mut pe_ft = Matrix::new(ndim, ndim);
        let mut dpeft: Vec<_> = (0..neq_solid).map(|_| Matrix::new(ndim, ndim)).collect();
        let mut x_ref = Vector::new(ndim);
        let mut x_q = Vector::new(ndim);
        let mut ksi_f = Vector::new(ndim);
        let mut u = Vector::new(ndim);
        let mut gu = Matrix::new(ndim, ndim);

        for p in 0..self.gauss.npoint() {
            let ksi = self.gauss.coords(p);
            let det = self.pad.calc_gradient(ksi.as_data())?;
            (self.pad.fn_interp)(&mut self.pad.interp, ksi.as_data());
            let jxw = det * self.gauss.weight(p);
            self.pad.calc_coords(&mut x_ref, ksi.as_data())?;
            let nn_s = self.pad.interp.clone();
            let gg_s = self.pad.gradient.clone();

            // constitutive terms at the reference quadrature point
            ElasticLaw::deformation_gradient(&mut ff, &gg_s, &ww);
            if !(semi && spread) {
                self.law.stress_force(&mut pe_ft, &ff, x_ref.as_data())?;
            }
            if with_jacobian {
                self.law.stress_force_derivative(&mut dpeft, &ff, &gg_s, x_ref.as_data())?;
            }

            // fluid cell hosting the deformed quadrature point
            map.coords(&mut x_q, self.cell_id, ksi.as_data())?;
            let fluid_cell = field.locate(&mut ksi_f, &x_q)?;
            let nn_f = field.shape(fluid_cell, ksi_f.as_data());
            let gg_f = field.gradient(fluid_cell, ksi_f.as_data())?;
            let fluid_points = field.cell_points(fluid_cell).to_vec();
            let nnode_f = fluid_points.len();
            field.velocity(&mut u, layout, &state.xi, fluid_cell, ksi_f.as_data());
            let hessian = if with_jacobian && !semi {
                Some(field.shape_hessian(fluid_cell, &x_q)?)
            } else {
                None
            };
            if with_jacobian && !semi {
                field.velocity_gradient(&mut gu, layout, &state.xi, fluid_cell, ksi_f.as_data())?;
            }

            // force rows on the fluid cell
            for mf in 0..nnode_f {
                for c in 0..ndim {
                    let eq_row = layout.velocity_eq(fluid_points[mf], c);
                    if constraints.is_constrained(eq_row) {
                        continue;
                    }
                    if spread {
                        let density = minva.ok_or("spread mode requires the mass-projected force density")?;
                        let mut value = 0.0;
                        for ms in 0..nnode {
                            value += nn_s[ms] * density[self.local_block[ms * ndim + c]];
                        }
                        rr[eq_row] += phi_b * value * nn_f[mf] * jxw;
                    } else {
                        let mut value = 0.0;
                        for j in 0..ndim {
                            value += pe_ft.get(c, j) * gg_f.get(mf, j);
                        }
                        rr[eq_row] += value * jxw;
                    }
                    if let Some(ref mut kk) = kk {
                        for k in 0..neq_solid {
                            let (ns, d) = (k / ndim, k % ndim);
                            let mut value = 0.0;
                            for j in 0..ndim {
                                value += dpeft[k].get(c, j) * gg_f.get(mf, j);
                            }
                            if let Some(ref hh) = hessian {
                                let mut conv = 0.0;
                                for j in 0..ndim {
                                    conv += pe_ft.get(c, j) * hh[mf].get(j, d);
                                }
                                value += conv * nn_s[ns];
                            }
                            if value != 0.0 {
                                kk.put(eq_row, self.l2g[k], value * jxw)?;
                            }
                        }
                    }
                }
            }

            // velocity-matching and inertia rows on the solid DOFs
            for ms in 0..nnode {
                for c in 0..ndim {
                    let i = ms * ndim + c;
                    let eq_row = self.l2g[i];
                    let mut wdot = 0.0;
                    for ns in 0..nnode {
                        let eq = self.l2g[ns * ndim + c];
                        wdot += nn_s[ns] * (state.xi[eq] - state.xi_prev[eq]) * alpha;
                    }
                    rr[eq_row] += phi_b * (wdot - u[c]) * nn_s[ms] * jxw;
                    if let Some(ref mut kk) = kk {
                        for nf in 0..nnode_f {
                            let eq_col = layout.velocity_eq(fluid_points[nf], c);
                            kk.put(eq_row, eq_col, -phi_b * nn_s[ms] * nn_f[nf] * jxw)?;
                        }
                        for ns in 0..nnode {
                            for d in 0..ndim {
                                let mut value = 0.0;
                                if d == c {
                                    value += alpha * phi_b * nn_s[ms] * nn_s[ns];
                                }
                                if !semi {
                                    value -= phi_b * nn_s[ms] * nn_s[ns] * gu.get(c, d);
                                }
                                if value != 0.0 {
                                    kk.put(eq_row, self.l2g[ns * ndim + d], value * jxw)?;
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use crate::base::MaterialModel;
use crate::StrError;
use russell_lab::{mat_inverse, Matrix, Vector};

/// Implements the elastic part of the first Piola-Kirchhoff stress
///
/// The body is incompressible, so the constitutive model only provides the
/// elastic (deviatoric) part `Pe` of the stress; the volumetric part is
/// carried by the fluid pressure. Three variants are available:
///
/// * `NeoHookeanZeroTraction` -- Pe = mu (F - F⁻ᵀ)
/// * `NeoHookeanDeviatoric`   -- Pe = mu F
/// * `CircumferentialFiber`   -- Pe = mu F (e ⊗ e), 2D only, where e is the
///   unit circumferential direction around a given center
///
/// The Eulerian force on the fluid involves the push-forward Pe Fᵀ and its
/// derivatives with respect to the nodal displacements.
pub struct ElasticLaw {
    /// Constitutive model variant
    model: MaterialModel,

    /// Shear modulus
    mu: f64,

    /// Space dimension
    ndim: usize,
}

impl ElasticLaw {
    /// Allocates a new instance
    pub fn new(model: MaterialModel, mu: f64, ndim: usize) -> Result<Self, StrError> {
        if mu <= 0.0 {
            return Err("mu must be > 0.0");
        }
        if let MaterialModel::CircumferentialFiber { .. } = model {
            if ndim != 2 {
                return Err("the CircumferentialFiber model is only available in 2D");
            }
        }
        Ok(ElasticLaw { model, mu, ndim })
    }

    /// Computes the deformation gradient F = I + ∇w from nodal displacements
    ///
    /// `gg` is the (nnode × ndim) matrix of shape function gradients with
    /// respect to the reference coordinates and `ww` holds the local nodal
    /// displacements in node-major order.
    pub fn deformation_gradient(ff: &mut Matrix, gg: &Matrix, ww: &Vector) {
        let (nnode, ndim) = gg.dims();
        for i in 0..ndim {
            for j in 0..ndim {
                let mut value = if i == j { 1.0 } else { 0.0 };
                for m in 0..nnode {
                    value += ww[m * ndim + i] * gg.get(m, j);
                }
                ff.set(i, j, value);
            }
        }
    }

    /// Computes the elastic stress Pe
    ///
    /// `x_ref` holds the reference coordinates of the quadrature point
    /// (only used by the fiber model).
    pub fn stress(&self, pe: &mut Matrix, ff: &Matrix, x_ref: &[f64]) -> Result<(), StrError> {
        let ndim = self.ndim;
        match self.model {
            MaterialModel::NeoHookeanZeroTraction => {
                let mut fi = Matrix::new(ndim, ndim);
                mat_inverse(&mut fi, ff)?;
                for i in 0..ndim {
                    for j in 0..ndim {
                        pe.set(i, j, self.mu * (ff.get(i, j) - fi.get(j, i)));
                    }
                }
            }
            MaterialModel::NeoHookeanDeviatoric => {
                for i in 0..ndim {
                    for j in 0..ndim {
                        pe.set(i, j, self.mu * ff.get(i, j));
                    }
                }
            }
            MaterialModel::CircumferentialFiber { xc, yc } => {
                let mm = fiber_projector(x_ref, xc, yc)?;
                for i in 0..ndim {
                    for j in 0..ndim {
                        let mut value = 0.0;
                        for k in 0..ndim {
                            value += ff.get(i, k) * mm.get(k, j);
                        }
                        pe.set(i, j, self.mu * value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Computes the push-forward Pe Fᵀ appearing in the Eulerian force
    pub fn stress_force(&self, pe_ft: &mut Matrix, ff: &Matrix, x_ref: &[f64]) -> Result<(), StrError> {
        let ndim = self.ndim;
        match self.model {
            // Pe Fᵀ = mu (F Fᵀ - I); the inverse cancels out
            MaterialModel::NeoHookeanZeroTraction => {
                for i in 0..ndim {
                    for j in 0..ndim {
                        let mut value = if i == j { -1.0 } else { 0.0 };
                        for m in 0..ndim {
                            value += ff.get(i, m) * ff.get(j, m);
                        }
                        pe_ft.set(i, j, self.mu * value);
                    }
                }
            }
            MaterialModel::NeoHookeanDeviatoric => {
                for i in 0..ndim {
                    for j in 0..ndim {
                        let mut value = 0.0;
                        for m in 0..ndim {
                            value += ff.get(i, m) * ff.get(j, m);
                        }
                        pe_ft.set(i, j, self.mu * value);
                    }
                }
            }
            MaterialModel::CircumferentialFiber { xc, yc } => {
                let mm = fiber_projector(x_ref, xc, yc)?;
                for i in 0..ndim {
                    for j in 0..ndim {
                        let mut value = 0.0;
                        for k in 0..ndim {
                            for m in 0..ndim {
                                value += ff.get(i, k) * mm.get(k, m) * ff.get(j, m);
                            }
                        }
                        pe_ft.set(i, j, self.mu * value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Computes the derivatives of Pe Fᵀ with respect to the nodal displacements
    ///
    /// `dpeft[k]` receives ∂(Pe Fᵀ)/∂w_k where k enumerates the local solid
    /// DOFs in node-major order. The slice must have length nnode × ndim.
    pub fn stress_force_derivative(
        &self,
        dpeft: &mut [Matrix],
        ff: &Matrix,
        gg: &Matrix,
        x_ref: &[f64],
    ) -> Result<(), StrError> {
        let (nnode, ndim) = gg.dims();
        let mut g_tilde = vec![0.0; ndim];
        for n in 0..nnode {
            match self.model {
                MaterialModel::CircumferentialFiber { xc, yc } => {
                    let mm = fiber_projector(x_ref, xc, yc)?;
                    for m in 0..ndim {
                        let mut value = 0.0;
                        for l in 0..ndim {
                            value += mm.get(m, l) * gg.get(n, l);
                        }
                        g_tilde[m] = value;
                    }
                }
                _ => {
                    for m in 0..ndim {
                        g_tilde[m] = gg.get(n, m);
                    }
                }
            }
            for c in 0..ndim {
                let k = n * ndim + c;
                for i in 0..ndim {
                    for j in 0..ndim {
                        let mut value = 0.0;
                        if i == c {
                            for m in 0..ndim {
                                value += g_tilde[m] * ff.get(j, m);
                            }
                        }
                        if j == c {
                            for m in 0..ndim {
                                value += g_tilde[m] * ff.get(i, m);
                            }
                        }
                        dpeft[k].set(i, j, self.mu * value);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Computes the fiber projector M = e ⊗ e with e the circumferential direction
fn fiber_projector(x_ref: &[f64], xc: f64, yc: f64) -> Result<Matrix, StrError> {
    let px = x_ref[0] - xc;
    let py = x_ref[1] - yc;
    let r = f64::sqrt(px * px + py * py);
    if r < 1e-12 {
        return Err("fiber direction is undefined at the ring center");
    }
    let (ex, ey) = (-py / r, px / r);
    let mut mm = Matrix::new(2, 2);
    mm.set(0, 0, ex * ex);
    mm.set(0, 1, ex * ey);
    mm.set(1, 0, ey * ex);
    mm.set(1, 1, ey * ey);
    Ok(mm)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

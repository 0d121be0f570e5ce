use super::{Constraints, DeformedMap, FluidField, SimState, SolidElement};
use crate::base::{Config, Layout};
use crate::StrError;
use gemlab::mesh::Mesh;
use russell_lab::Vector;
use russell_sparse::{CooMatrix, LinSolver, SparseMatrix, Sym};

/// Drives the solid elements and the spread-mode force projection
///
/// Owns the deformed map and, in spread mode, the (fixed) solid mass
/// matrix weighted by the excess density. The mass matrix lives on the
/// reference configuration, so it is assembled and factorized once; the
/// force density is re-projected at every residual evaluation.
pub struct Coupling<'a> {
    /// Configuration
    config: &'a Config,

    /// The solid mesh
    solid: &'a Mesh,

    /// All solid elements
    pub elements: Vec<SolidElement<'a>>,

    /// Deformed map of the solid
    pub map: DeformedMap,

    /// Virtual work of the elastic stress (spread mode)
    a_gamma: Vector,

    /// Mass-projected force density (spread mode)
    minva: Vector,

    /// Factorized solid mass matrix (spread mode)
    mass: Option<SparseMatrix>,

    /// Solver holding the mass factorization (spread mode)
    mass_solver: Option<LinSolver<'a>>,
}

impl<'a> Coupling<'a> {
    /// Allocates a new instance
    pub fn new(solid: &'a Mesh, layout: &Layout, config: &'a Config) -> Result<Self, StrError> {
        let mut elements = Vec::with_capacity(solid.cells.len());
        for cell_id in 0..solid.cells.len() {
            elements.push(SolidElement::new(solid, layout, config, cell_id)?);
        }
        let map = DeformedMap::new(solid)?;
        let (mass, mass_solver) = if config.use_spread {
            let nnz: usize = solid
                .cells
                .iter()
                .map(|cell| {
                    let n = cell.points.len() * solid.ndim;
                    n * n
                })
                .sum();
            let mut mass = SparseMatrix::new_coo(layout.n_w, layout.n_w, nnz, Sym::No)?;
            let coo = mass.get_coo_mut()?;
            for element in &mut elements {
                element.add_to_mass(coo)?;
            }
            let mut solver = LinSolver::new(config.lin_sol_genie)?;
            solver.actual.factorize(&mut mass, Some(config.lin_sol_params))?;
            (Some(mass), Some(solver))
        } else {
            (None, None)
        };
        Ok(Coupling {
            config,
            solid,
            elements,
            map,
            a_gamma: Vector::new(layout.n_w),
            minva: Vector::new(layout.n_w),
            mass,
            mass_solver,
        })
    }

    /// Assembles the coupling residual, and optionally the Jacobian
    ///
    /// Refreshes the deformed map from the current (or previous, in the
    /// semi-implicit scheme) displacements before integrating.
    pub fn assemble(
        &mut self,
        rr: &mut Vector,
        mut kk: Option<&mut CooMatrix>,
        state: &SimState,
        field: &mut FluidField,
        constraints: &Constraints,
        layout: &Layout,
    ) -> Result<(), StrError> {
        let xi_map = if self.config.semi_implicit {
            &state.xi_prev
        } else {
            &state.xi
        };
        self.map.update(self.solid, layout, xi_map);
        let minva = if self.config.use_spread {
            self.a_gamma.fill(0.0);
            for element in &mut self.elements {
                element.add_to_a_gamma(&mut self.a_gamma, &state.xi)?;
            }
            let mass = self.mass.as_mut().ok_or("spread mode requires the mass matrix")?;
            let solver = self.mass_solver.as_mut().ok_or("spread mode requires the mass solver")?;
            solver.actual.solve(&mut self.minva, mass, &self.a_gamma, false)?;
            Some(&self.minva)
        } else {
            None
        };
        for element in &mut self.elements {
            element.assemble(rr, kk.as_deref_mut(), state, field, &mut self.map, minva, constraints, layout)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Coupling;
    use crate::base::{Config, Essential, Layout, MaterialModel, StructuredMeshes};
    use crate::fem::{Constraints, FluidField, SimState};
    use gemlab::mesh::Features;
    use russell_lab::{approx_eq, deriv1_central5, Vector};
    use russell_sparse::{CooMatrix, Sym};

    #[test]
    fn force_rows_vanish_at_the_reference_configuration() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 8).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let features = Features::new(&fluid, false);
        let essential = Essential::new();
        let mut config = Config::new();
        config.set_model(MaterialModel::NeoHookeanZeroTraction);
        let state = SimState::new(&fluid, &solid, &layout, &config).unwrap();
        let mut field = FluidField::new(&fluid).unwrap();
        let constraints = Constraints::new(
            &fluid,
            &features,
            &essential,
            &layout,
            &config,
            field.min_diameter,
            field.domain_area,
        )
        .unwrap();
        let mut coupling = Coupling::new(&solid, &layout, &config).unwrap();
        let mut rr = Vector::new(layout.n_equation);
        coupling
            .assemble(&mut rr, None, &state, &mut field, &constraints, &layout)
            .unwrap();
        // zero stress, zero velocity, zero body velocity
        for i in 0..layout.n_equation {
            approx_eq(rr[i], 0.0, 1e-13);
        }
    }

    #[test]
    fn spread_mode_assembles_at_the_reference_configuration() {
        // the mass matrix is built and factorized in new(); the projected
        // force density of a stress-free ring is zero
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 8).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let features = Features::new(&fluid, false);
        let essential = Essential::new();
        let mut config = Config::new();
        config
            .set_model(MaterialModel::NeoHookeanZeroTraction)
            .set_use_spread(true);
        let state = SimState::new(&fluid, &solid, &layout, &config).unwrap();
        let mut field = FluidField::new(&fluid).unwrap();
        let constraints = Constraints::new(
            &fluid,
            &features,
            &essential,
            &layout,
            &config,
            field.min_diameter,
            field.domain_area,
        )
        .unwrap();
        let mut coupling = Coupling::new(&solid, &layout, &config).unwrap();
        let mut rr = Vector::new(layout.n_equation);
        coupling
            .assemble(&mut rr, None, &state, &mut field, &constraints, &layout)
            .unwrap();
        for i in 0..layout.n_equation {
            approx_eq(rr[i], 0.0, 1e-12);
        }
    }

    #[test]
    fn jacobian_matches_numerical_derivatives() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let features = Features::new(&fluid, false);
        let essential = Essential::new();
        let mut config = Config::new();
        config
            .set_model(MaterialModel::NeoHookeanDeviatoric)
            .set_phi_b(0.8)
            .unwrap()
            .set_time(0.05, 1.0)
            .unwrap();
        let mut state = SimState::new(&fluid, &solid, &layout, &config).unwrap();
        // small displacements and a smooth velocity field
        for i in 0..layout.n_equation {
            state.xi[i] = 0.01 * f64::sin(1.0 + i as f64);
            state.xi_prev[i] = 0.01 * f64::cos(i as f64);
        }
        let mut field = FluidField::new(&fluid).unwrap();
        let constraints = Constraints::new(
            &fluid,
            &features,
            &essential,
            &layout,
            &config,
            field.min_diameter,
            field.domain_area,
        )
        .unwrap();
        let mut coupling = Coupling::new(&solid, &layout, &config).unwrap();

        // analytical Jacobian
        let neq = layout.n_equation;
        let mut rr = Vector::new(neq);
        let mut kk = CooMatrix::new(neq, neq, 100_000, Sym::No).unwrap();
        coupling
            .assemble(&mut rr, Some(&mut kk), &state, &mut field, &constraints, &layout)
            .unwrap();
        let dense = kk.as_dense();

        // numerical Jacobian
        struct Args<'x, 'c> {
            coupling: &'x mut Coupling<'c>,
            field: &'x mut FluidField<'c>,
            constraints: &'x Constraints,
            layout: &'x Layout,
            state: SimState,
            i: usize,
            eq: usize,
        }
        let mut args = Args {
            coupling: &mut coupling,
            field: &mut field,
            constraints: &constraints,
            layout: &layout,
            state: state.clone(),
            i: 0,
            eq: 0,
        };
        for i in 0..neq {
            for j in 0..neq {
                args.i = i;
                args.eq = j;
                let at_x = state.xi[j];
                let num = deriv1_central5(at_x, &mut args, |x, a| {
                    let original = a.state.xi[a.eq];
                    a.state.xi[a.eq] = x;
                    let mut rr = Vector::new(a.layout.n_equation);
                    a.coupling
                        .assemble(&mut rr, None, &a.state, a.field, a.constraints, a.layout)?;
                    a.state.xi[a.eq] = original;
                    Ok(rr[a.i])
                })
                .unwrap();
                approx_eq(dense.get(i, j), num, 1e-6);
            }
        }
    }
}

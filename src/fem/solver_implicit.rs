use super::{BoundaryFlux, Constraints, Coupling, FileIo, FluidElement, FluidField, LinearSystem, SimState};
use crate::base::{
    Config, Essential, Layout, NEWTON_MAX_ITERATIONS, NEWTON_MAX_RESTARTS, NEWTON_THRESHOLD_LARGE, NEWTON_TOL_RESIDUAL,
};
use crate::StrError;
use gemlab::mesh::{Features, Mesh};
use russell_lab::{vec_norm, Norm, Vector};

/// Implements the implicit (backward Euler) solver for the coupled problem
///
/// Every timestep solves the monolithic nonlinear system with Newton
/// iterations. The Jacobian is recomputed lazily: a factorization is
/// reused across iterations (and timesteps) until the residual norm
/// exceeds a threshold, the iteration count reaches its cap, or the
/// configuration demands a fresh matrix.
pub struct SolverImplicit<'a> {
    /// Configuration
    config: &'a Config,

    /// The solid mesh
    solid: &'a Mesh,

    /// Equation layout of both meshes
    pub layout: Layout,

    /// All fluid elements
    pub fluid_elements: Vec<FluidElement<'a>>,

    /// The solid elements and the spread-mode projection
    pub coupling: Coupling<'a>,

    /// Field evaluator on the fluid mesh
    pub field: FluidField<'a>,

    /// Essential conditions and pressure gauge
    pub constraints: Constraints,

    /// Global residual, Jacobian, and linear solver
    pub linear_system: LinearSystem<'a>,

    /// Boundary flux diagnostic
    flux: BoundaryFlux,

    /// Number of Newton iterations spent on each timestep
    pub iteration_counts: Vec<usize>,

    /// Residual norm at the first Newton iteration of each timestep
    pub first_residual_norms: Vec<f64>,
}

impl<'a> SolverImplicit<'a> {
    /// Allocates a new instance
    pub fn new(
        fluid: &'a Mesh,
        solid: &'a Mesh,
        config: &'a Config,
        essential: &'a Essential,
    ) -> Result<Self, StrError> {
        if let Some(message) = config.validate() {
            println!("ERROR: {}", message);
            return Err("cannot allocate simulation because config.validate() failed");
        }
        let layout = Layout::new(fluid, solid)?;
        let n_corner = if fluid.ndim == 2 { 4 } else { 8 };
        if fluid.cells.iter().any(|cell| cell.points.len() <= n_corner) {
            println!("WARNING: equal-order interpolation with linear elements is not inf-sup stable; expect spurious pressure modes");
        }
        let features = Features::new(fluid, false);
        let field = FluidField::new(fluid)?;
        let constraints = Constraints::new(
            fluid,
            &features,
            essential,
            &layout,
            config,
            field.min_diameter,
            field.domain_area,
        )?;
        let mut fluid_elements = Vec::with_capacity(fluid.cells.len());
        for cell_id in 0..fluid.cells.len() {
            fluid_elements.push(FluidElement::new(fluid, &layout, config, cell_id)?);
        }
        let coupling = Coupling::new(solid, &layout, config)?;
        let linear_system = LinearSystem::new(&layout, config, fluid, solid)?;
        let flux = BoundaryFlux::new(fluid, &features)?;
        Ok(SolverImplicit {
            config,
            solid,
            layout,
            fluid_elements,
            coupling,
            field,
            constraints,
            linear_system,
            flux,
            iteration_counts: Vec::new(),
            first_residual_norms: Vec::new(),
        })
    }

    /// Solves the transient problem from t = 0 to t = t_fin
    pub fn solve(&mut self, state: &mut SimState, file_io: &mut FileIo) -> Result<(), StrError> {
        // helper macro to save the state before returning an error
        macro_rules! run {
            ($e:expr) => {
                match $e {
                    Ok(val) => val,
                    Err(err) => {
                        file_io.write_state(state)?;
                        file_io.write_self()?;
                        return Err(err);
                    }
                }
            };
        }

        let config = self.config;
        state.dt = config.dt;
        let nstep = (config.t_fin / config.dt + 1e-12) as usize;

        // output the initial condition
        run!(self.output_step(state, file_io, 0));

        let mut update_jacobian = true;
        for step in 1..(nstep + 1) {
            state.t = (step as f64) * config.dt;
            if config.verbose_timesteps {
                println!("time = {:?}, step = {}, dt = {:?}", state.t, step, state.dt);
            }

            // write the prescribed values into the unknowns
            self.constraints.update_time(state.t);
            self.constraints.apply_to_unknowns(&mut state.xi);

            // Newton iterations
            let mut iteration = 0;
            let mut restarts = 0;
            loop {
                let res_norm = run!(self.assemble(state, update_jacobian));
                if iteration == 0 && restarts == 0 {
                    self.first_residual_norms.push(res_norm);
                }
                if res_norm < NEWTON_TOL_RESIDUAL {
                    if config.verbose_iterations {
                        println!("step {:>4}, residual: {:>12.3e} (converged in {} iterations)", step, res_norm, iteration);
                    }
                    self.iteration_counts.push(iteration);
                    break;
                }
                if config.verbose_iterations {
                    println!("    iteration {:>2}: residual = {:>12.3e}", iteration, res_norm);
                }

                // solve and update
                let ls = &mut self.linear_system;
                run!(ls
                    .solver
                    .actual
                    .solve(&mut ls.mdu, &ls.kk, &ls.rr, config.lin_sol_params.verbose));
                for i in 0..ls.n_equation {
                    state.xi[i] -= ls.mdu[i];
                }

                // refresh policy
                if res_norm > NEWTON_THRESHOLD_LARGE {
                    update_jacobian = true;
                } else if !config.update_jacobian_continuously {
                    update_jacobian = false;
                }
                iteration += 1;
                if iteration == NEWTON_MAX_ITERATIONS {
                    update_jacobian = true;
                    iteration = 0;
                    restarts += 1;
                    if config.verbose_iterations {
                        println!("restarting the Newton loop with a fresh Jacobian");
                    }
                    if restarts > NEWTON_MAX_RESTARTS {
                        file_io.write_state(state)?;
                        file_io.write_self()?;
                        return Err("Newton-Raphson did not converge");
                    }
                }
            }

            // accept the step and write the output
            run!(state.accept_step());
            run!(self.output_step(state, file_io, step));
            update_jacobian = config.update_jacobian_continuously || config.update_jacobian_at_step_beginning;
        }

        // write the summary
        file_io.write_self()
    }

    /// Assembles the residual (and optionally the Jacobian) and returns the residual norm
    ///
    /// A fresh Jacobian is factorized whenever `with_jacobian` is true.
    fn assemble(&mut self, state: &SimState, with_jacobian: bool) -> Result<f64, StrError> {
        let ls = &mut self.linear_system;
        ls.rr.fill(0.0);
        if with_jacobian {
            ls.kk.reset()?;
            {
                let coo = ls.kk.get_coo_mut()?;
                for element in &mut self.fluid_elements {
                    element.assemble(&mut ls.rr, Some(&mut *coo), state, &self.constraints)?;
                }
                self.coupling
                    .assemble(&mut ls.rr, Some(coo), state, &mut self.field, &self.constraints, &self.layout)?;
            }
            ls.solver.actual.factorize(&mut ls.kk, Some(self.config.lin_sol_params))?;
        } else {
            for element in &mut self.fluid_elements {
                element.assemble(&mut ls.rr, None, state, &self.constraints)?;
            }
            self.coupling
                .assemble(&mut ls.rr, None, state, &mut self.field, &self.constraints, &self.layout)?;
        }
        Ok(vec_norm(&ls.rr, Norm::Euc))
    }

    /// Writes the per-step diagnostics and (periodically) the state files
    fn output_step(&mut self, state: &SimState, file_io: &mut FileIo, step: usize) -> Result<(), StrError> {
        let flux = self.flux.compute(&self.layout, &state.xi)?;
        self.coupling.map.update(self.solid, &self.layout, &state.xi);
        let mut center = Vector::new(self.layout.ndim);
        let area = self.coupling.map.area_and_center(&mut center, self.layout.ndim)?;
        file_io.write_record(state.t, flux, area, center.as_data())?;
        if step <= 1 || step % self.config.output_interval == 0 {
            file_io.write_state(state)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SolverImplicit;
    use crate::base::{Config, Dof, Essential, Layout, StructuredMeshes};
    use crate::fem::SimState;
    use gemlab::mesh::{At, Features};
    use gemlab::util::any_x;
    use russell_lab::approx_eq;

    #[test]
    fn zero_state_residual_is_pure_constraint() {
        // with a zero state, zero force, and zero time derivative, only
        // the boundary-constraint rows may be nonzero
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 8).unwrap();
        let feat = Features::new(&fluid, false);
        let left = feat.search_edges(At::X(0.0), any_x).unwrap();
        let mut essential = Essential::new();
        essential.edges(&left, Dof::Vx, |_, _| 3.0);
        let config = Config::new();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let state = SimState::new(&fluid, &solid, &layout, &config).unwrap();
        let mut solver = SolverImplicit::new(&fluid, &solid, &config, &essential).unwrap();
        solver.assemble(&state, false).unwrap();
        // each adjacent fluid cell contributes one copy of the constraint row
        let scale = solver.constraints.scale;
        for eq in 0..solver.layout.n_equation {
            if solver.constraints.is_constrained(eq) {
                let point = eq / 3;
                let n_cell = fluid.cells.iter().filter(|cell| cell.points.contains(&point)).count();
                approx_eq(solver.linear_system.rr[eq], -3.0 * scale * (n_cell as f64), 1e-14);
            } else {
                approx_eq(solver.linear_system.rr[eq], 0.0, 1e-14);
            }
        }
    }

    #[test]
    fn new_captures_errors() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let mut config = Config::new();
        config.dt = -1.0; // invalid
        let essential = Essential::new();
        assert_eq!(
            SolverImplicit::new(&fluid, &solid, &config, &essential).err(),
            Some("cannot allocate simulation because config.validate() failed")
        );
    }
}

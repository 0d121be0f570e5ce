use super::MaterialModel;
use crate::{FnVectorSpaceTime, StrError};
use russell_sparse::{Genie, LinSolParams};
use std::fmt;

/// Holds the physical parameters and numerical settings of a simulation
pub struct Config {
    // physical parameters
    /// Mass density of the fluid
    pub(crate) rho: f64,

    /// Dynamic viscosity of the fluid
    pub(crate) eta: f64,

    /// Shear modulus of the immersed elastic body
    pub(crate) mu: f64,

    /// Excess mass density of the solid over the fluid
    pub(crate) phi_b: f64,

    /// Constitutive model of the immersed elastic body
    pub(crate) model: MaterialModel,

    /// Body force per unit mass acting on the fluid
    pub(crate) body_force: Option<FnVectorSpaceTime>,

    // initial conditions
    /// Initial velocity field of the fluid
    pub(crate) initial_velocity: Option<FnVectorSpaceTime>,

    /// Initial displacement field of the solid
    pub(crate) initial_displacement: Option<FnVectorSpaceTime>,

    // time stepping
    /// Timestep size
    pub(crate) dt: f64,

    /// Final simulation time
    pub(crate) t_fin: f64,

    // coupling options
    /// Freezes the Eulerian map at the previous timestep and drops the
    /// associated cross-derivative terms from the Jacobian
    pub(crate) semi_implicit: bool,

    /// Computes the elastic force on the fluid by spreading M⁻¹ A instead of
    /// contracting the stress with the fluid test gradients
    pub(crate) use_spread: bool,

    // pressure gauge
    /// Pins the first pressure DOF to zero instead of constraining the mean pressure
    pub(crate) fix_pressure: bool,

    // Jacobian update policy
    /// Recomputes the Jacobian on every Newton iteration
    pub(crate) update_jacobian_continuously: bool,

    /// Recomputes the Jacobian at the beginning of every timestep
    pub(crate) update_jacobian_at_step_beginning: bool,

    // output and messages
    /// Writes mesh state files every `output_interval` steps
    pub(crate) output_interval: usize,

    /// Shows timestep messages
    pub(crate) verbose_timesteps: bool,

    /// Shows Newton iteration messages
    pub(crate) verbose_iterations: bool,

    // linear solver
    /// Linear solver kind
    pub(crate) lin_sol_genie: Genie,

    /// Linear solver parameters
    pub(crate) lin_sol_params: LinSolParams,

    // quadrature
    /// Overrides the default number of integration points of fluid cells
    pub(crate) ngauss_fluid: Option<usize>,

    /// Overrides the default number of integration points of solid cells
    pub(crate) ngauss_solid: Option<usize>,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            rho: 1.0,
            eta: 1.0,
            mu: 1.0,
            phi_b: 1.0,
            model: MaterialModel::NeoHookeanZeroTraction,
            body_force: None,
            initial_velocity: None,
            initial_displacement: None,
            dt: 0.01,
            t_fin: 1.0,
            semi_implicit: false,
            use_spread: false,
            fix_pressure: false,
            update_jacobian_continuously: false,
            update_jacobian_at_step_beginning: true,
            output_interval: 1,
            verbose_timesteps: true,
            verbose_iterations: true,
            lin_sol_genie: Genie::Umfpack,
            lin_sol_params: LinSolParams::new(),
            ngauss_fluid: None,
            ngauss_solid: None,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if no problem is found.
    pub fn validate(&self) -> Option<String> {
        if self.rho <= 0.0 {
            return Some(format!("rho = {:?} is incorrect; it must be > 0.0", self.rho));
        }
        if self.eta <= 0.0 {
            return Some(format!("eta = {:?} is incorrect; it must be > 0.0", self.eta));
        }
        if self.mu <= 0.0 {
            return Some(format!("mu = {:?} is incorrect; it must be > 0.0", self.mu));
        }
        if self.phi_b <= 0.0 {
            return Some(format!("phi_b = {:?} is incorrect; it must be > 0.0", self.phi_b));
        }
        if self.dt <= 0.0 {
            return Some(format!("dt = {:?} is incorrect; it must be > 0.0", self.dt));
        }
        if self.t_fin < self.dt {
            return Some(format!(
                "t_fin = {:?} is incorrect; it must be ≥ dt = {:?}",
                self.t_fin, self.dt
            ));
        }
        None
    }

    /// Sets the mass density of the fluid
    pub fn set_rho(&mut self, rho: f64) -> Result<&mut Self, StrError> {
        if rho <= 0.0 {
            return Err("rho must be > 0.0");
        }
        self.rho = rho;
        Ok(self)
    }

    /// Sets the dynamic viscosity of the fluid
    pub fn set_eta(&mut self, eta: f64) -> Result<&mut Self, StrError> {
        if eta <= 0.0 {
            return Err("eta must be > 0.0");
        }
        self.eta = eta;
        Ok(self)
    }

    /// Sets the shear modulus of the immersed elastic body
    pub fn set_mu(&mut self, mu: f64) -> Result<&mut Self, StrError> {
        if mu <= 0.0 {
            return Err("mu must be > 0.0");
        }
        self.mu = mu;
        Ok(self)
    }

    /// Sets the excess mass density of the solid over the fluid
    pub fn set_phi_b(&mut self, phi_b: f64) -> Result<&mut Self, StrError> {
        if phi_b <= 0.0 {
            return Err("phi_b must be > 0.0");
        }
        self.phi_b = phi_b;
        Ok(self)
    }

    /// Sets the constitutive model of the immersed elastic body
    pub fn set_model(&mut self, model: MaterialModel) -> &mut Self {
        self.model = model;
        self
    }

    /// Sets the body force per unit mass acting on the fluid
    pub fn set_body_force(&mut self, f: FnVectorSpaceTime) -> &mut Self {
        self.body_force = Some(f);
        self
    }

    /// Sets the initial velocity field of the fluid
    pub fn set_initial_velocity(&mut self, f: FnVectorSpaceTime) -> &mut Self {
        self.initial_velocity = Some(f);
        self
    }

    /// Sets the initial displacement field of the solid
    pub fn set_initial_displacement(&mut self, f: FnVectorSpaceTime) -> &mut Self {
        self.initial_displacement = Some(f);
        self
    }

    /// Sets the timestep size and the final simulation time
    pub fn set_time(&mut self, dt: f64, t_fin: f64) -> Result<&mut Self, StrError> {
        if dt <= 0.0 {
            return Err("dt must be > 0.0");
        }
        if t_fin < dt {
            return Err("t_fin must be ≥ dt");
        }
        self.dt = dt;
        self.t_fin = t_fin;
        Ok(self)
    }

    /// Enables or disables the semi-implicit treatment of the coupling
    pub fn set_semi_implicit(&mut self, flag: bool) -> &mut Self {
        self.semi_implicit = flag;
        self
    }

    /// Enables or disables the spread form of the elastic force
    pub fn set_use_spread(&mut self, flag: bool) -> &mut Self {
        self.use_spread = flag;
        self
    }

    /// Enables or disables pinning the first pressure DOF to zero
    pub fn set_fix_pressure(&mut self, flag: bool) -> &mut Self {
        self.fix_pressure = flag;
        self
    }

    /// Sets the Jacobian update policy
    pub fn set_update_jacobian(&mut self, continuously: bool, at_step_beginning: bool) -> &mut Self {
        self.update_jacobian_continuously = continuously;
        self.update_jacobian_at_step_beginning = at_step_beginning;
        self
    }

    /// Sets the interval (in steps) between mesh state output files
    pub fn set_output_interval(&mut self, interval: usize) -> Result<&mut Self, StrError> {
        if interval < 1 {
            return Err("output_interval must be ≥ 1");
        }
        self.output_interval = interval;
        Ok(self)
    }

    /// Enables or disables console messages
    pub fn set_messages(&mut self, timesteps: bool, iterations: bool) -> &mut Self {
        self.verbose_timesteps = timesteps;
        self.verbose_iterations = iterations;
        self
    }

    /// Sets the linear solver kind
    pub fn set_lin_sol_genie(&mut self, genie: Genie) -> &mut Self {
        self.lin_sol_genie = genie;
        self
    }

    /// Sets the linear solver parameters
    pub fn set_lin_sol_params(&mut self, params: LinSolParams) -> &mut Self {
        self.lin_sol_params = params;
        self
    }

    /// Overrides the default number of integration points
    pub fn set_ngauss(&mut self, fluid: Option<usize>, solid: Option<usize>) -> &mut Self {
        self.ngauss_fluid = fluid;
        self.ngauss_solid = solid;
        self
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Physical parameters\n").unwrap();
        write!(f, "===================\n").unwrap();
        write!(f, "rho = {:?}\n", self.rho).unwrap();
        write!(f, "eta = {:?}\n", self.eta).unwrap();
        write!(f, "mu = {:?}\n", self.mu).unwrap();
        write!(f, "phi_b = {:?}\n", self.phi_b).unwrap();
        write!(f, "model = {:?}\n", self.model).unwrap();
        write!(f, "\nTime stepping\n").unwrap();
        write!(f, "=============\n").unwrap();
        write!(f, "dt = {:?}\n", self.dt).unwrap();
        write!(f, "t_fin = {:?}\n", self.t_fin).unwrap();
        write!(f, "\nCoupling options\n").unwrap();
        write!(f, "================\n").unwrap();
        write!(f, "semi_implicit = {:?}\n", self.semi_implicit).unwrap();
        write!(f, "use_spread = {:?}\n", self.use_spread).unwrap();
        write!(f, "fix_pressure = {:?}\n", self.fix_pressure).unwrap();
        write!(f, "\nNumerical settings\n").unwrap();
        write!(f, "==================\n").unwrap();
        write!(f, "update_jacobian_continuously = {:?}\n", self.update_jacobian_continuously).unwrap();
        write!(
            f,
            "update_jacobian_at_step_beginning = {:?}\n",
            self.update_jacobian_at_step_beginning
        )
        .unwrap();
        write!(f, "output_interval = {:?}\n", self.output_interval).unwrap();
        write!(f, "lin_sol_genie = {:?}\n", self.lin_sol_genie).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::base::MaterialModel;

    #[test]
    fn setters_capture_errors() {
        let mut config = Config::new();
        assert_eq!(config.set_rho(0.0).err(), Some("rho must be > 0.0"));
        assert_eq!(config.set_eta(-1.0).err(), Some("eta must be > 0.0"));
        assert_eq!(config.set_mu(0.0).err(), Some("mu must be > 0.0"));
        assert_eq!(config.set_phi_b(0.0).err(), Some("phi_b must be > 0.0"));
        assert_eq!(config.set_time(0.0, 1.0).err(), Some("dt must be > 0.0"));
        assert_eq!(config.set_time(0.1, 0.05).err(), Some("t_fin must be ≥ dt"));
        assert_eq!(config.set_output_interval(0).err(), Some("output_interval must be ≥ 1"));
    }

    #[test]
    fn setters_work() {
        let mut config = Config::new();
        config
            .set_rho(1.2)
            .unwrap()
            .set_eta(0.1)
            .unwrap()
            .set_mu(2.0)
            .unwrap()
            .set_phi_b(0.5)
            .unwrap()
            .set_model(MaterialModel::NeoHookeanDeviatoric)
            .set_time(0.01, 0.1)
            .unwrap()
            .set_semi_implicit(true)
            .set_use_spread(true)
            .set_fix_pressure(true)
            .set_update_jacobian(true, false)
            .set_output_interval(5)
            .unwrap()
            .set_messages(false, false)
            .set_ngauss(Some(9), Some(4));
        assert_eq!(config.rho, 1.2);
        assert_eq!(config.eta, 0.1);
        assert_eq!(config.mu, 2.0);
        assert_eq!(config.phi_b, 0.5);
        assert_eq!(config.model, MaterialModel::NeoHookeanDeviatoric);
        assert_eq!(config.dt, 0.01);
        assert_eq!(config.t_fin, 0.1);
        assert!(config.semi_implicit);
        assert!(config.use_spread);
        assert!(config.fix_pressure);
        assert!(config.update_jacobian_continuously);
        assert!(!config.update_jacobian_at_step_beginning);
        assert_eq!(config.output_interval, 5);
        assert_eq!(config.ngauss_fluid, Some(9));
        assert_eq!(config.ngauss_solid, Some(4));
        assert_eq!(config.validate(), None);
    }

    #[test]
    fn validate_works() {
        let mut config = Config::new();
        config.rho = -1.0;
        assert_eq!(
            config.validate(),
            Some("rho = -1.0 is incorrect; it must be > 0.0".to_string())
        );
        config.rho = 1.0;
        config.dt = 0.0;
        assert_eq!(
            config.validate(),
            Some("dt = 0.0 is incorrect; it must be > 0.0".to_string())
        );
        config.dt = 0.5;
        config.t_fin = 0.1;
        assert_eq!(
            config.validate(),
            Some("t_fin = 0.1 is incorrect; it must be ≥ dt = 0.5".to_string())
        );
    }

    #[test]
    fn display_works() {
        let config = Config::new();
        let text = format!("{}", config);
        assert!(text.contains("rho = 1.0"));
        assert!(text.contains("semi_implicit = false"));
        assert!(text.contains("lin_sol_genie = Umfpack"));
    }
}

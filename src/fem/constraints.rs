use crate::base::{Config, Essential, Layout};
use crate::{FnSpaceTime, StrError};
use gemlab::mesh::{Features, Mesh};
use russell_lab::{Matrix, Vector};
use std::collections::HashMap;

/// Enforces the essential conditions and the pressure gauge on the system
///
/// Prescribed velocity rows are replaced by the scaled identity
/// `scale (xi - value)` where `scale` is the minimal fluid cell diameter;
/// the scaling keeps the conditioning of the matrix comparable to the
/// interior rows.
///
/// When every velocity component is prescribed on the whole boundary, the
/// pressure is determined up to a constant. Two gauges are available:
/// pinning the first pressure DOF to zero (`fix_pressure`), or replacing
/// the first pressure equation with the zero-mean-pressure constraint
/// accumulated cell by cell during assembly.
pub struct Constraints {
    /// Prescribed conditions: equation number, point coordinates, value function
    entries: Vec<(usize, Vec<f64>, FnSpaceTime)>,

    /// Current prescribed values by equation number
    pub values: HashMap<usize, f64>,

    /// Scaling factor (minimal fluid cell diameter)
    pub scale: f64,

    /// Total area of the fluid mesh (for the mean-pressure constraint)
    pub area: f64,

    /// Equation number receiving the gauge (first pressure DOF)
    pub gauge_eq: usize,

    /// Whether the zero-mean-pressure constraint is active
    pub gauge_active: bool,
}

impl Constraints {
    /// Allocates a new instance
    pub fn new(
        fluid: &Mesh,
        features: &Features,
        essential: &Essential,
        layout: &Layout,
        config: &Config,
        scale: f64,
        area: f64,
    ) -> Result<Self, StrError> {
        let gauge_eq = layout.pressure_eq(0);
        let mut entries = Vec::new();
        for ((point, dof), f) in &essential.all {
            let eq = layout.fluid_eq(*point, *dof)?;
            entries.push((eq, fluid.points[*point].coords.clone(), *f));
        }
        entries.sort_by_key(|(eq, _, _)| *eq);
        if config.fix_pressure {
            entries.push((gauge_eq, fluid.points[0].coords.clone(), |_, _| 0.0));
        }
        let all_velocity = essential.covers_all_velocity(features, layout.ndim);
        let gauge_active = all_velocity && !config.fix_pressure;
        let mut constraints = Constraints {
            entries,
            values: HashMap::new(),
            scale,
            area,
            gauge_eq,
            gauge_active,
        };
        constraints.update_time(0.0);
        Ok(constraints)
    }

    /// Recomputes the prescribed values at a given time
    pub fn update_time(&mut self, t: f64) {
        self.values.clear();
        for (eq, x, f) in &self.entries {
            self.values.insert(*eq, f(x, t));
        }
    }

    /// Tells whether an equation is directly prescribed
    pub fn is_constrained(&self, eq: usize) -> bool {
        self.values.contains_key(&eq)
    }

    /// Writes the prescribed values into the global unknown vector
    pub fn apply_to_unknowns(&self, xi: &mut Vector) {
        for (eq, value) in &self.values {
            xi[*eq] = *value;
        }
    }

    /// Overwrites the constrained rows of a local residual and Jacobian
    ///
    /// Must be called after computing the local quantities and before the
    /// assembly into the global system. The gauge row is zeroed here; its
    /// content comes from the mean-pressure accumulation instead.
    pub fn apply_local(&self, res: &mut Vector, jac: Option<&mut Matrix>, l2g: &[usize], xi: &Vector) {
        let n = l2g.len();
        let mut jac = jac;
        for l in 0..n {
            let eq = l2g[l];
            if let Some(value) = self.values.get(&eq) {
                res[l] = self.scale * (xi[eq] - value);
                if let Some(ref mut kk) = jac {
                    for ll in 0..n {
                        kk.set(l, ll, 0.0);
                    }
                    kk.set(l, l, self.scale);
                }
            } else if self.gauge_active && eq == self.gauge_eq {
                res[l] = 0.0;
                if let Some(ref mut kk) = jac {
                    for ll in 0..n {
                        kk.set(l, ll, 0.0);
                    }
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Constraints;
    use crate::base::{Config, Dof, Essential, Layout, StructuredMeshes};
    use gemlab::mesh::Features;
    use russell_lab::{approx_eq, Matrix, Vector};

    fn sample() -> (Constraints, Layout) {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let features = Features::new(&fluid, false);
        let edges: Vec<_> = features.edges.values().collect();
        let mut essential = Essential::new();
        essential.edges(&edges, Dof::Vx, |x, t| x[1] * t).edges(&edges, Dof::Vy, |_, _| 0.0);
        let config = Config::new();
        let constraints = Constraints::new(&fluid, &features, &essential, &layout, &config, 0.5, 1.0).unwrap();
        (constraints, layout)
    }

    #[test]
    fn gauge_activation_works() {
        let (constraints, layout) = sample();
        assert!(constraints.gauge_active);
        assert_eq!(constraints.gauge_eq, layout.pressure_eq(0));
        // 8 boundary points × 2 components
        assert_eq!(constraints.values.len(), 16);
        assert!(constraints.is_constrained(layout.velocity_eq(0, 0)));
        assert!(!constraints.is_constrained(layout.velocity_eq(4, 0))); // center point
        assert!(!constraints.is_constrained(constraints.gauge_eq));
    }

    #[test]
    fn fix_pressure_pins_the_gauge() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let features = Features::new(&fluid, false);
        let essential = Essential::new();
        let mut config = Config::new();
        config.set_fix_pressure(true);
        let constraints = Constraints::new(&fluid, &features, &essential, &layout, &config, 0.5, 1.0).unwrap();
        assert!(!constraints.gauge_active);
        assert!(constraints.is_constrained(layout.pressure_eq(0)));
        assert_eq!(constraints.values.get(&layout.pressure_eq(0)), Some(&0.0));
    }

    #[test]
    fn update_time_reevaluates_the_functions() {
        let (mut constraints, layout) = sample();
        // point 3 is at (0.0, 0.5); prescribed vx = y t
        let eq = layout.velocity_eq(3, 0);
        assert_eq!(constraints.values.get(&eq), Some(&0.0));
        constraints.update_time(2.0);
        assert_eq!(constraints.values.get(&eq), Some(&1.0));
    }

    #[test]
    fn apply_local_overwrites_rows() {
        let (mut constraints, layout) = sample();
        constraints.update_time(1.0);
        let mut xi = Vector::new(layout.n_equation);
        constraints.apply_to_unknowns(&mut xi);
        // point 3 at (0.0, 0.5) has vx = 0.5 prescribed
        approx_eq(xi[layout.velocity_eq(3, 0)], 0.5, 1e-15);

        // local block: [vx point 3, vx point 4, p point 0]
        let l2g = vec![
            layout.velocity_eq(3, 0),
            layout.velocity_eq(4, 0),
            layout.pressure_eq(0),
        ];
        xi[layout.velocity_eq(3, 0)] = 0.7; // not yet equal to the prescribed value
        let mut res = Vector::from(&[10.0, 20.0, 30.0]);
        let mut jac = Matrix::filled(3, 3, 1.0);
        constraints.apply_local(&mut res, Some(&mut jac), &l2g, &xi);
        approx_eq(res[0], 0.5 * (0.7 - 0.5), 1e-15); // scale (xi - value)
        approx_eq(res[1], 20.0, 1e-15); // untouched
        approx_eq(res[2], 0.0, 1e-15); // gauge row zeroed
        approx_eq(jac.get(0, 0), 0.5, 1e-15);
        approx_eq(jac.get(0, 1), 0.0, 1e-15);
        approx_eq(jac.get(1, 1), 1.0, 1e-15);
        approx_eq(jac.get(2, 2), 0.0, 1e-15);
    }
}

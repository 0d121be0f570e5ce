use std::f64::consts::PI;

/// Implements the equilibrium solution of a circumferential-fiber ring at rest
///
/// An annular ring with inner radius `rin` and width `width`, reinforced with
/// circumferential fibers of modulus `mu`, sits at rest inside the square
/// fluid box [0,l] × [0,l]. The fiber tension is balanced by a pressure
/// field which is constant inside and outside the ring and logarithmic
/// across its thickness:
///
/// ```text
/// p(r) = p_out + mu ln(rout / r)     for rin ≤ r ≤ rout
/// p(r) = p_out + mu ln(rout / rin)   for r < rin
/// p(r) = p_out                       for r > rout
/// u = 0
/// ```
///
/// The constant `p_out` is fixed by requiring the mean pressure over the
/// square to vanish.
pub struct RingWithFibers {
    /// Side length of the square fluid box
    pub l: f64,

    /// Inner radius of the ring
    pub rin: f64,

    /// Outer radius of the ring
    pub rout: f64,

    /// Center of the ring
    pub xc: f64,

    /// Center of the ring
    pub yc: f64,

    /// Fiber modulus
    pub mu: f64,

    /// Pressure outside the ring (set by the zero-mean condition)
    pub p_out: f64,
}

impl RingWithFibers {
    /// Allocates a new instance with the ring centered in the box
    pub fn new(l: f64, rin: f64, width: f64, mu: f64) -> Self {
        let rout = rin + width;
        let log = f64::ln(rout / rin);
        // ∫(p - p_out) dA = mu [π rin² ln(rout/rin) + 2π ((rout²-rin²)/4 - (rin²/2) ln(rout/rin))]
        let annulus = 2.0 * PI * ((rout * rout - rin * rin) / 4.0 - (rin * rin / 2.0) * log);
        let disk = PI * rin * rin * log;
        let p_out = -mu * (disk + annulus) / (l * l);
        RingWithFibers {
            l,
            rin,
            rout,
            xc: l / 2.0,
            yc: l / 2.0,
            mu,
            p_out,
        }
    }

    /// Returns the equilibrium pressure at a point
    pub fn pressure(&self, x: &[f64]) -> f64 {
        let dx = x[0] - self.xc;
        let dy = x[1] - self.yc;
        let r = f64::sqrt(dx * dx + dy * dy);
        if r >= self.rout {
            self.p_out
        } else if r <= self.rin {
            self.p_out + self.mu * f64::ln(self.rout / self.rin)
        } else {
            self.p_out + self.mu * f64::ln(self.rout / r)
        }
    }

    /// Returns the equilibrium velocity at a point (identically zero)
    pub fn velocity(&self, _x: &[f64]) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// Returns the pressure jump across the ring
    pub fn pressure_jump(&self) -> f64 {
        self.mu * f64::ln(self.rout / self.rin)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

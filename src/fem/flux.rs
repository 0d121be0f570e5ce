use crate::base::Layout;
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::{Features, Mesh, PointId};
use gemlab::shapes::Scratchpad;
use russell_lab::Vector;

/// Computes the flux of the velocity across the fluid mesh boundary
///
/// Integrates u·n over all boundary edges (2D) or faces (3D) with the
/// outward normal provided by the boundary features. For an enclosed flow
/// the flux measures the discrete volume loss.
pub struct BoundaryFlux {
    /// One scratchpad and the point ids per boundary feature
    pads: Vec<(Scratchpad, Vec<PointId>)>,

    /// One quadrature rule per boundary feature
    gauss: Vec<Gauss>,
}

impl BoundaryFlux {
    /// Allocates a new instance from the boundary features of the fluid mesh
    pub fn new(fluid: &Mesh, features: &Features) -> Result<Self, StrError> {
        let mut pads = Vec::new();
        let mut gauss = Vec::new();
        let boundary: Vec<_> = if fluid.ndim == 2 {
            features.edges.values().collect()
        } else {
            features.faces.values().collect()
        };
        for feature in boundary {
            let mut pad = Scratchpad::new(fluid.ndim, feature.kind)?;
            fluid.set_pad(&mut pad, &feature.points);
            gauss.push(Gauss::new(feature.kind));
            pads.push((pad, feature.points.clone()));
        }
        Ok(BoundaryFlux { pads, gauss })
    }

    /// Integrates u·n over the boundary
    pub fn compute(&mut self, layout: &Layout, xi: &Vector) -> Result<f64, StrError> {
        let ndim = layout.ndim;
        let mut normal = Vector::new(ndim);
        let mut flux = 0.0;
        for (i, (pad, points)) in self.pads.iter_mut().enumerate() {
            let gauss = &self.gauss[i];
            for p in 0..gauss.npoint() {
                let ksi = gauss.coords(p);
                (pad.fn_interp)(&mut pad.interp, ksi.as_data());
                // the norm of the normal vector carries the length/area ratio
                pad.calc_normal_vector(&mut normal, ksi.as_data())?;
                let mut un = 0.0;
                for c in 0..ndim {
                    let mut u = 0.0;
                    for (m, point) in points.iter().enumerate() {
                        u += pad.interp[m] * xi[layout.velocity_eq(*point, c)];
                    }
                    un += u * normal[c];
                }
                flux += un * gauss.weight(p);
            }
        }
        Ok(flux)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

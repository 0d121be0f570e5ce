use crate::base::Layout;
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::{CellId, Mesh};
use gemlab::shapes::Scratchpad;
use russell_lab::Vector;

/// Maps the solid reference configuration onto the current (deformed) one
///
/// Holds one scratchpad per solid cell whose coordinates are the deformed
/// positions X + w of the solid points. The map is refreshed from the
/// current (or previous, in the semi-implicit scheme) displacements before
/// every residual evaluation; the scratchpads then give the deformed
/// position of any reference point and the deformed geometry measures.
pub struct DeformedMap {
    /// One scratchpad per solid cell holding deformed coordinates
    pads: Vec<Scratchpad>,

    /// One quadrature rule per solid cell
    gauss: Vec<Gauss>,
}

impl DeformedMap {
    /// Allocates a new instance (coordinates start at the reference configuration)
    pub fn new(solid: &Mesh) -> Result<Self, StrError> {
        let mut pads = Vec::with_capacity(solid.cells.len());
        let mut gauss = Vec::with_capacity(solid.cells.len());
        for cell in &solid.cells {
            let mut pad = Scratchpad::new(solid.ndim, cell.kind)?;
            solid.set_pad(&mut pad, &cell.points);
            gauss.push(Gauss::new(cell.kind));
            pads.push(pad);
        }
        Ok(DeformedMap { pads, gauss })
    }

    /// Updates the deformed coordinates from a global unknown vector
    pub fn update(&mut self, solid: &Mesh, layout: &Layout, xi: &Vector) {
        let ndim = solid.ndim;
        for cell in &solid.cells {
            let pad = &mut self.pads[cell.id];
            for (m, point) in cell.points.iter().enumerate() {
                for j in 0..ndim {
                    let value = solid.points[*point].coords[j] + xi[layout.solid_eq(*point, j)];
                    pad.set_xx(m, j, value);
                }
            }
        }
    }

    /// Computes the deformed position of a reference point of a cell
    pub fn coords(&mut self, x: &mut Vector, cell_id: CellId, ksi: &[f64]) -> Result<(), StrError> {
        self.pads[cell_id].calc_coords(x, ksi)
    }

    /// Computes the area and the center of mass of the deformed solid
    pub fn area_and_center(&mut self, center: &mut Vector, ndim: usize) -> Result<f64, StrError> {
        let mut area = 0.0;
        center.fill(0.0);
        let mut x = Vector::new(ndim);
        for cell_id in 0..self.pads.len() {
            let gauss = &self.gauss[cell_id];
            for p in 0..gauss.npoint() {
                let ksi = gauss.coords(p);
                let det = self.pads[cell_id].calc_gradient(ksi.as_data())?;
                let jxw = det * gauss.weight(p);
                self.pads[cell_id].calc_coords(&mut x, ksi.as_data())?;
                area += jxw;
                for j in 0..ndim {
                    center[j] += jxw * x[j];
                }
            }
        }
        if area > 0.0 {
            for j in 0..ndim {
                center[j] /= area;
            }
        }
        Ok(area)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::DeformedMap;
    use crate::base::{Layout, StructuredMeshes};
    use russell_lab::Vector;
    use std::f64::consts::PI;

    #[test]
    fn area_and_center_track_the_deformation() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.25, 0.3125, 2, 64).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let mut map = DeformedMap::new(&solid).unwrap();

        // reference configuration
        let xi = Vector::new(layout.n_equation);
        map.update(&solid, &layout, &xi);
        let mut center = Vector::new(2);
        let area = map.area_and_center(&mut center, 2).unwrap();
        let exact = PI * (0.3125 * 0.3125 - 0.25 * 0.25);
        assert!(f64::abs(area - exact) / exact < 1e-2);
        assert!(f64::abs(center[0] - 0.5) < 1e-12);
        assert!(f64::abs(center[1] - 0.5) < 1e-12);

        // rigid translation by (0.1, -0.2)
        let mut xi = Vector::new(layout.n_equation);
        for point in &solid.points {
            xi[layout.solid_eq(point.id, 0)] = 0.1;
            xi[layout.solid_eq(point.id, 1)] = -0.2;
        }
        map.update(&solid, &layout, &xi);
        let area_moved = map.area_and_center(&mut center, 2).unwrap();
        assert!(f64::abs(area_moved - area) < 1e-14);
        assert!(f64::abs(center[0] - 0.6) < 1e-12);
        assert!(f64::abs(center[1] - 0.3) < 1e-12);
    }

    #[test]
    fn coords_follow_the_displacement() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 8).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let mut map = DeformedMap::new(&solid).unwrap();
        let mut xi = Vector::new(layout.n_equation);
        for point in &solid.points {
            xi[layout.solid_eq(point.id, 0)] = 0.05;
        }
        map.update(&solid, &layout, &xi);
        let mut x = Vector::new(2);
        map.coords(&mut x, 0, &[-1.0, -1.0]).unwrap();
        assert!(f64::abs(x[0] - (solid.points[0].coords[0] + 0.05)) < 1e-14);
        assert!(f64::abs(x[1] - solid.points[0].coords[1]) < 1e-14);
    }
}

use crate::base::{Layout, KSI_INSIDE_TOLERANCE, KSI_SEARCH_NIT_MAX, KSI_SEARCH_TOLERANCE};
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::{CellId, Mesh};
use gemlab::shapes::{GeoClass, Scratchpad};
use russell_lab::{Matrix, Vector};

/// Evaluates the fluid fields at arbitrary physical points
///
/// Holds one scratchpad per fluid cell and a uniform grid of bins built
/// from the cell bounding boxes to accelerate the search for the cell
/// containing a given point. The fluid mesh is fixed, so the bins are
/// built once; the solid quadrature points move across them at every
/// residual evaluation.
pub struct FluidField<'a> {
    /// The fluid mesh
    mesh: &'a Mesh,

    /// One scratchpad per fluid cell
    pads: Vec<Scratchpad>,

    /// Number of bins along each dimension
    ndiv: usize,

    /// Lower corner of the grid
    xmin: Vec<f64>,

    /// Size of each bin along each dimension
    delta: Vec<f64>,

    /// Cells whose bounding box overlaps each bin
    bins: Vec<Vec<CellId>>,

    /// Minimal cell diameter (used to scale constraints and derivatives)
    pub min_diameter: f64,

    /// Total area (or volume) of the fluid mesh
    pub domain_area: f64,
}

impl<'a> FluidField<'a> {
    /// Allocates a new instance
    pub fn new(mesh: &'a Mesh) -> Result<Self, StrError> {
        let ndim = mesh.ndim;
        let ncell = mesh.cells.len();
        if ncell < 1 {
            return Err("fluid mesh must have at least one cell");
        }

        // scratchpads, minimal diameter, and total area
        let mut pads = Vec::with_capacity(ncell);
        let mut min_diameter = f64::MAX;
        let mut domain_area = 0.0;
        for cell in &mesh.cells {
            let mut pad = Scratchpad::new(ndim, cell.kind)?;
            mesh.set_pad(&mut pad, &cell.points);
            let gauss = Gauss::new(cell.kind);
            for p in 0..gauss.npoint() {
                let det = pad.calc_gradient(gauss.coords(p).as_data())?;
                domain_area += det * gauss.weight(p);
            }
            let nnode = cell.points.len();
            let mut diameter: f64 = 0.0;
            for m in 0..nnode {
                for n in (m + 1)..nnode {
                    let mut dist = 0.0;
                    for j in 0..ndim {
                        let d = pad.xxt.get(j, m) - pad.xxt.get(j, n);
                        dist += d * d;
                    }
                    diameter = f64::max(diameter, f64::sqrt(dist));
                }
            }
            min_diameter = f64::min(min_diameter, diameter);
            pads.push(pad);
        }

        // grid limits
        let mut xmin = vec![f64::MAX; ndim];
        let mut xmax = vec![f64::MIN; ndim];
        for point in &mesh.points {
            for j in 0..ndim {
                xmin[j] = f64::min(xmin[j], point.coords[j]);
                xmax[j] = f64::max(xmax[j], point.coords[j]);
            }
        }

        // bins from the cell bounding boxes
        let ndiv = usize::max(1, f64::powf(ncell as f64, 1.0 / (ndim as f64)) as usize);
        let delta: Vec<_> = (0..ndim).map(|j| (xmax[j] - xmin[j]) / (ndiv as f64)).collect();
        let mut bins = vec![Vec::new(); usize::pow(ndiv, ndim as u32)];
        let index_of = |value: f64, j: usize| -> usize {
            let ratio = (value - xmin[j]) / delta[j];
            usize::min(ndiv - 1, f64::max(0.0, ratio) as usize)
        };
        for cell in &mesh.cells {
            let mut cmin = vec![f64::MAX; ndim];
            let mut cmax = vec![f64::MIN; ndim];
            for point in &cell.points {
                for j in 0..ndim {
                    cmin[j] = f64::min(cmin[j], mesh.points[*point].coords[j]);
                    cmax[j] = f64::max(cmax[j], mesh.points[*point].coords[j]);
                }
            }
            let imin: Vec<_> = (0..ndim).map(|j| index_of(cmin[j], j)).collect();
            let imax: Vec<_> = (0..ndim).map(|j| index_of(cmax[j], j)).collect();
            if ndim == 2 {
                for i in imin[0]..(imax[0] + 1) {
                    for j in imin[1]..(imax[1] + 1) {
                        bins[j * ndiv + i].push(cell.id);
                    }
                }
            } else {
                for i in imin[0]..(imax[0] + 1) {
                    for j in imin[1]..(imax[1] + 1) {
                        for k in imin[2]..(imax[2] + 1) {
                            bins[(k * ndiv + j) * ndiv + i].push(cell.id);
                        }
                    }
                }
            }
        }

        Ok(FluidField {
            mesh,
            pads,
            ndiv,
            xmin,
            delta,
            bins,
            min_diameter,
            domain_area,
        })
    }

    /// Finds the cell containing a physical point and its reference coordinates
    pub fn locate(&mut self, ksi: &mut Vector, x: &Vector) -> Result<CellId, StrError> {
        let ndim = self.mesh.ndim;
        let mut index = 0;
        for j in (0..ndim).rev() {
            let ratio = (x[j] - self.xmin[j]) / self.delta[j];
            let i = usize::min(self.ndiv - 1, f64::max(0.0, ratio) as usize);
            index = index * self.ndiv + i;
        }
        let candidates = self.bins[index].clone();
        for cell_id in &candidates {
            if self.try_cell(*cell_id, ksi, x) {
                return Ok(*cell_id);
            }
        }
        // fallback for points on bin borders or distorted cells
        for cell_id in 0..self.mesh.cells.len() {
            if candidates.contains(&cell_id) {
                continue;
            }
            if self.try_cell(cell_id, ksi, x) {
                return Ok(cell_id);
            }
        }
        Err("point is outside the fluid mesh")
    }

    /// Tries to invert the map of a single cell; returns true if the point is inside
    fn try_cell(&mut self, cell_id: CellId, ksi: &mut Vector, x: &Vector) -> bool {
        let pad = &mut self.pads[cell_id];
        ksi.fill(0.0);
        match pad.approximate_ksi(ksi, x, KSI_SEARCH_NIT_MAX, KSI_SEARCH_TOLERANCE) {
            Ok(_) => ksi_inside(pad.kind.class(), ksi),
            Err(_) => false,
        }
    }

    /// Returns the number of nodes of a fluid cell
    pub fn nnode(&self, cell_id: CellId) -> usize {
        self.mesh.cells[cell_id].points.len()
    }

    /// Returns the point ids of a fluid cell
    pub fn cell_points(&self, cell_id: CellId) -> &[usize] {
        &self.mesh.cells[cell_id].points
    }

    /// Returns the shape function values at a reference point
    pub fn shape(&mut self, cell_id: CellId, ksi: &[f64]) -> Vector {
        let pad = &mut self.pads[cell_id];
        (pad.fn_interp)(&mut pad.interp, ksi);
        pad.interp.clone()
    }

    /// Returns the shape function gradients (w.r.t. physical coordinates) at a reference point
    pub fn gradient(&mut self, cell_id: CellId, ksi: &[f64]) -> Result<Matrix, StrError> {
        let pad = &mut self.pads[cell_id];
        pad.calc_gradient(ksi)?;
        Ok(pad.gradient.clone())
    }

    /// Returns the second derivatives of the shape functions at a physical point
    ///
    /// Uses central finite differences of the physical-space gradients with a
    /// step proportional to the minimal cell diameter. The result is
    /// symmetrized. `hh[m]` receives ∂²N_m/∂x_i∂x_j.
    pub fn shape_hessian(&mut self, cell_id: CellId, x: &Vector) -> Result<Vec<Matrix>, StrError> {
        let ndim = self.mesh.ndim;
        let nnode = self.nnode(cell_id);
        let step = 1e-4 * self.min_diameter;
        let mut hh: Vec<_> = (0..nnode).map(|_| Matrix::new(ndim, ndim)).collect();
        let mut ksi = Vector::new(ndim);
        let mut xp = x.clone();
        for d in 0..ndim {
            xp[d] = x[d] + step;
            let pad = &mut self.pads[cell_id];
            pad.approximate_ksi(&mut ksi, &xp, KSI_SEARCH_NIT_MAX, KSI_SEARCH_TOLERANCE)?;
            pad.calc_gradient(ksi.as_data())?;
            let plus = pad.gradient.clone();
            xp[d] = x[d] - step;
            pad.approximate_ksi(&mut ksi, &xp, KSI_SEARCH_NIT_MAX, KSI_SEARCH_TOLERANCE)?;
            pad.calc_gradient(ksi.as_data())?;
            for m in 0..nnode {
                for j in 0..ndim {
                    hh[m].set(j, d, (plus.get(m, j) - pad.gradient.get(m, j)) / (2.0 * step));
                }
            }
            xp[d] = x[d];
        }
        for m in 0..nnode {
            for i in 0..ndim {
                for j in (i + 1)..ndim {
                    let mean = 0.5 * (hh[m].get(i, j) + hh[m].get(j, i));
                    hh[m].set(i, j, mean);
                    hh[m].set(j, i, mean);
                }
            }
        }
        Ok(hh)
    }

    /// Evaluates the velocity at a reference point of a cell
    pub fn velocity(&mut self, v: &mut Vector, layout: &Layout, xi: &Vector, cell_id: CellId, ksi: &[f64]) {
        let ndim = layout.ndim;
        let nn = self.shape(cell_id, ksi);
        let points = &self.mesh.cells[cell_id].points;
        for c in 0..ndim {
            let mut value = 0.0;
            for (m, point) in points.iter().enumerate() {
                value += nn[m] * xi[layout.velocity_eq(*point, c)];
            }
            v[c] = value;
        }
    }

    /// Evaluates the velocity gradient ∂u_i/∂x_j at a reference point of a cell
    pub fn velocity_gradient(
        &mut self,
        gv: &mut Matrix,
        layout: &Layout,
        xi: &Vector,
        cell_id: CellId,
        ksi: &[f64],
    ) -> Result<(), StrError> {
        let ndim = layout.ndim;
        let gg = self.gradient(cell_id, ksi)?;
        let points = &self.mesh.cells[cell_id].points;
        for i in 0..ndim {
            for j in 0..ndim {
                let mut value = 0.0;
                for (m, point) in points.iter().enumerate() {
                    value += xi[layout.velocity_eq(*point, i)] * gg.get(m, j);
                }
                gv.set(i, j, value);
            }
        }
        Ok(())
    }
}

/// Tells whether reference coordinates lie inside the reference domain of a class
fn ksi_inside(class: GeoClass, ksi: &Vector) -> bool {
    let tol = KSI_INSIDE_TOLERANCE;
    match class {
        GeoClass::Tri | GeoClass::Tet => {
            let mut sum = 0.0;
            for j in 0..ksi.dim() {
                if ksi[j] < -tol {
                    return false;
                }
                sum += ksi[j];
            }
            sum <= 1.0 + tol
        }
        _ => {
            for j in 0..ksi.dim() {
                if f64::abs(ksi[j]) > 1.0 + tol {
                    return false;
                }
            }
            true
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FluidField;
    use crate::base::{Layout, StructuredMeshes};
    use crate::fem::DeformedMap;
    use russell_lab::{approx_eq, math::SQRT_2, Matrix, Vector};

    #[test]
    fn new_computes_geometry_data() {
        let mesh = StructuredMeshes::rectangle(1.0, 1.0, 4, 4).unwrap();
        let field = FluidField::new(&mesh).unwrap();
        approx_eq(field.domain_area, 1.0, 1e-14);
        approx_eq(field.min_diameter, 0.25 * SQRT_2, 1e-14);
    }

    #[test]
    fn locate_works() {
        let mesh = StructuredMeshes::rectangle(1.0, 1.0, 4, 4).unwrap();
        let mut field = FluidField::new(&mesh).unwrap();
        let mut ksi = Vector::new(2);

        let x = Vector::from(&[0.1, 0.1]);
        assert_eq!(field.locate(&mut ksi, &x).unwrap(), 0);
        approx_eq(ksi[0], -0.2, 1e-10);
        approx_eq(ksi[1], -0.2, 1e-10);

        let x = Vector::from(&[0.9, 0.6]);
        assert_eq!(field.locate(&mut ksi, &x).unwrap(), 11);

        let x = Vector::from(&[1.5, 0.5]);
        assert_eq!(field.locate(&mut ksi, &x).err(), Some("point is outside the fluid mesh"));
    }

    #[test]
    fn location_of_mapped_solid_points_round_trips() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 4, 4).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 8).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let mut field = FluidField::new(&fluid).unwrap();
        let mut map = DeformedMap::new(&solid).unwrap();
        let mut xi = Vector::new(layout.n_equation);
        // rigid shift of the ring
        for p in 0..solid.points.len() {
            xi[layout.solid_eq(p, 0)] = 0.05;
            xi[layout.solid_eq(p, 1)] = -0.04;
        }
        map.update(&solid, &layout, &xi);
        let g = 1.0 / f64::sqrt(3.0);
        let mut x = Vector::new(2);
        let mut ksi = Vector::new(2);
        let mut back = Vector::new(2);
        for cell_id in 0..solid.cells.len() {
            for (a, b) in [(-g, -g), (g, -g), (g, g), (-g, g)] {
                map.coords(&mut x, cell_id, &[a, b]).unwrap();
                let fluid_cell = field.locate(&mut ksi, &x).unwrap();
                field.pads[fluid_cell].calc_coords(&mut back, ksi.as_data()).unwrap();
                approx_eq(back[0], x[0], 1e-9);
                approx_eq(back[1], x[1], 1e-9);
            }
        }
    }

    #[test]
    fn velocity_and_gradient_work() {
        let mesh = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let layout = Layout::new(&mesh, &solid).unwrap();
        let mut field = FluidField::new(&mesh).unwrap();

        // linear velocity field: u = (x + 2y, 3x - y)
        let mut xi = Vector::new(layout.n_equation);
        for point in &mesh.points {
            let (x, y) = (point.coords[0], point.coords[1]);
            xi[layout.velocity_eq(point.id, 0)] = x + 2.0 * y;
            xi[layout.velocity_eq(point.id, 1)] = 3.0 * x - y;
        }

        let mut ksi = Vector::new(2);
        let x = Vector::from(&[0.3, 0.2]);
        let cell_id = field.locate(&mut ksi, &x).unwrap();

        let mut v = Vector::new(2);
        field.velocity(&mut v, &layout, &xi, cell_id, ksi.as_data());
        approx_eq(v[0], 0.3 + 2.0 * 0.2, 1e-12);
        approx_eq(v[1], 3.0 * 0.3 - 0.2, 1e-12);

        let mut gv = Matrix::new(2, 2);
        field.velocity_gradient(&mut gv, &layout, &xi, cell_id, ksi.as_data()).unwrap();
        approx_eq(gv.get(0, 0), 1.0, 1e-12);
        approx_eq(gv.get(0, 1), 2.0, 1e-12);
        approx_eq(gv.get(1, 0), 3.0, 1e-12);
        approx_eq(gv.get(1, 1), -1.0, 1e-12);
    }

    #[test]
    fn shape_hessian_works() {
        let mesh = StructuredMeshes::rectangle(1.0, 1.0, 2, 2).unwrap();
        let mut field = FluidField::new(&mesh).unwrap();
        let x = Vector::from(&[0.2, 0.3]);
        let mut ksi = Vector::new(2);
        let cell_id = field.locate(&mut ksi, &x).unwrap();
        let hh = field.shape_hessian(cell_id, &x).unwrap();
        // bilinear shapes on an axis-aligned cell of size a × b:
        // ∂²N/∂x² = ∂²N/∂y² = 0 and |∂²N/∂x∂y| = 1/(a b)
        let expected = 1.0 / (0.5 * 0.5);
        for m in 0..4 {
            approx_eq(hh[m].get(0, 0), 0.0, 1e-5);
            approx_eq(hh[m].get(1, 1), 0.0, 1e-5);
            approx_eq(f64::abs(hh[m].get(0, 1)), expected, 1e-4);
            approx_eq(hh[m].get(0, 1), hh[m].get(1, 0), 1e-12);
        }
    }
}

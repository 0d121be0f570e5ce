use crate::StrError;
use gemlab::mesh::{Cell, Mesh, Point};
use gemlab::shapes::GeoKind;
use std::f64::consts::PI;

/// Holds functions to generate structured meshes
pub struct StructuredMeshes {}

impl StructuredMeshes {
    /// Generates a structured Qua4 mesh over the rectangle [0,lx] × [0,ly]
    ///
    /// ```text
    /// 6–––––––7–––––––8
    /// |  (2)  |  (3)  |
    /// 3–––––––4–––––––5   (nx = ny = 2)
    /// |  (0)  |  (1)  |
    /// 0–––––––1–––––––2
    /// ```
    pub fn rectangle(lx: f64, ly: f64, nx: usize, ny: usize) -> Result<Mesh, StrError> {
        if lx <= 0.0 || ly <= 0.0 {
            return Err("lx and ly must be > 0.0");
        }
        if nx < 1 || ny < 1 {
            return Err("nx and ny must be ≥ 1");
        }
        let dx = lx / (nx as f64);
        let dy = ly / (ny as f64);
        let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..(ny + 1) {
            for i in 0..(nx + 1) {
                points.push(Point {
                    id: j * (nx + 1) + i,
                    marker: 0,
                    coords: vec![(i as f64) * dx, (j as f64) * dy],
                });
            }
        }
        let mut cells = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let p0 = j * (nx + 1) + i;
                cells.push(Cell {
                    id: j * nx + i,
                    attribute: 1,
                    kind: GeoKind::Qua4,
                    points: vec![p0, p0 + 1, p0 + nx + 2, p0 + nx + 1],
                });
            }
        }
        Ok(Mesh { ndim: 2, points, cells })
    }

    /// Generates a structured Qua4 mesh of a closed annulus (ring) centered at (xc, yc)
    ///
    /// The ring has `nr` layers along the radius and `ntheta` sectors around
    /// the circumference. Points are numbered layer by layer starting at the
    /// inner radius; the last sector wraps around to the first.
    pub fn annulus(xc: f64, yc: f64, rin: f64, rout: f64, nr: usize, ntheta: usize) -> Result<Mesh, StrError> {
        if rin <= 0.0 || rout <= rin {
            return Err("radii must satisfy 0.0 < rin < rout");
        }
        if nr < 1 {
            return Err("nr must be ≥ 1");
        }
        if ntheta < 3 {
            return Err("ntheta must be ≥ 3");
        }
        let dr = (rout - rin) / (nr as f64);
        let dth = 2.0 * PI / (ntheta as f64);
        let mut points = Vec::with_capacity((nr + 1) * ntheta);
        for k in 0..(nr + 1) {
            let r = rin + (k as f64) * dr;
            for j in 0..ntheta {
                let th = (j as f64) * dth;
                points.push(Point {
                    id: k * ntheta + j,
                    marker: 0,
                    coords: vec![xc + r * f64::cos(th), yc + r * f64::sin(th)],
                });
            }
        }
        let mut cells = Vec::with_capacity(nr * ntheta);
        for k in 0..nr {
            for j in 0..ntheta {
                let jp = (j + 1) % ntheta;
                cells.push(Cell {
                    id: k * ntheta + j,
                    attribute: 1,
                    kind: GeoKind::Qua4,
                    points: vec![k * ntheta + j, (k + 1) * ntheta + j, (k + 1) * ntheta + jp, k * ntheta + jp],
                });
            }
        }
        Ok(Mesh { ndim: 2, points, cells })
    }

    /// Returns a mesh with two horizontally adjacent Qua4 cells
    ///
    /// ```text
    /// 3–––––––2–––––––5
    /// |  (0)  |  (1)  |
    /// 0–––––––1–––––––4
    /// ```
    #[rustfmt::skip]
    pub fn two_qua4() -> Mesh {
        Mesh {
            ndim: 2,
            points: vec![
                Point { id: 0, marker: 0, coords: vec![0.0, 0.0] },
                Point { id: 1, marker: 0, coords: vec![1.0, 0.0] },
                Point { id: 2, marker: 0, coords: vec![1.0, 1.0] },
                Point { id: 3, marker: 0, coords: vec![0.0, 1.0] },
                Point { id: 4, marker: 0, coords: vec![2.0, 0.0] },
                Point { id: 5, marker: 0, coords: vec![2.0, 1.0] },
            ],
            cells: vec![
                Cell { id: 0, attribute: 1, kind: GeoKind::Qua4, points: vec![0, 1, 2, 3] },
                Cell { id: 1, attribute: 1, kind: GeoKind::Qua4, points: vec![1, 4, 5, 2] },
            ],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::StructuredMeshes;
    use russell_lab::approx_eq;

    #[test]
    fn rectangle_captures_errors() {
        assert_eq!(
            StructuredMeshes::rectangle(0.0, 1.0, 2, 2).err(),
            Some("lx and ly must be > 0.0")
        );
        assert_eq!(
            StructuredMeshes::rectangle(1.0, 1.0, 0, 2).err(),
            Some("nx and ny must be ≥ 1")
        );
    }

    #[test]
    fn rectangle_works() {
        let mesh = StructuredMeshes::rectangle(2.0, 1.0, 2, 2).unwrap();
        mesh.check_all().unwrap();
        assert_eq!(mesh.points.len(), 9);
        assert_eq!(mesh.cells.len(), 4);
        assert_eq!(mesh.points[4].coords, &[1.0, 0.5]);
        assert_eq!(mesh.cells[0].points, &[0, 1, 4, 3]);
        assert_eq!(mesh.cells[3].points, &[4, 5, 8, 7]);
    }

    #[test]
    fn annulus_captures_errors() {
        assert_eq!(
            StructuredMeshes::annulus(0.0, 0.0, 0.0, 1.0, 1, 8).err(),
            Some("radii must satisfy 0.0 < rin < rout")
        );
        assert_eq!(
            StructuredMeshes::annulus(0.0, 0.0, 0.5, 0.4, 1, 8).err(),
            Some("radii must satisfy 0.0 < rin < rout")
        );
        assert_eq!(StructuredMeshes::annulus(0.0, 0.0, 0.2, 0.4, 0, 8).err(), Some("nr must be ≥ 1"));
        assert_eq!(
            StructuredMeshes::annulus(0.0, 0.0, 0.2, 0.4, 1, 2).err(),
            Some("ntheta must be ≥ 3")
        );
    }

    #[test]
    fn annulus_works() {
        let mesh = StructuredMeshes::annulus(0.5, 0.5, 0.25, 0.3125, 2, 16).unwrap();
        mesh.check_all().unwrap();
        assert_eq!(mesh.points.len(), 3 * 16);
        assert_eq!(mesh.cells.len(), 2 * 16);
        approx_eq(mesh.points[0].coords[0], 0.75, 1e-15);
        approx_eq(mesh.points[0].coords[1], 0.5, 1e-15);
        // last sector wraps around
        assert_eq!(mesh.cells[15].points, &[15, 31, 16, 0]);
        // counterclockwise cells
        let cell = &mesh.cells[0];
        let (a, b, d) = (cell.points[0], cell.points[1], cell.points[3]);
        let (xa, ya) = (mesh.points[a].coords[0], mesh.points[a].coords[1]);
        let (xb, yb) = (mesh.points[b].coords[0], mesh.points[b].coords[1]);
        let (xd, yd) = (mesh.points[d].coords[0], mesh.points[d].coords[1]);
        let cross = (xb - xa) * (yd - ya) - (yb - ya) * (xd - xa);
        assert!(cross > 0.0);
    }

    #[test]
    fn two_qua4_works() {
        let mesh = StructuredMeshes::two_qua4();
        mesh.check_all().unwrap();
        assert_eq!(mesh.points.len(), 6);
        assert_eq!(mesh.cells.len(), 2);
    }
}

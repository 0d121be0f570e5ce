use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Assembles a local vector into the global residual vector
///
/// The local-to-global map `l2g` gives the global equation number of each
/// local row.
pub fn assemble_vector(rr: &mut Vector, r_local: &Vector, l2g: &[usize]) {
    for l in 0..l2g.len() {
        rr[l2g[l]] += r_local[l];
    }
}

/// Assembles a local matrix into the global (sparse) Jacobian matrix
///
/// Rows and columns may map through different local-to-global arrays,
/// which is how the rectangular coupling blocks are handled.
pub fn assemble_matrix(
    kk: &mut CooMatrix,
    k_local: &Matrix,
    row_l2g: &[usize],
    col_l2g: &[usize],
) -> Result<(), StrError> {
    for l in 0..row_l2g.len() {
        for ll in 0..col_l2g.len() {
            let value = k_local.get(l, ll);
            if value != 0.0 {
                kk.put(row_l2g[l], col_l2g[ll], value)?;
            }
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{assemble_matrix, assemble_vector};
    use russell_lab::{vec_approx_eq, Matrix, Vector};
    use russell_sparse::{CooMatrix, Sym};

    #[test]
    fn assemble_vector_works() {
        let mut rr = Vector::new(5);
        let r_local = Vector::from(&[1.0, 2.0, 3.0]);
        assemble_vector(&mut rr, &r_local, &[4, 0, 2]);
        vec_approx_eq(&rr, &[2.0, 0.0, 3.0, 0.0, 1.0], 1e-15);
        assemble_vector(&mut rr, &r_local, &[4, 0, 2]);
        vec_approx_eq(&rr, &[4.0, 0.0, 6.0, 0.0, 2.0], 1e-15);
    }

    #[test]
    fn assemble_matrix_works() {
        let mut kk = CooMatrix::new(4, 4, 16, Sym::No).unwrap();
        let k_local = Matrix::from(&[
            [10.0, 20.0], //
            [0.0, 40.0],  //
        ]);
        assemble_matrix(&mut kk, &k_local, &[3, 1], &[0, 2]).unwrap();
        let dense = kk.as_dense();
        assert_eq!(dense.get(3, 0), 10.0);
        assert_eq!(dense.get(3, 2), 20.0);
        assert_eq!(dense.get(1, 0), 0.0);
        assert_eq!(dense.get(1, 2), 40.0);
    }
}

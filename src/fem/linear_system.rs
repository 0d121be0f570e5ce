use crate::base::{Config, Layout};
use crate::StrError;
use gemlab::integ::Gauss;
use gemlab::mesh::Mesh;
use russell_lab::Vector;
use russell_sparse::{LinSolver, SparseMatrix, Sym};

/// Holds variables to solve the global linear system
pub struct LinearSystem<'a> {
    /// Total number of global equations
    pub n_equation: usize,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// **Notes:**
    ///
    /// 1. The fluid cells contribute their full local matrices, so their part of
    ///    nnz is bounded by Σ (nnode (ndim+1))²; the mean-pressure row adds at
    ///    most nnode (ndim+1) entries per fluid cell.
    /// 2. The coupling blocks depend on where the deformed solid quadrature
    ///    points land, which changes between evaluations. The bound must
    ///    therefore assume that every quadrature point pairs its solid cell
    ///    with a distinct fluid cell: each point contributes a force block
    ///    (nnode_f ndim) × (nnode_s ndim), a velocity-matching block
    ///    (nnode_s ndim) × (nnode_f (ndim+1)), and a solid block
    ///    (nnode_s ndim)².
    /// 3. Repeated (i, j) entries are fine: the COO format sums duplicates.
    pub nnz_sup: usize,

    /// Global residual vector
    pub rr: Vector,

    /// Global Jacobian matrix
    pub kk: SparseMatrix,

    /// Linear solver
    pub solver: LinSolver<'a>,

    /// Minus delta xi (the solution of the linear system)
    pub mdu: Vector,
}

impl<'a> LinearSystem<'a> {
    /// Allocates a new instance
    pub fn new(layout: &Layout, config: &Config, fluid: &Mesh, solid: &Mesh) -> Result<Self, StrError> {
        let ndim = layout.ndim;
        let n_equation = layout.n_equation;
        let nnode_f_max = fluid.cells.iter().map(|cell| cell.points.len()).max().unwrap_or(0);

        let mut nnz_sup = 0;
        for cell in &fluid.cells {
            let n = cell.points.len() * (ndim + 1);
            nnz_sup += n * n + n;
        }
        for cell in &solid.cells {
            let gauss = Gauss::new_or_sized(cell.kind, config.ngauss_solid)?;
            let n_s = cell.points.len() * ndim;
            let n_f = nnode_f_max * ndim;
            let n_fp = nnode_f_max * (ndim + 1);
            nnz_sup += gauss.npoint() * (n_f * n_s + n_s * n_fp + n_s * n_s);
        }

        let sym = Sym::No;
        Ok(LinearSystem {
            n_equation,
            nnz_sup,
            rr: Vector::new(n_equation),
            kk: SparseMatrix::new_coo(n_equation, n_equation, nnz_sup, sym)?,
            solver: LinSolver::new(config.lin_sol_genie)?,
            mdu: Vector::new(n_equation),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Default directory to save simulation results
pub const DEFAULT_OUT_DIR: &str = "/tmp/ifem/results";

/// Default directory to save test results
pub const DEFAULT_TEST_DIR: &str = "/tmp/ifem/test";

/// Tolerance on the Euclidean norm of the global residual
pub const NEWTON_TOL_RESIDUAL: f64 = 1e-10;

/// Residual norm above which the Jacobian is recomputed on the next iteration
pub const NEWTON_THRESHOLD_LARGE: f64 = 1e-2;

/// Maximum number of Newton iterations before restarting with a fresh Jacobian
pub const NEWTON_MAX_ITERATIONS: usize = 15;

/// Maximum number of restarts of the Newton loop within a timestep
pub const NEWTON_MAX_RESTARTS: usize = 3;

/// Maximum number of iterations to find the reference coordinates of a point
pub const KSI_SEARCH_NIT_MAX: usize = 30;

/// Tolerance to find the reference coordinates of a point
pub const KSI_SEARCH_TOLERANCE: f64 = 1e-12;

/// Tolerance to decide whether reference coordinates lie inside a cell
pub const KSI_INSIDE_TOLERANCE: f64 = 1e-8;

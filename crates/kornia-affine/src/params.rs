use serde::{Deserialize, Serialize};

/// Minimum spread `σ_min / σ_max` of the centered source points accepted by both solvers.
///
/// The spread is invariant to similarity transforms of the input, so a thin strip of
/// pixels is judged the same as its unit scale counterpart.
pub const DEFAULT_DEGENERACY_TOLERANCE: f64 = 8.0 * f32::EPSILON as f64;

/// Minimum reciprocal condition number of the normal matrix `DᵗD` in the least-squares
/// solver.
///
/// With normalized points `rcond(DᵗD)` tracks the squared source spread, so this floor sits
/// well below `DEFAULT_DEGENERACY_TOLERANCE²` and only catches f64 breakdown, mostly
/// when normalization is disabled.
pub const DEFAULT_MIN_RCOND: f64 = 64.0 * f64::EPSILON;

/// Parameters controlling the affine DLT solvers.
///
/// Missing fields fall back to their defaults when deserialized.
///
/// ```
/// use kornia_affine::AffineDltParams;
///
/// let params = AffineDltParams {
///     normalize: false,
///     ..Default::default()
/// };
/// assert!(params.min_rcond < params.degeneracy_tol * params.degeneracy_tol);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffineDltParams {
    /// Source spread `σ_min / σ_max` at or below which the points count as collinear.
    pub degeneracy_tol: f64,
    /// Reciprocal condition number below which the normal equations count as singular.
    pub min_rcond: f64,
    /// Condition the system with an isotropic normalization of both point sets.
    pub normalize: bool,
}

impl Default for AffineDltParams {
    fn default() -> Self {
        Self {
            degeneracy_tol: DEFAULT_DEGENERACY_TOLERANCE,
            min_rcond: DEFAULT_MIN_RCOND,
            normalize: true,
        }
    }
}

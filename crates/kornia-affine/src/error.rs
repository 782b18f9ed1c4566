use thiserror::Error;

/// Reasons an input is rejected before any linear algebra takes place.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidInputError {
    /// The source and destination point sets have different lengths.
    #[error("Mismatched number of points: source ({0}) != destination ({1})")]
    MismatchedPointCount(usize, usize),

    /// Not enough correspondences to constrain the six affine parameters.
    #[error("Affine estimation requires at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum number of correspondences required by the solver
        required: usize,
        /// Actual number of correspondences provided
        actual: usize,
    },

    /// The minimal solver was given a number of points other than three.
    #[error("The 3-point affine solver requires exactly 3 correspondences, got {0}")]
    ExpectedThreeCorrespondences(usize),

    /// A point matrix does not have 2 (cartesian) or 3 (homogeneous) columns.
    #[error("Point matrix must have shape (N, 2) or (N, 3), got ({0}, {1})")]
    InvalidPointShape(usize, usize),

    /// The output matrix is not 3x3.
    #[error("Affine matrix must have shape (3, 3), got ({0}, {1})")]
    InvalidResultShape(usize, usize),

    /// A coordinate is NaN or infinite.
    #[error("Point {0} has a non-finite coordinate")]
    NonFiniteCoordinate(usize),

    /// A homogeneous point has a zero scale component.
    #[error("Point {0} is at infinity (w == 0)")]
    PointAtInfinity(usize),
}

/// Error type for the affine estimators.
#[derive(Debug, Error, PartialEq)]
pub enum AffineError {
    /// The inputs violate the estimator contract.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The point configuration makes the linear system singular or ill-conditioned.
    #[error("Degenerate point configuration: {reason} (measure {measure:e}, tolerance {tolerance:e})")]
    DegenerateInput {
        /// What the conditioning check detected.
        reason: &'static str,
        /// The conditioning value that was computed.
        measure: f64,
        /// The tolerance the value was compared against.
        tolerance: f64,
    },
}

impl AffineError {
    /// Returns true if the error was raised by input validation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AffineError::InvalidInput(_))
    }

    /// Returns true if the error was raised by a conditioning check.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, AffineError::DegenerateInput { .. })
    }
}

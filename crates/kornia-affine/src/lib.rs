#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Affine
//!
//! Estimation of the 3x3 affine matrix `[[a, b, tx], [c, d, ty], [0, 0, 1]]` that maps a set
//! of source points onto their destinations.
//!
//! - [`affine_dlt3`]: exact solution from 3 correspondences
//! - [`affine_dlt`]: least-squares solution from N >= 3 correspondences
//! - [`estimate_affine`]: array based entry point dispatching on [`AffineMethod`]
//!
//! ## Example
//!
//! ```rust
//! use kornia_affine::{estimate_affine, AffineMethod};
//!
//! let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
//! let dst = [[1.0, 2.0], [3.0, 2.0], [1.0, 4.0], [3.0, 4.0]];
//!
//! let affine = estimate_affine(&src, &dst, AffineMethod::Auto)?;
//! assert!((affine[0][0] - 2.0).abs() < 1e-5);
//! assert!((affine[1][2] - 2.0).abs() < 1e-5);
//! # Ok::<(), kornia_affine::AffineError>(())
//! ```

mod dlt;
pub use dlt::*;

mod error;
pub use error::{AffineError, InvalidInputError};

mod normalize;
pub use normalize::{normalize_points, NormalizedPoints};

mod params;
pub use params::{AffineDltParams, DEFAULT_DEGENERACY_TOLERANCE, DEFAULT_MIN_RCOND};

mod points;
pub use points::MIN_CORRESPONDENCES;

mod transform;
pub use transform::*;

/// Conversions between point arrays and faer matrices.
pub mod utils;

/// Enumeration of the affine estimators available in this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AffineMethod {
    /// Exact solver for 3 correspondences, least squares otherwise.
    #[default]
    Auto,
    /// Exact 3-point solver.
    Dlt3,
    /// N-point least-squares solver.
    Dlt,
}

/// Estimates the affine matrix mapping `src` onto `dst` with the default parameters.
///
/// # Arguments
///
/// * `src` - The source points with shape (N, 2).
/// * `dst` - The destination points with shape (N, 2).
/// * `method` - The solver to use.
///
/// # Returns
///
/// The 3x3 affine matrix from src to dst.
pub fn estimate_affine(
    src: &[[f32; 2]],
    dst: &[[f32; 2]],
    method: AffineMethod,
) -> Result<[[f32; 3]; 3], AffineError> {
    estimate_affine_with_params(src, dst, method, &AffineDltParams::default())
}

/// Same as [`estimate_affine`] with explicit solver parameters.
pub fn estimate_affine_with_params(
    src: &[[f32; 2]],
    dst: &[[f32; 2]],
    method: AffineMethod,
    params: &AffineDltParams,
) -> Result<[[f32; 3]; 3], AffineError> {
    let src_mat = utils::points2_to_faer_mat(src);
    let dst_mat = utils::points2_to_faer_mat(dst);
    let mut affine = faer::Mat::<f32>::zeros(3, 3);

    let method = match method {
        AffineMethod::Auto if src.len() == 3 => AffineMethod::Dlt3,
        AffineMethod::Auto => AffineMethod::Dlt,
        other => other,
    };
    log::trace!("estimate_affine: {:?} with {} points", method, src.len());

    match method {
        AffineMethod::Dlt3 => {
            affine_dlt3_with_params(&mut affine, src_mat, dst_mat, params)?;
        }
        _ => {
            affine_dlt_with_params(&mut affine, src_mat, dst_mat, params)?;
        }
    }

    Ok(utils::faer_mat33_to_array(affine.as_ref()))
}

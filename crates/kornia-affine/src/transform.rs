use faer::{MatMut, MatRef};

use crate::error::{AffineError, InvalidInputError};
use crate::points::{check_affine_shape, check_point_shape, load_points};

/// Reads the top two rows of a 3x3 affine matrix in double precision.
fn load_affine(affine: MatRef<'_, f32>) -> Result<[[f64; 3]; 2], InvalidInputError> {
    check_affine_shape(affine.nrows(), affine.ncols())?;
    let mut m = [[0.0; 3]; 2];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = affine.read(i, j) as f64;
        }
    }
    Ok(m)
}

fn apply(m: &[[f64; 3]; 2], p: &[f64; 2]) -> [f64; 2] {
    [
        m[0][0] * p[0] + m[0][1] * p[1] + m[0][2],
        m[1][0] * p[0] + m[1][1] * p[1] + m[1][2],
    ]
}

/// Applies a 2D affine transformation to a set of points.
///
/// Only the top two rows of `affine` are used; the bottom row is assumed to be `[0, 0, 1]`.
///
/// # Arguments
///
/// * `affine` - The affine matrix with shape (3, 3).
/// * `src` - The points to transform with shape (N, 2), or (N, 3) in homogeneous coordinates.
/// * `dst` - A pre-allocated matrix with shape (N, 2) receiving the transformed points.
///
/// PRECONDITION: `dst` has as many rows as `src`.
///
/// Example:
///
/// ```
/// use kornia_affine::transform_points_affine;
///
/// let affine = faer::mat![[2.0f32, 0.0, 1.0], [0.0, 2.0, -1.0], [0.0, 0.0, 1.0]];
/// let src = faer::mat![[1.0f32, 1.0], [2.0, 3.0]];
/// let mut dst = faer::Mat::<f32>::zeros(2, 2);
/// transform_points_affine(affine.as_ref(), src.as_ref(), dst.as_mut())?;
/// assert_eq!(dst.read(1, 0), 5.0);
/// # Ok::<(), kornia_affine::AffineError>(())
/// ```
pub fn transform_points_affine(
    affine: MatRef<'_, f32>,
    src: MatRef<'_, f32>,
    mut dst: MatMut<'_, f32>,
) -> Result<(), AffineError> {
    let m = load_affine(affine)?;
    check_point_shape(src)?;
    if dst.ncols() != 2 {
        return Err(InvalidInputError::InvalidPointShape(dst.nrows(), dst.ncols()).into());
    }
    if src.nrows() != dst.nrows() {
        return Err(InvalidInputError::MismatchedPointCount(src.nrows(), dst.nrows()).into());
    }

    for (i, p) in load_points(src)?.iter().enumerate() {
        let q = apply(&m, p);
        dst.write(i, 0, q[0] as f32);
        dst.write(i, 1, q[1] as f32);
    }

    Ok(())
}

/// Computes the per-correspondence reprojection error `||dest_i − A·src_i||`.
///
/// # Arguments
///
/// * `affine` - The affine matrix with shape (3, 3).
/// * `src` - The source points with shape (N, 2), or (N, 3) in homogeneous coordinates.
/// * `dest` - The destination points with shape (N, 2), or (N, 3) in homogeneous coordinates.
///
/// # Returns
///
/// The Euclidean distance of every transformed source point to its destination.
pub fn affine_residuals(
    affine: MatRef<'_, f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<Vec<f32>, AffineError> {
    Ok(squared_residuals(affine, src, dest)?
        .into_iter()
        .map(|r2| r2.sqrt() as f32)
        .collect())
}

/// Computes the sum of squared reprojection errors `Σ ||dest_i − A·src_i||²`.
///
/// The sum is accumulated in double precision.
pub fn affine_sum_squared_error(
    affine: MatRef<'_, f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<f64, AffineError> {
    Ok(squared_residuals(affine, src, dest)?.into_iter().sum())
}

fn squared_residuals(
    affine: MatRef<'_, f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<Vec<f64>, AffineError> {
    let m = load_affine(affine)?;
    check_point_shape(src)?;
    check_point_shape(dest)?;
    if src.nrows() != dest.nrows() {
        return Err(InvalidInputError::MismatchedPointCount(src.nrows(), dest.nrows()).into());
    }

    let src_pts = load_points(src)?;
    let dst_pts = load_points(dest)?;

    Ok(src_pts
        .iter()
        .zip(dst_pts.iter())
        .map(|(p, q)| {
            let r = apply(&m, p);
            (q[0] - r[0]).powi(2) + (q[1] - r[1]).powi(2)
        })
        .collect())
}

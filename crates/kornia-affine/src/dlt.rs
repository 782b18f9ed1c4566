use faer::prelude::SpSolver;
use faer::{Mat, MatRef};

use crate::error::{AffineError, InvalidInputError};
use crate::normalize::{normalize_points, NormalizedPoints};
use crate::params::AffineDltParams;
use crate::points::{check_affine_shape, check_correspondences, load_points};
use crate::utils::array33_to_faer_mat33;

/// Computes the 2D affine transformation matrix from exactly 3 point correspondences.
///
/// The six affine parameters are the solution of the square 6x6 system built from the
/// three pairs, so the returned matrix maps every source point exactly onto its destination.
///
/// # Arguments
///
/// * `result` - The output affine matrix with shape (3, 3). Only written on success.
/// * `src` - The source points with shape (3, 2), or (3, 3) in homogeneous coordinates.
/// * `dest` - The destination points with shape (3, 2), or (3, 3) in homogeneous coordinates.
///
/// # Returns
///
/// A reference to `result` holding `[[a, b, tx], [c, d, ty], [0, 0, 1]]`.
///
/// # Errors
///
/// * [`AffineError::InvalidInput`] if the shapes are wrong or there are not exactly 3 pairs.
/// * [`AffineError::DegenerateInput`] if the source points are collinear.
///
/// # Example
///
/// ```
/// use kornia_affine::affine_dlt3;
///
/// let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// let dst = faer::mat![[0.0f32, 0.0], [2.0, 0.0], [0.0, 2.0]];
/// let mut affine = faer::Mat::<f32>::zeros(3, 3);
/// affine_dlt3(&mut affine, src.as_ref(), dst.as_ref())?;
/// assert!((affine.read(0, 0) - 2.0).abs() < 1e-6);
/// # Ok::<(), kornia_affine::AffineError>(())
/// ```
pub fn affine_dlt3<'a>(
    result: &'a mut Mat<f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<&'a Mat<f32>, AffineError> {
    affine_dlt3_with_params(result, src, dest, &AffineDltParams::default())
}

/// Same as [`affine_dlt3`] with explicit solver parameters.
pub fn affine_dlt3_with_params<'a>(
    result: &'a mut Mat<f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
    params: &AffineDltParams,
) -> Result<&'a Mat<f32>, AffineError> {
    check_affine_shape(result.nrows(), result.ncols())?;
    let n = check_correspondences(src, dest)?;
    if n != 3 {
        return Err(InvalidInputError::ExpectedThreeCorrespondences(n).into());
    }
    let src_pts = load_points(src)?;
    let dst_pts = load_points(dest)?;

    check_source_spread(&src_pts, params)?;

    let (src_norm, dst_norm) = condition_points(&src_pts, &dst_pts, params)?;

    // construct the square system: two rows per correspondence
    let mut mat_a = Mat::<f64>::zeros(6, 6);
    let mut mat_b = Mat::<f64>::zeros(6, 1);
    for (i, (p, q)) in src_norm.points.iter().zip(dst_norm.points.iter()).enumerate() {
        write_correspondence_rows(&mut mat_a, &mut mat_b, i, p, q);
    }

    let params_h = mat_a.partial_piv_lu().solve(mat_b);

    write_affine(result, params_h.as_ref(), &src_norm, &dst_norm)?;
    Ok(&*result)
}

/// Computes the 2D affine transformation matrix from N >= 3 point correspondences.
///
/// The matrix minimizes `Σ ||dest_i − A·src_i||²` over all pairs. The 2N x 6 design matrix
/// and the 2N observations are stacked from the correspondences and the 6x6 normal
/// equations `(DᵗD) h = Dᵗt` are solved in double precision.
///
/// # Arguments
///
/// * `result` - The output affine matrix with shape (3, 3). Only written on success.
/// * `src` - The source points with shape (N, 2), or (N, 3) in homogeneous coordinates.
/// * `dest` - The destination points with shape (N, 2), or (N, 3) in homogeneous coordinates.
///
/// # Returns
///
/// A reference to `result` holding `[[a, b, tx], [c, d, ty], [0, 0, 1]]`.
///
/// # Errors
///
/// * [`AffineError::InvalidInput`] if the shapes are wrong, the counts differ or N < 3.
/// * [`AffineError::DegenerateInput`] if the normal equations are rank deficient, e.g.
///   when all source points are collinear.
pub fn affine_dlt<'a>(
    result: &'a mut Mat<f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<&'a Mat<f32>, AffineError> {
    affine_dlt_with_params(result, src, dest, &AffineDltParams::default())
}

/// Same as [`affine_dlt`] with explicit solver parameters.
pub fn affine_dlt_with_params<'a>(
    result: &'a mut Mat<f32>,
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
    params: &AffineDltParams,
) -> Result<&'a Mat<f32>, AffineError> {
    check_affine_shape(result.nrows(), result.ncols())?;
    let n = check_correspondences(src, dest)?;
    let src_pts = load_points(src)?;
    let dst_pts = load_points(dest)?;

    check_source_spread(&src_pts, params)?;

    let (src_norm, dst_norm) = condition_points(&src_pts, &dst_pts, params)?;

    // construct the design matrix D and the observations t
    let mut mat_d = Mat::<f64>::zeros(2 * n, 6);
    let mut mat_t = Mat::<f64>::zeros(2 * n, 1);
    for (i, (p, q)) in src_norm.points.iter().zip(dst_norm.points.iter()).enumerate() {
        write_correspondence_rows(&mut mat_d, &mut mat_t, i, p, q);
    }

    // normal equations
    let mat_dtd = mat_d.transpose() * mat_d.as_ref();
    let mat_dtt = mat_d.transpose() * mat_t.as_ref();

    let rcond = reciprocal_condition(mat_dtd.as_ref());
    log::debug!("affine_dlt: {} correspondences, rcond(DtD) {:e}", n, rcond);
    // with normalized points rcond(DtD) tracks the squared source spread, so this only
    // trips on numerical breakdown of the accumulated system
    if !(rcond >= params.min_rcond) {
        log::debug!("affine_dlt: rejecting rank deficient normal equations");
        return Err(AffineError::DegenerateInput {
            reason: "rank deficient normal equations",
            measure: rcond,
            tolerance: params.min_rcond,
        });
    }

    let params_h = mat_dtd.partial_piv_lu().solve(mat_dtt);

    write_affine(result, params_h.as_ref(), &src_norm, &dst_norm)?;
    Ok(&*result)
}

/// Ratio of the smallest to the largest singular value of the centered source points.
///
/// Invariant to translation, rotation and scale; zero for collinear or coincident points.
fn source_spread(points: &[[f64; 2]]) -> f64 {
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (sum_x / n, sum_y / n);

    let centered = Mat::<f64>::from_fn(points.len(), 2, |i, j| match j {
        0 => points[i][0] - cx,
        _ => points[i][1] - cy,
    });

    reciprocal_condition(centered.as_ref())
}

/// Rejects collinear or coincident source points.
///
/// Both solvers run the same check so that they accept the same 3-point configurations.
fn check_source_spread(points: &[[f64; 2]], params: &AffineDltParams) -> Result<(), AffineError> {
    let spread = source_spread(points);
    log::debug!("source spread {:e}", spread);

    // NOTE: negated comparison so that NaN is rejected too
    if !(spread > params.degeneracy_tol) {
        log::debug!("rejecting collinear source points");
        return Err(AffineError::DegenerateInput {
            reason: "collinear source points",
            measure: spread,
            tolerance: params.degeneracy_tol,
        });
    }

    Ok(())
}

/// Ratio of the smallest to the largest singular value.
fn reciprocal_condition(mat: MatRef<'_, f64>) -> f64 {
    let singular_values = mat.singular_values();
    let (min, max) = singular_values
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    if max <= 0.0 {
        return 0.0;
    }

    min / max
}

/// Applies the configured normalization to both point sets.
fn condition_points(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &AffineDltParams,
) -> Result<(NormalizedPoints, NormalizedPoints), AffineError> {
    if !params.normalize {
        return Ok((NormalizedPoints::identity(src), NormalizedPoints::identity(dst)));
    }

    let src_norm = normalize_points(src).ok_or(AffineError::DegenerateInput {
        reason: "coincident source points",
        measure: 0.0,
        tolerance: f64::EPSILON,
    })?;

    // a destination set collapsed to a single point is a valid (singular) affine image
    let dst_norm = normalize_points(dst).unwrap_or_else(|| NormalizedPoints::identity(dst));

    Ok((src_norm, dst_norm))
}

/// Writes the x and y equations of the i-th correspondence in the unknowns
/// `[a, b, tx, c, d, ty]`.
fn write_correspondence_rows(
    mat_a: &mut Mat<f64>,
    mat_b: &mut Mat<f64>,
    i: usize,
    src: &[f64; 2],
    dst: &[f64; 2],
) {
    let (row_x, row_y) = (2 * i, 2 * i + 1);

    mat_a.write(row_x, 0, src[0]);
    mat_a.write(row_x, 1, src[1]);
    mat_a.write(row_x, 2, 1.0);
    mat_a.write(row_y, 3, src[0]);
    mat_a.write(row_y, 4, src[1]);
    mat_a.write(row_y, 5, 1.0);

    mat_b.write(row_x, 0, dst[0]);
    mat_b.write(row_y, 0, dst[1]);
}

/// Undoes the normalization of the solved parameters and stores them in `result`.
///
/// `result` is left untouched if the solution is not finite.
fn write_affine(
    result: &mut Mat<f32>,
    params_h: MatRef<'_, f64>,
    src_norm: &NormalizedPoints,
    dst_norm: &NormalizedPoints,
) -> Result<(), AffineError> {
    let h = |k: usize| params_h.read(k, 0);

    // A = T_dst⁻¹ · Â · T_src
    let affine_norm = faer::mat![
        [h(0), h(1), h(2)],
        [h(3), h(4), h(5)],
        [0.0, 0.0, 1.0]
    ];
    let t_src = array33_to_faer_mat33(&src_norm.transform());
    let t_dst_inv = array33_to_faer_mat33(&dst_norm.inverse_transform());
    let affine_src = affine_norm.as_ref() * t_src.as_ref();
    let affine = t_dst_inv.as_ref() * affine_src.as_ref();

    let mut params = [[0.0f32; 3]; 2];
    for (i, row) in params.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = affine.read(i, j) as f32;
        }
    }

    if params.iter().flatten().any(|v| !v.is_finite()) {
        return Err(AffineError::DegenerateInput {
            reason: "non-finite solution",
            measure: f64::NAN,
            tolerance: 0.0,
        });
    }

    log::trace!("affine parameters: {:?}", params);

    for (i, row) in params.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            result.write(i, j, val);
        }
    }
    result.write(2, 0, 0.0);
    result.write(2, 1, 0.0);
    result.write(2, 2, 1.0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_affine_eq(affine: &Mat<f32>, expected: &[[f32; 3]; 3], epsilon: f32) {
        for (i, row) in expected.iter().enumerate() {
            for (j, &val) in row.iter().enumerate() {
                assert_relative_eq!(affine.read(i, j), val, epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_affine_dlt3_scale() -> Result<(), AffineError> {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let dst = faer::mat![[0.0f32, 0.0], [2.0, 0.0], [0.0, 2.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt3(&mut affine, src.as_ref(), dst.as_ref())?;

        let expected = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        assert_affine_eq(&affine, &expected, 1e-6);
        Ok(())
    }

    #[test]
    fn test_affine_dlt3_translation() -> Result<(), AffineError> {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let dst = faer::mat![[1.0f32, 1.0], [2.0, 1.0], [1.0, 2.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt3(&mut affine, src.as_ref(), dst.as_ref())?;

        let expected = [[1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]];
        assert_affine_eq(&affine, &expected, 1e-6);
        Ok(())
    }

    #[test]
    fn test_affine_dlt3_shear_unnormalized() -> Result<(), AffineError> {
        let src = faer::mat![[1.0f32, 1.0], [4.0, 2.0], [2.0, 5.0]];
        let expected = [[1.5f32, 0.5, -2.0], [-0.25, 0.75, 3.0], [0.0, 0.0, 1.0]];
        let dst = Mat::<f32>::from_fn(3, 2, |i, j| {
            let (x, y) = (src.read(i, 0), src.read(i, 1));
            expected[j][0] * x + expected[j][1] * y + expected[j][2]
        });

        let params = AffineDltParams {
            normalize: false,
            ..Default::default()
        };
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt3_with_params(&mut affine, src.as_ref(), dst.as_ref(), &params)?;

        assert_affine_eq(&affine, &expected, 1e-5);
        Ok(())
    }

    #[test]
    fn test_affine_dlt3_collinear() {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let dst = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let mut affine = Mat::<f32>::from_fn(3, 3, |i, j| (i * 3 + j) as f32);
        let before = affine.clone();

        let res = affine_dlt3(&mut affine, src.as_ref(), dst.as_ref());
        assert!(matches!(res, Err(AffineError::DegenerateInput { .. })));
        assert_eq!(affine, before);
    }

    #[test]
    fn test_affine_dlt3_coincident() {
        let src = faer::mat![[3.0f32, 3.0], [3.0, 3.0], [3.0, 3.0]];
        let dst = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        let res = affine_dlt3(&mut affine, src.as_ref(), dst.as_ref());
        assert!(matches!(res, Err(AffineError::DegenerateInput { .. })));
    }

    #[test]
    fn test_affine_dlt3_wrong_count() {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        let res = affine_dlt3(&mut affine, src.as_ref(), src.as_ref());
        assert_eq!(
            res.err(),
            Some(AffineError::InvalidInput(
                InvalidInputError::ExpectedThreeCorrespondences(4)
            ))
        );
    }

    #[test]
    fn test_affine_dlt_result_shape() {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let mut affine = Mat::<f32>::zeros(2, 3);
        let res = affine_dlt(&mut affine, src.as_ref(), src.as_ref());
        assert_eq!(
            res.err(),
            Some(AffineError::InvalidInput(
                InvalidInputError::InvalidResultShape(2, 3)
            ))
        );
    }

    #[test]
    fn test_affine_dlt_square_identity() -> Result<(), AffineError> {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt(&mut affine, src.as_ref(), src.as_ref())?;

        let expected = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_affine_eq(&affine, &expected, 1e-6);
        Ok(())
    }

    #[test]
    fn test_affine_dlt_homogeneous_input() -> Result<(), AffineError> {
        let src = faer::mat![
            [0.0f32, 0.0, 1.0],
            [2.0, 0.0, 2.0],
            [0.0, 3.0, 3.0],
            [4.0, 4.0, 4.0]
        ];
        let dst = faer::mat![[1.0f32, 1.0], [2.0, 1.0], [1.0, 2.0], [2.0, 2.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt(&mut affine, src.as_ref(), dst.as_ref())?;

        let expected = [[1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]];
        assert_affine_eq(&affine, &expected, 1e-5);
        Ok(())
    }

    #[test]
    fn test_affine_dlt_collinear() {
        let src = faer::mat![[0.0f32, 1.0], [1.0, 2.0], [2.0, 3.0], [5.0, 6.0]];
        let dst = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        let res = affine_dlt(&mut affine, src.as_ref(), dst.as_ref());
        assert!(matches!(res, Err(AffineError::DegenerateInput { .. })));
        assert_eq!(affine, Mat::<f32>::zeros(3, 3));
    }

    #[test]
    fn test_affine_dlt_collapsed_destination() -> Result<(), AffineError> {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let dst = faer::mat![[5.0f32, -2.0], [5.0, -2.0], [5.0, -2.0], [5.0, -2.0]];
        let mut affine = Mat::<f32>::zeros(3, 3);
        affine_dlt(&mut affine, src.as_ref(), dst.as_ref())?;

        let expected = [[0.0, 0.0, 5.0], [0.0, 0.0, -2.0], [0.0, 0.0, 1.0]];
        assert_affine_eq(&affine, &expected, 1e-5);
        Ok(())
    }

    #[test]
    fn test_source_spread() {
        // centered scatter of the unit right triangle has eigenvalues 1/3 and 1/9
        assert_relative_eq!(
            source_spread(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            1.0 / 3.0f64.sqrt(),
            epsilon = 1e-12
        );
        // invariant to similarity transforms
        assert_relative_eq!(
            source_spread(&[[10.0, 10.0], [10.0, 30.0], [-10.0, 10.0]]),
            1.0 / 3.0f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(source_spread(&[[0.0, 0.0], [1.0, 1.0], [3.0, 3.0]]) < 1e-12);
        assert_eq!(source_spread(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]), 0.0);
    }

    #[test]
    fn test_thin_triangle_accepted_by_both_solvers() -> Result<(), AffineError> {
        let src = faer::mat![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1e-4]];
        let dst = faer::mat![[0.0f32, 0.0], [2.0, 0.0], [0.0, 2e-4]];
        let expected = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];

        let mut exact = Mat::<f32>::zeros(3, 3);
        affine_dlt3(&mut exact, src.as_ref(), dst.as_ref())?;
        assert_affine_eq(&exact, &expected, 1e-4);

        let mut lstsq = Mat::<f32>::zeros(3, 3);
        affine_dlt(&mut lstsq, src.as_ref(), dst.as_ref())?;
        assert_affine_eq(&lstsq, &expected, 1e-4);
        Ok(())
    }
}

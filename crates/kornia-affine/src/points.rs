use faer::MatRef;

use crate::error::InvalidInputError;

/// Minimum number of correspondences needed to fix the six affine parameters.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Checks that a point matrix holds one cartesian (N, 2) or homogeneous (N, 3) point per row.
pub(crate) fn check_point_shape(points: MatRef<'_, f32>) -> Result<(), InvalidInputError> {
    match points.ncols() {
        2 | 3 => Ok(()),
        _ => Err(InvalidInputError::InvalidPointShape(
            points.nrows(),
            points.ncols(),
        )),
    }
}

/// Checks that the output matrix is 3x3.
pub(crate) fn check_affine_shape(nrows: usize, ncols: usize) -> Result<(), InvalidInputError> {
    if nrows != 3 || ncols != 3 {
        return Err(InvalidInputError::InvalidResultShape(nrows, ncols));
    }
    Ok(())
}

/// Validates a pair of point sets and returns the number of correspondences.
pub(crate) fn check_correspondences(
    src: MatRef<'_, f32>,
    dest: MatRef<'_, f32>,
) -> Result<usize, InvalidInputError> {
    check_point_shape(src)?;
    check_point_shape(dest)?;

    let n = src.nrows();
    if n != dest.nrows() {
        return Err(InvalidInputError::MismatchedPointCount(n, dest.nrows()));
    }
    if n < MIN_CORRESPONDENCES {
        return Err(InvalidInputError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: n,
        });
    }

    Ok(n)
}

/// Reads a point matrix into cartesian double precision coordinates.
///
/// Homogeneous rows `(x, y, w)` are divided by `w`.
///
/// PRECONDITION: `points` passed [`check_point_shape`].
pub(crate) fn load_points(points: MatRef<'_, f32>) -> Result<Vec<[f64; 2]>, InvalidInputError> {
    let homogeneous = points.ncols() == 3;
    let mut out = Vec::with_capacity(points.nrows());

    for i in 0..points.nrows() {
        let x = points.read(i, 0) as f64;
        let y = points.read(i, 1) as f64;
        let w = if homogeneous {
            points.read(i, 2) as f64
        } else {
            1.0
        };

        if !(x.is_finite() && y.is_finite() && w.is_finite()) {
            return Err(InvalidInputError::NonFiniteCoordinate(i));
        }
        if w == 0.0 {
            return Err(InvalidInputError::PointAtInfinity(i));
        }

        out.push([x / w, y / w]);
    }

    Ok(out)
}

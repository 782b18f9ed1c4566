/// Creates a zero-copy (N, 2) faer view over a slice of 2d points.
///
/// # Arguments
///
/// * `points` - A slice of 2d points.
///
/// # Returns
///
/// A faer matrix view with one point per row.
pub fn points2_to_faer_mat(points: &[[f32; 2]]) -> faer::MatRef<'_, f32> {
    // SAFETY: [[f32; 2]] is stored as 2 * len contiguous f32 values
    let points_slice =
        unsafe { std::slice::from_raw_parts(points.as_ptr() as *const f32, points.len() * 2) };
    faer::mat::from_row_major_slice(points_slice, points.len(), 2)
}

/// Copies a 3x3 faer matrix into a row-major array.
///
/// PRECONDITION: `mat` has shape (3, 3).
pub fn faer_mat33_to_array(mat: faer::MatRef<'_, f32>) -> [[f32; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = mat.read(i, j);
        }
    }
    out
}

/// Builds an owned faer 3x3 matrix from a row-major array.
pub(crate) fn array33_to_faer_mat33(array: &[[f64; 3]; 3]) -> faer::Mat<f64> {
    faer::Mat::<f64>::from_fn(3, 3, |i, j| array[i][j])
}

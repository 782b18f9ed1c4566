/// A point set mapped by an isotropic similarity `T` so that its centroid is the origin
/// and its mean distance to the origin is √2.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoints {
    /// The transformed points `T * p`.
    pub points: Vec<[f64; 2]>,
    /// The centroid of the original points.
    pub centroid: [f64; 2],
    /// The isotropic scale factor of `T`.
    pub scale: f64,
}

impl NormalizedPoints {
    /// Wraps the points with the identity transform.
    pub fn identity(points: &[[f64; 2]]) -> Self {
        Self {
            points: points.to_vec(),
            centroid: [0.0, 0.0],
            scale: 1.0,
        }
    }

    /// The 3x3 normalizing transform `T`.
    pub fn transform(&self) -> [[f64; 3]; 3] {
        let (s, [cx, cy]) = (self.scale, self.centroid);
        [[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]]
    }

    /// The 3x3 inverse transform `T⁻¹`, mapping normalized points back.
    pub fn inverse_transform(&self) -> [[f64; 3]; 3] {
        let (inv_s, [cx, cy]) = (1.0 / self.scale, self.centroid);
        [[inv_s, 0.0, cx], [0.0, inv_s, cy], [0.0, 0.0, 1.0]]
    }
}

/// Computes the Hartley normalization of a 2d point set.
///
/// # Arguments
///
/// * `points` - The points to normalize.
///
/// # Returns
///
/// The normalized points and their transform, or `None` if the set is empty or all
/// points coincide.
///
/// # Example
///
/// ```
/// use kornia_affine::normalize_points;
///
/// let norm = normalize_points(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]]).unwrap();
/// assert_eq!(norm.centroid, [1.0, 1.0]);
/// ```
pub fn normalize_points(points: &[[f64; 2]]) -> Option<NormalizedPoints> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (sum_x / n, sum_y / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist <= f64::EPSILON * (cx.abs() + cy.abs()).max(1.0) {
        return None;
    }

    let scale = std::f64::consts::SQRT_2 / mean_dist;
    let normalized = points
        .iter()
        .map(|p| [scale * (p[0] - cx), scale * (p[1] - cy)])
        .collect();

    Some(NormalizedPoints {
        points: normalized,
        centroid: [cx, cy],
        scale,
    })
}

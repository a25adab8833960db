use ndarray::{Array1, Array2, ArrayView1};

/// Sample positions shared by every field of a snapshot.
///
/// Both variants are stored as 2-D arrays. A line of `n` points has shape
/// `(1, n)` and no Y coordinates; a grid built from `nx` x-samples and `ny`
/// y-samples has shape `(ny, nx)` with `x[[r, c]] = xs[c]` and
/// `y[[r, c]] = ys[r]`, so each row is a line of constant y.
#[derive(Debug, Clone)]
pub struct SpatialDomain {
    pub x: Array2<f64>,
    pub y: Option<Array2<f64>>,
}

impl SpatialDomain {
    pub fn line(xs: Array1<f64>) -> Self {
        assert!(!xs.is_empty(), "spatial domain must contain at least one point");
        let x = Array2::from_shape_fn((1, xs.len()), |(_, c)| xs[c]);
        SpatialDomain { x, y: None }
    }

    pub fn grid(xs: Array1<f64>, ys: Array1<f64>) -> Self {
        assert!(
            !xs.is_empty() && !ys.is_empty(),
            "spatial domain must contain at least one point"
        );
        let shape = (ys.len(), xs.len());
        let x = Array2::from_shape_fn(shape, |(_, c)| xs[c]);
        let y = Array2::from_shape_fn(shape, |(r, _)| ys[r]);
        SpatialDomain { x, y: Some(y) }
    }

    /// `n` evenly spaced points on `[min, max]`, endpoints included.
    pub fn linspace_line(n: usize, min: f64, max: f64) -> Self {
        Self::line(Array1::linspace(min, max, n))
    }

    /// `nx` by `ny` grid spanning `[min, max]` on both axes.
    pub fn linspace_grid(nx: usize, ny: usize, min: f64, max: f64) -> Self {
        Self::grid(Array1::linspace(min, max, nx), Array1::linspace(min, max, ny))
    }

    pub fn dim(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn is_grid(&self) -> bool {
        self.y.is_some()
    }

    pub fn x_axis(&self) -> ArrayView1<'_, f64> {
        // Every row carries the same x samples
        self.x.row(0)
    }

    pub fn y_axis(&self) -> Option<ArrayView1<'_, f64>> {
        self.y.as_ref().map(|y| y.column(0))
    }

    pub fn x_extent(&self) -> (f64, f64) {
        let xs = self.x_axis();
        (xs[0], xs[xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn line_has_single_row_and_no_y() {
        let domain = SpatialDomain::linspace_line(500, -PI, PI);
        assert_eq!(domain.dim(), (1, 500));
        assert!(!domain.is_grid());
        assert_relative_eq!(domain.x[[0, 0]], -PI);
        assert_relative_eq!(domain.x[[0, 499]], PI);
    }

    #[test]
    fn grid_follows_meshgrid_layout() {
        let xs = Array1::from(vec![0.0, 1.0, 2.0]);
        let ys = Array1::from(vec![10.0, 20.0]);
        let domain = SpatialDomain::grid(xs, ys);
        assert_eq!(domain.dim(), (2, 3));
        let y = domain.y.as_ref().unwrap();
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(domain.x[[r, c]], c as f64);
                assert_eq!(y[[r, c]], 10.0 * (r + 1) as f64);
            }
        }
        assert_eq!(domain.y_axis().unwrap().to_vec(), vec![10.0, 20.0]);
        assert_eq!(domain.x_extent(), (0.0, 2.0));
    }

    #[test]
    #[should_panic(expected = "at least one point")]
    fn empty_line_is_rejected() {
        SpatialDomain::line(Array1::zeros(0));
    }
}

//! Lattice geometry: basis inversion and nearest-node residuals.

/// Determinants below this magnitude make the basis unusable.
pub(crate) const MIN_DET: f64 = 1e-9;

/// Candidate parameters of an equal-length lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LatticeParams {
    pub a: f64,
    pub alpha: f64,
    pub tx: f64,
    pub ty: f64,
}

impl LatticeParams {
    pub(crate) fn to_array(self) -> [f64; 4] {
        [self.a, self.alpha, self.tx, self.ty]
    }

    pub(crate) fn from_array(p: [f64; 4]) -> Self {
        Self {
            a: p[0],
            alpha: p[1],
            tx: p[2],
            ty: p[3],
        }
    }
}

/// Pixel-space lattice: `origin + i * u + j * v` for integer `i`, `j`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LatticeGeometry {
    origin: [f64; 2],
    u: [f64; 2],
    v: [f64; 2],
    inv: [[f64; 2]; 2],
}

impl LatticeGeometry {
    /// Builds the geometry from two basis vectors; `None` if singular.
    pub(crate) fn from_basis(origin: [f64; 2], u: [f64; 2], v: [f64; 2]) -> Option<Self> {
        let det = u[0] * v[1] - u[1] * v[0];
        if !det.is_finite() || det.abs() < MIN_DET {
            return None;
        }
        let inv = [[v[1] / det, -v[0] / det], [-u[1] / det, u[0] / det]];
        Some(Self { origin, u, v, inv })
    }

    /// Equal-length basis at `alpha` and `alpha + basis_angle`, shifted by
    /// the translation relative to `center`.
    pub(crate) fn from_params(
        params: &LatticeParams,
        basis_angle: f64,
        center: [f64; 2],
    ) -> Option<Self> {
        if params.a.is_nan() || params.a <= 0.0 {
            return None;
        }
        let u = polar(params.a, params.alpha);
        let v = polar(params.a, params.alpha + basis_angle);
        Self::from_basis([center[0] + params.tx, center[1] + params.ty], u, v)
    }

    /// Fractional lattice coordinates `(i, j)` of a pixel position.
    pub(crate) fn lattice_coords(&self, p: [f64; 2]) -> [f64; 2] {
        let dx = p[0] - self.origin[0];
        let dy = p[1] - self.origin[1];
        [
            self.inv[0][0] * dx + self.inv[0][1] * dy,
            self.inv[1][0] * dx + self.inv[1][1] * dy,
        ]
    }

    /// Pixel position of lattice node `(i, j)`.
    pub(crate) fn node(&self, i: f64, j: f64) -> [f64; 2] {
        [
            self.origin[0] + i * self.u[0] + j * self.v[0],
            self.origin[1] + i * self.u[1] + j * self.v[1],
        ]
    }

    /// Squared distance from `p` to the closest lattice node.
    ///
    /// Searches the 3x3 node neighbourhood around the rounded lattice
    /// coordinates, which covers skewed bases as well as orthogonal ones.
    pub(crate) fn residual2(&self, p: [f64; 2]) -> f64 {
        let [fi, fj] = self.lattice_coords(p);
        let (ri, rj) = (fi.round(), fj.round());
        let mut best = f64::INFINITY;
        for di in -1..=1 {
            for dj in -1..=1 {
                let n = self.node(ri + f64::from(di), rj + f64::from(dj));
                let d2 = (p[0] - n[0]).powi(2) + (p[1] - n[1]).powi(2);
                best = best.min(d2);
            }
        }
        best
    }
}

#[inline]
pub(crate) fn polar(length: f64, angle: f64) -> [f64; 2] {
    let (s, c) = angle.sin_cos();
    [length * c, length * s]
}

/// Mean squared residual of `points`, `+inf` when the lattice is degenerate.
pub(crate) fn mean_loss(
    points: &[[f64; 2]],
    params: &LatticeParams,
    basis_angle: f64,
    center: [f64; 2],
) -> f64 {
    if points.is_empty() {
        return f64::INFINITY;
    }
    match LatticeGeometry::from_params(params, basis_angle, center) {
        Some(geom) => points.iter().map(|&p| geom.residual2(p)).sum::<f64>() / points.len() as f64,
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::{mean_loss, LatticeGeometry, LatticeParams};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_3};

    #[test]
    fn coords_invert_node() {
        let params = LatticeParams {
            a: 30.0,
            alpha: 0.3,
            tx: 4.0,
            ty: -7.0,
        };
        let geom = LatticeGeometry::from_params(&params, FRAC_PI_3, [100.0, 80.0]).unwrap();
        let p = geom.node(2.0, -3.0);
        let [i, j] = geom.lattice_coords(p);
        assert!((i - 2.0).abs() < 1e-9);
        assert!((j + 3.0).abs() < 1e-9);
        assert!(geom.residual2(p) < 1e-18);
    }

    #[test]
    fn residual_measures_offset_to_closest_node() {
        let params = LatticeParams {
            a: 10.0,
            alpha: 0.0,
            tx: 0.0,
            ty: 0.0,
        };
        let geom = LatticeGeometry::from_params(&params, FRAC_PI_2, [0.0, 0.0]).unwrap();
        assert!((geom.residual2([13.0, 24.0]) - (9.0 + 16.0)).abs() < 1e-9);
        assert!((geom.residual2([-18.0, 1.0]) - (4.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn singular_basis_is_rejected() {
        assert!(LatticeGeometry::from_basis([0.0, 0.0], [1.0, 2.0], [2.0, 4.0]).is_none());
        let zero = LatticeParams {
            a: 0.0,
            alpha: 0.0,
            tx: 0.0,
            ty: 0.0,
        };
        assert_eq!(mean_loss(&[[1.0, 1.0]], &zero, FRAC_PI_2, [0.0, 0.0]), f64::INFINITY);
    }
}

//! Python bindings for the gridfit detection and lattice fitting library.
//!
//! Images are passed as 2D numpy arrays (height x width), points as lists of
//! `(x, y)` tuples.

use numpy::{PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use gridfit::lowlevel::{from_f32, from_luma8};
use gridfit::{
    DetectConfig as RustDetectConfig, FitConfig as RustFitConfig, FitResult as RustFitResult,
    GridDetector, GridFitError, ImageView, LatticeFitter, Point2D, ScalarField,
};

/// Convert a GridFitError to a Python exception.
fn to_py_err(err: GridFitError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

fn field_from_u8(image: &PyReadonlyArray2<'_, u8>) -> PyResult<ScalarField> {
    let shape = image.shape();
    let view = ImageView::from_slice(image.as_slice()?, shape[1], shape[0]).map_err(to_py_err)?;
    Ok(from_luma8(view))
}

fn field_from_f32(image: &PyReadonlyArray2<'_, f32>) -> PyResult<ScalarField> {
    let shape = image.shape();
    let view = ImageView::from_slice(image.as_slice()?, shape[1], shape[0]).map_err(to_py_err)?;
    Ok(from_f32(view))
}

/// Configuration for grid point detection.
#[pyclass]
#[derive(Clone)]
pub struct DetectConfig {
    inner: RustDetectConfig,
}

#[pymethods]
impl DetectConfig {
    /// Create a new DetectConfig.
    ///
    /// Args:
    ///     variance_radius: Variance window radius (default: 5)
    ///     morph_radius: Morphology radius (default: 2)
    ///     merge_radius: Peak merge radius in pixels (default: 10.0)
    ///     min_value: Fixed minimum peak distance, None to derive (default: None)
    ///     max_drop_fraction: Largest fraction of peaks the CV filter drops (default: 0.3)
    ///     cv_threshold: Target coefficient of variation (default: 0.2)
    ///     parallel: Row-parallel window stages (default: False)
    #[new]
    #[pyo3(signature = (
        variance_radius = 5,
        morph_radius = 2,
        merge_radius = 10.0,
        min_value = None,
        max_drop_fraction = 0.3,
        cv_threshold = 0.2,
        parallel = false
    ))]
    fn new(
        variance_radius: usize,
        morph_radius: usize,
        merge_radius: f32,
        min_value: Option<f32>,
        max_drop_fraction: f32,
        cv_threshold: f32,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustDetectConfig {
            variance_radius,
            morph_radius,
            merge_radius,
            min_value,
            max_drop_fraction,
            cv_threshold,
            parallel,
            ..RustDetectConfig::default()
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectConfig(variance_radius={}, morph_radius={}, merge_radius={}, parallel={})",
            self.inner.variance_radius,
            self.inner.morph_radius,
            self.inner.merge_radius,
            self.inner.parallel
        )
    }
}

/// Configuration for lattice fitting; angles in degrees.
#[pyclass]
#[derive(Clone)]
pub struct FitConfig {
    inner: RustFitConfig,
}

#[pymethods]
impl FitConfig {
    /// Create a new FitConfig.
    ///
    /// Args:
    ///     basis_angle_deg: Angle between basis vectors (default: 90.0)
    ///     inlier_fraction: Fraction of points kept for refinement (default: 0.95)
    ///     max_iterations: Gradient descent iteration cap (default: 50)
    #[new]
    #[pyo3(signature = (basis_angle_deg = 90.0, inlier_fraction = 0.95, max_iterations = 50))]
    fn new(basis_angle_deg: f64, inlier_fraction: f64, max_iterations: usize) -> PyResult<Self> {
        let inner = RustFitConfig {
            basis_angle: basis_angle_deg.to_radians(),
            inlier_fraction,
            max_iterations,
            ..RustFitConfig::default()
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "FitConfig(basis_angle_deg={:.2}, inlier_fraction={}, max_iterations={})",
            self.inner.basis_angle.to_degrees(),
            self.inner.inlier_fraction,
            self.inner.max_iterations
        )
    }
}

/// Fitted lattice: basis lengths and angles plus origin offset.
#[pyclass]
#[derive(Clone)]
pub struct FitResult {
    #[pyo3(get)]
    pub a: f64,
    /// Direction of the first basis vector in degrees.
    #[pyo3(get)]
    pub alpha_deg: f64,
    #[pyo3(get)]
    pub b: f64,
    /// Direction of the second basis vector in degrees.
    #[pyo3(get)]
    pub beta_deg: f64,
    /// Origin offset from the canvas centre.
    #[pyo3(get)]
    pub tx: f64,
    #[pyo3(get)]
    pub ty: f64,
    #[pyo3(get)]
    pub inliers: usize,
    #[pyo3(get)]
    pub final_loss: f64,
    nodes: Vec<(f64, f64)>,
}

#[pymethods]
impl FitResult {
    /// Lattice nodes inside the fitted canvas as `(x, y)` tuples.
    fn nodes(&self) -> Vec<(f64, f64)> {
        self.nodes.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "FitResult(a={:.3}, alpha_deg={:.2}, beta_deg={:.2}, tx={:.2}, ty={:.2})",
            self.a, self.alpha_deg, self.beta_deg, self.tx, self.ty
        )
    }
}

impl FitResult {
    fn new(fit: RustFitResult, width: usize, height: usize) -> Self {
        Self {
            a: fit.lattice.a,
            alpha_deg: fit.lattice.alpha.to_degrees(),
            b: fit.lattice.b,
            beta_deg: fit.lattice.beta.to_degrees(),
            tx: fit.tx,
            ty: fit.ty,
            inliers: fit.inliers,
            final_loss: fit.final_loss,
            nodes: fit.nodes_within(width, height),
        }
    }
}

fn detect_points(
    image: &ScalarField,
    radius: usize,
    config: Option<DetectConfig>,
) -> PyResult<Vec<(usize, usize)>> {
    let mut cfg = config.map(|c| c.inner).unwrap_or_default();
    cfg.variance_radius = radius;
    let detector = GridDetector::new(cfg).map_err(to_py_err)?;
    Ok(detector
        .detect(image)
        .points
        .into_iter()
        .map(|p| (p.x, p.y))
        .collect())
}

/// Detect grid points in a 2D uint8 image.
///
/// Args:
///     image: 2D uint8 numpy array (height x width)
///     radius: Variance window radius (default: 5)
///     config: Optional DetectConfig; its variance_radius is replaced by `radius`
///
/// Returns:
///     List of (x, y) points, strongest first
#[pyfunction]
#[pyo3(signature = (image, radius = 5, config = None))]
fn detect_grid_points(
    image: PyReadonlyArray2<'_, u8>,
    radius: usize,
    config: Option<DetectConfig>,
) -> PyResult<Vec<(usize, usize)>> {
    detect_points(&field_from_u8(&image)?, radius, config)
}

/// Detect grid points in a 2D float32 intensity image.
#[pyfunction]
#[pyo3(signature = (image, radius = 5, config = None))]
fn detect_grid_points_f32(
    image: PyReadonlyArray2<'_, f32>,
    radius: usize,
    config: Option<DetectConfig>,
) -> PyResult<Vec<(usize, usize)>> {
    detect_points(&field_from_f32(&image)?, radius, config)
}

/// Fit a lattice to `(x, y)` points on a `width x height` canvas.
///
/// Returns None when the points do not define a lattice.
#[pyfunction]
#[pyo3(signature = (points, width, height, basis_angle = std::f64::consts::FRAC_PI_2, config = None))]
fn fit_grid(
    points: Vec<(usize, usize)>,
    width: usize,
    height: usize,
    basis_angle: f64,
    config: Option<FitConfig>,
) -> PyResult<Option<FitResult>> {
    let cfg = match config {
        Some(c) => c.inner,
        None => RustFitConfig {
            basis_angle,
            ..RustFitConfig::default()
        },
    };
    let fitter = LatticeFitter::new(cfg).map_err(to_py_err)?;
    let pts: Vec<Point2D> = points.into_iter().map(|(x, y)| Point2D::new(x, y)).collect();
    Ok(fitter
        .fit(&pts, width, height)
        .map(|fit| FitResult::new(fit, width, height)))
}

/// Python module for gridfit.
#[pymodule]
fn _gridfit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<DetectConfig>()?;
    m.add_class::<FitConfig>()?;
    m.add_class::<FitResult>()?;
    m.add_function(wrap_pyfunction!(detect_grid_points, m)?)?;
    m.add_function(wrap_pyfunction!(detect_grid_points_f32, m)?)?;
    m.add_function(wrap_pyfunction!(fit_grid, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

//! GridFit detects the nodes of regular 2D grids in grayscale images and fits
//! an equal-length lattice to them.
//!
//! Detection works on texture rather than edges: a local variance field
//! separates patterned cells from flat background, Otsu binarization and
//! morphology turn it into a clean mask, and the peaks of the Euclidean
//! distance transform of that mask are the candidate grid points. Fitting
//! votes for two basis directions among nearest-neighbour vectors and then
//! refines length, angle and translation with a clamped gradient descent.
//!
//! Everything is synchronous and deterministic. The `rayon` feature makes the
//! window stages row-parallel with bit-identical output, `image-io` adds image
//! loading and `tracing` emits per-stage spans.

mod candidate;
pub mod detect;
mod distance;
pub mod image;
mod kernel;
pub mod lattice;
pub mod lowlevel;
mod segment;
mod trace;
pub mod util;
mod variance;

pub use candidate::{Peak, Point2D};
pub use detect::{detect_grid_points, DetectConfig, Detection, GridDetector};
pub use image::{BinaryMask, ImageView, ScalarField};
pub use lattice::{fit_grid, FitConfig, FitResult, Lattice, LatticeFitter};
pub use util::{GridFitError, GridFitResult};

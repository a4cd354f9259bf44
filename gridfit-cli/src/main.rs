use clap::Parser;
use gridfit::image::io::load_intensity_field;
use gridfit::{DetectConfig, Detection, FitConfig, FitResult, GridDetector, LatticeFitter, Point2D};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "GridFit CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable per-stage tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    variance_radius: usize,
    morph_radius: usize,
    merge_radius: f32,
    min_value: Option<f32>,
    min_value_floor: f32,
    min_value_fraction: f32,
    max_drop_fraction: f32,
    cv_threshold: f32,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            variance_radius: cfg.variance_radius,
            morph_radius: cfg.morph_radius,
            merge_radius: cfg.merge_radius,
            min_value: cfg.min_value,
            min_value_floor: cfg.min_value_floor,
            min_value_fraction: cfg.min_value_fraction,
            max_drop_fraction: cfg.max_drop_fraction,
            cv_threshold: cfg.cv_threshold,
            parallel: cfg.parallel,
        }
    }
}

impl From<DetectConfigJson> for DetectConfig {
    fn from(value: DetectConfigJson) -> Self {
        Self {
            variance_radius: value.variance_radius,
            morph_radius: value.morph_radius,
            merge_radius: value.merge_radius,
            min_value: value.min_value,
            min_value_floor: value.min_value_floor,
            min_value_fraction: value.min_value_fraction,
            max_drop_fraction: value.max_drop_fraction,
            cv_threshold: value.cv_threshold,
            parallel: value.parallel,
        }
    }
}

/// Fit settings; angles are given in degrees.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct FitConfigJson {
    enabled: bool,
    basis_angle_deg: f64,
    bin_count: usize,
    search_half_width_deg: f64,
    min_secondary_ratio: f64,
    inlier_fraction: f64,
    max_iterations: usize,
    initial_step: f64,
    max_halvings: usize,
    length_clamp_fraction: f64,
    angle_clamp_deg: f64,
    translation_clamp: f64,
}

impl Default for FitConfigJson {
    fn default() -> Self {
        let cfg = FitConfig::default();
        Self {
            enabled: true,
            basis_angle_deg: cfg.basis_angle.to_degrees(),
            bin_count: cfg.bin_count,
            search_half_width_deg: cfg.search_half_width.to_degrees(),
            min_secondary_ratio: cfg.min_secondary_ratio,
            inlier_fraction: cfg.inlier_fraction,
            max_iterations: cfg.max_iterations,
            initial_step: cfg.initial_step,
            max_halvings: cfg.max_halvings,
            length_clamp_fraction: cfg.length_clamp_fraction,
            angle_clamp_deg: cfg.angle_clamp.to_degrees(),
            translation_clamp: cfg.translation_clamp,
        }
    }
}

impl From<&FitConfigJson> for FitConfig {
    fn from(value: &FitConfigJson) -> Self {
        Self {
            basis_angle: value.basis_angle_deg.to_radians(),
            bin_count: value.bin_count,
            search_half_width: value.search_half_width_deg.to_radians(),
            min_secondary_ratio: value.min_secondary_ratio,
            inlier_fraction: value.inlier_fraction,
            max_iterations: value.max_iterations,
            initial_step: value.initial_step,
            max_halvings: value.max_halvings,
            length_clamp_fraction: value.length_clamp_fraction,
            angle_clamp: value.angle_clamp_deg.to_radians(),
            translation_clamp: value.translation_clamp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    /// Image to detect grid points in.
    image_path: Option<String>,
    /// JSON array of `{"x": .., "y": ..}` points; skips detection.
    points_path: Option<String>,
    /// Canvas size for fitting a point file; taken from the image otherwise.
    canvas_width: Option<usize>,
    canvas_height: Option<usize>,
    output_path: Option<String>,
    detect: DetectConfigJson,
    fit: FitConfigJson,
}

#[derive(Debug, Deserialize, Serialize)]
struct PointRecord {
    x: usize,
    y: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f32>,
}

impl From<&PointRecord> for Point2D {
    fn from(value: &PointRecord) -> Self {
        Point2D::new(value.x, value.y)
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    threshold: f32,
    foreground: usize,
    raw_count: usize,
    merged_count: usize,
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        Self {
            threshold: value.threshold,
            foreground: value.foreground,
            raw_count: value.raw_count,
            merged_count: value.merged_count,
        }
    }
}

#[derive(Debug, Serialize)]
struct LatticeRecord {
    a: f64,
    alpha_deg: f64,
    b: f64,
    beta_deg: f64,
    tx: f64,
    ty: f64,
    inliers: usize,
    initial_loss: f64,
    final_loss: f64,
    iterations: usize,
}

impl From<FitResult> for LatticeRecord {
    fn from(value: FitResult) -> Self {
        Self {
            a: value.lattice.a,
            alpha_deg: value.lattice.alpha.to_degrees(),
            b: value.lattice.b,
            beta_deg: value.lattice.beta.to_degrees(),
            tx: value.tx,
            ty: value.ty,
            inliers: value.inliers,
            initial_loss: value.initial_loss,
            final_loss: value.final_loss,
            iterations: value.iterations,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    points: Vec<PointRecord>,
    detection: Option<DetectionRecord>,
    lattice: Option<LatticeRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("gridfit=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;

    let (points, detection, canvas) = match (&config.image_path, &config.points_path) {
        (_, Some(points_path)) => {
            let records: Vec<PointRecord> = serde_json::from_str(&fs::read_to_string(points_path)?)?;
            let canvas = match (&config.image_path, config.canvas_width, config.canvas_height) {
                (_, Some(w), Some(h)) => (w, h),
                (Some(image_path), _, _) => {
                    let image = load_intensity_field(image_path)?;
                    (image.width(), image.height())
                }
                _ => return Err("canvas_width/canvas_height or image_path must be set".into()),
            };
            (records, None, canvas)
        }
        (Some(image_path), None) => {
            let image = load_intensity_field(image_path)?;
            let detector = GridDetector::new(config.detect.into())?;
            let detection = detector.detect(&image);
            let records = detection
                .peaks
                .iter()
                .map(|p| PointRecord {
                    x: p.x,
                    y: p.y,
                    value: Some(p.value),
                })
                .collect();
            (records, Some(DetectionRecord::from(&detection)), (image.width(), image.height()))
        }
        (None, None) => return Err("image_path or points_path must be set in the config".into()),
    };

    let lattice = if config.fit.enabled {
        let fitter = LatticeFitter::new(FitConfig::from(&config.fit))?;
        let pts: Vec<Point2D> = points.iter().map(Point2D::from).collect();
        fitter.fit(&pts, canvas.0, canvas.1).map(LatticeRecord::from)
    } else {
        None
    };

    let output = Output {
        points,
        detection,
        lattice,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

// src/main.rs

mod calibration;
mod cli;
mod cone_detection;
mod config;
mod error;
mod frame;
mod frame_source;
mod ground_truth;
mod output;
mod overlay;
mod performance;
mod pipeline;
mod segmentation;
mod steering;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use frame_source::{FrameSource, VideoFrameSource};
use ground_truth::GroundTruthCell;
use output::SteeringWriter;
use performance::RunSummary;
use pipeline::SteeringPipeline;
use std::io::Write;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "cone_steering=debug"
    } else {
        "cone_steering=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    info!("🚗 Cone steering starting");

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config);
    config.validate()?;
    info!("✓ Configuration loaded");
    info!(
        "Frame {}x{}, right ROI {}, center ROI {}, calibration window {}",
        config.frame.width,
        config.frame.height,
        config.rois.right,
        config.rois.center,
        config.calibration.window
    );
    info!(
        "Steering: right={:.3} left={:.3} bounds=[{:.2}, {:.2}] rule={:?}, tolerance={:?}",
        config.steering.turn_right,
        config.steering.turn_left,
        config.steering.min,
        config.steering.max,
        config.steering.update_rule,
        config.performance.tolerance
    );

    let ground_truth = GroundTruthCell::new();
    let runtime = tokio::runtime::Runtime::new()?;
    match &args.ground_truth {
        Some(addr) => {
            let socket = runtime.block_on(ground_truth::bind_listener(addr))?;
            runtime.spawn(ground_truth::run_listener(socket, ground_truth.clone()));
        }
        None => warn!("⚠️  No ground-truth source configured, scoring against 0.0"),
    }

    let mut source = VideoFrameSource::open(&args.source)?;
    let pipeline = SteeringPipeline::new(&config).with_diagnostics(args.verbose);
    let stdout = std::io::stdout();
    let writer = SteeringWriter::new(stdout.lock(), config.output.group_id.clone());
    let diagnostics = args.verbose.then(|| Diagnostics::from_config(&config));

    let summary = process_stream(&mut source, pipeline, &ground_truth, writer, diagnostics)?;

    info!("\n✓ Stream processed");
    info!("  Total frames: {}", summary.total_frames);
    info!(
        "  Within tolerance: {} ({:.1}%)",
        summary.frames_within_tolerance, summary.percentage
    );
    info!("  Direction: {}", summary.direction.as_str());
    info!("  Processing speed: {:.1} FPS", summary.fps);
    if summary.passed {
        info!("  ✅ Performance at or above {:.0}%", summary.pass_mark);
    } else {
        warn!("  ⚠️  Performance below {:.0}%", summary.pass_mark);
    }
    info!("{}", serde_json::to_string(&summary)?);

    // no pending work to drain; dropping the runtime stops the listener
    runtime.shutdown_background();
    Ok(())
}

/// What verbose mode needs to draw.
struct Diagnostics {
    center: types::Roi,
    min_area: f64,
    edge_prepass: Option<types::CannyThresholds>,
    pass_mark: f64,
}

impl Diagnostics {
    fn from_config(config: &Config) -> Self {
        Self {
            center: config.rois.center,
            min_area: config.detection.min_contour_area,
            edge_prepass: config.detection.edge_prepass,
            pass_mark: config.performance.pass_mark,
        }
    }

    fn show(&self, frame: &frame::Frame, report: &pipeline::FrameReport) -> Result<()> {
        for (label, mask) in &report.masks {
            let img = overlay::contour_image(mask, self.min_area, self.edge_prepass)?;
            overlay::show(label, &img)?;
        }
        let img = overlay::render(frame, &self.center, report, self.pass_mark)?;
        overlay::show(overlay::MAIN_WINDOW, &img)
    }
}

/// Main loop: one frame end to end, then the next, until the source runs dry.
fn process_stream<S: FrameSource, W: Write>(
    source: &mut S,
    mut pipeline: SteeringPipeline,
    ground_truth: &GroundTruthCell,
    mut writer: SteeringWriter<W>,
    diagnostics: Option<Diagnostics>,
) -> Result<RunSummary> {
    while let Some(frame) = source.wait()? {
        let actual = ground_truth.latest();
        let report = pipeline.process(&frame, actual)?;
        writer.write(report.timestamp_us, report.angle)?;

        if let Some(diag) = &diagnostics {
            diag.show(&frame, &report)?;
        }
    }

    info!("Wrote {} steering line(s)", writer.lines());
    Ok(pipeline.summary())
}

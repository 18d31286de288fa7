// src/overlay.rs
//
// Verbose-mode visualization. Reads the frame and the finished FrameReport,
// draws, and shows. Nothing here ever feeds back into the pipeline.

use crate::cone_detection::trace_contours;
use crate::frame::Frame;
use crate::pipeline::FrameReport;
use crate::segmentation::Mask;
use crate::steering::SteeringOutcome;
use crate::types::{CannyThresholds, ConeObservation, Roi};
use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar},
    highgui,
    imgproc,
    prelude::*,
};

pub const MAIN_WINDOW: &str = "Main";

/// BGR colors used for drawing.
pub mod colors {
    use opencv::core::Scalar;

    pub const ROI_FILL: Scalar = Scalar::new(0.0, 0.0, 255.0, 128.0);
    pub const TEXT_OK: Scalar = Scalar::new(154.0, 250.0, 0.0, 0.0);
    pub const TEXT_BAD: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
    pub const CONTOUR_FILL: Scalar = Scalar::new(255.0, 0.0, 0.0, 0.0);
}

pub const ROI_ALPHA: f64 = 0.5;

pub fn performance_message(percentage: f64, pass_mark: f64) -> (String, bool) {
    let passed = percentage >= pass_mark;
    let message = if passed {
        format!("Performance: {:.6}%", percentage)
    } else {
        format!(
            "Performance: {:.6}% (Insufficient frames within range)",
            percentage
        )
    };
    (message, passed)
}

/// `Frame 12 CLOCKWISE | blue 840px | steer +0.025`, listing only the checks
/// that actually ran this frame.
pub fn checks_line(report: &FrameReport) -> String {
    let mut line = format!(
        "Frame {} {}",
        report.frame_index,
        report.direction.as_str()
    );
    let checks = [
        ("right yellow", &report.calibration),
        ("blue", &report.blue),
        ("yellow", &report.yellow),
    ];
    for (label, obs) in checks {
        if let Some(obs) = obs {
            line.push_str(&format!(" | {} {}", label, describe(obs)));
        }
    }
    match report.steering {
        Some(SteeringOutcome::Corrected { delta }) => {
            line.push_str(&format!(" | steer {:+.3}", delta))
        }
        Some(SteeringOutcome::Held) => line.push_str(" | held"),
        Some(SteeringOutcome::Reset) => line.push_str(" | reset"),
        None => {}
    }
    line
}

fn describe(obs: &ConeObservation) -> String {
    if obs.found {
        format!("{:.0}px", obs.max_area)
    } else {
        "-".to_string()
    }
}

/// Annotated copy of the frame: translucent center ROI plus the text lines.
pub fn render(frame: &Frame, center: &Roi, report: &FrameReport, pass_mark: f64) -> Result<Mat> {
    let mut img = frame.to_bgr_mat()?;

    let lines = [
        format!("Calculated Ground Steering: {:.6}", report.angle),
        format!("Actual Ground Steering: {}", report.actual),
        format!("Time Stamp: {}", report.timestamp_us),
        checks_line(report),
    ];
    for (i, text) in lines.iter().enumerate() {
        draw_text(&mut img, text, 80, 50 + 30 * i as i32, colors::TEXT_OK)?;
    }

    let (message, passed) = performance_message(report.evaluation.percentage, pass_mark);
    let color = if passed {
        colors::TEXT_OK
    } else {
        colors::TEXT_BAD
    };
    draw_text(&mut img, &message, 80, 170, color)?;

    let mut overlay = img.try_clone()?;
    imgproc::rectangle(
        &mut overlay,
        center.to_rect(),
        colors::ROI_FILL,
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;

    let mut blended = Mat::default();
    core::add_weighted(
        &overlay,
        ROI_ALPHA,
        &img,
        1.0 - ROI_ALPHA,
        0.0,
        &mut blended,
        -1,
    )?;
    Ok(blended)
}

/// Black canvas with every contour over `min_area` filled in.
pub fn contour_image(
    mask: &Mask,
    min_area: f64,
    edge_prepass: Option<CannyThresholds>,
) -> Result<Mat> {
    let contours = trace_contours(mask, edge_prepass)?;
    let mut canvas =
        Mat::new_rows_cols_with_default(mask.rows(), mask.cols(), core::CV_8UC3, Scalar::all(0.0))?;

    for (i, contour) in contours.iter().enumerate() {
        if imgproc::contour_area_def(&contour)? > min_area {
            imgproc::draw_contours(
                &mut canvas,
                &contours,
                i as i32,
                colors::CONTOUR_FILL,
                imgproc::FILLED,
                imgproc::LINE_8,
                &core::no_array(),
                i32::MAX,
                Point::new(0, 0),
            )?;
        }
    }
    Ok(canvas)
}

pub fn show(window: &str, img: &Mat) -> Result<()> {
    highgui::imshow(window, img)?;
    highgui::wait_key(1)?;
    Ok(())
}

fn draw_text(img: &mut Mat, text: &str, x: i32, y: i32, color: Scalar) -> Result<()> {
    imgproc::put_text(
        img,
        text,
        Point::new(x, y),
        imgproc::FONT_HERSHEY_DUPLEX,
        0.5,
        color,
        1,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

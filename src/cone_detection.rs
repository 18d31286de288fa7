// src/cone_detection.rs

use crate::segmentation::Mask;
use crate::types::{CannyThresholds, ConeColor, ConeObservation, DetectionConfig};
use anyhow::Result;
use opencv::{
    core::{Point, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

pub type Contours = Vector<Vector<Point>>;

/// Decides cone presence from a mask.
///
/// A cone is present when at least one traced contour encloses strictly more
/// than `min_area` px². Qualifying contours are OR-ed, never summed, so a
/// cone split into several fragments still reads as one "found".
#[derive(Debug, Clone, Copy)]
pub struct ConeDetector {
    min_area: f64,
    edge_prepass: Option<CannyThresholds>,
}

impl ConeDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_area: config.min_contour_area,
            edge_prepass: config.edge_prepass,
        }
    }

    pub fn detect(&self, mask: &Mask, color: ConeColor) -> Result<ConeObservation> {
        let contours = trace_contours(mask, self.edge_prepass)?;

        let mut qualifying = 0usize;
        let mut max_area = 0.0f64;
        for contour in contours.iter() {
            let area = imgproc::contour_area_def(&contour)?;
            max_area = max_area.max(area);
            if area > self.min_area {
                qualifying += 1;
            }
        }

        let observation = ConeObservation {
            color,
            found: qualifying > 0,
            contours: contours.len(),
            qualifying,
            max_area,
        };

        debug!(
            "{} check: {} contour(s), {} over {:.0}px², max area {:.1}",
            color.as_str(),
            observation.contours,
            observation.qualifying,
            self.min_area,
            observation.max_area
        );

        Ok(observation)
    }
}

/// Boundary-traces every connected foreground region of the mask, optionally
/// after a Canny edge pass.
pub fn trace_contours(mask: &Mask, edge_prepass: Option<CannyThresholds>) -> Result<Contours> {
    let mut contours = Contours::new();

    match edge_prepass {
        Some(canny) => {
            let mut edges = opencv::core::Mat::default();
            imgproc::canny_def(mask.as_mat(), &mut edges, canny.low, canny.high)?;
            imgproc::find_contours_def(
                &edges,
                &mut contours,
                imgproc::RETR_TREE,
                imgproc::CHAIN_APPROX_SIMPLE,
            )?;
        }
        None => {
            imgproc::find_contours_def(
                mask.as_mat(),
                &mut contours,
                imgproc::RETR_TREE,
                imgproc::CHAIN_APPROX_SIMPLE,
            )?;
        }
    }

    Ok(contours)
}

// src/segmentation.rs
//
// Color segmentation of a cropped region into a binary cone mask.
//
// Stages, in order:
//   1. BGR -> HSV
//   2. inRange against the cone's ColorRange
//   3. Gaussian blur to knock down speckle
//   4. dilate then erode (default 3x3 kernel) to close gaps inside a cone
//      while dropping isolated noise pixels

use crate::types::{ColorRange, SegmentationConfig};
use anyhow::{bail, Result};
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    imgproc,
    prelude::*,
};

/// Single-channel 8-bit mask. Non-zero pixels are foreground.
#[derive(Debug)]
pub struct Mask(Mat);

impl Mask {
    pub fn from_mat(mat: Mat) -> Result<Self> {
        if mat.typ() != core::CV_8UC1 {
            bail!("mask must be CV_8UC1, got type {}", mat.typ());
        }
        Ok(Self(mat))
    }

    /// Builds a mask from row-major bytes.
    #[cfg(test)]
    pub fn from_bytes(rows: i32, cols: i32, bytes: &[u8]) -> Result<Self> {
        if rows <= 0 || cols <= 0 || bytes.len() != rows as usize * cols as usize {
            bail!(
                "mask of {}x{} cannot be built from {} bytes",
                cols,
                rows,
                bytes.len()
            );
        }
        let mut mat = Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC1, Scalar::all(0.0))?;
        mat.data_bytes_mut()?.copy_from_slice(bytes);
        Ok(Self(mat))
    }

    pub fn as_mat(&self) -> &Mat {
        &self.0
    }

    pub fn rows(&self) -> i32 {
        self.0.rows()
    }

    pub fn cols(&self) -> i32 {
        self.0.cols()
    }

    #[cfg(test)]
    pub fn count_set(&self) -> Result<i32> {
        Ok(core::count_non_zero(&self.0)?)
    }
}

/// Stateless: the same region and range always give the same mask.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    blur_kernel: i32,
    blur_sigma: f64,
    morph_iterations: i32,
}

impl Segmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            blur_sigma: config.blur_sigma,
            morph_iterations: config.morph_iterations,
        }
    }

    pub fn segment(&self, region_bgr: &Mat, range: &ColorRange) -> Result<Mask> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(region_bgr, &mut hsv, imgproc::COLOR_BGR2HSV)?;

        let mut in_range = Mat::default();
        core::in_range(
            &hsv,
            &range.lower_scalar(),
            &range.upper_scalar(),
            &mut in_range,
        )?;

        let mut blurred = Mat::default();
        imgproc::gaussian_blur_def(
            &in_range,
            &mut blurred,
            Size::new(self.blur_kernel, self.blur_kernel),
            self.blur_sigma,
        )?;

        // An empty kernel means OpenCV's 3x3 rectangle.
        let kernel = Mat::default();
        let anchor = Point::new(-1, -1);
        let border_value = imgproc::morphology_default_border_value()?;

        let mut dilated = Mat::default();
        imgproc::dilate(
            &blurred,
            &mut dilated,
            &kernel,
            anchor,
            self.morph_iterations,
            core::BORDER_CONSTANT,
            border_value,
        )?;

        let mut eroded = Mat::default();
        imgproc::erode(
            &dilated,
            &mut eroded,
            &kernel,
            anchor,
            self.morph_iterations,
            core::BORDER_CONSTANT,
            border_value,
        )?;

        Mask::from_mat(eroded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::types::{ColorConfig, Roi};

    // HSV (22, 150, 220) and (111, 217, 200) in OpenCV units.
    const YELLOW_BGRA: [u8; 4] = [91, 186, 220, 255];
    const BLUE_BGRA: [u8; 4] = [200, 80, 30, 255];

    fn segmenter() -> Segmenter {
        Segmenter::new(&SegmentationConfig::default())
    }

    fn region_with_patch(color: [u8; 4]) -> Mat {
        let mut frame = Frame::filled(40, 40, [0, 0, 0, 255], 0);
        frame.paint(Roi::new(10, 10, 20, 20), color);
        frame.to_bgr_mat().unwrap()
    }

    #[test]
    fn test_yellow_patch_is_segmented() {
        let colors = ColorConfig::default();
        let mask = segmenter()
            .segment(&region_with_patch(YELLOW_BGRA), &colors.yellow)
            .unwrap();

        assert_eq!(mask.rows(), 40);
        assert_eq!(mask.cols(), 40);
        let set = mask.count_set().unwrap();
        assert!(set >= 300, "expected patch to survive, got {} pixels", set);
        assert_eq!(mask.as_mat().at_2d::<u8>(0, 0).copied().unwrap(), 0);
    }

    #[test]
    fn test_blue_patch_ignored_by_yellow_range() {
        let colors = ColorConfig::default();
        let mask = segmenter()
            .segment(&region_with_patch(BLUE_BGRA), &colors.yellow)
            .unwrap();
        assert_eq!(mask.count_set().unwrap(), 0);
    }

    #[test]
    fn test_blue_patch_is_segmented() {
        let colors = ColorConfig::default();
        let mask = segmenter()
            .segment(&region_with_patch(BLUE_BGRA), &colors.blue)
            .unwrap();
        assert!(mask.count_set().unwrap() >= 300);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let colors = ColorConfig::default();
        let region = region_with_patch(YELLOW_BGRA);
        let a = segmenter().segment(&region, &colors.yellow).unwrap();
        let b = segmenter().segment(&region, &colors.yellow).unwrap();
        assert_eq!(
            a.as_mat().data_bytes().unwrap(),
            b.as_mat().data_bytes().unwrap()
        );
    }

    #[test]
    fn test_mask_from_bytes_checks_length() {
        assert!(Mask::from_bytes(2, 2, &[0, 255, 0]).is_err());
        let mask = Mask::from_bytes(2, 2, &[0, 255, 0, 255]).unwrap();
        assert_eq!(mask.count_set().unwrap(), 2);
    }
}

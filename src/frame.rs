// src/frame.rs
//
// Owned snapshot of one camera frame. Sources copy out of their own buffers
// into a Frame, so nothing downstream ever aliases capture memory.

use crate::types::Roi;
use anyhow::{bail, Result};
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};

pub const CHANNELS: usize = 4;

/// 4-channel BGRA pixel buffer plus capture timestamp.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: i32,
    height: i32,
    timestamp_us: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: i32, height: i32, timestamp_us: u64) -> Result<Self> {
        if width <= 0 || height <= 0 {
            bail!("frame dimensions must be positive, got {}x{}", width, height);
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            bail!(
                "frame buffer holds {} bytes, {}x{} BGRA needs {}",
                data.len(),
                width,
                height,
                expected
            );
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_us,
        })
    }

    /// Uniformly colored frame.
    pub fn filled(width: i32, height: i32, bgra: [u8; 4], timestamp_us: u64) -> Self {
        let pixels = width.max(0) as usize * height.max(0) as usize;
        Self {
            data: bgra.repeat(pixels),
            width: width.max(0),
            height: height.max(0),
            timestamp_us,
        }
    }

    /// Paints `roi` (clipped to the frame) with a solid color.
    pub fn paint(&mut self, roi: Roi, bgra: [u8; 4]) {
        let x0 = roi.x.clamp(0, self.width) as usize;
        let y0 = roi.y.clamp(0, self.height) as usize;
        let x1 = roi.x.saturating_add(roi.width).clamp(0, self.width) as usize;
        let y1 = roi.y.saturating_add(roi.height).clamp(0, self.height) as usize;
        let stride = self.width as usize * CHANNELS;

        for y in y0..y1 {
            for x in x0..x1 {
                let idx = y * stride + x * CHANNELS;
                self.data[idx..idx + CHANNELS].copy_from_slice(&bgra);
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    #[cfg(test)]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copies `roi` out of the frame as a 3-channel BGR Mat.
    pub fn crop_bgr(&self, roi: &Roi) -> Result<Mat> {
        if !roi.fits_within(self.width, self.height) {
            bail!(
                "ROI {} lies outside the {}x{} frame",
                roi,
                self.width,
                self.height
            );
        }

        let mut bgra =
            Mat::new_rows_cols_with_default(roi.height, roi.width, core::CV_8UC4, Scalar::all(0.0))?;
        {
            let dst = bgra.data_bytes_mut()?;
            let src_stride = self.width as usize * CHANNELS;
            let row_len = roi.width as usize * CHANNELS;
            for row in 0..roi.height as usize {
                let src_start = (roi.y as usize + row) * src_stride + roi.x as usize * CHANNELS;
                let dst_start = row * row_len;
                dst[dst_start..dst_start + row_len]
                    .copy_from_slice(&self.data[src_start..src_start + row_len]);
            }
        }

        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&bgra, &mut bgr, imgproc::COLOR_BGRA2BGR)?;
        Ok(bgr)
    }

    /// Whole frame as a 3-channel BGR Mat, used for drawing.
    pub fn to_bgr_mat(&self) -> Result<Mat> {
        self.crop_bgr(&Roi::new(0, 0, self.width, self.height))
    }
}

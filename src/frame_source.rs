// src/frame_source.rs

use crate::frame::Frame;
use anyhow::{bail, Result};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
#[cfg(test)]
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Blocking supplier of frames. `Ok(None)` means the source is exhausted.
pub trait FrameSource {
    fn wait(&mut self) -> Result<Option<Frame>>;
}

/// Video file or camera device read through OpenCV.
pub struct VideoFrameSource {
    cap: VideoCapture,
    live: bool,
    frames_read: u64,
}

impl VideoFrameSource {
    /// A purely numeric `source` opens that camera index, anything else is a
    /// file path or stream URL.
    pub fn open(source: &str) -> Result<Self> {
        let (cap, live) = match source.parse::<i32>() {
            Ok(index) => {
                info!("Opening camera {}", index);
                (VideoCapture::new(index, videoio::CAP_ANY)?, true)
            }
            Err(_) => {
                info!("Opening video: {}", source);
                (VideoCapture::from_file(source, videoio::CAP_ANY)?, false)
            }
        };

        if !cap.is_opened()? {
            bail!("Failed to open video source {}", source);
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        info!("Video properties: {}x{} @ {:.1} FPS", width, height, fps);

        Ok(Self {
            cap,
            live,
            frames_read: 0,
        })
    }

    fn timestamp_us(&self) -> Result<u64> {
        if self.live {
            return Ok(SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_micros() as u64)
                .unwrap_or(0));
        }
        let pos_ms = VideoCaptureTraitConst::get(&self.cap, videoio::CAP_PROP_POS_MSEC)?;
        Ok((pos_ms.max(0.0) * 1000.0) as u64)
    }
}

impl FrameSource for VideoFrameSource {
    fn wait(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            info!("Video source exhausted after {} frame(s)", self.frames_read);
            return Ok(None);
        }

        let bgra = match mat.channels() {
            4 => mat,
            3 => {
                let mut out = Mat::default();
                imgproc::cvt_color_def(&mat, &mut out, imgproc::COLOR_BGR2BGRA)?;
                out
            }
            1 => {
                let mut out = Mat::default();
                imgproc::cvt_color_def(&mat, &mut out, imgproc::COLOR_GRAY2BGRA)?;
                out
            }
            n => bail!("unsupported channel count {}", n),
        };

        let bgra = if bgra.is_continuous() {
            bgra
        } else {
            bgra.try_clone()?
        };

        self.frames_read += 1;
        let frame = Frame::new(
            bgra.data_bytes()?.to_vec(),
            bgra.cols(),
            bgra.rows(),
            self.timestamp_us()?,
        )?;
        Ok(Some(frame))
    }
}

/// Hands out frames prepared in memory, then reports exhaustion.
#[cfg(test)]
pub struct ReplaySource {
    frames: VecDeque<Frame>,
}

#[cfg(test)]
impl ReplaySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

#[cfg(test)]
impl FrameSource for ReplaySource {
    fn wait(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

// src/cli.rs

use crate::types::Config;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "cone-steering",
    about = "Estimates steering from cone sightings in a frame stream and scores it against ground truth"
)]
pub struct Args {
    /// Video file, stream URL, or camera index
    #[arg(long)]
    pub source: String,

    /// YAML file overriding the built-in tuning
    #[arg(long)]
    pub config: Option<String>,

    /// Expected frame width in pixels
    #[arg(long)]
    pub width: Option<i32>,

    /// Expected frame height in pixels
    #[arg(long)]
    pub height: Option<i32>,

    /// UDP address to receive ground-truth steering on, e.g. 0.0.0.0:5009
    #[arg(long)]
    pub ground_truth: Option<String>,

    /// Group id printed at the start of every output line
    #[arg(long)]
    pub group: Option<String>,

    /// Show the annotated frame and per-check contour windows
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    /// Command-line values win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.frame.width = width;
        }
        if let Some(height) = self.height {
            config.frame.height = height;
        }
        if let Some(group) = &self.group {
            config.output.group_id = group.clone();
        }
    }
}

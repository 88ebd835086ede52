use std::path::{Path, PathBuf};

use anyhow::Result;
use image::GrayImage;

use crate::detection::{Stage, StageObserver};
use crate::models::{Frame, Player};

/// Writes intermediate pipeline images to a directory, one subdirectory
/// per stage, one PNG per player.
pub struct DebugDump {
    output_dir: PathBuf,
    saved: usize,
}

impl DebugDump {
    /// Use `output_dir` for debug images. The directory must be empty or
    /// not exist yet.
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            saved: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of images written so far.
    pub fn saved(&self) -> usize {
        self.saved
    }

    pub fn save_input(&mut self, frame: &Frame) -> Result<()> {
        self.save("00_input", "frame.png", frame.image())
    }

    fn save(&mut self, dir_name: &str, file_name: &str, image: &GrayImage) -> Result<()> {
        let dir = self.output_dir.join(dir_name);
        std::fs::create_dir_all(&dir)?;
        image
            .save(dir.join(file_name))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        self.saved += 1;
        log::debug!("saved {dir_name}/{file_name}");
        Ok(())
    }
}

impl StageObserver for DebugDump {
    fn observe(&mut self, stage: Stage, player: Player, image: &GrayImage) {
        let file_name = format!("p{}.png", player.number());
        if let Err(e) = self.save(stage.dir_name(), &file_name, image) {
            log::warn!("{e:#}");
        }
    }
}

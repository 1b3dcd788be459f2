//! 帧标注 - 把纠正后的单词烧录到覆盖帧的副本上

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::draw_text_mut;
use log::warn;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use super::reconstruct::CorrectedWord;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid font data: {0}")]
    Font(String),
}

static FRAME_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"frame_(\d+)").unwrap());

#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    pub color: Rgb<u8>,
    pub margin: i32,
    /// Pixel height of the overlay text at scale factor 1.0.
    pub base_scale: f32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            margin: 20,
            base_scale: 32.0,
        }
    }
}

/// Burns corrected words into copies of their covering frames.
///
/// Originals are never touched; annotated copies keep the source file
/// name under the output directory. Missing or unreadable frames are
/// skipped with a log line, never aborting the batch.
pub struct FrameAnnotator {
    font: FontVec,
    config: AnnotatorConfig,
}

impl FrameAnnotator {
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, AnnotateError> {
        let font = FontVec::try_from_vec(bytes).map_err(|err| AnnotateError::Font(err.to_string()))?;
        Ok(Self {
            font,
            config: AnnotatorConfig::default(),
        })
    }

    pub fn from_font_path(path: impl AsRef<Path>) -> Result<Self, AnnotateError> {
        Self::from_font_bytes(fs::read(path)?)
    }

    pub fn with_config(mut self, config: AnnotatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Annotate every frame covered by a corrected word.
    ///
    /// Returns the number of frames successfully written. Words run in
    /// parallel; their frame ranges never overlap by construction.
    pub fn annotate_all(
        &self,
        frames_dir: &Path,
        words: &[CorrectedWord],
        output_dir: &Path,
    ) -> Result<usize, AnnotateError> {
        fs::create_dir_all(output_dir)?;
        let index = index_frames(frames_dir)?;

        let annotated = words
            .par_iter()
            .map(|word| {
                let mut count = 0usize;
                for frame in word.start_frame..=word.end_frame {
                    let path = match index.get(&frame) {
                        Some(path) => path,
                        None => continue,
                    };
                    if self.annotate_one(path, &word.text, output_dir) {
                        count += 1;
                    }
                }
                count
            })
            .sum();

        Ok(annotated)
    }

    fn annotate_one(&self, path: &Path, text: &str, output_dir: &Path) -> bool {
        let image = match image::open(path) {
            Ok(image) => image,
            Err(err) => {
                warn!("skipping unreadable frame {:?}: {}", path, err);
                return false;
            }
        };
        let mut canvas = image.into_rgb8();
        let (width, height) = canvas.dimensions();

        // bottom-left placement, scaled to frame width
        let factor = (width as f32 / 800.0).clamp(0.6, 1.2);
        let scale = PxScale::from(factor * self.config.base_scale);
        let x = self.config.margin;
        let y = (height as i32 - self.config.margin - scale.y as i32).max(0);

        draw_text_mut(&mut canvas, self.config.color, x, y, scale, &self.font, text);

        let file_name = match path.file_name() {
            Some(name) => name,
            None => return false,
        };
        let out_path = output_dir.join(file_name);
        match canvas.save(&out_path) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to write annotated frame {:?}: {}", out_path, err);
                false
            }
        }
    }
}

/// Map frame numbers to image paths in a capture directory.
///
/// Accepts `frame_<n>_<timestamp>.jpg` and plain `frame_<n>.png`
/// names; sidecar files like `frame_<n>_meta.json` are ignored.
pub fn index_frames(dir: &Path) -> Result<HashMap<u64, PathBuf>, AnnotateError> {
    let mut index = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let is_image = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("jpg") | Some("jpeg") | Some("png")
        );
        if !is_image {
            continue;
        }
        let captures = match FRAME_NUMBER.captures(name) {
            Some(captures) => captures,
            None => continue,
        };
        if let Ok(number) = captures[1].parse::<u64>() {
            index.insert(number, path);
        }
    }
    Ok(index)
}

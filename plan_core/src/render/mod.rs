//! # Rendering
//!
//! ```text
//! FloorPlan ──render_floor──> Drawing ──SvgBackend────> .svg
//!                                     └──RasterBackend─> .png
//! ```
//!
//! [`renderer`] decides every line, arc and label; a [`Backend`] only
//! interprets the resulting command list. File output goes through a scoped
//! writer that removes the partial file if anything fails before it is
//! committed.

pub mod commands;
pub mod raster;
pub mod renderer;
pub mod svg;

pub use commands::{Color, DrawCommand, Drawing, Layer, Stroke, TextAnchor};
pub use raster::RasterBackend;
pub use renderer::{render_floor, RenderConfig, Transform};
pub use svg::SvgBackend;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::design::Design;
use crate::errors::{PlanError, PlanResult};
use crate::floor_plan::floor_label;

/// Interprets a [`Drawing`] into a concrete output.
pub trait Backend {
    type Output;

    fn render(&self, drawing: &Drawing) -> PlanResult<Self::Output>;
}

/// File format for a rendered floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Svg, OutputFormat::Png];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }

    pub fn from_str_flexible(s: &str) -> PlanResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" | "raster" => Ok(OutputFormat::Png),
            _ => Err(PlanError::invalid_input("format", s, "Expected svg or png")),
        }
    }
}

// ============================================================================
// Scoped output
// ============================================================================

/// Output file that is deleted on drop unless committed.
struct OutputFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl OutputFile {
    fn create(path: &Path) -> PlanResult<Self> {
        let file = File::create(path)
            .map_err(|e| PlanError::file_error("create", path.display().to_string(), e.to_string()))?;
        Ok(OutputFile {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    fn io_error(&self, operation: &str, e: impl ToString) -> PlanError {
        PlanError::file_error(operation, self.path.display().to_string(), e.to_string())
    }

    /// Flush and sync; the file is kept from here on.
    fn commit(mut self) -> PlanResult<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|e| self.io_error("flush", e.error()))?;
        file.sync_all().map_err(|e| self.io_error("sync", e))?;
        // nothing left to clean up once the writer is gone
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        self.writer.take();
        if fs::remove_file(&self.path).is_ok() {
            tracing::warn!(path = %self.path.display(), "Removed partial drawing");
        }
    }
}

/// Render `drawing` with the backend for `format` and write it to `path`.
pub fn write_drawing(drawing: &Drawing, path: &Path, format: OutputFormat) -> PlanResult<()> {
    let mut out = OutputFile::create(path)?;
    let Some(writer) = out.writer.as_mut() else {
        return Err(out.io_error("write", "output already closed"));
    };
    let written = match format {
        OutputFormat::Svg => {
            let svg = SvgBackend::default().render(drawing)?;
            writer.write_all(svg.as_bytes()).map_err(|e| e.to_string())
        }
        OutputFormat::Png => {
            let raster = RasterBackend.render(drawing)?;
            raster.write_to(writer, image::ImageFormat::Png).map_err(|e| e.to_string())
        }
    };
    if let Err(reason) = written {
        return Err(out.io_error("write", reason));
    }
    out.commit()?;
    tracing::info!(path = %path.display(), format = format.extension(), "Drawing written");
    Ok(())
}

/// File stem for a floor: "ground_floor_plan", "first_floor_plan", ...
pub fn floor_file_stem(index: usize) -> String {
    format!("{}_plan", floor_label(index).to_lowercase().replace(' ', "_"))
}

/// Render every floor of a design into `out_dir`, one file per floor and
/// format. Floors render in parallel; paths come back in floor order.
pub fn render_design(
    design: &Design,
    config: &RenderConfig,
    out_dir: &Path,
    formats: &[OutputFormat],
) -> PlanResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .map_err(|e| PlanError::file_error("create_dir", out_dir.display().to_string(), e.to_string()))?;
    let facing = design.input.facing;

    let per_floor: Vec<PlanResult<Vec<PathBuf>>> = design
        .floors
        .par_iter()
        .map(|floor| {
            let drawing = render_floor(floor, facing, config)?;
            formats
                .iter()
                .map(|format| {
                    let path = out_dir.join(format!("{}.{}", floor_file_stem(floor.floor_index()), format.extension()));
                    write_drawing(&drawing, &path, *format)?;
                    Ok(path)
                })
                .collect()
        })
        .collect();

    let mut paths = Vec::new();
    for floor in per_floor {
        paths.extend(floor?);
    }
    Ok(paths)
}

//! The full image-to-classification pipeline and its result surface.
//!
//! Stage order: preprocess → segment → clean outlines → extract somas, with
//! path classification independent of the segmentation branch, then mask
//! fusion and graph construction. Each stage is a pure function of its
//! inputs; a failed stage aborts the whole run with no partial results.

use std::path::Path;

use image::{GrayImage, RgbImage};
use log::info;
use serde::Serialize;

use crate::classify::{self, ClassificationMap};
use crate::error::{Error, Result};
use crate::graph::PixelGraph;
use crate::outline;
use crate::paths;
use crate::preprocess;
use crate::segment;
use crate::soma::{self, Soma};

/// Gaussian kernel radius used by the preprocessing stage.
pub const BLUR_RADIUS: u32 = 3;

/// Every stage-boundary raster, retained so the persistence layer can write
/// its inspection images.
#[derive(Debug, Clone)]
pub struct Intermediates {
    pub smoothed: GrayImage,
    pub segmented: RgbImage,
    pub outlines: GrayImage,
    pub soma_mask: GrayImage,
    pub path_mask: GrayImage,
}

/// The complete result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub classification: ClassificationMap,
    pub rendered: RgbImage,
    pub somas: Vec<Soma>,
    pub graph: PixelGraph,
    pub intermediates: Intermediates,
}

/// The exportable result summary: soma count plus each soma's contour as an
/// array of `[x, y]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub num_cells: usize,
    pub cell_contours: Vec<Vec<[i32; 2]>>,
}

impl Analysis {
    pub fn soma_count(&self) -> usize {
        self.somas.len()
    }

    /// Each soma's ordered boundary points as `[x, y]` pairs, in discovery
    /// order.
    pub fn soma_contours(&self) -> Vec<Vec<[i32; 2]>> {
        self.somas
            .iter()
            .map(|s| s.contour().iter().map(|p| [p.x, p.y]).collect())
            .collect()
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            num_cells: self.soma_count(),
            cell_contours: self.soma_contours(),
        }
    }
}

/// Decodes an RGB raster from encoded image bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the bytes cannot be decoded or the
/// decoded image has a zero dimension.
pub fn load_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| Error::InvalidImage(e.to_string()))?;
    nonzero(decoded.to_rgb8())
}

/// Reads and decodes an RGB raster from a file.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the file cannot be read or decoded, or
/// the decoded image has a zero dimension.
pub fn open_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let decoded = image::open(path).map_err(|e| Error::InvalidImage(e.to_string()))?;
    nonzero(decoded.to_rgb8())
}

fn nonzero(raster: RgbImage) -> Result<RgbImage> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage(format!(
            "zero-dimension raster ({width}x{height})"
        )));
    }
    Ok(raster)
}

/// Runs the whole pipeline on a raw raster.
///
/// Synchronous; produces the classification map, its rendering, the soma
/// list, the pixel graph, and all stage-boundary intermediates. Zero somas
/// and an all-background map are valid outcomes.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] for a zero-dimension input (before any
/// stage executes) and [`Error::InternalInconsistency`] if any stage hands a
/// mis-shaped intermediate downstream.
pub fn analyze(raster: &RgbImage) -> Result<Analysis> {
    let dims = raster.dimensions();

    let smoothed = preprocess::grayscale_blur(raster, BLUR_RADIUS)?;

    let segmented = segment::segment(&smoothed);
    check_dims("segment", dims, segmented.dimensions())?;

    let outlines = outline::clean_outlines(&segmented);
    check_dims("clean_outlines", dims, outlines.dimensions())?;

    let (soma_mask, somas) = soma::extract_somas(&outlines);
    check_dims("extract_somas", dims, soma_mask.dimensions())?;

    let path_mask = paths::classify_paths(raster);
    check_dims("classify_paths", dims, path_mask.dimensions())?;

    let (classification, rendered) = classify::fuse(&soma_mask, &path_mask)?;
    let graph = PixelGraph::build(&classification);

    info!(
        "analyzed {}x{} raster: {} soma(s), {} graph node(s)",
        dims.0,
        dims.1,
        somas.len(),
        graph.node_count()
    );

    Ok(Analysis {
        classification,
        rendered,
        somas,
        graph,
        intermediates: Intermediates {
            smoothed,
            segmented,
            outlines,
            soma_mask,
            path_mask,
        },
    })
}

fn check_dims(stage: &str, expected: (u32, u32), found: (u32, u32)) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::dimension_mismatch(stage, expected, found))
    }
}

//! Per-pixel classification: mask fusion into a [`ClassificationMap`] and a
//! color-coded rendering.

use image::{GrayImage, RgbImage};
use log::debug;

use crate::color;
use crate::error::{Error, Result};

/// Classification of a single raster coordinate.
///
/// `Unknown` is only the map's pre-fill sentinel; fusion assigns every cell
/// one of the other three values, and the builder verifies that no `Unknown`
/// cell survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelClass {
    Dendrite,
    Soma,
    Background,
    Unknown,
}

/// A dense per-coordinate classification grid, same dimensions as the source
/// raster. Produced once by [`fuse`], read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationMap {
    width: u32,
    height: u32,
    cells: Vec<PixelClass>,
}

impl ClassificationMap {
    fn new(width: u32, height: u32) -> Self {
        ClassificationMap {
            width,
            height,
            cells: vec![PixelClass::Unknown; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Classification at a coordinate, or `None` if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<PixelClass> {
        if x < self.width && y < self.height {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Number of cells with the given classification.
    pub fn count_of(&self, class: PixelClass) -> usize {
        self.cells.iter().filter(|c| **c == class).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// Fuses the soma-region mask and the dendrite-path mask into the final
/// classification and its rendering.
///
/// Priority order per coordinate: soma-mask foreground wins as SOMA, then
/// path-mask foreground as DENDRITE, else BACKGROUND. The rendering uses
/// magenta, white and black respectively.
///
/// # Errors
///
/// Returns [`Error::InternalInconsistency`] if the two masks disagree on
/// dimensions, or if any cell were to remain `Unknown` after fusion.
pub fn fuse(soma_mask: &GrayImage, path_mask: &GrayImage) -> Result<(ClassificationMap, RgbImage)> {
    let (width, height) = soma_mask.dimensions();
    if path_mask.dimensions() != (width, height) {
        return Err(Error::dimension_mismatch(
            "fuse",
            (width, height),
            path_mask.dimensions(),
        ));
    }

    let mut map = ClassificationMap::new(width, height);
    let mut rendered = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let (class, shade) = if soma_mask.get_pixel(x, y)[0] == 255 {
                (PixelClass::Soma, color::SOMA)
            } else if path_mask.get_pixel(x, y)[0] == 255 {
                (PixelClass::Dendrite, color::DENDRITE)
            } else {
                (PixelClass::Background, color::BACKGROUND)
            };
            let i = map.index(x, y);
            map.cells[i] = class;
            rendered.put_pixel(x, y, shade);
        }
    }

    // Unknown is asserted unreachable: the else-branch above is exhaustive.
    // Its survival would mean the fusion loop skipped a cell.
    let unknown = map.count_of(PixelClass::Unknown);
    if unknown > 0 {
        return Err(Error::InternalInconsistency(format!(
            "{unknown} cell(s) left unclassified after fusion"
        )));
    }

    debug!(
        "classified {} soma, {} dendrite, {} background pixels",
        map.count_of(PixelClass::Soma),
        map.count_of(PixelClass::Dendrite),
        map.count_of(PixelClass::Background)
    );
    Ok((map, rendered))
}

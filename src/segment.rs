//! Marker-based watershed segmentation.
//!
//! Separates touching soma regions by growing labeled markers outward from
//! high-confidence seeds until competing growth fronts meet. Meeting pixels
//! become a one-pixel-wide separating boundary, painted over the raster in
//! [`color::BOUNDARY`] for the outline cleaner to pick up.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::{Norm, euclidean_squared_distance_transform};
use imageproc::morphology::{dilate, open};
use imageproc::region_labelling::{Connectivity, connected_components};
use log::debug;

use crate::color;

/// Radius of the elliptical structuring element (a 7x7 kernel).
const KERNEL_RADIUS: u8 = 3;

/// Fraction of the maximum background distance above which a pixel counts as
/// sure foreground.
const SURE_FG_FRACTION: f64 = 0.7;

/// Marker value of pixels still awaiting flood resolution.
const UNRESOLVED: u32 = 0;

/// Marker value of pixels where two growth fronts met. Never reassigned.
const BOUNDARY: u32 = u32::MAX;

const OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Runs marker-based watershed segmentation over the smoothed raster.
///
/// Every pixel of the output keeps its grayscale value except watershed
/// boundary pixels, which are overwritten with [`color::BOUNDARY`]. An input
/// with no sufficiently bright content produces no markers and therefore no
/// boundary pixels.
pub fn segment(smoothed: &GrayImage) -> RgbImage {
    let (width, height) = smoothed.dimensions();

    // Not-background band: value above the fixed floor, hue and saturation
    // unconstrained.
    let (_, _, value_floor) = color::hsv_to_255_scale(0.0, 0.0, 39.0);
    let mask = GrayImage::from_fn(width, height, |x, y| {
        let g = smoothed.get_pixel(x, y)[0];
        let value = color::hsv_value(Rgb([g, g, g]));
        if value >= value_floor { Luma([255]) } else { Luma([0]) }
    });

    // One opening pass removes speckle; two dilation passes push the sure
    // background margin outward.
    let opened = open(&mask, Norm::L2, KERNEL_RADIUS);
    let sure_bg = dilate(&dilate(&opened, Norm::L2, KERNEL_RADIUS), Norm::L2, KERNEL_RADIUS);

    let sure_fg = sure_foreground(&opened);
    let components = connected_components(&sure_fg, Connectivity::Eight, Luma([0u8]));

    // Label 0 is reserved: every component shifts up by one, so the region
    // outside the sure background becomes marker 1 and blobs start at 2.
    // Pixels between sure background and sure foreground are unresolved.
    let mut markers = vec![UNRESOLVED; (width * height) as usize];
    let mut seeds = 0usize;
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) as usize;
            let unknown = sure_bg.get_pixel(x, y)[0] == 255 && sure_fg.get_pixel(x, y)[0] == 0;
            if !unknown {
                markers[i] = components.get_pixel(x, y)[0] + 1;
                seeds += 1;
            }
        }
    }
    debug!("watershed: {seeds} seed pixels, {} unresolved", markers.len() - seeds);

    flood(smoothed, &mut markers);

    RgbImage::from_fn(width, height, |x, y| {
        if markers[(y * width + x) as usize] == BOUNDARY {
            color::BOUNDARY
        } else {
            let g = smoothed.get_pixel(x, y)[0];
            Rgb([g, g, g])
        }
    })
}

/// Thresholds the Euclidean distance-to-background transform of the opened
/// mask at [`SURE_FG_FRACTION`] of its maximum, yielding the high-confidence
/// interior of each blob.
fn sure_foreground(opened: &GrayImage) -> GrayImage {
    let (width, height) = opened.dimensions();

    // The transform measures distance to the nearest foreground pixel, so it
    // runs on the inverted mask to get distance to the nearest background.
    let inverted = GrayImage::from_fn(width, height, |x, y| {
        Luma([255 - opened.get_pixel(x, y)[0]])
    });
    let squared = euclidean_squared_distance_transform(&inverted);

    let max_distance = squared
        .pixels()
        .map(|p| p[0].sqrt())
        .fold(0.0f64, f64::max);
    let threshold = SURE_FG_FRACTION * max_distance;

    GrayImage::from_fn(width, height, |x, y| {
        if squared.get_pixel(x, y)[0].sqrt() > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Grows all numbered markers simultaneously through the unresolved region.
///
/// Pixels are flooded in order of ascending gradient magnitude, so growth
/// fronts sweep flat terrain first and meet on the ridges of the smoothed
/// image. A pixel whose already-labeled neighbors carry two different markers
/// becomes [`BOUNDARY`]; ties at equal gradient resolve in insertion order,
/// keeping the result deterministic.
fn flood(smoothed: &GrayImage, markers: &mut [u32]) {
    let (width, height) = smoothed.dimensions();
    let gradient = gradient_magnitude(smoothed);

    let mut heap: BinaryHeap<Reverse<(u32, u64, u32, u32)>> = BinaryHeap::new();
    let mut seq = 0u64;

    for y in 0..height {
        for x in 0..width {
            if markers[(y * width + x) as usize] != UNRESOLVED {
                continue;
            }
            let seeded = neighbors(x, y, width, height)
                .any(|(nx, ny)| markers[(ny * width + nx) as usize] != UNRESOLVED);
            if seeded {
                heap.push(Reverse((gradient[(y * width + x) as usize], seq, x, y)));
                seq += 1;
            }
        }
    }

    while let Some(Reverse((_, _, x, y))) = heap.pop() {
        let i = (y * width + x) as usize;
        if markers[i] != UNRESOLVED {
            continue;
        }

        let mut label = UNRESOLVED;
        let mut contested = false;
        for (nx, ny) in neighbors(x, y, width, height) {
            let m = markers[(ny * width + nx) as usize];
            if m == UNRESOLVED || m == BOUNDARY {
                continue;
            }
            if label == UNRESOLVED {
                label = m;
            } else if label != m {
                contested = true;
            }
        }

        // A pixel can surface with no labeled neighbors left if the front
        // that queued it has since turned to boundary; a later labeling of
        // any neighbor re-queues it.
        if label == UNRESOLVED {
            continue;
        }

        markers[i] = if contested { BOUNDARY } else { label };
        for (nx, ny) in neighbors(x, y, width, height) {
            if markers[(ny * width + nx) as usize] == UNRESOLVED {
                heap.push(Reverse((gradient[(ny * width + nx) as usize], seq, nx, ny)));
                seq += 1;
            }
        }
    }
}

fn neighbors(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    OFFSETS.iter().filter_map(move |&(dx, dy)| {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        (nx >= 0 && ny >= 0 && nx < width as i32 && ny < height as i32)
            .then_some((nx as u32, ny as u32))
    })
}

/// Sobel gradient magnitude, row-major, with clamped borders.
fn gradient_magnitude(image: &GrayImage) -> Vec<u32> {
    let (width, height) = image.dimensions();
    let sample = |x: i32, y: i32| -> i32 {
        let cx = x.clamp(0, width as i32 - 1) as u32;
        let cy = y.clamp(0, height as i32 - 1) as u32;
        image.get_pixel(cx, cy)[0] as i32
    };

    let mut out = vec![0u32; (width * height) as usize];
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let gx = sample(x + 1, y - 1) + 2 * sample(x + 1, y) + sample(x + 1, y + 1)
                - sample(x - 1, y - 1)
                - 2 * sample(x - 1, y)
                - sample(x - 1, y + 1);
            let gy = sample(x - 1, y + 1) + 2 * sample(x, y + 1) + sample(x + 1, y + 1)
                - sample(x - 1, y - 1)
                - 2 * sample(x, y - 1)
                - sample(x + 1, y - 1);
            out[(y * width as i32 + x) as usize] =
                ((gx * gx + gy * gy) as f64).sqrt() as u32;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(width: u32, height: u32, cx: i32, cy: i32, r: i32, bright: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let dx = x as i32 - cx;
            let dy = y as i32 - cy;
            if dx * dx + dy * dy <= r * r {
                Luma([bright])
            } else {
                Luma([0])
            }
        })
    }

    fn boundary_pixels(segmented: &RgbImage) -> Vec<(u32, u32)> {
        segmented
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == color::BOUNDARY)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn dark_raster_produces_no_boundaries() {
        let segmented = segment(&GrayImage::new(10, 10));
        assert_eq!(segmented.dimensions(), (10, 10));
        assert!(boundary_pixels(&segmented).is_empty());
        assert!(segmented.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn bright_disk_is_ringed_by_a_boundary() {
        let segmented = segment(&disk(20, 20, 10, 10, 6, 220));
        let ring = boundary_pixels(&segmented);
        assert!(!ring.is_empty(), "no boundary pixels found");

        // Every boundary pixel sits near the disk's edge, not in the deep
        // interior or the far field.
        for (x, y) in &ring {
            let dx = *x as i32 - 10;
            let dy = *y as i32 - 10;
            let d2 = dx * dx + dy * dy;
            assert!((4..=100).contains(&d2), "boundary pixel at ({x}, {y})");
        }
    }

    #[test]
    fn non_boundary_pixels_keep_their_gray_value() {
        let smoothed = disk(20, 20, 10, 10, 6, 220);
        let segmented = segment(&smoothed);
        let center = segmented.get_pixel(10, 10);
        assert_eq!(*center, Rgb([220, 220, 220]));
        assert_eq!(*segmented.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn separated_disks_get_separate_rings() {
        let mut smoothed = disk(20, 20, 5, 5, 4, 220);
        let second = disk(20, 20, 15, 15, 4, 220);
        for (a, b) in smoothed.pixels_mut().zip(second.pixels()) {
            a[0] = a[0].max(b[0]);
        }
        let segmented = segment(&smoothed);
        let ring = boundary_pixels(&segmented);

        let near_first = ring
            .iter()
            .any(|(x, y)| (*x as i32 - 5).pow(2) + (*y as i32 - 5).pow(2) <= 49);
        let near_second = ring
            .iter()
            .any(|(x, y)| (*x as i32 - 15).pow(2) + (*y as i32 - 15).pow(2) <= 49);
        assert!(near_first, "no boundary around the first disk");
        assert!(near_second, "no boundary around the second disk");
    }

    #[test]
    fn segmentation_is_deterministic() {
        let smoothed = disk(20, 20, 10, 10, 6, 220);
        assert_eq!(segment(&smoothed), segment(&smoothed));
    }
}

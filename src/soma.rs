//! Soma extraction: closed outline contours, filled region mask, centroids.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use log::debug;
use num::{Num, NumCast};
use num_traits::AsPrimitive;

/// An extracted cell body: the ordered boundary contour (trace order) and the
/// centroid derived from it. Immutable once constructed.
///
/// The centroid is the integer-rounded mean of the *boundary* points, not of
/// the filled interior. For a non-circular contour this biases the result
/// toward regions of denser boundary sampling; downstream consumers rely on
/// this exact behavior, so it is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soma {
    contour: Vec<Point<i32>>,
    centroid: Point<i32>,
}

impl Soma {
    /// Builds a soma from a traced contour.
    ///
    /// # Panics
    ///
    /// Panics if `contour` is empty; contour extraction never produces an
    /// empty point list.
    pub fn new(contour: Vec<Point<i32>>) -> Self {
        assert!(!contour.is_empty(), "soma contour must not be empty");
        let centroid = centroid_of(&contour);
        Soma { contour, centroid }
    }

    /// The ordered boundary points, in trace order.
    pub fn contour(&self) -> &[Point<i32>] {
        &self.contour
    }

    /// The integer-rounded mean of the boundary points.
    pub fn centroid(&self) -> Point<i32> {
        self.centroid
    }

    /// Perimeter of the contour: the sum of Euclidean distances between
    /// consecutive points, closing the loop back to the first point.
    pub fn perimeter(&self) -> f64 {
        if self.contour.len() < 2 {
            return 0.0;
        }
        self.contour
            .iter()
            .zip(self.contour.iter().cycle().skip(1))
            .map(|(p1, p2)| {
                let dx = (p2.x - p1.x) as f64;
                let dy = (p2.y - p1.y) as f64;
                dx.hypot(dy)
            })
            .sum()
    }
}

/// Integer-rounded arithmetic mean of a non-empty point slice.
fn centroid_of<T>(points: &[Point<T>]) -> Point<i32>
where
    T: Num + NumCast + Copy + PartialEq + Eq + AsPrimitive<f64>,
{
    let len = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.x.as_()).sum();
    let sum_y: f64 = points.iter().map(|p| p.y.as_()).sum();
    Point::new((sum_x / len).round() as i32, (sum_y / len).round() as i32)
}

/// Extracts somas from the binary outline mask.
///
/// Only external (outermost) closed contours are considered; nested contours
/// such as the inner edge of an outline ring are ignored. Each contour's
/// enclosed region is filled into one combined soma-region mask, which starts
/// from the outline pixels themselves, so the mask is foreground on both the
/// outlines and their interiors.
///
/// Returns the mask and the somas in contour discovery order. Zero contours
/// is a valid outcome, not an error.
pub fn extract_somas(outline: &GrayImage) -> (GrayImage, Vec<Soma>) {
    let mut mask = outline.clone();

    let contours = find_contours::<i32>(outline);
    let mut somas = Vec::new();
    for contour in contours {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        fill_contour(&mut mask, &contour.points);
        somas.push(Soma::new(contour.points));
    }
    debug!("extracted {} soma(s)", somas.len());

    (mask, somas)
}

/// Fills the region enclosed by a contour with foreground.
fn fill_contour(mask: &mut GrayImage, points: &[Point<i32>]) {
    if points.len() >= 3 {
        draw_polygon_mut(mask, points, Luma([255]));
    } else {
        // Degenerate one- or two-point contours enclose nothing; keep just
        // their own pixels foreground.
        for p in points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < mask.width() && (p.y as u32) < mask.height()
            {
                mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Draws a one-pixel-wide rectangular ring.
    fn ring(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for x in x0..=x1 {
            mask.put_pixel(x, y0, Luma([255]));
            mask.put_pixel(x, y1, Luma([255]));
        }
        for y in y0..=y1 {
            mask.put_pixel(x0, y, Luma([255]));
            mask.put_pixel(x1, y, Luma([255]));
        }
    }

    #[test]
    fn empty_mask_yields_zero_somas() {
        let (mask, somas) = extract_somas(&GrayImage::new(12, 12));
        assert!(somas.is_empty());
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn single_ring_yields_one_filled_soma() {
        let mut outline = GrayImage::new(16, 16);
        ring(&mut outline, 4, 4, 11, 11);

        let (mask, somas) = extract_somas(&outline);
        assert_eq!(somas.len(), 1);

        // Interior pixels are filled, exterior pixels are not.
        assert_eq!(mask.get_pixel(7, 7)[0], 255);
        assert_eq!(mask.get_pixel(5, 9)[0], 255);
        assert_eq!(mask.get_pixel(1, 1)[0], 0);
        assert_eq!(mask.get_pixel(13, 7)[0], 0);

        // A symmetric ring centers its centroid.
        let c = somas[0].centroid();
        assert!((c.x - 7).abs() <= 1 && (c.y - 7).abs() <= 1, "centroid {c:?}");
    }

    #[test]
    fn two_rings_yield_two_somas() {
        let mut outline = GrayImage::new(24, 24);
        ring(&mut outline, 2, 2, 9, 9);
        ring(&mut outline, 14, 14, 21, 21);

        let (mask, somas) = extract_somas(&outline);
        assert_eq!(somas.len(), 2);
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(17, 17)[0], 255);
        assert_eq!(mask.get_pixel(12, 12)[0], 0);
    }

    #[test]
    fn nested_ring_is_ignored() {
        let mut outline = GrayImage::new(20, 20);
        ring(&mut outline, 2, 2, 17, 17);
        ring(&mut outline, 7, 7, 12, 12);

        let (_, somas) = extract_somas(&outline);
        assert_eq!(somas.len(), 1);
    }

    #[test]
    fn centroid_averages_boundary_points() {
        let soma = Soma::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ]);
        assert_eq!(soma.centroid(), Point::new(5, 5));
    }

    #[test]
    fn centroid_is_biased_by_dense_boundary_sampling() {
        // Three of four points on the right edge drag the mean rightward of
        // the geometric center. This is the documented approximation, not a
        // defect.
        let soma = Soma::new(vec![
            Point::new(0, 5),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(10, 10),
        ]);
        assert_eq!(soma.centroid().x, 8);
    }

    #[test]
    fn perimeter_closes_the_loop() {
        let soma = Soma::new(vec![
            Point::new(0, 0),
            Point::new(3, 0),
            Point::new(0, 4),
        ]);
        assert!((soma.perimeter() - 12.0).abs() < 1e-9);
    }
}

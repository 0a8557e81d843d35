/// Map normalized bounding boxes onto an image drawn with "contain" scaling.
///
/// The image is scaled uniformly to fit inside the container and centred,
/// leaving symmetric empty margins on one axis. A box expressed as fractions
/// of the image therefore lands at `offset + fraction * displayed_extent`.
///
/// Everything here is pure arithmetic: no rounding, no clamping, no errors.
use crate::overlay::types::{Finding, NormalizedBox, ProjectedRect, Size};

/// Placement of a "contain"-scaled image inside its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
}

impl ContainFit {
    /// Fit `natural` inside `container`.
    ///
    /// Each side of the natural size that is not known yet is taken from the
    /// container, so boxes still render before the image has reported its
    /// dimensions.
    pub fn new(container: Size, natural: Size) -> Self {
        let natural = Size::new(
            known_or(natural.width, container.width),
            known_or(natural.height, container.height),
        );

        let scale = (container.width / non_zero(natural.width))
            .min(container.height / non_zero(natural.height));
        let displayed_width = natural.width * scale;
        let displayed_height = natural.height * scale;

        Self {
            scale,
            offset_x: (container.width - displayed_width) / 2.0,
            offset_y: (container.height - displayed_height) / 2.0,
            displayed_width,
            displayed_height,
        }
    }

    /// Rectangle the image itself occupies inside the container.
    pub fn displayed_rect(&self) -> ProjectedRect {
        ProjectedRect {
            left: self.offset_x,
            top: self.offset_y,
            width: self.displayed_width,
            height: self.displayed_height,
        }
    }

    /// Place a normalized box over the displayed image.
    pub fn place(&self, bbox: &NormalizedBox) -> ProjectedRect {
        ProjectedRect {
            left: self.offset_x + bbox.x * self.displayed_width,
            top: self.offset_y + bbox.y * self.displayed_height,
            width: bbox.width * self.displayed_width,
            height: bbox.height * self.displayed_height,
        }
    }
}

fn known_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        fallback
    }
}

// A zero denominator would turn the scale into NaN or infinity.
fn non_zero(v: f64) -> f64 {
    if v == 0.0 {
        1.0
    } else {
        v
    }
}

/// Project one normalized box into container-local pixels, then grow it by
/// `padding` on every side (negative padding shrinks it).
pub fn project(container: Size, natural: Size, bbox: &NormalizedBox, padding: f64) -> ProjectedRect {
    ContainFit::new(container, natural).place(bbox).padded(padding)
}

/// Project every finding, preserving order.
pub fn project_findings(
    container: Size,
    natural: Size,
    findings: &[Finding],
    padding: f64,
) -> Vec<ProjectedRect> {
    let fit = ContainFit::new(container, natural);
    findings
        .iter()
        .map(|f| fit.place(&f.bbox).padded(padding))
        .collect()
}

/// Index of the topmost rectangle under the point.
///
/// Later rectangles are drawn on top of earlier ones, so the search runs
/// back to front.
pub fn finding_at(rects: &[ProjectedRect], x: f64, y: f64) -> Option<usize> {
    rects.iter().rposition(|r| r.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(x: f64, y: f64, w: f64, h: f64) -> Finding {
        Finding {
            bbox: NormalizedBox::new(x, y, w, h),
            label: "face".into(),
            text: None,
        }
    }

    #[test]
    fn letterboxed_wide_container() {
        let fit = ContainFit::new(Size::new(200.0, 100.0), Size::new(400.0, 400.0));
        assert_eq!(fit.scale, 0.25);
        assert_eq!(fit.displayed_width, 100.0);
        assert_eq!(fit.displayed_height, 100.0);
        assert_eq!(fit.offset_x, 50.0);
        assert_eq!(fit.offset_y, 0.0);

        let r = project(
            Size::new(200.0, 100.0),
            Size::new(400.0, 400.0),
            &NormalizedBox::new(0.5, 0.5, 0.25, 0.25),
            0.0,
        );
        assert_eq!(r, ProjectedRect { left: 100.0, top: 50.0, width: 25.0, height: 25.0 });
    }

    #[test]
    fn full_box_equals_displayed_image() {
        let container = Size::new(320.0, 480.0);
        let natural = Size::new(1920.0, 1080.0);
        let fit = ContainFit::new(container, natural);
        assert_eq!(project(container, natural, &NormalizedBox::FULL, 0.0), fit.displayed_rect());
    }

    #[test]
    fn same_aspect_has_no_letterbox() {
        let fit = ContainFit::new(Size::new(300.0, 150.0), Size::new(1200.0, 600.0));
        assert_eq!(fit.scale, 300.0 / 1200.0);
        assert_eq!(fit.scale, 150.0 / 600.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn equal_sizes_map_directly() {
        let size = Size::new(640.0, 480.0);
        let fit = ContainFit::new(size, size);
        assert_eq!(fit.scale, 1.0);
        let r = project(size, size, &NormalizedBox::new(0.25, 0.5, 0.5, 0.25), 0.0);
        assert_eq!(r, ProjectedRect { left: 160.0, top: 240.0, width: 320.0, height: 120.0 });
    }

    #[test]
    fn unknown_natural_falls_back_to_container() {
        let r = project(Size::new(300.0, 150.0), Size::default(), &NormalizedBox::FULL, 0.0);
        assert_eq!(r, ProjectedRect { left: 0.0, top: 0.0, width: 300.0, height: 150.0 });
    }

    #[test]
    fn unknown_side_is_taken_from_container() {
        let container = Size::new(300.0, 150.0);

        // Height unknown: natural becomes 800x150.
        let r = project(container, Size::new(800.0, 0.0), &NormalizedBox::FULL, 0.0);
        assert_eq!(r, ProjectedRect { left: 0.0, top: 46.875, width: 300.0, height: 56.25 });

        // Width unknown: natural becomes 300x600.
        let r = project(container, Size::new(f64::NAN, 600.0), &NormalizedBox::FULL, 0.0);
        assert_eq!(r, ProjectedRect { left: 112.5, top: 0.0, width: 75.0, height: 150.0 });
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let cases = [
            (Size::default(), Size::default()),
            (Size::default(), Size::new(400.0, 300.0)),
            (Size::new(0.0, 100.0), Size::new(400.0, 300.0)),
        ];
        for (container, natural) in cases {
            let r = project(container, natural, &NormalizedBox::new(0.2, 0.2, 0.5, 0.5), 0.0);
            assert!(r.left.is_finite() && r.top.is_finite());
            assert_eq!(r.width, 0.0);
            assert_eq!(r.height, 0.0);
        }
    }

    #[test]
    fn padding_is_symmetric() {
        let c = Size::new(375.0, 500.0);
        let n = Size::new(3024.0, 4032.0);
        let b = NormalizedBox::new(0.1, 0.3, 0.2, 0.05);
        let base = project(c, n, &b, 0.0);
        for p in [-5.0, 0.5, 3.0, 12.0] {
            let r = project(c, n, &b, p);
            assert_eq!(r.width, base.width + 2.0 * p);
            assert_eq!(r.height, base.height + 2.0 * p);
            assert_eq!(r.left, base.left - p);
            assert_eq!(r.top, base.top - p);
        }
    }

    #[test]
    fn negative_padding_on_twenty_pixel_box() {
        let size = Size::new(100.0, 100.0);
        let b = NormalizedBox::new(0.1, 0.1, 0.2, 0.2);
        let r = project(size, size, &b, -5.0);
        assert_eq!(r, ProjectedRect { left: 15.0, top: 15.0, width: 10.0, height: 10.0 });
    }

    #[test]
    fn repeated_calls_are_bitwise_identical() {
        let c = Size::new(333.3, 217.9);
        let n = Size::new(1001.0, 777.0);
        let b = NormalizedBox::new(0.123, 0.456, 0.321, 0.111);
        let a = project(c, n, &b, 3.0);
        let z = project(c, n, &b, 3.0);
        assert_eq!(a.left.to_bits(), z.left.to_bits());
        assert_eq!(a.top.to_bits(), z.top.to_bits());
        assert_eq!(a.width.to_bits(), z.width.to_bits());
        assert_eq!(a.height.to_bits(), z.height.to_bits());
    }

    #[test]
    fn out_of_range_boxes_are_not_clamped() {
        let size = Size::new(100.0, 100.0);
        let r = project(size, size, &NormalizedBox::new(0.9, -0.1, 0.5, 0.3), 0.0);
        assert_eq!(r.left, 90.0);
        assert_eq!(r.top, -10.0);
        assert_eq!(r.width, 50.0);
    }

    #[test]
    fn batch_matches_single_projection() {
        let c = Size::new(200.0, 100.0);
        let n = Size::new(400.0, 400.0);
        let findings = vec![finding(0.0, 0.0, 1.0, 1.0), finding(0.5, 0.5, 0.25, 0.25)];
        let rects = project_findings(c, n, &findings, 3.0);
        assert_eq!(rects.len(), 2);
        for (f, r) in findings.iter().zip(&rects) {
            assert_eq!(*r, project(c, n, &f.bbox, 3.0));
        }
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let rects = vec![
            ProjectedRect { left: 0.0, top: 0.0, width: 100.0, height: 100.0 },
            ProjectedRect { left: 40.0, top: 40.0, width: 20.0, height: 20.0 },
        ];
        assert_eq!(finding_at(&rects, 50.0, 50.0), Some(1));
        assert_eq!(finding_at(&rects, 10.0, 10.0), Some(0));
        assert_eq!(finding_at(&rects, 150.0, 10.0), None);
    }
}

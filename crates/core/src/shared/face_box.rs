/// Axis-aligned face bounding box in pixel coordinates.
///
/// Detectors report boxes in the coordinate space of the frame they were
/// given; callers clamp before cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }

    /// Intersects the box with a `frame_width × frame_height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceBox> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + self.width).min(frame_width as i32);
        let y2 = (self.y + self.height).min(frame_height as i32);

        let clamped = FaceBox::new(x1, y1, x2 - x1, y2 - y1);
        (!clamped.is_empty()).then_some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_iou_identical_boxes() {
        let a = FaceBox::new(10, 10, 100, 100);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = FaceBox::new(0, 0, 50, 50);
        let b = FaceBox::new(100, 100, 50, 50);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100, union 10000 + 10000 - 5000
        let a = FaceBox::new(0, 0, 100, 100);
        let b = FaceBox::new(50, 0, 100, 100);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::zero_width(FaceBox::new(0, 0, 0, 100), FaceBox::new(0, 0, 50, 50))]
    #[case::zero_height(FaceBox::new(0, 0, 100, 0), FaceBox::new(0, 0, 50, 50))]
    #[case::touching(FaceBox::new(0, 0, 50, 50), FaceBox::new(50, 0, 50, 50))]
    fn test_iou_degenerate_is_zero(#[case] a: FaceBox, #[case] b: FaceBox) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let b = FaceBox::new(10, 20, 30, 40);
        assert_eq!(b.clamp_to(100, 100), Some(b));
    }

    #[test]
    fn test_clamp_trims_overhang() {
        let b = FaceBox::new(-10, 90, 50, 50);
        assert_eq!(b.clamp_to(100, 100), Some(FaceBox::new(0, 90, 40, 10)));
    }

    #[test]
    fn test_clamp_outside_is_none() {
        let b = FaceBox::new(200, 200, 50, 50);
        assert_eq!(b.clamp_to(100, 100), None);
    }

    #[test]
    fn test_area_ignores_negative_extent() {
        assert_eq!(FaceBox::new(0, 0, -5, 10).area(), 0);
        assert_eq!(FaceBox::new(0, 0, 4, 5).area(), 20);
    }
}

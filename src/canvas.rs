use crate::batch::BorderColor;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, RgbaImage};

/// Multiply this by the image height to get the padded width.
pub const WIDTH_MULTIPLIER: f64 = 2.37;

const MASK_BACKGROUND: Luma<u8> = Luma([255]);
const MASK_CONTENT: Luma<u8> = Luma([0]);

/// Padded canvas width for an image of `height`, rounded down to the nearest even number.
pub fn canvas_width(height: u32) -> u32 {
    let width = (height as f64 * WIDTH_MULTIPLIER).floor() as u32;
    width - width % 2
}

/// Left edge of an image of `image_width` centered on a canvas of `canvas_width`.
/// Negative when the image is wider than the canvas.
pub fn center_offset(canvas_width: u32, image_width: u32) -> i64 {
    (canvas_width / 2) as i64 - (image_width / 2) as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }
}

/// Fill `rect` with `color`, clipped to the image bounds.
pub fn fill_rect<P: Pixel>(img: &mut ImageBuffer<P, Vec<P::Subpixel>>, rect: Rect, color: P) {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = rect.right().min(img.width() as i64);
    let y1 = rect.bottom().min(img.height() as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Stroke the outline of `rect` with a pen of `pen_width` centered on the outline.
///
/// Half of the pen falls outside the rectangle and half inside, so a pen at least as wide
/// as the rectangle's shorter side covers it completely.
pub fn stroke_rect<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    rect: Rect,
    pen_width: f32,
    color: P,
) {
    let half = (pen_width / 2.0) as f64;
    let (left, top) = (rect.x as f64, rect.y as f64);
    let (right, bottom) = (rect.right() as f64, rect.bottom() as f64);

    for y in 0..img.height() {
        let cy = y as f64 + 0.5;
        if cy < top - half || cy > bottom + half {
            continue;
        }
        let inside_y = cy > top + half && cy < bottom - half;

        for x in 0..img.width() {
            let cx = x as f64 + 0.5;
            if cx < left - half || cx > right + half {
                continue;
            }
            let inside_x = cx > left + half && cx < right - half;
            if !(inside_x && inside_y) {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Pad `source` to its canvas width with a `color` border and center it on top.
pub fn render_bordered(source: &DynamicImage, color: BorderColor) -> RgbaImage {
    let (width, height) = (source.width(), source.height());
    let canvas_width = canvas_width(height);

    let mut canvas = RgbaImage::new(canvas_width, height);

    // Border first
    stroke_rect(
        &mut canvas,
        Rect::new(0, 0, canvas_width, height),
        (canvas_width / 2) as f32,
        color.to_rgba(),
    );

    // Image on top
    let x_offset = center_offset(canvas_width, width);
    image::imageops::overlay(&mut canvas, &source.to_rgba8(), x_offset, 0);

    canvas
}

/// White canvas with a black rectangle where the source image sits.
pub fn render_monochrome(canvas_width: u32, image_width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::from_pixel(canvas_width, height, MASK_BACKGROUND);
    let x_offset = center_offset(canvas_width, image_width);
    fill_rect(&mut mask, Rect::new(x_offset, 0, image_width, height), MASK_CONTENT);
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_canvas_width_is_even_floor() {
        for height in 1..5000u32 {
            let floor = (height as f64 * WIDTH_MULTIPLIER).floor() as u32;
            let width = canvas_width(height);
            assert_eq!(width % 2, 0, "height {}", height);
            assert!(width <= floor);
            assert!(floor - width <= 1);
        }
    }

    #[test]
    fn test_canvas_width_known_values() {
        assert_eq!(canvas_width(50), 118);
        assert_eq!(canvas_width(100), 236); // floor(237.0) is odd
        assert_eq!(canvas_width(1), 2);
        assert_eq!(canvas_width(0), 0);
    }

    #[test]
    fn test_center_offset_keeps_image_in_bounds() {
        for canvas in (2..400u32).step_by(2) {
            for width in 1..=canvas {
                let offset = center_offset(canvas, width);
                assert!(offset >= 0);
                assert!(offset + width as i64 <= canvas as i64);
            }
        }
        assert_eq!(center_offset(118, 100), 9);
        assert_eq!(center_offset(118, 60), 29);
        assert_eq!(center_offset(10, 20), -5);
    }

    #[test]
    fn test_monochrome_mask_pixels() {
        let (canvas, width, height) = (118, 60, 50);
        let mask = render_monochrome(canvas, width, height);
        assert_eq!(mask.dimensions(), (canvas, height));

        let x0 = center_offset(canvas, width) as u32;
        for (x, y, pixel) in mask.enumerate_pixels() {
            let inside = x >= x0 && x < x0 + width && y < height;
            let expected = if inside { MASK_CONTENT } else { MASK_BACKGROUND };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_monochrome_mask_clips_wide_content() {
        let mask = render_monochrome(10, 20, 4);
        assert!(mask.pixels().all(|p| *p == MASK_CONTENT));
    }

    #[test]
    fn test_bordered_composite_pixels() {
        let color = BorderColor::new(255, 0, 255);
        let source = gradient(100, 50);
        let out = render_bordered(&source, color);
        assert_eq!(out.dimensions(), (118, 50));

        let src = source.to_rgba8();
        for (x, y, pixel) in out.enumerate_pixels() {
            if (9..109).contains(&x) {
                assert_eq!(*pixel, *src.get_pixel(x - 9, y));
            } else {
                assert_eq!(*pixel, color.to_rgba(), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_bordered_composite_blends_transparent_source() {
        let color = BorderColor::new(10, 20, 30);
        let source = DynamicImage::ImageRgba8(RgbaImage::new(20, 10));
        let out = render_bordered(&source, color);
        assert!(out.pixels().all(|p| *p == color.to_rgba()));
    }

    #[test]
    fn test_bordered_composite_clips_wide_source() {
        let source = gradient(40, 10);
        let out = render_bordered(&source, BorderColor::default());
        assert_eq!(out.dimensions(), (22, 10));
        // Source starts 9 pixels left of the canvas edge.
        assert_eq!(*out.get_pixel(0, 3), *source.to_rgba8().get_pixel(9, 3));
    }

    #[test]
    fn test_thin_stroke_leaves_interior() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255]));
        stroke_rect(&mut img, Rect::new(0, 0, 10, 10), 2.0, Luma([0]));

        assert_eq!(*img.get_pixel(0, 0), Luma([0]));
        assert_eq!(*img.get_pixel(9, 5), Luma([0]));
        assert_eq!(*img.get_pixel(5, 9), Luma([0]));
        assert_eq!(*img.get_pixel(1, 5), Luma([255]));
        assert_eq!(*img.get_pixel(5, 5), Luma([255]));
    }

    #[test]
    fn test_fill_rect_clips_negative_origin() {
        let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
        fill_rect(&mut img, Rect::new(-2, -2, 4, 4), Luma([0]));
        assert_eq!(*img.get_pixel(0, 0), Luma([0]));
        assert_eq!(*img.get_pixel(1, 1), Luma([0]));
        assert_eq!(*img.get_pixel(2, 2), Luma([255]));
    }
}

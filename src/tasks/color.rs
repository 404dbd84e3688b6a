use plotters::prelude::RGBColor;

pub static FONT_SIZE: i32 = 16;
pub static STROKE_WIDTH: u32 = 2;

/// Saturation and value shared by every generated series color.
pub const SATURATION: f64 = 0.9;
pub const VALUE: f64 = 0.76;

/// RGB triple with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub fn to_rgb_color(self) -> RGBColor {
        fn channel(c: f64) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        RGBColor(channel(self.0), channel(self.1), channel(self.2))
    }
}

pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }

    let sextant = (h * 6.0).floor();
    let f = h * 6.0 - sextant;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sextant as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// `n` colors with hues evenly spaced around the color wheel.
pub fn make_colors(n: usize) -> Vec<Rgb> {
    (0..n)
        .map(|i| {
            let (r, g, b) = hsv_to_rgb(i as f64 / n as f64, SATURATION, VALUE);
            Rgb(r, g, b)
        })
        .collect()
}

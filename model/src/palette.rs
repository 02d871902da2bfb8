use rand::Rng;
use serde::Serialize;

/// A marker/trail color, independent of any particular rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MarkerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

/// Assigns each new vehicle a distinguishing color by walking hue space in golden-ratio
/// increments, which keeps consecutive picks about as far apart as hue space allows. HSV
/// gives more natural colors than sampling RGB directly.
pub struct ColorWheel {
    hue: f64,
}

impl ColorWheel {
    pub fn new() -> Self {
        Self::seeded(rand::thread_rng().gen_range(0.0..1.0))
    }

    pub fn seeded(hue: f64) -> Self {
        Self {
            hue: hue.rem_euclid(1.0),
        }
    }

    pub fn next(&mut self) -> MarkerColor {
        self.hue = (self.hue + GOLDEN_RATIO_CONJUGATE) % 1.0;
        hsv_to_rgb(self.hue, 0.90, 0.90)
    }
}

/// Standard six-sector HSV conversion, all inputs in [0, 1)
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> MarkerColor {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (sector as u32) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    MarkerColor {
        r: (r * 255.0).round() as u8,
        g: (g * 255.0).round() as u8,
        b: (b * 255.0).round() as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_20_colors_are_distinct() {
        let mut wheel = ColorWheel::seeded(0.0);
        let colors: Vec<MarkerColor> = (0..20).map(|_| wheel.next()).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn hues_stay_well_spread() {
        // The golden-ratio walk guarantees the first 20 hues keep a healthy minimum
        // pairwise distance around the hue circle, no matter the seed
        for seed in [0.0, 0.123, 0.5, 0.99] {
            let hues: Vec<f64> = (1..=20)
                .map(|i| (seed + (i as f64) * GOLDEN_RATIO_CONJUGATE).rem_euclid(1.0))
                .collect();
            for (i, a) in hues.iter().enumerate() {
                for b in &hues[i + 1..] {
                    let d = (a - b).abs();
                    let circular = d.min(1.0 - d);
                    assert!(circular > 0.03, "hues {} and {} too close", a, b);
                }
            }
        }
    }

    #[test]
    fn hsv_sector_conversion_matches_known_values() {
        // Pure-ish primaries at s=1, v=1
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), MarkerColor { r: 255, g: 0, b: 0 });
        let green = hsv_to_rgb(1.0 / 3.0, 1.0, 1.0);
        assert_eq!((green.r, green.g, green.b), (0, 255, 0));
        let blue = hsv_to_rgb(2.0 / 3.0, 1.0, 1.0);
        assert_eq!((blue.r, blue.g, blue.b), (0, 0, 255));
        // Greyscale when saturation drops out
        assert_eq!(
            hsv_to_rgb(0.4, 0.0, 0.5),
            MarkerColor {
                r: 128,
                g: 128,
                b: 128
            }
        );
    }
}

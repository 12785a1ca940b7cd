//! Color utility functions shared across the application.
//!
//! Associations are painted with a single `#rrggbb` color used for both fill
//! and stroke. New associations get a random hue with saturation and lightness
//! held in a band that stays readable on top of map tiles.

use rand::Rng;

use crate::constants::{COLOR_LIGHTNESS_RANGE, COLOR_SATURATION_RANGE};
use crate::error::DataError;

/// Convert HSL to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `l` - Lightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple (0.0-1.0 channels) as `#rrggbb`.
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// Parse a `#rrggbb` string into its byte channels.
pub fn parse_hex(color: &str) -> Result<[u8; 3], DataError> {
    let digits = color
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| DataError::invalid_color(color))?;

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| DataError::invalid_color(color))?;
    }
    Ok(rgb)
}

/// Check whether a string is a valid `#rrggbb` color.
pub fn is_valid_hex(color: &str) -> bool {
    parse_hex(color).is_ok()
}

/// Generate a distinct, legible color for a new association.
///
/// Hue is uniform over [0, 360), saturation 60-90% and lightness 40-60%.
pub fn random_association_color<R: Rng>(rng: &mut R) -> String {
    let hue = rng.random_range(0..360u32);
    let saturation = rng.random_range(COLOR_SATURATION_RANGE);
    let lightness = rng.random_range(COLOR_LIGHTNESS_RANGE);

    let (r, g, b) = hsl_to_rgb(
        f64::from(hue),
        f64::from(saturation) / 100.0,
        f64::from(lightness) / 100.0,
    );
    rgb_to_hex(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_to_rgb_red() {
        let (r, g, b) = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsl_to_rgb_green() {
        let (r, g, b) = hsl_to_rgb(120.0, 1.0, 0.5);
        assert!(r.abs() < 0.01);
        assert!((g - 1.0).abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsl_to_rgb_grey_when_unsaturated() {
        let (r, g, b) = hsl_to_rgb(200.0, 0.0, 0.5);
        assert!((r - 0.5).abs() < 0.01);
        assert!((g - 0.5).abs() < 0.01);
        assert!((b - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_rgb_to_hex() {
        assert_eq!(rgb_to_hex(1.0, 0.0, 0.0), "#ff0000");
        assert_eq!(rgb_to_hex(0.0, 0.5, 1.0), "#0080ff");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff8000").unwrap(), [255, 128, 0]);
        assert_eq!(parse_hex("#FFffFF").unwrap(), [255, 255, 255]);
        assert!(parse_hex("ff8000").is_err());
        assert!(parse_hex("#ff80").is_err());
        assert!(parse_hex("#gg0000").is_err());
    }

    #[test]
    fn test_random_colors_are_valid_and_in_band() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let color = random_association_color(&mut rng);
            let [r, g, b] = parse_hex(&color).expect("generated color must parse");

            // Lightness 40-60% keeps the brightest channel away from white
            // and the darkest away from black.
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            assert!(max > 100, "{color} too dark");
            assert!(min < 160, "{color} too light");
            assert!(max - min > 50, "{color} not saturated enough");
        }
    }
}

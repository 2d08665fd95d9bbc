//! Colors and perceptually uniform (CIE L*a*b*) interpolation.
//!
//! Conversion uses the sRGB transfer curve and the D50 white point; channels are
//! clamped back into gamut after interpolation.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A color with opacity in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl Rgba {
    pub const fn opaque(rgb: Rgb) -> Self {
        Self { rgb, alpha: 1.0 }
    }

    pub fn with_alpha(rgb: Rgb, alpha: f64) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl From<Rgb> for Rgba {
    fn from(rgb: Rgb) -> Self {
        Self::opaque(rgb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

// D50 reference white
const XN: f64 = 0.96422;
const YN: f64 = 1.0;
const ZN: f64 = 0.82521;
const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;
const T3: f64 = T1 * T1 * T1;

fn srgb_to_linear(c: u8) -> f64 {
    let v = c as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f64) -> u8 {
    let s = if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round().clamp(0.0, 255.0) as u8
}

fn xyz_to_lab_f(t: f64) -> f64 {
    if t > T3 { t.cbrt() } else { t / T2 + T0 }
}

fn lab_to_xyz_f(t: f64) -> f64 {
    if t > T1 { t * t * t } else { T2 * (t - T0) }
}

impl From<Rgb> for Lab {
    fn from(c: Rgb) -> Self {
        let (r, g, b) = (srgb_to_linear(c.r), srgb_to_linear(c.g), srgb_to_linear(c.b));
        // Bradford-adapted sRGB -> XYZ (D50), matching the usual web Lab conversion
        let y = xyz_to_lab_f((0.2225045 * r + 0.7168786 * g + 0.0606169 * b) / YN);
        let (x, z) = if c.r == c.g && c.g == c.b {
            (y, y)
        } else {
            (
                xyz_to_lab_f((0.4360747 * r + 0.3850649 * g + 0.1430804 * b) / XN),
                xyz_to_lab_f((0.0139322 * r + 0.0971045 * g + 0.7141733 * b) / ZN),
            )
        };
        Lab {
            l: 116.0 * y - 16.0,
            a: 500.0 * (x - y),
            b: 200.0 * (y - z),
        }
    }
}

impl From<Lab> for Rgb {
    fn from(c: Lab) -> Self {
        let y0 = (c.l + 16.0) / 116.0;
        let x = XN * lab_to_xyz_f(y0 + c.a / 500.0);
        let y = YN * lab_to_xyz_f(y0);
        let z = ZN * lab_to_xyz_f(y0 - c.b / 200.0);
        Rgb::new(
            linear_to_srgb(3.1338561 * x - 1.6168667 * y - 0.4906146 * z),
            linear_to_srgb(-0.9787684 * x + 1.9161415 * y + 0.0334540 * z),
            linear_to_srgb(0.0719453 * x - 0.2289914 * y + 1.4052427 * z),
        )
    }
}

/// Interpolate between `from` and `to` in Lab space; `t` is clamped to `[0, 1]`.
pub fn interpolate_lab(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (a, b) = (Lab::from(from), Lab::from(to));
    Rgb::from(Lab {
        l: a.l + (b.l - a.l) * t,
        a: a.a + (b.a - a.a) * t,
        b: a.b + (b.b - a.b) * t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_zero_padded() {
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");
        assert_eq!(Rgb::new(0x98, 0x23, 0x39).to_string(), "#982339");
    }

    #[test]
    fn lab_round_trip_is_stable() {
        for c in [
            Rgb::new(0xf3, 0xf4, 0xf6),
            Rgb::new(0x98, 0x23, 0x39),
            Rgb::new(0, 0, 0),
            Rgb::new(255, 255, 255),
            Rgb::new(12, 200, 90),
        ] {
            let back = Rgb::from(Lab::from(c));
            assert!((back.r as i32 - c.r as i32).abs() <= 1, "{c} -> {back}");
            assert!((back.g as i32 - c.g as i32).abs() <= 1, "{c} -> {back}");
            assert!((back.b as i32 - c.b as i32).abs() <= 1, "{c} -> {back}");
        }
    }

    #[test]
    fn interpolation_hits_endpoints_and_clamps() {
        let (a, b) = (Rgb::new(0xf3, 0xf4, 0xf6), Rgb::new(0x98, 0x23, 0x39));
        assert_eq!(interpolate_lab(a, b, 0.0), interpolate_lab(a, b, -3.0));
        assert_eq!(interpolate_lab(a, b, 1.0), interpolate_lab(a, b, 7.0));
        let mid = interpolate_lab(a, b, 0.5);
        assert!(mid.r < a.r && mid.r > b.r);
    }
}

use std::fmt;

use crate::StyleError;

/// Straight-alpha RGBA color, channels 0..=255 and alpha 0..=1.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)` and `rgba(..)`.
    pub fn parse(raw: &str) -> Result<Self, StyleError> {
        let s = raw.trim();
        let bad = || StyleError::InvalidColor(raw.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(bad)?;
            return match digits.as_slice() {
                [r, g, b] => Ok(Self::new(
                    f64::from(r * 17),
                    f64::from(g * 17),
                    f64::from(b * 17),
                    1.0,
                )),
                [r1, r0, g1, g0, b1, b0] => Ok(Self::new(
                    f64::from(r1 * 16 + r0),
                    f64::from(g1 * 16 + g0),
                    f64::from(b1 * 16 + b0),
                    1.0,
                )),
                [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(Self::new(
                    f64::from(r1 * 16 + r0),
                    f64::from(g1 * 16 + g0),
                    f64::from(b1 * 16 + b0),
                    f64::from(a1 * 16 + a0) / 255.0,
                )),
                _ => Err(bad()),
            };
        }

        let (body, expect_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(bad());
        };
        let body = body.strip_suffix(')').ok_or_else(bad)?;
        let parts: Vec<f64> = body
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| bad())?;
        let color = match (parts.as_slice(), expect_alpha) {
            ([r, g, b], false) => Self::new(*r, *g, *b, 1.0),
            ([r, g, b, a], true) => Self::new(*r, *g, *b, *a),
            _ => return Err(bad()),
        };
        let channels_ok = [color.r, color.g, color.b]
            .iter()
            .all(|c| (0.0..=255.0).contains(c));
        if !channels_ok || !(0.0..=1.0).contains(&color.a) {
            return Err(bad());
        }
        Ok(color)
    }

    /// Linear blend, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    pub fn to_css(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.r.round(),
            self.g.round(),
            self.b.round(),
            (self.a * 1000.0).round() / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Rgba;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgba::parse("#fff").expect("short"), Rgba::new(255.0, 255.0, 255.0, 1.0));
        assert_eq!(Rgba::parse("#1a9850").expect("long"), Rgba::new(26.0, 152.0, 80.0, 1.0));
        let with_alpha = Rgba::parse("#00000080").expect("alpha");
        assert!((with_alpha.a - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(Rgba::parse("rgb(1, 2, 3)").expect("rgb"), Rgba::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(
            Rgba::parse("rgba(1,2,3,0.5)").expect("rgba"),
            Rgba::new(1.0, 2.0, 3.0, 0.5)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(Rgba::parse("red").is_err());
        assert!(Rgba::parse("#12").is_err());
        assert!(Rgba::parse("rgb(1,2)").is_err());
        assert!(Rgba::parse("rgba(300,0,0,1)").is_err());
        assert!(Rgba::parse("#gg0000").is_err());
    }

    #[test]
    fn lerp_midpoint_and_clamp() {
        let black = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let white = Rgba::new(255.0, 255.0, 255.0, 1.0);
        assert_eq!(black.lerp(white, 0.5).to_css(), "rgba(128, 128, 128, 1)");
        assert_eq!(black.lerp(white, 2.0), white);
    }
}

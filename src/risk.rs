use std::fmt;

/// Discrete risk level, ordered from least to most severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels in ascending severity
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Minimum inclusive score for this level
    pub fn min_score(self) -> f64 {
        match self {
            RiskLevel::Critical => 80.0,
            RiskLevel::High => 60.0,
            RiskLevel::Medium => 40.0,
            RiskLevel::Low => 0.0,
        }
    }

    /// Relative priority, Low = 1 .. Critical = 4
    pub fn priority(self) -> u8 {
        self.ordinal() as u8 + 1
    }

    /// Position within `RiskLevel::ALL`
    pub fn ordinal(self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Legend range text: "<40%" for Low, "<min>%+" otherwise
    pub fn range_label(self) -> String {
        match self {
            RiskLevel::Low => format!("<{}%", RiskLevel::Medium.min_score()),
            level => format!("{}%+", level.min_score()),
        }
    }

    /// Flat display color for this level
    pub fn color(self) -> Rgb {
        flat_color(self)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a score into the highest level whose threshold it meets.
///
/// Everything below the Medium threshold is Low, including negative
/// scores. NaN compares false against every threshold and lands in Low.
pub fn classify(score: f64) -> RiskLevel {
    RiskLevel::ALL
        .iter()
        .rev()
        .copied()
        .find(|level| *level != RiskLevel::Low && score >= level.min_score())
        .unwrap_or(RiskLevel::Low)
}

/// 24-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#e74c3c`
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

/// HSL color; hue in degrees, saturation and lightness in percent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    /// Convert to RGB for backends that only speak RGB (terminals)
    pub fn to_rgb(self) -> Rgb {
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

        Rgb::new(channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Fixed color table lookup
pub fn flat_color(level: RiskLevel) -> Rgb {
    match level {
        RiskLevel::Critical => Rgb::from(0xe74c3c),
        RiskLevel::High => Rgb::from(0xf39c12),
        RiskLevel::Medium => Rgb::from(0xf1c40f),
        RiskLevel::Low => Rgb::from(0x2ecc71),
    }
}

/// Continuous red-to-green ramp, independent of the discrete levels.
/// Hue runs from 120° at score 0 to 0° at score 100, saturation from 70% to 100%.
pub fn gradient_color(score: f64) -> Hsl {
    let score = clamp_score(score);
    Hsl {
        hue: (100.0 - score) * 1.2,
        saturation: 70.0 + (score / 100.0) * 30.0,
        lightness: 50.0,
    }
}

/// Clamp into [0, 100]; NaN maps to 0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(85.0), RiskLevel::Critical);
        assert_eq!(classify(80.0), RiskLevel::Critical);
        assert_eq!(classify(79.9), RiskLevel::High);
        assert_eq!(classify(60.0), RiskLevel::High);
        assert_eq!(classify(55.0), RiskLevel::Medium);
        assert_eq!(classify(40.0), RiskLevel::Medium);
        assert_eq!(classify(39.99), RiskLevel::Low);
        assert_eq!(classify(0.0), RiskLevel::Low);
    }

    #[test]
    fn test_classify_out_of_range() {
        assert_eq!(classify(-15.0), RiskLevel::Low);
        assert_eq!(classify(150.0), RiskLevel::Critical);
        assert_eq!(classify(f64::NAN), RiskLevel::Low);
        assert_eq!(classify(f64::INFINITY), RiskLevel::Critical);
        assert_eq!(classify(f64::NEG_INFINITY), RiskLevel::Low);
    }

    #[test]
    fn test_classify_min_threshold_roundtrip() {
        for level in RiskLevel::ALL {
            assert_eq!(classify(level.min_score()), level);
        }
    }

    #[test]
    fn test_classify_monotonic() {
        let mut prev = classify(-10.0);
        let mut score = -10.0;
        while score <= 110.0 {
            let level = classify(score);
            assert!(level >= prev, "{} classified below {}", score, prev);
            prev = level;
            score += 0.25;
        }
    }

    #[test]
    fn test_priority_and_ordinal() {
        assert_eq!(RiskLevel::Low.priority(), 1);
        assert_eq!(RiskLevel::Critical.priority(), 4);
        for (i, level) in RiskLevel::ALL.iter().enumerate() {
            assert_eq!(level.ordinal(), i);
        }
    }

    #[test]
    fn test_flat_colors() {
        assert_eq!(flat_color(RiskLevel::Critical).hex(), "#e74c3c");
        assert_eq!(flat_color(RiskLevel::High).hex(), "#f39c12");
        assert_eq!(flat_color(RiskLevel::Medium).hex(), "#f1c40f");
        assert_eq!(flat_color(RiskLevel::Low).hex(), "#2ecc71");
    }

    #[test]
    fn test_gradient_endpoints() {
        let red = gradient_color(100.0);
        assert_eq!(red.hue, 0.0);
        assert_eq!(red.saturation, 100.0);
        assert_eq!(red.lightness, 50.0);

        let green = gradient_color(0.0);
        assert_eq!(green.hue, 120.0);
        assert_eq!(green.saturation, 70.0);
    }

    #[test]
    fn test_gradient_clamps() {
        assert_eq!(gradient_color(250.0), gradient_color(100.0));
        assert_eq!(gradient_color(-3.0), gradient_color(0.0));
        assert_eq!(gradient_color(f64::NAN), gradient_color(0.0));
    }

    #[test]
    fn test_hsl_to_rgb() {
        assert_eq!(gradient_color(100.0).to_rgb(), Rgb::new(255, 0, 0));
        let green = Hsl { hue: 120.0, saturation: 100.0, lightness: 50.0 };
        assert_eq!(green.to_rgb(), Rgb::new(0, 255, 0));
        let grey = Hsl { hue: 200.0, saturation: 0.0, lightness: 50.0 };
        assert_eq!(grey.to_rgb(), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_range_labels() {
        assert_eq!(RiskLevel::Low.range_label(), "<40%");
        assert_eq!(RiskLevel::Critical.range_label(), "80%+");
    }
}

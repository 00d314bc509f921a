//! AFM advance widths for the standard PDF fonts, in 1/1000 em.
//!
//! Tables cover printable ASCII (32..=126). Other characters use the
//! font's average width.

use super::StandardFont;

pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
}

const FIRST_CHAR: u32 = 32;

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// Times bold and italic faces reuse the roman table.
#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

static COURIER: [u16; 95] = [600; 95];

static HELVETICA_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA,
    default_width: 556,
};

static HELVETICA_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD,
    default_width: 611,
};

static TIMES_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &TIMES_ROMAN,
    default_width: 500,
};

static COURIER_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &COURIER,
    default_width: 600,
};

impl StandardFontMetrics {
    /// Advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let units = if (FIRST_CHAR..FIRST_CHAR + 95).contains(&code) {
            self.widths[(code - FIRST_CHAR) as usize]
        } else {
            self.default_width
        };
        units as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

impl StandardFont {
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &HELVETICA_METRICS,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &HELVETICA_BOLD_METRICS,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => {
                &TIMES_METRICS
            }
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &COURIER_METRICS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space() {
        let w = StandardFont::Helvetica.metrics().char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn courier_is_monospaced() {
        let m = StandardFont::Courier.metrics();
        assert_eq!(m.measure_string("iiii", 10.0, 0.0), m.measure_string("MMMM", 10.0, 0.0));
        assert!((m.measure_string("abc", 10.0, 0.0) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn non_ascii_uses_average_width() {
        let w = StandardFont::Helvetica.metrics().char_width('é', 10.0);
        assert!((w - 5.56).abs() < 1e-9);
    }
}

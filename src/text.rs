//! # Label Wrapping
//!
//! Greedy line breaking for legend labels. Break opportunities follow
//! UAX#14; a word wider than the available width is force-broken between
//! characters so no line ever exceeds the cell.

use crate::font::{FontContext, FontSpec};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width without trailing spaces.
    pub width: f64,
}

/// Break opportunity *before* each char index. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// End of `chars[start..end]` without its line terminator (`\r\n` counts
/// as one).
fn content_end(chars: &[char], start: usize, mut end: usize) -> usize {
    if end >= start + 2 && chars[end - 2..end] == ['\r', '\n'] {
        return end - 2;
    }
    if end > start && is_newline(chars[end - 1]) {
        end -= 1;
    }
    end
}

fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && chars[end - 1] == ' ' {
        end -= 1;
    }
    BrokenLine {
        text: chars.iter().collect(),
        width: widths[..end].iter().sum(),
    }
}

/// Wrap `text` into lines no wider than `max_width` (unless a single
/// character is wider). `max_width` may be infinite.
pub fn break_into_lines(
    fonts: &FontContext,
    text: &str,
    max_width: f64,
    font: &FontSpec,
) -> Vec<BrokenLine> {
    if text.is_empty() {
        return vec![BrokenLine {
            text: String::new(),
            width: 0.0,
        }];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .map(|&ch| {
            if is_newline(ch) {
                0.0
            } else {
                fonts.char_width(ch, font)
            }
        })
        .collect();
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break_point: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = content_end(&chars, line_start, i);
                    lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
                    line_start = i;
                    line_width = 0.0;
                    last_break_point = None;
                }
                Some(BreakOpportunity::Allowed) => last_break_point = Some(i - 1),
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        // Trailing spaces hang past the edge.
        if ch == ' ' || line_width + widths[i] <= max_width || line_start == i {
            line_width += widths[i];
            continue;
        }

        match last_break_point.filter(|bp| *bp >= line_start) {
            Some(bp) => {
                lines.push(make_line(&chars[line_start..=bp], &widths[line_start..=bp]));
                line_start = bp + 1;
                line_width = widths[line_start..=i].iter().sum();
            }
            None => {
                lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                line_start = i;
                line_width = widths[i];
            }
        }
        last_break_point = None;
    }

    if line_start < chars.len() {
        let end = content_end(&chars, line_start, chars.len());
        lines.push(make_line(&chars[line_start..end], &widths[line_start..end]));
    }

    lines
}

/// Width of `text` set on a single line, ignoring explicit line breaks.
pub fn natural_width(fonts: &FontContext, text: &str, font: &FontSpec) -> f64 {
    text.split(is_newline)
        .map(|line| fonts.measure_string(line.trim_end(), font))
        .fold(0.0, f64::max)
}

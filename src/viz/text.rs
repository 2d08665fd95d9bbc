//! Text measurement and fitting.
//!
//! SVG output carries no font metrics, so widths are estimated from character counts.
//! Every layout decision that depends on text size goes through these helpers so the
//! annotation engine and the renderer agree.

/// Average glyph advance as a fraction of the font size.
const ADVANCE: f64 = 0.60;

/// Estimated pixel width of a single line.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> f64 {
    (text.chars().count() as f64 * font_px as f64 * ADVANCE).ceil()
}

/// Width of the widest `\n`-separated line.
pub fn widest_line_px(text: &str, font_px: u32) -> f64 {
    text.lines()
        .map(|l| estimate_text_width_px(l, font_px))
        .fold(0.0, f64::max)
}

/// Line height used for stacked labels.
pub fn line_height_px(font_px: u32) -> f64 {
    (font_px as f64 * 1.2).round()
}

/// Cut `text` so it fits in `max_px`, ending with a single ellipsis when shortened.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: f64) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    if out.is_empty() {
        return String::new();
    }
    out.push('…');
    out
}

/// Greedy word wrap to `max_px`. Words longer than a line are truncated.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: f64) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            cur = candidate;
        } else if cur.is_empty() {
            lines.push(truncate_to_width(word, font_px, max_px));
        } else {
            lines.push(std::mem::replace(&mut cur, word.to_string()));
            if estimate_text_width_px(&cur, font_px) > max_px {
                lines.push(truncate_to_width(&cur, font_px, max_px));
                cur.clear();
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_scale_with_chars_and_lines() {
        assert_eq!(estimate_text_width_px("abcd", 10), 24.0);
        assert_eq!(widest_line_px("UK lockdown\nbegins", 10), 66.0);
        assert_eq!(widest_line_px("", 10), 0.0);
    }

    #[test]
    fn truncation_fits_and_marks() {
        let t = truncate_to_width("Kensington and Chelsea", 10, 60.0);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 10) <= 60.0);
        assert_eq!(truncate_to_width("Brent", 10, 60.0), "Brent");
    }

    #[test]
    fn wrapping_respects_width() {
        let lines = wrap_text_to_width("Error: request failed with HTTP 404 Not Found", 12, 120.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| estimate_text_width_px(l, 12) <= 120.0));
    }
}

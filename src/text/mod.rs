//! # Text Layout
//!
//! Line breaking and text measurement for the layout probe.
//!
//! Inline content is flattened into styled characters with CSS whitespace
//! collapsing applied and `<br>` turned into a mandatory break, then broken
//! greedily at UAX#14 opportunities. Lines are as tall as the largest font
//! on them times the line-height multiplier, which is what the print
//! stylesheet does with `line-height: <number>`.

use crate::font::FontContext;
use crate::html::style_property;
use crate::model::Inline;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Resolved font for a run of characters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub italic: bool,
}

impl TextStyle {
    pub fn new(font_family: &str, font_size: f64) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size,
            font_weight: 400,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = 700;
        self
    }

    /// The style inside an inline wrapper: `<b>`, `<i>`, `<span style=…>`
    /// and the legacy `<font size=…>` that rich-text commands still emit.
    pub fn nested(&self, tag: &str, attrs: &[(String, String)]) -> Self {
        let mut style = self.clone();
        match tag {
            "b" | "strong" | "th" => style.font_weight = 700,
            "i" | "em" | "cite" | "var" => style.italic = true,
            "small" => style.font_size *= 0.833,
            "sub" | "sup" => style.font_size *= 0.75,
            "code" | "kbd" | "samp" | "tt" => style.font_family = "monospace".to_string(),
            _ => {}
        }
        for (name, value) in attrs {
            match name.as_str() {
                "style" => style.apply_declarations(value),
                "face" if tag == "font" => style.font_family = value.clone(),
                "size" if tag == "font" => {
                    if let Some(px) = legacy_font_size(value) {
                        style.font_size = px;
                    }
                }
                _ => {}
            }
        }
        style
    }

    fn apply_declarations(&mut self, css: &str) {
        if let Some(size) = style_property(css, "font-size").and_then(|v| parse_length(v, self.font_size)) {
            self.font_size = size;
        }
        if let Some(family) = style_property(css, "font-family") {
            self.font_family = family.to_string();
        }
        match style_property(css, "font-weight") {
            Some("bold") | Some("bolder") => self.font_weight = 700,
            Some("normal") | Some("lighter") => self.font_weight = 400,
            Some(n) => {
                if let Ok(w) = n.parse::<u32>() {
                    self.font_weight = w;
                }
            }
            None => {}
        }
        match style_property(css, "font-style") {
            Some("italic") | Some("oblique") => self.italic = true,
            Some("normal") => self.italic = false,
            _ => {}
        }
    }
}

/// Parse a CSS length into pixels. `em` and `%` are relative to `base`.
///
/// Negative lengths are rejected: font sizes and heights cannot be negative,
/// and a browser drops such a declaration rather than clamping it.
pub fn parse_length(value: &str, base: f64) -> Option<f64> {
    let v = value.trim();
    let (num, unit) = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .map(|i| (&v[..i], v[i..].trim()))
        .unwrap_or((v, ""));
    let n: f64 = num.parse().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    let px = match unit {
        "" | "px" => n,
        "pt" => n * 96.0 / 72.0,
        "em" | "rem" => n * base,
        "%" => n / 100.0 * base,
        "in" => n * 96.0,
        "cm" => n * 96.0 / 2.54,
        "mm" => n * 96.0 / 25.4,
        _ => return None,
    };
    Some(px)
}

/// `<font size="1..7">` as browsers map it.
fn legacy_font_size(value: &str) -> Option<f64> {
    let px = match value.trim() {
        "1" => 10.0,
        "2" => 13.0,
        "3" => 16.0,
        "4" => 18.0,
        "5" => 24.0,
        "6" => 32.0,
        "7" => 48.0,
        _ => return None,
    };
    Some(px)
}

/// A styled character for multi-style line breaking.
#[derive(Debug, Clone)]
pub struct StyledChar {
    pub ch: char,
    pub style: TextStyle,
}

/// A line of text from multi-style line breaking.
#[derive(Debug, Clone)]
pub struct RunBrokenLine {
    pub chars: Vec<StyledChar>,
    pub width: f64,
    /// Largest font size on the line; empty lines keep the block's own.
    pub font_size: f64,
}

impl RunBrokenLine {
    pub fn text(&self) -> String {
        self.chars.iter().map(|sc| sc.ch).collect()
    }
}

fn is_collapsible(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n' || c == '\r' || c == '\u{000C}'
}

/// Flatten an inline tree into styled characters the way a browser lays it
/// out: whitespace runs collapse to one space (also across element
/// boundaries), leading whitespace is dropped and `<br>` becomes `'\n'`.
pub fn flatten_inlines(inlines: &[Inline], style: &TextStyle) -> Vec<StyledChar> {
    let mut out = Vec::new();
    flatten_into(inlines, style, &mut out);
    out
}

fn flatten_into(inlines: &[Inline], style: &TextStyle, out: &mut Vec<StyledChar>) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => {
                for ch in t.chars() {
                    if is_collapsible(ch) {
                        let after_space = out.last().map(|sc| sc.ch == ' ' || sc.ch == '\n');
                        if after_space.unwrap_or(true) {
                            continue;
                        }
                        out.push(StyledChar {
                            ch: ' ',
                            style: style.clone(),
                        });
                    } else {
                        out.push(StyledChar {
                            ch,
                            style: style.clone(),
                        });
                    }
                }
            }
            Inline::Break => {
                if out.last().map(|sc| sc.ch == ' ').unwrap_or(false) {
                    out.pop();
                }
                out.push(StyledChar {
                    ch: '\n',
                    style: style.clone(),
                });
            }
            // Replaced inline content, sized as one em-wide glyph unless it says otherwise.
            Inline::Element(el) if el.tag == "img" => {
                let height = el
                    .attr("height")
                    .and_then(|h| parse_length(h, style.font_size))
                    .or_else(|| {
                        el.attr("style")
                            .and_then(|s| style_property(s, "height"))
                            .and_then(|h| parse_length(h, style.font_size))
                    })
                    .unwrap_or(style.font_size);
                let mut s = style.clone();
                s.font_size = height;
                out.push(StyledChar { ch: '\u{FFFC}', style: s });
            }
            Inline::Element(el) => {
                let nested = style.nested(&el.tag, &el.attrs);
                flatten_into(&el.children, &nested, out);
            }
        }
    }
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the break opportunity *before* that character. Index 0 is
/// always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break styled characters into lines no wider than `max_width`.
    ///
    /// Greedy: each line takes as many characters as fit, backing up to the
    /// last break opportunity. A word wider than the column is broken
    /// mid-word, as `overflow-wrap: break-word` does.
    pub fn break_runs_into_lines(
        &self,
        font_context: &FontContext,
        chars: &[StyledChar],
        max_width: f64,
    ) -> Vec<RunBrokenLine> {
        if chars.is_empty() {
            return Vec::new();
        }

        let char_widths: Vec<f64> = chars
            .iter()
            .map(|sc| {
                if sc.ch == '\u{FFFC}' {
                    return sc.style.font_size;
                }
                font_context.char_width(
                    sc.ch,
                    &sc.style.font_family,
                    sc.style.font_weight,
                    sc.style.italic,
                    sc.style.font_size,
                )
            })
            .collect();

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        let plain_text: String = chars.iter().map(|sc| sc.ch).collect();
        let break_opps = compute_break_opportunities(&plain_text);

        for (i, sc) in chars.iter().enumerate() {
            let char_width = char_widths[i];

            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if chars[i - 1].ch == '\n' { i - 1 } else { i };
                        lines.push(self.make_run_line(&chars[line_start..end], &char_widths[line_start..end], &chars[i - 1]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => last_break_point = Some(i - 1),
                    None => {}
                }
            }

            if sc.ch == '\n' {
                continue;
            }

            // Spaces may hang past the edge; only visible content overflows
            if sc.ch != ' ' && line_width + char_width > max_width && line_start < i {
                let break_at = match last_break_point {
                    Some(bp) if bp >= line_start => bp + 1,
                    _ => i,
                };
                lines.push(self.make_run_line(
                    &chars[line_start..break_at],
                    &char_widths[line_start..break_at],
                    &chars[line_start],
                ));
                line_start = break_at;
                line_width = char_widths[line_start..=i]
                    .iter()
                    .zip(&chars[line_start..=i])
                    .filter(|(_, sc)| sc.ch != '\n')
                    .map(|(w, _)| w)
                    .sum();
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            let last = &chars[chars.len() - 1];
            let end = if last.ch == '\n' && chars.len() - 1 > line_start {
                chars.len() - 1
            } else {
                chars.len()
            };
            let rest: Vec<StyledChar> = chars[line_start..end]
                .iter()
                .filter(|sc| sc.ch != '\n')
                .cloned()
                .collect();
            let widths: Vec<f64> = chars[line_start..end]
                .iter()
                .zip(&char_widths[line_start..end])
                .filter(|(sc, _)| sc.ch != '\n')
                .map(|(_, w)| *w)
                .collect();
            lines.push(self.make_run_line(&rest, &widths, &chars[line_start]));
        }

        lines
    }

    fn make_run_line(&self, chars: &[StyledChar], widths: &[f64], fallback: &StyledChar) -> RunBrokenLine {
        let mut width: f64 = widths.iter().sum();

        let mut i = chars.len();
        while i > 0 && chars[i - 1].ch == ' ' {
            i -= 1;
            width -= widths[i];
        }

        let font_size = chars
            .iter()
            .map(|sc| sc.style.font_size)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
            .unwrap_or(fallback.style.font_size);

        RunBrokenLine {
            chars: chars.to_vec(),
            width,
            font_size,
        }
    }

    /// Measure the width of a string on a single line.
    pub fn measure_width(&self, font_context: &FontContext, text: &str, style: &TextStyle) -> f64 {
        font_context.measure_string(
            text,
            &style.font_family,
            style.font_weight,
            style.italic,
            style.font_size,
        )
    }

    /// Total height of inline content laid out in a `max_width` column.
    pub fn measure_inlines(
        &self,
        font_context: &FontContext,
        inlines: &[Inline],
        style: &TextStyle,
        max_width: f64,
        line_height: f64,
    ) -> f64 {
        let chars = flatten_inlines(inlines, style);
        self.break_runs_into_lines(font_context, &chars, max_width)
            .iter()
            .map(|line| {
                // Images sit on the baseline at their own height, no leading
                let tallest = line
                    .chars
                    .iter()
                    .map(|sc| {
                        if sc.ch == '\u{FFFC}' {
                            sc.style.font_size
                        } else {
                            sc.style.font_size * line_height
                        }
                    })
                    .fold(0.0, f64::max);
                if line.chars.is_empty() {
                    line.font_size * line_height
                } else {
                    tallest
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineElement;

    fn style() -> TextStyle {
        TextStyle::new("Helvetica", 10.0)
    }

    fn lines_of(text: &str, width: f64) -> Vec<String> {
        let ctx = FontContext::new();
        let chars = flatten_inlines(&[Inline::Text(text.to_string())], &style());
        TextLayout::new()
            .break_runs_into_lines(&ctx, &chars, width)
            .iter()
            .map(|l| l.text().trim_end().to_string())
            .collect()
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(lines_of("Hello world", 1000.0), vec!["Hello world"]);
    }

    #[test]
    fn breaks_at_spaces() {
        // "aaaa " is 5 × 5.56 = 27.8 at 10px
        let lines = lines_of("aaaa aaaa aaaa", 50.0);
        assert_eq!(lines, vec!["aaaa aaaa", "aaaa"]);
    }

    #[test]
    fn overlong_word_breaks_mid_word() {
        let lines = lines_of("aaaaaaaaaaaaaaaaaaaa", 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "aaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn whitespace_collapses() {
        let chars = flatten_inlines(&[Inline::Text("  a \n\t b  ".into())], &style());
        let text: String = chars.iter().map(|c| c.ch).collect();
        assert_eq!(text, "a b ");
    }

    #[test]
    fn br_forces_a_line() {
        let ctx = FontContext::new();
        let inlines = vec![
            Inline::Text("one".into()),
            Inline::Break,
            Inline::Text("two".into()),
        ];
        let h = TextLayout::new().measure_inlines(&ctx, &inlines, &style(), 1000.0, 1.5);
        assert!((h - 30.0).abs() < 1e-9);
    }

    #[test]
    fn lone_br_is_one_line() {
        let ctx = FontContext::new();
        let h = TextLayout::new().measure_inlines(&ctx, &[Inline::Break], &style(), 1000.0, 1.5);
        assert!((h - 15.0).abs() < 1e-9);
        let empty = TextLayout::new().measure_inlines(&ctx, &[], &style(), 1000.0, 1.5);
        assert_eq!(empty, 0.0);
    }

    #[test]
    fn larger_span_raises_line_height() {
        let ctx = FontContext::new();
        let inlines = vec![
            Inline::Text("small ".into()),
            Inline::Element(InlineElement::new(
                "span",
                vec![("style".into(), "font-size: 20px".into())],
                vec![Inline::Text("big".into())],
            )),
        ];
        let h = TextLayout::new().measure_inlines(&ctx, &inlines, &style(), 1000.0, 1.5);
        assert!((h - 30.0).abs() < 1e-9);
    }

    #[test]
    fn bold_wrapper_changes_weight() {
        let s = style().nested("strong", &[]);
        assert_eq!(s.font_weight, 700);
        let s = style().nested("span", &[("style".into(), "font-weight: normal".into())]);
        assert_eq!(s.font_weight, 400);
    }

    #[test]
    fn css_lengths() {
        assert_eq!(parse_length("12px", 16.0), Some(12.0));
        assert_eq!(parse_length("12pt", 16.0), Some(16.0));
        assert_eq!(parse_length("1.5em", 10.0), Some(15.0));
        assert_eq!(parse_length("50%", 20.0), Some(10.0));
        assert_eq!(parse_length("auto", 20.0), None);
        assert_eq!(parse_length("-20px", 16.0), None);
    }

    #[test]
    fn negative_font_size_is_ignored() {
        let s = style().nested("span", &[("style".into(), "font-size: -20px".into())]);
        assert_eq!(s.font_size, 10.0);
        let s = style().nested("span", &[("style".into(), "font-size: 2em".into())]);
        assert_eq!(s.font_size, 20.0);
    }

    #[test]
    fn bold_measures_wider() {
        let ctx = FontContext::new();
        let layout = TextLayout::new();
        let regular = layout.measure_width(&ctx, "Prepared by:", &style());
        let bold = layout.measure_width(&ctx, "Prepared by:", &style().bold());
        assert!(bold > regular);
        assert!((layout.measure_width(&ctx, "aa", &style()) - 11.12).abs() < 1e-9);
    }
}

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::{MeasuredSize, TextMetrics};
use crate::markup::{Font, FontFamily, StyledRun};

/// Tolerance for comparing accumulated advances against the width limit.
const EPSILON: f32 = 0.01;
const TAB_COLUMNS: usize = 4;

/// Lay `run` out with greedy word wrapping at `max_width` and return the
/// smallest box that shows every glyph.
pub fn layout(run: &StyledRun, max_width: f32, metrics: &TextMetrics) -> MeasuredSize {
    if max_width.is_nan() || max_width <= 0.0 || run.is_empty() {
        return MeasuredSize::ZERO;
    }

    let mut lines = LineBreaker::new(max_width);
    for slice in run.slices() {
        let font = &slice.attributes.font;
        for grapheme in slice.text.graphemes(true) {
            if grapheme == "\n" || grapheme == "\r\n" {
                lines.note_font(font.size);
                lines.newline();
            } else if grapheme.chars().all(char::is_whitespace) {
                lines.note_font(font.size);
                lines.space(advance(grapheme, font, metrics));
            } else {
                lines.glyph(advance(grapheme, font, metrics), font.size);
            }
        }
    }
    let (width, text_height) = lines.finish();

    MeasuredSize {
        width: width.ceil().min(max_width),
        height: (text_height * metrics.line_height).ceil(),
    }
}

fn advance(grapheme: &str, font: &Font, metrics: &TextMetrics) -> f32 {
    let columns = match grapheme {
        "\t" => TAB_COLUMNS,
        g if g.chars().all(char::is_whitespace) => 1,
        g => g.width(),
    };
    let ratio = match font.family {
        FontFamily::Monospace => metrics.monospace_advance,
        FontFamily::Body => metrics.body_advance,
    };
    let weight = if font.is_bold() { metrics.bold_factor } else { 1.0 };
    columns as f32 * font.size * ratio * weight
}

#[derive(Debug, Default)]
struct Word {
    /// (advance, font size) per grapheme.
    glyphs: Vec<(f32, f32)>,
    width: f32,
}

/// Greedy line filling. Widths are in points, heights in font-size units
/// (the caller applies the line-height factor).
struct LineBreaker {
    max_width: f32,
    widest: f32,
    height: f32,
    line_width: f32,
    /// Largest font size seen on the current line.
    line_size: f32,
    line_has_glyphs: bool,
    pending_space: f32,
    word: Word,
    last_size: f32,
}

impl LineBreaker {
    fn new(max_width: f32) -> Self {
        Self {
            max_width,
            widest: 0.0,
            height: 0.0,
            line_width: 0.0,
            line_size: 0.0,
            line_has_glyphs: false,
            pending_space: 0.0,
            word: Word::default(),
            last_size: 0.0,
        }
    }

    fn note_font(&mut self, size: f32) {
        self.line_size = self.line_size.max(size);
        self.last_size = size;
    }

    fn glyph(&mut self, advance: f32, size: f32) {
        self.last_size = size;
        self.word.glyphs.push((advance, size));
        self.word.width += advance;
    }

    fn space(&mut self, advance: f32) {
        self.place_word();
        if self.line_has_glyphs {
            self.pending_space += advance;
        }
    }

    fn newline(&mut self) {
        self.place_word();
        self.end_line();
    }

    fn finish(mut self) -> (f32, f32) {
        self.place_word();
        if self.line_has_glyphs || self.line_size > 0.0 {
            self.end_line();
        }
        (self.widest, self.height)
    }

    fn end_line(&mut self) {
        let size = if self.line_size > 0.0 {
            self.line_size
        } else {
            self.last_size
        };
        self.widest = self.widest.max(self.line_width);
        self.height += size;
        self.line_width = 0.0;
        self.line_size = 0.0;
        self.line_has_glyphs = false;
        self.pending_space = 0.0;
    }

    fn place_word(&mut self) {
        let word = std::mem::take(&mut self.word);
        if word.glyphs.is_empty() {
            return;
        }
        if self.line_has_glyphs {
            if self.line_width + self.pending_space + word.width <= self.max_width + EPSILON {
                self.line_width += self.pending_space + word.width;
                self.pending_space = 0.0;
                for &(_, size) in &word.glyphs {
                    self.line_size = self.line_size.max(size);
                }
                return;
            }
            self.end_line();
        }
        self.pending_space = 0.0;

        // Fresh line: break inside the word only when it cannot fit whole.
        for (advance, size) in word.glyphs {
            if self.line_has_glyphs && self.line_width + advance > self.max_width + EPSILON {
                self.end_line();
            }
            self.line_width += advance;
            self.line_size = self.line_size.max(size);
            self.line_has_glyphs = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{render, FontWeight, TextAttributes, TextStyle};

    /// 10pt body font at ratio 1.0: every column is exactly 10pt wide.
    fn metrics() -> TextMetrics {
        TextMetrics {
            body_advance: 1.0,
            monospace_advance: 1.0,
            bold_factor: 1.5,
            line_height: 1.0,
        }
    }

    fn attrs() -> TextAttributes {
        TextStyle {
            font_size: 10.0,
            ..TextStyle::default()
        }
        .base_attributes()
    }

    fn plain(text: &str) -> StyledRun {
        StyledRun::plain(text, attrs())
    }

    #[test]
    fn single_line_shrinks_to_content() {
        let size = layout(&plain("hello"), 200.0, &metrics());
        assert_eq!(size, MeasuredSize { width: 50.0, height: 10.0 });
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // "aaa bbb ccc" is 110pt; at 75pt "aaa bbb" (70) fits, "ccc" wraps.
        let size = layout(&plain("aaa bbb ccc"), 75.0, &metrics());
        assert_eq!(size, MeasuredSize { width: 70.0, height: 20.0 });
    }

    #[test]
    fn long_words_break_at_graphemes() {
        let size = layout(&plain("abcdefghij"), 40.0, &metrics());
        assert_eq!(size, MeasuredSize { width: 40.0, height: 30.0 });
    }

    #[test]
    fn explicit_newlines_and_blank_lines() {
        let size = layout(&plain("ab\n\nabcd"), 200.0, &metrics());
        assert_eq!(size, MeasuredSize { width: 40.0, height: 30.0 });
    }

    #[test]
    fn wide_graphemes_take_two_columns() {
        let size = layout(&plain("日本"), 200.0, &metrics());
        assert_eq!(size.width, 40.0);

        let size = layout(&plain("e\u{301}"), 200.0, &metrics());
        assert_eq!(size.width, 10.0);
    }

    #[test]
    fn bold_glyphs_are_wider() {
        let mut bold = attrs();
        bold.font.weight = FontWeight::Bold;
        let size = layout(&StyledRun::plain("ab", bold), 200.0, &metrics());
        assert_eq!(size.width, 30.0);
    }

    #[test]
    fn tallest_font_sets_line_height() {
        let style = TextStyle {
            font_size: 10.0,
            ..TextStyle::default()
        };
        let run = render("# Hi\n\nthere", &style);
        let size = layout(&run, 500.0, &metrics());
        assert_eq!(size.height, 26.0);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(layout(&plain("hello"), 0.0, &metrics()), MeasuredSize::ZERO);
        assert_eq!(layout(&plain("hello"), -5.0, &metrics()), MeasuredSize::ZERO);
        assert_eq!(layout(&plain("hello"), f32::NAN, &metrics()), MeasuredSize::ZERO);
        assert_eq!(layout(&StyledRun::default(), 100.0, &metrics()), MeasuredSize::ZERO);
    }

    #[test]
    fn infinite_width_never_wraps() {
        let size = layout(&plain("aaa bbb ccc"), f32::INFINITY, &metrics());
        assert_eq!(size, MeasuredSize { width: 110.0, height: 10.0 });
    }

    #[test]
    fn width_never_exceeds_constraint() {
        let size = layout(&plain("W"), 4.0, &metrics());
        assert_eq!(size, MeasuredSize { width: 4.0, height: 10.0 });
    }
}

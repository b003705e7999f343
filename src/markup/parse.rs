use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use super::attributes::{FontFamily, FontStyle, FontWeight, TextAttributes, TextStyle};
use super::run::{RunBuilder, StyledRun};
use super::MarkupError;

const BULLET: &str = "• ";
const RULE: &str = "———";

pub(super) fn parse(markup: &str, style: &TextStyle) -> Result<StyledRun, MarkupError> {
    let mut renderer = RunRenderer::new(style);
    for event in Parser::new(markup) {
        renderer.process_event(event)?;
    }
    renderer.finish()
}

struct RunRenderer<'s> {
    style: &'s TextStyle,
    out: RunBuilder,
    /// Attributes in effect; the bottom entry is the base set.
    attr_stack: Vec<TextAttributes>,
    /// End tags we expect, innermost last.
    open: Vec<TagEnd>,
    /// Next ordinal for each open list, `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// Set right after a list marker so a loose item's paragraph stays on
    /// the marker's line.
    after_marker: bool,
}

impl<'s> RunRenderer<'s> {
    fn new(style: &'s TextStyle) -> Self {
        Self {
            style,
            out: RunBuilder::default(),
            attr_stack: vec![style.base_attributes()],
            open: Vec::new(),
            lists: Vec::new(),
            after_marker: false,
        }
    }

    fn current(&self) -> TextAttributes {
        self.attr_stack
            .last()
            .cloned()
            .unwrap_or_else(|| self.style.base_attributes())
    }

    fn push_text(&mut self, text: &str) {
        let attributes = self.current();
        self.out.push(text, &attributes);
        self.after_marker = false;
    }

    /// Blocks start on a fresh line.
    fn start_block(&mut self) {
        if std::mem::take(&mut self.after_marker) {
            return;
        }
        if !self.out.is_empty() && !self.out.ends_with_newline() {
            self.out.push("\n", &self.style.base_attributes());
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), MarkupError> {
        match event {
            Event::Start(tag) => self.start_tag(tag)?,
            Event::End(end) => self.end_tag(end)?,
            Event::Text(text) if self.open.contains(&TagEnd::CodeBlock) => {
                self.push_text(&unescape_lt(&text))
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let mut attributes = self.current();
                attributes.font.family = FontFamily::Monospace;
                self.out.push(&unescape_lt(&code), &attributes);
                self.after_marker = false;
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.start_block();
                self.push_text(RULE);
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => self.push_text(&math),
            Event::Html(_) | Event::InlineHtml(_) => {}
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag) -> Result<(), MarkupError> {
        if self.open.len() >= self.style.max_nesting {
            return Err(MarkupError::TooDeep {
                limit: self.style.max_nesting,
            });
        }
        let mut attributes = self.current();
        match &tag {
            Tag::Paragraph | Tag::HtmlBlock => self.start_block(),
            Tag::Heading { level, .. } => {
                self.start_block();
                attributes.font.weight = FontWeight::Bold;
                attributes.font.size = self.style.font_size * heading_scale(*level);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                attributes.font.style = FontStyle::Italic;
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                attributes.font.family = FontFamily::Monospace;
            }
            Tag::List(start) => {
                self.start_block();
                self.lists.push(*start);
            }
            Tag::Item => {
                self.start_block();
                let prefix = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let prefix = format!("{n}. ");
                        *n += 1;
                        prefix
                    }
                    _ => BULLET.to_owned(),
                };
                self.push_text(&prefix);
                self.after_marker = true;
            }
            Tag::Emphasis => attributes.font.style = FontStyle::Italic,
            Tag::Strong => attributes.font.weight = FontWeight::Bold,
            Tag::Link { dest_url, .. } => {
                attributes.color = self.style.link_color;
                attributes.link = Some(dest_url.to_string());
            }
            _ => {}
        }
        self.open.push(tag.to_end());
        self.attr_stack.push(attributes);
        Ok(())
    }

    fn end_tag(&mut self, end: TagEnd) -> Result<(), MarkupError> {
        match self.open.pop() {
            Some(expected) if expected == end => {}
            _ => return Err(MarkupError::Unbalanced(format!("{end:?}"))),
        }
        self.attr_stack.pop();
        if let TagEnd::List(_) = end {
            self.lists.pop();
        }
        Ok(())
    }

    fn finish(self) -> Result<StyledRun, MarkupError> {
        if let Some(end) = self.open.last() {
            return Err(MarkupError::Unbalanced(format!("{end:?}")));
        }
        Ok(self.out.finish())
    }
}

/// Code is taken verbatim by the parser, so the `<` entity added before
/// parsing is still there.
fn unescape_lt(code: &str) -> String {
    code.replace("&lt;", "<")
}

fn heading_scale(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => 1.6,
        HeadingLevel::H2 => 1.4,
        HeadingLevel::H3 => 1.2,
        _ => 1.0,
    }
}

//! Message body markup (CommonMark) to styled text runs.

mod attributes;
mod parse;
mod run;

pub use attributes::{Color, Font, FontFamily, FontStyle, FontWeight, TextAttributes, TextStyle};
pub use run::{StyledRun, StyledSlice};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("markup nested deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("unbalanced markup near {0}")]
    Unbalanced(String),
}

/// Trim and neutralise `<` so it reaches the parser as an entity instead of
/// opening inline HTML.
pub fn escape_markup(markup: &str) -> String {
    markup.trim().replace('<', "&lt;")
}

/// Render a message body. Never fails: markup that cannot be parsed comes
/// back as the trimmed source text with base attributes.
pub fn render(markup: &str, style: &TextStyle) -> StyledRun {
    match parse::parse(&escape_markup(markup), style) {
        Ok(run) => run,
        Err(e) => {
            tracing::debug!("Rendering message body as plain text: {e}");
            StyledRun::plain(markup.trim(), style.base_attributes())
        }
    }
}

pub fn try_render(markup: &str, style: &TextStyle) -> Result<StyledRun, MarkupError> {
    parse::parse(&escape_markup(markup), style)
}

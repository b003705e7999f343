use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::attributes::TextAttributes;

#[derive(Clone, Debug, PartialEq, Hash)]
pub struct StyledSlice {
    pub text: String,
    pub attributes: TextAttributes,
}

/// Text with per-slice formatting. Adjacent slices never share attributes
/// and no slice is empty.
#[derive(Clone, Debug, Default, PartialEq, Hash)]
pub struct StyledRun {
    slices: Vec<StyledSlice>,
}

impl StyledRun {
    /// A single unformatted slice.
    pub fn plain(text: &str, attributes: TextAttributes) -> Self {
        let mut builder = RunBuilder::default();
        builder.push(text, &attributes);
        builder.finish()
    }

    pub fn slices(&self) -> &[StyledSlice] {
        &self.slices
    }

    pub fn text(&self) -> String {
        self.slices.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Number of characters across all slices.
    pub fn char_count(&self) -> usize {
        self.slices.iter().map(|s| s.text.chars().count()).sum()
    }

    /// Content hash used as the run's identity by measurement caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Accumulates slices, merging text that continues with the same attributes.
#[derive(Debug, Default)]
pub(crate) struct RunBuilder {
    slices: Vec<StyledSlice>,
}

impl RunBuilder {
    pub(crate) fn push(&mut self, text: &str, attributes: &TextAttributes) {
        if text.is_empty() {
            return;
        }
        match self.slices.last_mut() {
            Some(last) if last.attributes == *attributes => last.text.push_str(text),
            _ => self.slices.push(StyledSlice {
                text: text.to_owned(),
                attributes: attributes.clone(),
            }),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub(crate) fn ends_with_newline(&self) -> bool {
        self.slices.last().is_some_and(|s| s.text.ends_with('\n'))
    }

    /// Drops trailing line breaks left behind by the last block.
    pub(crate) fn finish(mut self) -> StyledRun {
        while let Some(last) = self.slices.last_mut() {
            let trimmed = last.text.trim_end_matches('\n').len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.slices.pop();
            } else {
                break;
            }
        }
        StyledRun { slices: self.slices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::attributes::{FontWeight, TextStyle};

    #[test]
    fn adjacent_equal_attributes_merge() {
        let base = TextStyle::default().base_attributes();
        let mut bold = base.clone();
        bold.font.weight = FontWeight::Bold;

        let mut builder = RunBuilder::default();
        builder.push("a", &base);
        builder.push("b", &base);
        builder.push("", &bold);
        builder.push("c", &bold);
        builder.push("\n\n", &base);
        let run = builder.finish();

        assert_eq!(run.slices().len(), 2);
        assert_eq!(run.slices()[0].text, "ab");
        assert_eq!(run.slices()[1].text, "c");
        assert_eq!(run.text(), "abc");
    }

    #[test]
    fn fingerprint_tracks_content() {
        let base = TextStyle::default().base_attributes();
        let a = StyledRun::plain("hello", base.clone());
        let b = StyledRun::plain("hello", base.clone());
        let c = StyledRun::plain("hello!", base);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}

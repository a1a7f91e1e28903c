//! Evidence anchor spans.
//!
//! A [`SourceSpan`] is a half-open byte-offset range into a guideline
//! section's body text. Spans are the provenance link from a scenario back to
//! the exact prose that justified it, so every span must stay within the
//! bounds of its originating section.

/// A half-open byte range `[start, end)` into a section's body text.
///
/// # Examples
///
/// ```
/// use cds_types::SourceSpan;
///
/// let text = "initiate ACE inhibitor therapy";
/// let span = SourceSpan::new(9, 22);
/// assert!(span.is_within(text));
/// assert_eq!(span.slice(text), Some("ACE inhibitor"));
///
/// let out_of_bounds = SourceSpan::new(10, 500);
/// assert!(!out_of_bounds.is_within(text));
/// assert_eq!(out_of_bounds.slice(text), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSpan {
    /// Start offset in bytes (inclusive).
    pub start: usize,
    /// End offset in bytes (exclusive).
    pub end: usize,
}

impl SourceSpan {
    /// Creates a new span. `start` must not exceed `end`; the empty span
    /// `start == end` is permitted.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns true if the span lies entirely within `text` and lands on
    /// UTF-8 character boundaries.
    pub fn is_within(&self, text: &str) -> bool {
        self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }

    /// Returns the spanned slice of `text`, or `None` if the span is out of
    /// bounds.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }

    /// Returns a new span shifted right by `offset` bytes.
    pub fn offset(&self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let text = "measure blood pressure";
        let span = SourceSpan::new(8, 22);
        assert!(span.is_within(text));
        assert_eq!(span.slice(text), Some("blood pressure"));
        assert_eq!(span.len(), 14);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_out_of_bounds() {
        let text = "short";
        assert!(!SourceSpan::new(0, 6).is_within(text));
        assert_eq!(SourceSpan::new(0, 6).slice(text), None);
    }

    #[test]
    fn test_span_char_boundary() {
        // "µ" is two bytes; offset 1 is not a char boundary.
        let text = "µg/kg";
        assert!(!SourceSpan::new(1, 3).is_within(text));
        assert!(SourceSpan::new(0, 2).is_within(text));
    }

    #[test]
    fn test_empty_span() {
        let span = SourceSpan::new(3, 3);
        assert!(span.is_empty());
        assert_eq!(span.len(), 0);
    }

    #[test]
    fn test_offset() {
        let span = SourceSpan::new(2, 5).offset(10);
        assert_eq!(span, SourceSpan::new(12, 15));
    }
}

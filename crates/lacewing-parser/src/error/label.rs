//! Labeled source spans for diagnostic messages.
//!
//! A label associates a message with a span in the user's command. Primary
//! labels mark the failing position; secondary labels add context such as
//! "first value here" on a duplicate-clause error.

use crate::span::Span;

/// A labeled span in the source command.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label marking the main error location.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label providing additional context.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(10..20), "unexpected token");

        assert_eq!(label.span().start(), 10);
        assert_eq!(label.span().end(), 20);
        assert_eq!(label.message(), "unexpected token");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(5..15), "first value here");

        assert!(!label.is_primary());
        assert!(label.is_secondary());
    }
}

//! Collector for accumulating diagnostics during a processing phase.
//!
//! The tokenizer reports every bad character in one pass instead of stopping
//! at the first; the [`DiagnosticCollector`] gathers those diagnostics and
//! converts them to a single result at the end of the phase.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during a processing phase.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection and return a result.
    ///
    /// Warnings alone do not fail the phase; they are currently discarded in
    /// the success case.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }
}

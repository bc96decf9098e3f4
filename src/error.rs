//! Error types for registry loading, parsing, arithmetic and formatting.

use thiserror::Error;

use crate::dimension::Dimensionality;

/// Source location of a token or diagnostic, as byte offsets into the
/// parsed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span pointing at a single position.
    pub fn point(at: usize) -> Self {
        Self {
            start: at,
            end: at + 1,
        }
    }

    /// The text this span covers in `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end.min(source.len())]
    }

    /// 1-based line and column of the span start.
    pub fn line_column(&self, source: &str) -> (usize, usize) {
        let upto = &source[..self.start.min(source.len())];
        let line = upto.matches('\n').count() + 1;
        let column = upto.rfind('\n').map(|pos| self.start - pos).unwrap_or(self.start + 1);
        (line, column)
    }

    /// Renders the offending source line with a caret under the span.
    pub fn caret(&self, source: &str) -> String {
        let start = self.start.min(source.len());
        let line_start = source[..start].rfind('\n').map(|pos| pos + 1).unwrap_or(0);
        let line_end = source[start..]
            .find('\n')
            .map(|pos| start + pos)
            .unwrap_or(source.len());
        let line = &source[line_start..line_end];
        let column = source[line_start..start].chars().count();
        let width = self.text(source).chars().count().max(1);
        format!("{}\n{}{}", line, " ".repeat(column), "^".repeat(width))
    }
}

/// Everything that can go wrong in this crate.
///
/// Parser-family variants carry the source string along with the span so
/// the error can render a caret diagnostic on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantexError {
    /// Lexing or parsing failed. Covers unrecognized characters, wrong or
    /// missing tokens, unmatched parentheses and unresolved names inside
    /// expressions.
    #[error("{message}")]
    Parse {
        message: String,
        span: Span,
        source_text: String,
    },

    /// A name passed to [`crate::UnitRegistry::unit`] does not resolve.
    #[error("invalid unit name: {name}")]
    InvalidUnitName {
        name: String,
        suggestions: Vec<String>,
    },

    /// Arithmetic required matching dimensionalities and did not get them.
    #[error("operation with different dimensionalities")]
    DimensionalityMismatch,

    /// A quantity or resolution was formatted against a context of a
    /// different dimensionality.
    #[error("dimensionality mismatch for context '{context}'")]
    ContextDimensionality { context: String },

    /// Values from two distinct registries were combined.
    #[error("operation with different registries")]
    RegistryMismatch,

    #[error("unknown context: {0}")]
    UnknownContext(String),

    #[error("context '{context}' has no variant for system '{system}'")]
    UnknownSystem { context: String, system: String },

    /// Registry construction failures. Partial registries are never
    /// exposed; the load aborts with one of these.
    #[error("duplicate dimensionality name: {0}")]
    DuplicateExtentName(String),

    #[error("duplicate dimensionality extent: {0}")]
    DuplicateExtent(Dimensionality),

    #[error("mismatched option dimensionality in context '{0}'")]
    MismatchedOptionDimensionality(String),

    #[error("unknown prefix system: {0}")]
    UnknownPrefixSystem(String),

    /// A snapshot referenced a unit id that is not part of it.
    #[error("snapshot references unknown unit id: {0}")]
    UnknownUnitId(String),

    /// The registry document could not be decoded.
    #[error("invalid registry document: {0}")]
    Decode(String),
}

impl QuantexError {
    pub(crate) fn parse(message: impl Into<String>, span: Span, source: &str) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            source_text: source.to_string(),
        }
    }

    /// Caret-pointing diagnostic for parser-family errors, `None` for the
    /// rest.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Parse {
                message,
                span,
                source_text,
            } => {
                let (line, column) = span.line_column(source_text);
                Some(format!(
                    "{message} at {line}:{column}\n{}",
                    span.caret(source_text)
                ))
            }
            _ => None,
        }
    }

    /// The span of a parser-family error.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Parse { span, .. } => Some(*span),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_span() {
        let source = "10 bogus";
        let err = QuantexError::parse("invalid unit 'bogus'", Span::new(3, 8), source);
        let diagnostic = err.diagnostic().unwrap();
        assert!(diagnostic.contains("10 bogus"));
        assert!(diagnostic.contains("   ^^^^^"));
    }

    #[test]
    fn line_column_counts_from_one() {
        let span = Span::new(3, 4);
        assert_eq!(span.line_column("10 m"), (1, 4));
    }
}

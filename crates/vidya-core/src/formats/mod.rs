//! Format abstraction layer for multi-format support
//!
//! Each supported file format implements the `DocumentParser` trait, and the
//! `ParserRegistry` resolves a parser by file extension and isolates failures:
//! whatever goes wrong inside a parser, the registry reports it as a
//! `ParseOutcome` instead of propagating it.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::error::Result;
use crate::models::TextUnit;
use crate::processing::SectionConfig;

pub mod pdf;
pub mod spreadsheet;
pub mod text;

pub use pdf::PdfParser;
pub use spreadsheet::SpreadsheetParser;
pub use text::TextParser;

/// Parser trait that all format implementations must implement
pub trait DocumentParser: Send + Sync {
    /// Parse one file into zero or more units.
    ///
    /// Implementations return an error for unreadable or corrupt input and
    /// never emit units with blank content.
    fn parse(&self, path: &Path) -> Result<Vec<TextUnit>>;

    /// Get supported file extensions, lowercase and without the dot
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "PDF", "Spreadsheet")
    fn format_name(&self) -> &str;
}

/// Result of dispatching one file through the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The file was parsed; the list may be empty for blank documents
    Parsed(Vec<TextUnit>),

    /// No parser handles this extension
    Unsupported { extension: String },

    /// The parser failed; the file contributes nothing
    Failed { reason: String },
}

impl ParseOutcome {
    /// Units produced, empty for anything but a successful parse
    pub fn into_units(self) -> Vec<TextUnit> {
        match self {
            ParseOutcome::Parsed(units) => units,
            _ => Vec::new(),
        }
    }
}

/// Central registry for document parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Registry with the PDF, plain text and spreadsheet parsers
    pub fn with_defaults(sections: SectionConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PdfParser::new(sections)));
        registry.register(Box::new(TextParser));
        registry.register(Box::new(SpreadsheetParser));
        registry
    }

    /// Register a parser
    pub fn register(&mut self, parser: Box<dyn DocumentParser>) {
        self.parsers.push(parser);
    }

    /// Find the parser for a path by case-insensitive extension
    pub fn detect(&self, path: &Path) -> Option<&dyn DocumentParser> {
        let extension = extension_of(path)?;

        self.parsers
            .iter()
            .find(|p| p.supported_extensions().contains(&extension.as_str()))
            .map(|p| p.as_ref())
    }

    /// Parse a file, turning every failure mode into a `ParseOutcome`
    pub fn parse(&self, path: &Path) -> ParseOutcome {
        let Some(parser) = self.detect(path) else {
            let extension = extension_of(path).unwrap_or_else(|| "none".to_string());
            tracing::warn!("Skipping unsupported file type: {}", path.display());
            return ParseOutcome::Unsupported { extension };
        };

        // Third-party extractors can panic on malformed input
        let result = panic::catch_unwind(AssertUnwindSafe(|| parser.parse(path)));

        match result {
            Ok(Ok(units)) => {
                tracing::debug!(
                    "Parsed {} ({}) into {} units",
                    path.display(),
                    parser.format_name(),
                    units.len()
                );
                ParseOutcome::Parsed(units)
            }
            Ok(Err(e)) => {
                tracing::warn!("Error processing {}: {}", path.display(), e);
                ParseOutcome::Failed { reason: e.to_string() }
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::warn!("Parser panicked on {}: {}", path.display(), reason);
                ParseOutcome::Failed { reason: format!("parser panicked: {}", reason) }
            }
        }
    }

    /// Get list of all supported extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.parsers
            .iter()
            .flat_map(|p| p.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered parsers
    pub fn parsers(&self) -> &[Box<dyn DocumentParser>] {
        &self.parsers
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults(SectionConfig::default())
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// File name used as `source_file` provenance
pub(crate) fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidyaError;
    use crate::models::{TxtUnitMeta, UnitMetadata};

    // Mock parser for testing
    struct MockParser {
        extensions: Vec<&'static str>,
        name: &'static str,
        behaviour: Behaviour,
    }

    enum Behaviour {
        Emit,
        Fail,
        Panic,
    }

    impl DocumentParser for MockParser {
        fn parse(&self, path: &Path) -> Result<Vec<TextUnit>> {
            match self.behaviour {
                Behaviour::Emit => Ok(TextUnit::new(
                    "mock content",
                    UnitMetadata::Txt(TxtUnitMeta { source_file: source_file_name(path) }),
                )
                .into_iter()
                .collect()),
                Behaviour::Fail => Err(VidyaError::DocumentExtraction {
                    format: self.name.to_string(),
                    reason: "corrupt".to_string(),
                }),
                Behaviour::Panic => panic!("malformed xref table"),
            }
        }

        fn supported_extensions(&self) -> &[&str] {
            &self.extensions
        }

        fn format_name(&self) -> &str {
            self.name
        }
    }

    fn registry_with(behaviour: Behaviour) -> ParserRegistry {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(MockParser { extensions: vec!["md"], name: "Mock", behaviour }));
        registry
    }

    #[test]
    fn test_default_registry_formats() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.supported_formats(), vec!["pdf", "txt", "xlsx"]);
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.detect(Path::new("Book.PDF")).unwrap().format_name(), "PDF");
        assert_eq!(registry.detect(Path::new("notes.Txt")).unwrap().format_name(), "Text");
        assert!(registry.detect(Path::new("photo.png")).is_none());
        assert!(registry.detect(Path::new("README")).is_none());
    }

    #[test]
    fn test_unsupported_outcome() {
        let registry = ParserRegistry::default();
        assert_eq!(
            registry.parse(Path::new("slides.pptx")),
            ParseOutcome::Unsupported { extension: "pptx".to_string() }
        );
        assert_eq!(
            registry.parse(Path::new("Makefile")),
            ParseOutcome::Unsupported { extension: "none".to_string() }
        );
    }

    #[test]
    fn test_successful_parse() {
        let outcome = registry_with(Behaviour::Emit).parse(Path::new("dir/notes.md"));
        let units = outcome.into_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_file(), "notes.md");
    }

    #[test]
    fn test_parser_error_is_contained() {
        let outcome = registry_with(Behaviour::Fail).parse(Path::new("notes.md"));
        match outcome {
            ParseOutcome::Failed { reason } => assert!(reason.contains("corrupt")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_panic_is_contained() {
        let outcome = registry_with(Behaviour::Panic).parse(Path::new("notes.md"));
        match outcome {
            ParseOutcome::Failed { reason } => assert!(reason.contains("malformed xref table")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}

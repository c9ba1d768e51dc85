use std::fs;
use std::path::Path;

use crate::error::{VidyaError, Result};
use crate::formats::{source_file_name, DocumentParser};
use crate::models::{PdfUnitMeta, TextUnit, UnitMetadata};
use crate::processing::{segment_sections, SectionConfig};

/// PDF reader emitting one unit per logical section
pub struct PdfParser {
    sections: SectionConfig,
}

impl PdfParser {
    pub fn new(sections: SectionConfig) -> Self {
        Self { sections }
    }

    /// Turn already-extracted PDF text into units
    fn units_from_text(&self, text: &str, source_file: &str) -> Result<Vec<TextUnit>> {
        if text.trim().is_empty() {
            tracing::warn!("PDF contains no extractable text: {}", source_file);
            return Ok(Vec::new());
        }

        let units = segment_sections(text, &self.sections)?
            .into_iter()
            .filter(|section| !section.text.trim().is_empty())
            .enumerate()
            .filter_map(|(element_index, section)| {
                TextUnit::new(
                    section.text,
                    UnitMetadata::Pdf(PdfUnitMeta {
                        source_file: source_file.to_string(),
                        page_number: section.page_number,
                        section_title: section.title,
                        element_index,
                    }),
                )
            })
            .collect();

        Ok(units)
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new(SectionConfig::default())
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<Vec<TextUnit>> {
        let bytes = fs::read(path)?;

        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            VidyaError::DocumentExtraction {
                format: "PDF".to_string(),
                reason: format!("Failed to extract text: {}", e),
            }
        })?;

        self.units_from_text(&text, &source_file_name(path))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn format_name(&self) -> &str {
        "PDF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileType;
    use tempfile::TempDir;

    #[test]
    fn test_supported_extensions() {
        let parser = PdfParser::default();
        assert_eq!(parser.supported_extensions(), &["pdf"]);
        assert_eq!(parser.format_name(), "PDF");
    }

    #[test]
    fn test_units_carry_page_and_section() {
        let parser = PdfParser::new(SectionConfig { max_chars: 1000, combine_under_chars: 0 });
        let text = "1. Light\nPlants capture light energy.\x0C2. Water\nRoots absorb water.";

        let units = parser.units_from_text(text, "biology.pdf").unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].file_type(), FileType::Pdf);
        match units[1].metadata() {
            UnitMetadata::Pdf(meta) => {
                assert_eq!(meta.source_file, "biology.pdf");
                assert_eq!(meta.page_number, Some(2));
                assert_eq!(meta.section_title.as_deref(), Some("2. Water"));
                assert_eq!(meta.element_index, 1);
            }
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let parser = PdfParser::default();
        assert!(parser.units_from_text("  \n\x0C\n ", "scan.pdf").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let result = std::panic::catch_unwind(|| PdfParser::default().parse(&path));
        // pdf-extract either reports an error or panics; both mean no units
        if let Ok(parsed) = result {
            assert!(parsed.is_err());
        }
    }
}

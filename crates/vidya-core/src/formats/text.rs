use std::fs;
use std::path::Path;

use crate::error::{VidyaError, Result};
use crate::formats::{source_file_name, DocumentParser};
use crate::models::{TextUnit, TxtUnitMeta, UnitMetadata};

/// Plain text reader: the whole file becomes a single unit
pub struct TextParser;

impl DocumentParser for TextParser {
    fn parse(&self, path: &Path) -> Result<Vec<TextUnit>> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| VidyaError::DocumentExtraction {
            format: "Text".to_string(),
            reason: format!("File is not valid UTF-8: {}", e),
        })?;

        let metadata = UnitMetadata::Txt(TxtUnitMeta { source_file: source_file_name(path) });

        Ok(TextUnit::new(text, metadata).into_iter().collect())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn format_name(&self) -> &str {
        "Text"
    }
}

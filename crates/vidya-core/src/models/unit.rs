use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source document a unit was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
    Excel,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Txt => "txt",
            FileType::Excel => "excel",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provenance value: either free text or an integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(value) => write!(f, "{}", value),
            MetaValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        MetaValue::Int(value as i64)
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        MetaValue::Int(i64::from(value))
    }
}

/// Provenance of a unit extracted from a PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfUnitMeta {
    /// File name inside the source directory
    pub source_file: String,

    /// 1-based page the section starts on, when page breaks were detectable
    pub page_number: Option<u32>,

    /// Heading the section was grouped under
    pub section_title: Option<String>,

    /// Position of this unit among the file's emitted units
    pub element_index: usize,
}

/// Provenance of a plain text file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtUnitMeta {
    pub source_file: String,
}

/// Provenance of one spreadsheet sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcelUnitMeta {
    pub source_file: String,

    /// Sheet name as stored in the workbook
    pub sheet: String,

    /// Data rows below the header
    pub rows: usize,

    pub columns: usize,
}

/// Format-specific provenance, tagged by file type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "file_type", rename_all = "lowercase")]
pub enum UnitMetadata {
    Pdf(PdfUnitMeta),
    Txt(TxtUnitMeta),
    Excel(ExcelUnitMeta),
}

impl UnitMetadata {
    pub fn source_file(&self) -> &str {
        match self {
            UnitMetadata::Pdf(meta) => &meta.source_file,
            UnitMetadata::Txt(meta) => &meta.source_file,
            UnitMetadata::Excel(meta) => &meta.source_file,
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            UnitMetadata::Pdf(_) => FileType::Pdf,
            UnitMetadata::Txt(_) => FileType::Txt,
            UnitMetadata::Excel(_) => FileType::Excel,
        }
    }

    /// Flattened provenance in display order, `source_file` and `file_type` first
    pub fn properties(&self) -> Vec<(&'static str, MetaValue)> {
        let mut properties = vec![
            ("source_file", MetaValue::from(self.source_file())),
            ("file_type", MetaValue::from(self.file_type().as_str())),
        ];

        match self {
            UnitMetadata::Pdf(meta) => {
                if let Some(page) = meta.page_number {
                    properties.push(("page_number", page.into()));
                }
                if let Some(ref title) = meta.section_title {
                    properties.push(("section", title.as_str().into()));
                }
                properties.push(("element_index", meta.element_index.into()));
            }
            UnitMetadata::Txt(_) => {}
            UnitMetadata::Excel(meta) => {
                properties.push(("sheet", meta.sheet.as_str().into()));
                properties.push(("rows", meta.rows.into()));
                properties.push(("columns", meta.columns.into()));
            }
        }

        properties
    }

    /// Short human-readable location, e.g. `report.pdf p.3 "Results"`
    pub fn location(&self) -> String {
        match self {
            UnitMetadata::Pdf(meta) => {
                let mut location = meta.source_file.clone();
                if let Some(page) = meta.page_number {
                    location.push_str(&format!(" p.{}", page));
                }
                if let Some(ref title) = meta.section_title {
                    location.push_str(&format!(" \"{}\"", title));
                }
                location
            }
            UnitMetadata::Txt(meta) => meta.source_file.clone(),
            UnitMetadata::Excel(meta) => format!("{} [{}]", meta.source_file, meta.sheet),
        }
    }
}

/// A normalized, provenance-tagged chunk of extracted document text.
///
/// Content is never empty after trimming; construction through [`TextUnit::new`]
/// and deserialization both enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TextUnitRecord")]
pub struct TextUnit {
    content: String,
    metadata: UnitMetadata,
}

impl TextUnit {
    /// Create a unit, or `None` when the content is blank
    pub fn new(content: impl Into<String>, metadata: UnitMetadata) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self { content, metadata })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &UnitMetadata {
        &self.metadata
    }

    pub fn source_file(&self) -> &str {
        self.metadata.source_file()
    }

    pub fn file_type(&self) -> FileType {
        self.metadata.file_type()
    }
}

#[derive(Deserialize)]
struct TextUnitRecord {
    content: String,
    metadata: UnitMetadata,
}

impl TryFrom<TextUnitRecord> for TextUnit {
    type Error = String;

    fn try_from(record: TextUnitRecord) -> Result<Self, Self::Error> {
        let source = record.metadata.source_file().to_string();
        TextUnit::new(record.content, record.metadata)
            .ok_or_else(|| format!("unit from '{}' has empty content", source))
    }
}

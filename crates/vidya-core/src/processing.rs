//! Section segmentation for extracted document text
//!
//! PDF text arrives as a flat string with form feeds between pages. This module
//! groups it into coherent passages: a new section starts at every heading line,
//! small sections are folded into their successor and oversized ones are split
//! on paragraph boundaries.

use crate::error::{VidyaError, Result};

const MAX_HEADING_CHARS: usize = 80;
const MAX_HEADING_WORDS: usize = 10;

#[derive(Debug, Clone)]
pub struct SectionConfig {
    /// Upper bound on a section's size in characters
    pub max_chars: usize,

    /// Sections shorter than this are merged into the next one on the same page
    pub combine_under_chars: usize,
}

impl SectionConfig {
    /// Smallest section size accepted from configuration
    pub const MIN_MAX_CHARS: usize = 100;

    /// Build a config from a maximum size, combining below a fifth of it
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars, combine_under_chars: max_chars / 5 }
    }

    fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(VidyaError::ConfigInvalid {
                key: "section_max_chars".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.combine_under_chars >= self.max_chars {
            return Err(VidyaError::ConfigInvalid {
                key: "section_combine_under_chars".to_string(),
                reason: format!(
                    "combine threshold ({}) must be less than max_chars ({})",
                    self.combine_under_chars, self.max_chars
                ),
            });
        }

        Ok(())
    }
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self::with_max_chars(1500)
    }
}

/// A passage of document text grouped under a heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based page number, present only when the text carried page breaks
    pub page_number: Option<u32>,

    pub title: Option<String>,

    /// Section text, heading line included
    pub text: String,
}

/// Split extracted text into sections by heading and page boundaries
pub fn segment_sections(text: &str, config: &SectionConfig) -> Result<Vec<Section>> {
    config.validate()?;

    let paged = text.contains('\x0C');
    let mut sections = Vec::new();

    for (page_idx, page) in text.split('\x0C').enumerate() {
        let page_number = paged.then(|| page_idx as u32 + 1);
        let page_sections = combine_small(split_page(page, page_number), config);

        for section in page_sections {
            sections.extend(split_large(section, config));
        }
    }

    Ok(sections)
}

/// Walk one page line by line, opening a new section at each heading
fn split_page(page: &str, page_number: Option<u32>) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut title: Option<String> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();

    for line in page.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut paragraphs);
            continue;
        }

        if is_heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut paragraphs);

            if paragraphs.is_empty() {
                // Consecutive headings read as one: "CHAPTER 2: Cells"
                title = Some(match title.take() {
                    Some(previous) => format!("{}: {}", previous, trimmed),
                    None => trimmed.to_string(),
                });
            } else {
                sections.push(build_section(page_number, title.take(), &mut paragraphs));
                title = Some(trimmed.to_string());
            }
            continue;
        }

        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(trimmed);
    }

    flush_paragraph(&mut paragraph, &mut paragraphs);
    if title.is_some() || !paragraphs.is_empty() {
        sections.push(build_section(page_number, title, &mut paragraphs));
    }

    sections
}

fn flush_paragraph(paragraph: &mut String, paragraphs: &mut Vec<String>) {
    if !paragraph.is_empty() {
        paragraphs.push(std::mem::take(paragraph));
    }
}

fn build_section(
    page_number: Option<u32>,
    title: Option<String>,
    paragraphs: &mut Vec<String>,
) -> Section {
    let mut blocks: Vec<String> = Vec::with_capacity(paragraphs.len() + 1);
    if let Some(ref title) = title {
        blocks.push(title.clone());
    }
    blocks.append(paragraphs);

    Section { page_number, title, text: blocks.join("\n\n") }
}

/// Fold undersized sections into the following section on the same page
fn combine_small(sections: Vec<Section>, config: &SectionConfig) -> Vec<Section> {
    let mut combined: Vec<Section> = Vec::with_capacity(sections.len());
    let mut pending: Option<Section> = None;

    for section in sections {
        let section = match pending.take() {
            Some(small) => Section {
                page_number: section.page_number,
                title: small.title.or(section.title),
                text: format!("{}\n\n{}", small.text, section.text),
            },
            None => section,
        };

        if section.text.len() < config.combine_under_chars {
            pending = Some(section);
        } else {
            combined.push(section);
        }
    }

    if let Some(small) = pending {
        combined.push(small);
    }

    combined
}

/// Break an oversized section on paragraph boundaries, then on whitespace
fn split_large(section: Section, config: &SectionConfig) -> Vec<Section> {
    if section.text.len() <= config.max_chars {
        return vec![section];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for paragraph in section.text.split("\n\n") {
        if paragraph.len() > config.max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(split_on_whitespace(paragraph, config.max_chars));
            continue;
        }

        if !current.is_empty() && current.len() + 2 + paragraph.len() > config.max_chars {
            pieces.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
        .into_iter()
        .map(|text| Section { page_number: section.page_number, title: section.title.clone(), text })
        .collect()
}

/// Split at word boundaries; a single word longer than the limit stays whole
fn split_on_whitespace(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

/// Heuristic heading detection for a single trimmed line
pub fn is_heading(line: &str) -> bool {
    if line.chars().count() > MAX_HEADING_CHARS {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_HEADING_WORDS {
        return false;
    }

    if line.ends_with(['.', ',', ';', '?', '!']) {
        return false;
    }

    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }

    if is_numbered_heading(&words) {
        return true;
    }

    if letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase()) {
        return true;
    }

    is_title_case(&words)
}

/// "1. Introduction", "2.3 Methods", "IV. Results", "Chapter 3"
fn is_numbered_heading(words: &[&str]) -> bool {
    let first = words[0];
    let label = first.trim_end_matches(['.', ')']);

    let numeric = !label.is_empty() && label.chars().all(|c| c.is_ascii_digit() || c == '.');
    let roman = !label.is_empty()
        && label.len() <= 4
        && first.len() > label.len()
        && label.chars().all(|c| matches!(c, 'I' | 'V' | 'X' | 'L' | 'C'));

    if (numeric || roman) && words.len() > 1 {
        return words[1].chars().next().is_some_and(|c| c.is_uppercase());
    }

    let lowered = first.to_lowercase();
    (lowered == "chapter" || lowered == "section" || lowered == "part")
        && words.get(1).is_some_and(|w| w.chars().next().is_some_and(|c| c.is_alphanumeric()))
}

fn is_title_case(words: &[&str]) -> bool {
    if !words[0].chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }

    let significant: Vec<&&str> = words
        .iter()
        .filter(|w| w.len() > 3 && w.chars().next().is_some_and(|c| c.is_alphabetic()))
        .collect();

    !significant.is_empty()
        && significant.iter().all(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chars: usize) -> SectionConfig {
        SectionConfig { max_chars, combine_under_chars: 0 }
    }

    #[test]
    fn test_heading_detection() {
        assert!(is_heading("1. Introduction"));
        assert!(is_heading("2.3 Light Reactions"));
        assert!(is_heading("IV. Results"));
        assert!(is_heading("Chapter 3"));
        assert!(is_heading("PHOTOSYNTHESIS"));
        assert!(is_heading("The Water Cycle"));

        assert!(!is_heading("the sun heats water in lakes and oceans"));
        assert!(!is_heading("Plants make food."));
        assert!(!is_heading("42"));
        assert!(!is_heading(&"Long Heading Word ".repeat(10)));
    }

    #[test]
    fn test_sections_split_at_headings() {
        let text = "1. Introduction\nPlants need light.\n\n2. Methods\nWe measured growth.";
        let sections = segment_sections(text, &config(1000)).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title.as_deref(), Some("1. Introduction"));
        assert_eq!(sections[0].text, "1. Introduction\n\nPlants need light.");
        assert_eq!(sections[1].title.as_deref(), Some("2. Methods"));
        assert!(sections.iter().all(|s| s.page_number.is_none()));
    }

    #[test]
    fn test_consecutive_headings_merge() {
        let text = "CHAPTER 2\nCell Structure\nCells have membranes.";
        let sections = segment_sections(text, &config(1000)).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title.as_deref(), Some("CHAPTER 2: Cell Structure"));
    }

    #[test]
    fn test_wrapped_lines_join_into_paragraph() {
        let text = "energy moves through\nfood chains in\necosystems daily.";
        let sections = segment_sections(text, &config(1000)).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "energy moves through food chains in ecosystems daily.");
        assert!(sections[0].title.is_none());
    }

    #[test]
    fn test_page_numbers_from_form_feeds() {
        let text = "First page body text.\x0CSecond page body text.";
        let sections = segment_sections(text, &config(1000)).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].page_number, Some(1));
        assert_eq!(sections[1].page_number, Some(2));
    }

    #[test]
    fn test_blank_pages_emit_nothing() {
        let sections = segment_sections("\x0C   \n\n\x0C", &config(1000)).unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn test_small_sections_combined() {
        let text = "Overview\nShort.\n\nDetails\nThis section carries quite a bit more text than the first.";
        let config = SectionConfig { max_chars: 1000, combine_under_chars: 30 };
        let sections = segment_sections(text, &config).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title.as_deref(), Some("Overview"));
        assert!(sections[0].text.contains("Short."));
        assert!(sections[0].text.contains("more text"));
    }

    #[test]
    fn test_large_sections_split_on_paragraphs() {
        let paragraph = "word ".repeat(20);
        let text = format!("{}\n\n{}\n\n{}", paragraph.trim(), paragraph.trim(), paragraph.trim());
        let sections = segment_sections(&text, &config(120)).unwrap();

        assert_eq!(sections.len(), 3);
        for section in &sections {
            assert!(section.text.len() <= 120);
        }
    }

    #[test]
    fn test_oversized_paragraph_split_on_whitespace() {
        let text = "alpha ".repeat(100);
        let sections = segment_sections(&text, &config(50)).unwrap();

        assert!(sections.len() > 1);
        for section in &sections {
            assert!(section.text.len() <= 50);
            assert!(!section.text.starts_with(' '));
        }
    }

    #[test]
    fn test_config_validation() {
        let invalid = SectionConfig { max_chars: 100, combine_under_chars: 100 };
        assert!(segment_sections("text", &invalid).is_err());

        let zero = SectionConfig { max_chars: 0, combine_under_chars: 0 };
        assert!(segment_sections("text", &zero).is_err());
    }
}

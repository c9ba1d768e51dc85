use super::TextUnit;

/// Ordered collection of units produced by one scan of a source directory.
///
/// Order follows sorted file names, then the order each parser emitted units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    units: Vec<TextUnit>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the units one file produced, keeping their order
    pub fn extend(&mut self, units: impl IntoIterator<Item = TextUnit>) {
        self.units.extend(units);
    }

    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<TextUnit> {
        self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextUnit> {
        self.units.iter()
    }
}

impl FromIterator<TextUnit> for Corpus {
    fn from_iter<I: IntoIterator<Item = TextUnit>>(iter: I) -> Self {
        Self { units: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TextUnit;
    type IntoIter = std::slice::Iter<'a, TextUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

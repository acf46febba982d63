use std::collections::HashMap;

use crate::entity::ItemKind;

/// Maps persisted type tags to concrete kinds and expands aggregate
/// category names into the tag sets they subsume.
///
/// Callers filter queries by conceptual categories ("Recording") that span
/// more than one concrete kind; the registry is the one place that mapping
/// lives.
pub struct TypeRegistry {
    categories: HashMap<&'static str, Vec<&'static str>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut categories: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        categories.insert(
            "Recording",
            vec![
                ItemKind::AudioRecording.tag(),
                ItemKind::VideoRecording.tag(),
            ],
        );
        categories.insert("Program", vec![ItemKind::Program.tag()]);
        categories.insert("TvChannel", vec![ItemKind::Channel.tag()]);
        Self { categories }
    }

    /// Resolve a persisted tag to its kind. Unknown tags resolve to `None`
    /// so readers can skip the row instead of failing the whole read.
    pub fn resolve(&self, tag: &str) -> Option<ItemKind> {
        ItemKind::from_tag(tag)
    }

    /// Expand a category name into concrete tags. Names without a mapping
    /// pass through unchanged as a single-tag set.
    pub fn expand(&self, name: &str) -> Vec<String> {
        match self.categories.get(name) {
            Some(tags) => tags.iter().map(|t| (*t).to_string()).collect(),
            None => vec![name.to_string()],
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

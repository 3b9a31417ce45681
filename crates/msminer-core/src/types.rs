use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keywords::Category;

/// One service declared in a topology descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Declared image (or build reference) as written, before truncation.
    pub declared_image: String,
    /// Image repository (text before the first colon) or build reference.
    pub image_identifier: String,
    pub declared_dependencies: Vec<String>,
    /// At most one matched keyword per category.
    #[serde(default)]
    pub category_matches: BTreeMap<Category, String>,
}

impl Service {
    pub fn new(name: impl Into<String>, image_identifier: impl Into<String>) -> Self {
        let image_identifier = image_identifier.into();
        Self {
            name: name.into(),
            declared_image: image_identifier.clone(),
            image_identifier,
            declared_dependencies: Vec::new(),
            category_matches: BTreeMap::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// True when any infrastructure category matched the image identifier.
    pub fn is_infrastructure(&self) -> bool {
        self.category_matches.keys().any(Category::is_infrastructure)
    }

    pub fn matched(&self, category: Category) -> Option<&str> {
        self.category_matches.get(&category).map(String::as_str)
    }
}

/// A service classified as a database, with the matched product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseService {
    pub service: String,
    pub name: String,
}

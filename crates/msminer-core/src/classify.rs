use std::collections::BTreeSet;

use crate::keywords::{tokenize, Category, KeywordClassifier, KeywordSet};
use crate::types::{DatabaseService, Service};

/// Tags services with the technology categories their image identifier matches.
pub struct ServiceClassifier<'a> {
    keywords: &'a KeywordSet,
    classifier: KeywordClassifier,
}

impl<'a> ServiceClassifier<'a> {
    pub fn new(keywords: &'a KeywordSet) -> Self {
        Self::with_classifier(keywords, KeywordClassifier::new())
    }

    pub fn with_classifier(keywords: &'a KeywordSet, classifier: KeywordClassifier) -> Self {
        Self {
            keywords,
            classifier,
        }
    }

    /// Record, per category, the first keyword hit in the service's image.
    pub fn classify(&self, service: &mut Service) {
        let words = tokenize(&service.image_identifier, false);
        service.category_matches.clear();
        for category in Category::ALL {
            if let Some(hit) = self
                .classifier
                .match_first(&words, self.keywords.get(category))
            {
                service.category_matches.insert(category, hit.to_string());
            }
        }
    }

    /// Classify every service and report whether any database is shared.
    pub fn classify_services(&self, services: &mut [Service]) -> bool {
        for service in services.iter_mut() {
            self.classify(service);
        }
        has_shared_database(services)
    }
}

/// Services whose image matched a database keyword, in declaration order.
pub fn database_services(services: &[Service]) -> Vec<DatabaseService> {
    services
        .iter()
        .filter_map(|s| {
            s.matched(Category::Database).map(|name| DatabaseService {
                service: s.name.clone(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// True when the per-service database dependency pairs outnumber the
/// distinct databases they reference.
///
/// Each service contributes its dependencies (de-duplicated) that name a
/// database-classified service.
pub fn has_shared_database(services: &[Service]) -> bool {
    let db_services: BTreeSet<&str> = services
        .iter()
        .filter(|s| s.matched(Category::Database).is_some())
        .map(|s| s.name.as_str())
        .collect();

    let mut pairs = 0usize;
    let mut distinct: BTreeSet<&str> = BTreeSet::new();
    for service in services {
        let deps: BTreeSet<&str> = service
            .declared_dependencies
            .iter()
            .map(String::as_str)
            .filter(|d| db_services.contains(d))
            .collect();
        pairs += deps.len();
        distinct.extend(deps);
    }
    pairs != distinct.len()
}

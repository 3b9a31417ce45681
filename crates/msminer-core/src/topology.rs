use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::types::Service;

/// Extract the declared services from a docker-compose style descriptor.
///
/// Malformed documents, a missing or empty `services` mapping, and entries
/// without a configuration body all degrade to fewer (or zero) services.
pub fn parse(descriptor: &str) -> Vec<Service> {
    let mut document: Value = match serde_yaml::from_str(descriptor) {
        Ok(doc) => doc,
        Err(e) => {
            // Duplicate keys land here too; the message names the key.
            warn!(
                line = e.location().map(|l| l.line()),
                "failed to parse topology descriptor: {e}"
            );
            return Vec::new();
        }
    };
    // Shared `x-` fragments are pulled in with `<<: *anchor`.
    if let Err(e) = document.apply_merge() {
        warn!("failed to expand merge keys in topology descriptor: {e}");
        return Vec::new();
    }

    let Some(services) = document.get("services").and_then(Value::as_mapping) else {
        debug!("descriptor declares no services mapping");
        return Vec::new();
    };

    services
        .iter()
        .filter_map(|(name, body)| parse_service(&text_of(name), body))
        .collect()
}

fn parse_service(name: &str, body: &Value) -> Option<Service> {
    if is_blank(body) {
        debug!(service = name, "skipping service without configuration");
        return None;
    }
    let Some(body) = body.as_mapping() else {
        debug!(service = name, "skipping service whose configuration is not a mapping");
        return None;
    };

    let (declared_image, image_identifier) = image_of(body);
    Some(Service {
        name: name.to_string(),
        declared_image,
        image_identifier,
        declared_dependencies: dependencies_of(body),
        category_matches: Default::default(),
    })
}

/// Returns `(declared, identifier)`: `image` wins over `build`, and only an
/// image is truncated at its first colon.
fn image_of(body: &Mapping) -> (String, String) {
    if let Some(image) = body.get("image").filter(|v| !is_blank(v)) {
        let declared = reduce_variants(image);
        let identifier = declared
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string();
        return (declared, identifier);
    }
    if let Some(build) = body.get("build").filter(|v| !is_blank(v)) {
        let declared = reduce_variants(build);
        return (declared.clone(), declared);
    }
    (String::new(), String::new())
}

/// A mapping of named alternatives collapses to the text of its first value.
fn reduce_variants(value: &Value) -> String {
    match value {
        Value::Mapping(m) => m.values().next().map(text_of).unwrap_or_default(),
        other => text_of(other),
    }
}

fn dependencies_of(body: &Mapping) -> Vec<String> {
    if let Some(deps) = body.get("depends_on") {
        return names_of(deps);
    }
    if let Some(links) = body.get("links") {
        return names_of(links);
    }
    Vec::new()
}

fn names_of(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Mapping(m) => m.keys().map(text_of).collect(),
        Value::Sequence(items) => items.iter().map(text_of).collect(),
        Value::Tagged(tagged) => names_of(&tagged.value),
        scalar => vec![text_of(scalar)],
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => text_of(&tagged.value),
        nested => serde_yaml::to_string(nested)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        Value::Tagged(tagged) => is_blank(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_images_builds_and_dependencies() {
        let yaml = r#"
services:
  gateway:
    image: nginx:latest
  catalog-db:
    image: postgres:14
  catalog-service:
    build: ./catalog
    depends_on:
      - catalog-db
"#;
        let services = parse(yaml);
        let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["gateway", "catalog-db", "catalog-service"]);
        assert_eq!(services[0].image_identifier, "nginx");
        assert_eq!(services[0].declared_image, "nginx:latest");
        assert_eq!(services[1].image_identifier, "postgres");
        assert_eq!(services[2].image_identifier, "./catalog");
        assert_eq!(services[2].declared_dependencies, vec!["catalog-db"]);
    }

    #[test]
    fn test_registry_port_truncates_at_first_colon() {
        let yaml = "services:\n  api:\n    image: registry.local:5000/team/api:2.1\n";
        let services = parse(yaml);
        assert_eq!(services[0].image_identifier, "registry.local");
    }

    #[test]
    fn test_image_wins_over_build() {
        let yaml = "services:\n  api:\n    image: myorg/api:1.0\n    build: ./api\n";
        assert_eq!(parse(yaml)[0].image_identifier, "myorg/api");
    }

    #[test]
    fn test_build_mapping_reduces_to_first_value() {
        let yaml = r#"
services:
  api:
    build:
      context: ./services/rabbitmq-consumer
      dockerfile: Dockerfile.dev
"#;
        let services = parse(yaml);
        assert_eq!(services[0].image_identifier, "./services/rabbitmq-consumer");
    }

    #[test]
    fn test_depends_on_mapping_form_uses_keys() {
        let yaml = r#"
services:
  api:
    image: myorg/api
    depends_on:
      db:
        condition: service_healthy
      cache:
        condition: service_started
"#;
        assert_eq!(parse(yaml)[0].declared_dependencies, vec!["db", "cache"]);
    }

    #[test]
    fn test_links_used_only_without_depends_on() {
        let yaml = r#"
services:
  legacy:
    image: myorg/legacy
    links:
      - db
      - "cache:redis"
  modern:
    image: myorg/modern
    depends_on: []
    links:
      - db
"#;
        let services = parse(yaml);
        assert_eq!(services[0].declared_dependencies, vec!["db", "cache:redis"]);
        assert!(services[1].declared_dependencies.is_empty());
    }

    #[test]
    fn test_blank_service_bodies_are_skipped() {
        let yaml = "services:\n  empty:\n  also-empty: {}\n  real:\n    image: myorg/real\n";
        let services = parse(yaml);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "real");
    }

    #[test]
    fn test_service_without_image_or_build_has_empty_identifier() {
        let yaml = "services:\n  sidecar:\n    command: sleep infinity\n";
        let services = parse(yaml);
        assert_eq!(services[0].image_identifier, "");
        assert!(services[0].declared_dependencies.is_empty());
    }

    #[test]
    fn test_missing_or_malformed_services_yield_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("version: '3'\n").is_empty());
        assert!(parse("services:\n").is_empty());
        assert!(parse("services: [a, b]\n").is_empty());
        assert!(parse("services:\n  api: {image: [unclosed\n").is_empty());
        assert!(parse("- just\n- a list\n").is_empty());
    }

    #[test]
    fn test_merge_keys_pull_in_anchored_fields() {
        let yaml = "\
x-db: &db
  image: postgres:14
  restart: always
services:
  store:
    <<: *db
  api:
    image: myorg/api
    depends_on: [store]
";
        let services = parse(yaml);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "store");
        assert_eq!(services[0].declared_image, "postgres:14");
        assert_eq!(services[0].image_identifier, "postgres");
        assert_eq!(services[1].declared_dependencies, vec!["store"]);
    }

    #[test]
    fn test_local_keys_override_merged_ones() {
        let yaml = "\
x-base: &base
  image: myorg/base
services:
  worker:
    <<: *base
    image: rabbitmq:3
";
        let services = parse(yaml);
        assert_eq!(services[0].image_identifier, "rabbitmq");
    }

    #[test]
    fn test_duplicate_keys_are_malformed_and_reported_by_name() {
        let yaml = "\
services:
  api:
    image: myorg/api
    environment: [A=1]
    environment: [B=2]
";
        assert!(parse(yaml).is_empty());
        let err = serde_yaml::from_str::<Value>(yaml).unwrap_err();
        assert!(err.to_string().contains("environment"), "{err}");
    }
}

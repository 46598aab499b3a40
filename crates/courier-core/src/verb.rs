//! The verb table.
//!
//! Each entry maps a method annotation name (`get`, `post`, ...) to the HTTP
//! method it stands for and a function that reads the path template out of
//! the annotation. Supporting a new verb means registering a new entry.

use std::collections::HashMap;

use http::Method;

use crate::signature::Annotation;

/// Reads the path template from a verb annotation. `None` means the
/// annotation is malformed.
pub type PathExtractor = fn(&Annotation) -> Option<String>;

/// The default extractor: the annotation's string value.
pub fn string_value(annotation: &Annotation) -> Option<String> {
    annotation.str_value().map(str::to_string)
}

/// A single verb table entry.
#[derive(Debug, Clone)]
pub struct VerbRule {
    pub method: Method,
    pub extract: PathExtractor,
}

/// Registry of recognized verb markers.
#[derive(Debug, Clone)]
pub struct VerbRegistry {
    rules: HashMap<String, VerbRule>,
}

impl Default for VerbRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("get", Method::GET);
        registry.register("post", Method::POST);
        registry.register("put", Method::PUT);
        registry.register("delete", Method::DELETE);
        registry.register("patch", Method::PATCH);
        registry.register("head", Method::HEAD);
        registry.register("options", Method::OPTIONS);
        registry
    }
}

impl VerbRegistry {
    /// A registry with no verbs.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register `marker` as the annotation for `method`, replacing any
    /// previous entry.
    pub fn register(&mut self, marker: impl Into<String>, method: Method) -> &mut Self {
        self.register_with(marker, method, string_value)
    }

    /// Register `marker` with a custom path extractor.
    pub fn register_with(
        &mut self,
        marker: impl Into<String>,
        method: Method,
        extract: PathExtractor,
    ) -> &mut Self {
        self.rules
            .insert(marker.into().to_ascii_lowercase(), VerbRule { method, extract });
        self
    }

    /// Look up the rule for an annotation, if it is a verb marker.
    pub fn lookup(&self, annotation: &Annotation) -> Option<&VerbRule> {
        self.rules.get(&annotation.name.to_ascii_lowercase())
    }

    /// Whether `marker` names a registered verb.
    pub fn contains(&self, marker: &str) -> bool {
        self.rules.contains_key(&marker.to_ascii_lowercase())
    }

    /// Registered marker names, sorted.
    pub fn markers(&self) -> Vec<&str> {
        let mut markers: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        markers.sort_unstable();
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_verbs() {
        let registry = VerbRegistry::default();
        assert_eq!(
            registry.markers(),
            vec!["delete", "get", "head", "options", "patch", "post", "put"]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = VerbRegistry::default();
        let rule = registry.lookup(&Annotation::new("GET", "/users")).unwrap();
        assert_eq!(rule.method, Method::GET);
    }

    #[test]
    fn test_non_verb_annotation() {
        let registry = VerbRegistry::default();
        assert!(registry.lookup(&Annotation::marker("doc")).is_none());
    }

    #[test]
    fn test_register_extension_verb() {
        let mut registry = VerbRegistry::default();
        registry.register("purge", Method::from_bytes(b"PURGE").unwrap());

        let rule = registry.lookup(&Annotation::new("purge", "/cache")).unwrap();
        assert_eq!(rule.method.as_str(), "PURGE");
        assert_eq!((rule.extract)(&Annotation::new("purge", "/cache")), Some("/cache".into()));
    }

    #[test]
    fn test_custom_extractor() {
        fn versioned(annotation: &Annotation) -> Option<String> {
            annotation.str_value().map(|path| format!("/v2{path}"))
        }

        let mut registry = VerbRegistry::empty();
        registry.register_with("get", Method::GET, versioned);

        let rule = registry.lookup(&Annotation::new("get", "/users")).unwrap();
        assert_eq!((rule.extract)(&Annotation::new("get", "/users")), Some("/v2/users".into()));
    }
}

//! Request descriptors: the compiler's output.

use std::fmt;

use http::Method;

use crate::types::TypeRef;

/// How a parameter contributes to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// Substituted into a `{name}` placeholder of the path template
    Path(String),
    /// Appended to the query string
    Query(String),
    /// Sent as a request header
    Header(String),
    /// Serialized as the JSON request body
    Body,
    /// Not part of the request (e.g. the completion handler)
    Unclassified,
}

impl ParamRole {
    pub fn kind(&self) -> RoleKind {
        match self {
            ParamRole::Path(_) => RoleKind::Path,
            ParamRole::Query(_) => RoleKind::Query,
            ParamRole::Header(_) => RoleKind::Header,
            ParamRole::Body => RoleKind::Body,
            ParamRole::Unclassified => RoleKind::Unclassified,
        }
    }

    /// The wire name for path, query and header roles.
    pub fn name(&self) -> Option<&str> {
        match self {
            ParamRole::Path(name) | ParamRole::Query(name) | ParamRole::Header(name) => Some(name),
            ParamRole::Body | ParamRole::Unclassified => None,
        }
    }
}

/// The category of a [`ParamRole`], without its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Path,
    Query,
    Header,
    Body,
    Unclassified,
}

impl RoleKind {
    /// The annotation name that introduces this role.
    pub fn annotation(&self) -> &'static str {
        match self {
            RoleKind::Path => "path",
            RoleKind::Query => "query",
            RoleKind::Header => "header",
            RoleKind::Body => "body",
            RoleKind::Unclassified => "none",
        }
    }

    /// Parse a role annotation name (case-insensitive).
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "path" => Some(RoleKind::Path),
            "query" => Some(RoleKind::Query),
            "header" => Some(RoleKind::Header),
            "body" => Some(RoleKind::Body),
            _ => None,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation())
    }
}

/// Precomputed summary of how to build a request from a method's arguments.
///
/// Built once per method when a client is constructed and shared read-only
/// by every call afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    owner: String,
    method_name: String,
    http_method: Method,
    relative_url: String,
    response_type: Option<TypeRef>,
    roles: Vec<ParamRole>,
}

impl RequestDescriptor {
    pub(crate) fn new(
        owner: String,
        method_name: String,
        http_method: Method,
        relative_url: String,
        response_type: Option<TypeRef>,
        roles: Vec<ParamRole>,
    ) -> Self {
        Self {
            owner,
            method_name,
            http_method,
            relative_url,
            response_type,
            roles,
        }
    }

    /// Name of the declaring interface.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Name of the method this descriptor was compiled from.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// Path template, possibly containing `{name}` placeholders.
    pub fn relative_url(&self) -> &str {
        &self.relative_url
    }

    /// The payload type responses deserialize into. `None` for a raw handler.
    pub fn response_type(&self) -> Option<&TypeRef> {
        self.response_type.as_ref()
    }

    /// Roles, index-aligned with the method's parameters.
    pub fn roles(&self) -> &[ParamRole] {
        &self.roles
    }

    /// Index of the body parameter, if any.
    pub fn body_index(&self) -> Option<usize> {
        self.roles.iter().position(|role| *role == ParamRole::Body)
    }

    /// Placeholder names in the path template, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.relative_url)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {} {}",
            self.owner, self.method_name, self.http_method, self.relative_url
        )
    }
}

/// Extract `{name}` placeholders from a path template.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() {
            names.push(name);
        }
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("/users/{id}"), vec!["id"]);
        assert_eq!(
            placeholders("/orgs/{org}/repos/{repo}/issues"),
            vec!["org", "repo"]
        );
        assert!(placeholders("/users").is_empty());
        assert!(placeholders("/broken/{id").is_empty());
        assert!(placeholders("/empty/{}").is_empty());
        assert_eq!(placeholders("/users/{ id }"), vec![" id "]);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(ParamRole::Path("id".into()).name(), Some("id"));
        assert_eq!(ParamRole::Body.name(), None);
        assert_eq!(ParamRole::Header("Auth".into()).kind(), RoleKind::Header);
    }

    #[test]
    fn test_role_kind_from_annotation() {
        assert_eq!(RoleKind::from_annotation("Path"), Some(RoleKind::Path));
        assert_eq!(RoleKind::from_annotation("body"), Some(RoleKind::Body));
        assert_eq!(RoleKind::from_annotation("doc"), None);
    }
}

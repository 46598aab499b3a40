//! The signature-to-descriptor compiler.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::descriptor::{ParamRole, RequestDescriptor, RoleKind, placeholders};
use crate::error::{ConfigError, ConfigErrorKind};
use crate::signature::{Annotation, MethodSignature, ParamSlot};
use crate::types::{HandlerHierarchy, TypeRef};
use crate::verb::VerbRegistry;

static DEFAULT_COMPILER: LazyLock<DescriptorCompiler> = LazyLock::new(DescriptorCompiler::default);

/// Compile a signature with the default verb table and handler hierarchy.
pub fn compile(signature: &MethodSignature) -> Result<RequestDescriptor, ConfigError> {
    DEFAULT_COMPILER.compile(signature)
}

/// Compiles [`MethodSignature`]s into [`RequestDescriptor`]s.
///
/// Compilation is pure: each call keeps its own duplicate-tracking state, so
/// one compiler can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct DescriptorCompiler {
    verbs: VerbRegistry,
    handlers: HandlerHierarchy,
}

impl DescriptorCompiler {
    pub fn new(verbs: VerbRegistry, handlers: HandlerHierarchy) -> Self {
        Self { verbs, handlers }
    }

    pub fn verbs(&self) -> &VerbRegistry {
        &self.verbs
    }

    pub fn verbs_mut(&mut self) -> &mut VerbRegistry {
        &mut self.verbs
    }

    pub fn handlers(&self) -> &HandlerHierarchy {
        &self.handlers
    }

    pub fn with_handlers(mut self, handlers: HandlerHierarchy) -> Self {
        self.handlers = handlers;
        self
    }

    /// Compile every method of an interface, stopping at the first error.
    pub fn compile_all<'a>(
        &self,
        signatures: impl IntoIterator<Item = &'a MethodSignature>,
    ) -> Result<Vec<RequestDescriptor>, ConfigError> {
        signatures
            .into_iter()
            .map(|signature| self.compile(signature))
            .collect()
    }

    /// Compile a single method signature.
    pub fn compile(&self, signature: &MethodSignature) -> Result<RequestDescriptor, ConfigError> {
        let fail = |kind| ConfigError::new(&signature.owner, &signature.name, kind);

        let (http_method, relative_url) = self.parse_verb(signature).map_err(fail)?;
        let response_type = self.parse_response_type(&signature.params).map_err(fail)?;
        let roles = parse_roles(&signature.params).map_err(fail)?;

        check_template(signature, &relative_url, &roles);

        tracing::debug!(
            owner = %signature.owner,
            method = %signature.name,
            http_method = %http_method,
            relative_url = %relative_url,
            "compiled request descriptor"
        );

        Ok(RequestDescriptor::new(
            signature.owner.clone(),
            signature.name.clone(),
            http_method,
            relative_url,
            response_type,
            roles,
        ))
    }

    fn parse_verb(
        &self,
        signature: &MethodSignature,
    ) -> Result<(http::Method, String), ConfigErrorKind> {
        let mut found: Option<(&Annotation, http::Method, String)> = None;

        for annotation in &signature.annotations {
            let Some(rule) = self.verbs.lookup(annotation) else {
                continue;
            };

            if let Some((first, _, _)) = &found {
                return Err(ConfigErrorKind::MultipleVerbAnnotations {
                    first: first.name.clone(),
                    second: annotation.name.clone(),
                });
            }

            let path = (rule.extract)(annotation).ok_or_else(|| {
                ConfigErrorKind::MalformedVerbAnnotation {
                    annotation: annotation.name.clone(),
                }
            })?;
            found = Some((annotation, rule.method.clone(), path));
        }

        found
            .map(|(_, method, path)| (method, path))
            .ok_or_else(|| ConfigErrorKind::MissingVerbAnnotation {
                expected: self.verbs.markers().join(", "),
            })
    }

    fn parse_response_type(&self, params: &[ParamSlot]) -> Result<Option<TypeRef>, ConfigErrorKind> {
        let last = params.last().ok_or(ConfigErrorKind::MissingParameters)?;

        let capability =
            self.handlers
                .resolve(&last.ty)
                .ok_or_else(|| ConfigErrorKind::InvalidLastParameter {
                    found: last.ty.to_string(),
                })?;

        Ok(capability
            .args()
            .first()
            .and_then(TypeRef::upper_bound)
            .cloned())
    }
}

fn parse_roles(params: &[ParamSlot]) -> Result<Vec<ParamRole>, ConfigErrorKind> {
    let mut path_names = HashSet::new();
    let mut query_names = HashSet::new();
    let mut header_names = HashSet::new();
    let mut body_param: Option<&str> = None;

    let mut roles = Vec::with_capacity(params.len());

    for param in params {
        let role = parse_slot_role(param)?;

        let seen = match &role {
            ParamRole::Path(_) => Some(&mut path_names),
            ParamRole::Query(_) => Some(&mut query_names),
            ParamRole::Header(_) => Some(&mut header_names),
            ParamRole::Body => {
                if let Some(first) = body_param {
                    return Err(ConfigErrorKind::MultipleBodyParameters {
                        first: first.to_string(),
                        second: param.name.clone(),
                    });
                }
                body_param = Some(param.name.as_str());
                None
            }
            ParamRole::Unclassified => None,
        };

        if let (Some(seen), Some(name)) = (seen, role.name())
            && !seen.insert(name.to_string())
        {
            return Err(ConfigErrorKind::DuplicateParameterName {
                role: role.kind(),
                name: name.to_string(),
            });
        }

        roles.push(role);
    }

    Ok(roles)
}

fn parse_slot_role(param: &ParamSlot) -> Result<ParamRole, ConfigErrorKind> {
    let mut role: Option<ParamRole> = None;

    for annotation in &param.annotations {
        let Some(kind) = RoleKind::from_annotation(&annotation.name) else {
            continue;
        };

        if let Some(existing) = &role {
            return Err(ConfigErrorKind::ConflictingParameterRoles {
                param: param.name.clone(),
                first: existing.kind(),
                second: kind,
            });
        }

        let name = || {
            annotation
                .str_value()
                .map(str::to_string)
                .ok_or_else(|| ConfigErrorKind::MalformedParameterAnnotation {
                    param: param.name.clone(),
                    role: kind,
                })
        };

        role = Some(match kind {
            RoleKind::Path => ParamRole::Path(name()?),
            RoleKind::Query => ParamRole::Query(name()?),
            RoleKind::Header => ParamRole::Header(name()?),
            RoleKind::Body => ParamRole::Body,
            RoleKind::Unclassified => ParamRole::Unclassified,
        });
    }

    Ok(role.unwrap_or(ParamRole::Unclassified))
}

/// Placeholder/role mismatches are accepted but reported.
fn check_template(signature: &MethodSignature, template: &str, roles: &[ParamRole]) {
    let names = placeholders(template);

    for name in &names {
        if !roles.contains(&ParamRole::Path(name.to_string())) {
            tracing::warn!(
                owner = %signature.owner,
                method = %signature.name,
                placeholder = %name,
                "path placeholder has no matching path parameter"
            );
        }
    }

    for role in roles {
        if let ParamRole::Path(name) = role
            && !names.contains(&name.as_str())
        {
            tracing::warn!(
                owner = %signature.owner,
                method = %signature.name,
                param = %name,
                "path parameter does not appear in the path template"
            );
        }
    }
}

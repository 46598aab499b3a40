//! Method signatures: the compiler's input.

use crate::types::TypeRef;

/// The value carried by an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// `#[body]`
    None,
    /// `#[get("/users")]`
    Str(String),
    /// Anything that is not a string literal, kept as source text.
    Other(String),
}

/// A single annotation on a method or parameter, e.g. `#[get("/users/{id}")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub value: AnnotationValue,
}

impl Annotation {
    /// An annotation carrying a string value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AnnotationValue::Str(value.into()),
        }
    }

    /// An annotation with no value.
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AnnotationValue::None,
        }
    }

    /// An annotation whose value is not a string.
    pub fn with_raw(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AnnotationValue::Other(raw.into()),
        }
    }

    /// The string value, if the annotation carries one.
    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// One parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub ty: TypeRef,
}

impl ParamSlot {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            ty,
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A declared client method, as seen by the descriptor compiler.
///
/// ```
/// use courier_core::{Annotation, MethodSignature, ParamSlot, TypeRef};
///
/// let signature = MethodSignature::new("UserApi", "get_user")
///     .annotate(Annotation::new("get", "/users/{id}"))
///     .param(ParamSlot::new("id", TypeRef::named("u64")).annotate(Annotation::new("path", "id")))
///     .param(ParamSlot::new("cb", TypeRef::generic("Callback", [TypeRef::named("User")])));
///
/// assert_eq!(signature.params.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Name of the declaring interface
    pub owner: String,
    /// Method name
    pub name: String,
    /// Method annotations, in declaration order
    pub annotations: Vec<Annotation>,
    /// Parameters, in declaration order (receiver excluded)
    pub params: Vec<ParamSlot>,
}

impl MethodSignature {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            annotations: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn param(mut self, param: ParamSlot) -> Self {
        self.params.push(param);
        self
    }
}

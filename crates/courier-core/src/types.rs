//! Type tags and completion-handler resolution.
//!
//! Descriptors never hold real Rust types. A [`TypeRef`] is a structural tag
//! (`Vec<User>`, `impl Callback<User>`) that the proc macro captures from the
//! trait and the compiler resolves against a [`HandlerHierarchy`].

use std::collections::HashMap;
use std::fmt;

/// Maximum number of supertype hops before resolution gives up.
const MAX_SUPERTYPE_DEPTH: usize = 16;

/// A structural type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A named type with its generic arguments, e.g. `Vec<User>`.
    Named { name: String, args: Vec<TypeRef> },
    /// A wildcard constrained by upper bounds, in declaration order
    /// (`impl A + B`, `dyn A + B`).
    Bounded(Vec<TypeRef>),
}

impl TypeRef {
    /// A non-generic named type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A generic named type.
    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// A bounded wildcard.
    pub fn bounded(bounds: impl IntoIterator<Item = TypeRef>) -> Self {
        TypeRef::Bounded(bounds.into_iter().collect())
    }

    /// The last path segment of a named type (`courier::Callback` → `Callback`).
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(simple_name(name)),
            TypeRef::Bounded(_) => None,
        }
    }

    /// Generic arguments of a named type; empty for wildcards.
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            TypeRef::Bounded(_) => &[],
        }
    }

    /// Whether this is a named type carrying generic arguments.
    pub fn is_parameterized(&self) -> bool {
        !self.args().is_empty()
    }

    /// The type a wildcard stands for: its first bound. Named types are
    /// their own upper bound.
    pub fn upper_bound(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Named { .. } => Some(self),
            TypeRef::Bounded(bounds) => bounds.first().and_then(TypeRef::upper_bound),
        }
    }

    /// Replace named type variables with concrete types.
    pub fn substitute(&self, vars: &HashMap<&str, &TypeRef>) -> TypeRef {
        match self {
            TypeRef::Named { name, args } if args.is_empty() => match vars.get(name.as_str()) {
                Some(bound) => (*bound).clone(),
                None => self.clone(),
            },
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(vars)).collect(),
            },
            TypeRef::Bounded(bounds) => {
                TypeRef::Bounded(bounds.iter().map(|b| b.substitute(vars)).collect())
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Bounded(bounds) => {
                write!(f, "impl ")?;
                for (i, bound) in bounds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
        }
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name).trim()
}

/// A registered handler type: `name<params..>` has supertype `parent`.
#[derive(Debug, Clone)]
struct Supertype {
    params: Vec<String>,
    parent: TypeRef,
}

/// Which types count as completion handlers, and how they parameterize the
/// handler capability.
///
/// The capability itself (`Callback` by default) always qualifies. Other
/// handler types are declared with [`HandlerHierarchy::extend`]:
///
/// ```
/// use courier_core::{HandlerHierarchy, TypeRef};
///
/// // trait PageCallback<T>: Callback<Page<T>>
/// let handlers = HandlerHierarchy::default().extend(
///     "PageCallback",
///     &["T"],
///     TypeRef::generic("Callback", [TypeRef::generic("Page", [TypeRef::named("T")])]),
/// );
///
/// let ty = TypeRef::generic("PageCallback", [TypeRef::named("User")]);
/// let resolved = handlers.resolve(&ty).unwrap();
/// assert_eq!(resolved.to_string(), "Callback<Page<User>>");
/// ```
#[derive(Debug, Clone)]
pub struct HandlerHierarchy {
    capability: String,
    supertypes: HashMap<String, Supertype>,
}

impl Default for HandlerHierarchy {
    fn default() -> Self {
        Self::new("Callback")
    }
}

impl HandlerHierarchy {
    /// A hierarchy whose capability type is `capability`.
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            supertypes: HashMap::new(),
        }
    }

    /// The capability type name.
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Declare `name<params..>` as a handler whose supertype is `parent`.
    pub fn extend(mut self, name: impl Into<String>, params: &[&str], parent: TypeRef) -> Self {
        let name = name.into();
        self.supertypes.insert(
            simple_name(&name).to_string(),
            Supertype {
                params: params.iter().map(|p| p.to_string()).collect(),
                parent,
            },
        );
        self
    }

    /// Whether `ty` can be passed where the capability is expected.
    pub fn is_handler(&self, ty: &TypeRef) -> bool {
        self.resolve(ty).is_some()
    }

    /// Walk from `ty` up to the capability and return the capability type as
    /// `ty` parameterizes it.
    ///
    /// A raw subtype (used without its type arguments) resolves to the raw
    /// capability, which carries no payload type.
    pub fn resolve(&self, ty: &TypeRef) -> Option<TypeRef> {
        self.resolve_at(ty, 0)
    }

    fn resolve_at(&self, ty: &TypeRef, depth: usize) -> Option<TypeRef> {
        if depth > MAX_SUPERTYPE_DEPTH {
            return None;
        }

        match ty {
            TypeRef::Bounded(bounds) => bounds
                .iter()
                .find_map(|bound| self.resolve_at(bound, depth + 1)),
            TypeRef::Named { name, args } => {
                let base = simple_name(name);
                if base == simple_name(&self.capability) {
                    return Some(ty.clone());
                }

                let supertype = self.supertypes.get(base)?;
                if args.is_empty() && !supertype.params.is_empty() {
                    return Some(TypeRef::named(self.capability.clone()));
                }
                if args.len() != supertype.params.len() {
                    return None;
                }

                let vars: HashMap<&str, &TypeRef> = supertype
                    .params
                    .iter()
                    .map(String::as_str)
                    .zip(args.iter())
                    .collect();
                self.resolve_at(&supertype.parent.substitute(&vars), depth + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> TypeRef {
        TypeRef::named("User")
    }

    #[test]
    fn test_display() {
        let ty = TypeRef::generic("Callback", [TypeRef::generic("Vec", [user()])]);
        assert_eq!(ty.to_string(), "Callback<Vec<User>>");

        let ty = TypeRef::bounded([TypeRef::generic("Callback", [user()]), TypeRef::named("Send")]);
        assert_eq!(ty.to_string(), "impl Callback<User> + Send");
    }

    #[test]
    fn test_base_name_strips_path() {
        let ty = TypeRef::generic("courier::Callback", [user()]);
        assert_eq!(ty.base_name(), Some("Callback"));
    }

    #[test]
    fn test_upper_bound_takes_first_bound() {
        let ty = TypeRef::bounded([user(), TypeRef::named("Clone")]);
        assert_eq!(ty.upper_bound(), Some(&user()));
        assert_eq!(TypeRef::bounded([]).upper_bound(), None);
    }

    #[test]
    fn test_capability_resolves_to_itself() {
        let handlers = HandlerHierarchy::default();
        let ty = TypeRef::generic("courier::Callback", [user()]);
        assert_eq!(handlers.resolve(&ty), Some(ty));
    }

    #[test]
    fn test_impl_trait_resolves_through_bounds() {
        let handlers = HandlerHierarchy::default();
        let ty = TypeRef::bounded([TypeRef::named("Send"), TypeRef::generic("Callback", [user()])]);
        assert_eq!(
            handlers.resolve(&ty),
            Some(TypeRef::generic("Callback", [user()]))
        );
    }

    #[test]
    fn test_non_handler_is_rejected() {
        let handlers = HandlerHierarchy::default();
        assert!(!handlers.is_handler(&TypeRef::named("String")));
        assert!(!handlers.is_handler(&TypeRef::generic("Vec", [user()])));
    }

    #[test]
    fn test_non_generic_subtype_resolves_payload() {
        let handlers = HandlerHierarchy::default().extend(
            "UserCallback",
            &[],
            TypeRef::generic("Callback", [user()]),
        );
        assert_eq!(
            handlers.resolve(&TypeRef::named("UserCallback")),
            Some(TypeRef::generic("Callback", [user()]))
        );
    }

    #[test]
    fn test_raw_subtype_resolves_to_raw_capability() {
        let handlers = HandlerHierarchy::default().extend(
            "ListCallback",
            &["T"],
            TypeRef::generic("Callback", [TypeRef::generic("Vec", [TypeRef::named("T")])]),
        );
        assert_eq!(
            handlers.resolve(&TypeRef::named("ListCallback")),
            Some(TypeRef::named("Callback"))
        );
    }

    #[test]
    fn test_cyclic_hierarchy_gives_up() {
        let handlers = HandlerHierarchy::default()
            .extend("A", &[], TypeRef::named("B"))
            .extend("B", &[], TypeRef::named("A"));
        assert_eq!(handlers.resolve(&TypeRef::named("A")), None);
    }
}

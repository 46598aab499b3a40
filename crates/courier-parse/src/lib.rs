//! Trait parsing for the `#[rest_client]` macro.
//!
//! Turns an annotated trait into [`MethodSignature`]s, compiles them with the
//! same [`DescriptorCompiler`] the runtime uses, and reports configuration
//! errors as `syn` errors spanned at the offending method or parameter.

use courier_core::http::Method;
use courier_core::{
    Annotation, AnnotationValue, ConfigError, ConfigErrorKind, DescriptorCompiler,
    MethodSignature, ParamSlot, RequestDescriptor, RoleKind, TypeRef,
};
use heck::ToTrainCase;
use proc_macro2::Span;
use quote::{ToTokens, format_ident};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, ExprLit, FnArg, GenericArgument, Ident, ItemTrait, Lit, LitStr, Meta, Pat,
    PatType, PathArguments, ReturnType, Token, TraitBoundModifier, TraitItem, TraitItemFn, Type,
    TypeParamBound,
};

/// Arguments to `#[rest_client(...)]`.
#[derive(Debug, Default)]
pub struct ClientArgs {
    /// Name of the generated client struct (from `client = "..."`)
    pub client: Option<Ident>,
    /// Extension verbs (from `verbs(purge = "PURGE")`)
    pub verbs: Vec<ExtraVerb>,
}

/// A verb registered on top of the defaults, e.g. `purge = "PURGE"`.
#[derive(Debug, Clone)]
pub struct ExtraVerb {
    pub marker: Ident,
    pub method: LitStr,
}

impl ExtraVerb {
    pub fn marker_name(&self) -> String {
        self.marker.unraw().to_string()
    }

    pub fn http_method(&self) -> syn::Result<Method> {
        let verb = self.method.value();
        Method::from_bytes(verb.as_bytes()).map_err(|_| {
            syn::Error::new(
                self.method.span(),
                format!(
                    "{}\n\
                     \n\
                     Hint: extension methods are HTTP tokens, e.g. \"PURGE\" or \"PROPFIND\"",
                    ConfigErrorKind::UnknownHttpMethod { verb }
                ),
            )
        })
    }
}

impl Parse for ClientArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ClientArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;

            match ident.to_string().as_str() {
                "client" => {
                    input.parse::<Token![=]>()?;
                    let lit: LitStr = input.parse()?;
                    let name = lit.parse::<Ident>().map_err(|_| {
                        syn::Error::new(
                            lit.span(),
                            format!("`{}` is not a valid struct name", lit.value()),
                        )
                    })?;
                    args.client = Some(name);
                }
                "verbs" => {
                    let content;
                    syn::parenthesized!(content in input);
                    while !content.is_empty() {
                        let marker: Ident = content.call(Ident::parse_any)?;
                        content.parse::<Token![=]>()?;
                        let method: LitStr = content.parse()?;
                        let verb = ExtraVerb { marker, method };
                        verb.http_method()?;
                        args.verbs.push(verb);

                        if content.peek(Token![,]) {
                            content.parse::<Token![,]>()?;
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown argument `{other}`\n\
                             Valid arguments: client, verbs\n\
                             Examples:\n\
                             - #[rest_client(client = \"GitHub\")]\n\
                             - #[rest_client(verbs(purge = \"PURGE\"))]"
                        ),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Build the compiler a client uses: default verbs plus the extensions.
pub fn compiler_for(verbs: &[ExtraVerb]) -> syn::Result<DescriptorCompiler> {
    let mut compiler = DescriptorCompiler::default();
    for verb in verbs {
        compiler
            .verbs_mut()
            .register(verb.marker_name(), verb.http_method()?);
    }
    Ok(compiler)
}

/// A parsed `#[rest_client]` trait.
#[derive(Debug)]
pub struct ClientTrait {
    /// The trait as it is re-emitted, with verb and role attributes removed
    pub item: ItemTrait,
    pub client_ident: Ident,
    pub verbs: Vec<ExtraVerb>,
    /// Methods the client implements, in declaration order
    pub methods: Vec<ClientMethod>,
}

/// A trait method backed by a request descriptor.
#[derive(Debug)]
pub struct ClientMethod {
    /// Signature with role attributes removed
    pub sig: syn::Signature,
    pub signature: MethodSignature,
    /// Descriptor compiled at expansion time
    pub descriptor: RequestDescriptor,
    /// Parameters, excluding the receiver
    pub params: Vec<ClientParam>,
    /// Response payload type handed to the completion handler
    pub payload: Type,
}

#[derive(Debug, Clone)]
pub struct ClientParam {
    pub name: Ident,
    pub ty: Type,
    /// Whether this is `Option<T>`
    pub is_optional: bool,
}

impl ClientTrait {
    pub fn parse(args: ClientArgs, mut item: ItemTrait) -> syn::Result<Self> {
        if !item.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &item.generics,
                "#[rest_client] traits cannot be generic\n\
                 \n\
                 Hint: name concrete payload types in each method's completion handler",
            ));
        }

        let owner = item.ident.to_string();
        let compiler = compiler_for(&args.verbs)?;
        let mut methods = Vec::new();

        for trait_item in &mut item.items {
            let TraitItem::Fn(method) = trait_item else {
                return Err(syn::Error::new_spanned(
                    &*trait_item,
                    "#[rest_client] traits may only declare methods\n\
                     \n\
                     Hint: move associated types and constants to another trait",
                ));
            };

            let has_verb = method
                .attrs
                .iter()
                .any(|attr| attr_name(attr).is_some_and(|name| compiler.verbs().contains(&name)));
            if method.default.is_some() && !has_verb {
                continue;
            }

            methods.push(ClientMethod::parse(&owner, &compiler, method)?);
        }

        let client_ident = args
            .client
            .unwrap_or_else(|| format_ident!("{}Client", item.ident));

        Ok(Self {
            item,
            client_ident,
            verbs: args.verbs,
            methods,
        })
    }
}

impl ClientMethod {
    /// Parse and compile one method, stripping its verb and role attributes.
    pub fn parse(
        owner: &str,
        compiler: &DescriptorCompiler,
        method: &mut TraitItemFn,
    ) -> syn::Result<Self> {
        check_shape(method)?;
        let original = method.clone();

        let name = method.sig.ident.unraw().to_string();
        let mut signature = MethodSignature::new(owner, name);
        for attr in &method.attrs {
            if let Some(name) = attr_name(attr)
                && name != "doc"
            {
                signature = signature.annotate(annotation(&name, attr));
            }
        }
        method
            .attrs
            .retain(|attr| !attr_name(attr).is_some_and(|name| compiler.verbs().contains(&name)));

        let mut params = Vec::new();
        for arg in method.sig.inputs.iter_mut() {
            let FnArg::Typed(pat_type) = arg else {
                continue;
            };
            let (param, slot) = parse_param(pat_type)?;
            params.push(param);
            signature = signature.param(slot);
        }

        let descriptor = compiler
            .compile(&signature)
            .map_err(|error| config_error(error, &original, &signature))?;

        let payload = payload_type(&original, compiler, &descriptor)?;

        Ok(Self {
            sig: method.sig.clone(),
            signature,
            descriptor,
            params,
            payload,
        })
    }
}

fn check_shape(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;

    if let Some(default) = &method.default {
        return Err(syn::Error::new_spanned(
            default,
            "client methods cannot have a default body\n\
             \n\
             Hint: remove the body, the generated client implements the method",
        ));
    }

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "client methods cannot be async\n\
             \n\
             Hint: the response is delivered to the completion handler, e.g.\n\
             fn get_user(&self, #[path] id: u64, cb: impl Callback<User>);",
        ));
    }

    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "client methods cannot be generic\n\
             \n\
             Hint: take the completion handler as `impl Callback<T>`",
        ));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "client methods must take `&self`\n\
                 \n\
                 Example: fn list_users(&self, cb: impl Callback<Vec<User>>);",
            ));
        }
    }

    match &sig.output {
        ReturnType::Default => Ok(()),
        ReturnType::Type(_, ty) if is_unit_type(ty) => Ok(()),
        ReturnType::Type(_, ty) => Err(syn::Error::new_spanned(
            ty,
            "client methods must return `()`\n\
             \n\
             Hint: the response is delivered to the completion handler, so\n\
             `fn get_user(&self, id: u64) -> User` becomes\n\
             `fn get_user(&self, #[path] id: u64, cb: impl Callback<User>)`",
        )),
    }
}

/// Parse one parameter and remove its role attributes.
fn parse_param(pat_type: &mut PatType) -> syn::Result<(ClientParam, ParamSlot)> {
    let name = match pat_type.pat.as_ref() {
        Pat::Ident(pat_ident) => pat_ident.ident.clone(),
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "unsupported parameter pattern\n\
                 \n\
                 Client methods require simple parameter names.\n\
                 Use: id: u64\n\
                 Not: (id, _): (u64, u64)",
            ));
        }
    };
    let param_name = name.unraw().to_string();

    let mut slot = ParamSlot::new(&param_name, type_ref(&pat_type.ty));
    for attr in &pat_type.attrs {
        let Some(role_name) = attr_name(attr) else {
            continue;
        };
        let Some(role) = RoleKind::from_annotation(&role_name) else {
            continue;
        };

        let mut parsed = annotation(&role_name, attr);
        if parsed.value == AnnotationValue::None {
            match role {
                RoleKind::Path | RoleKind::Query => {
                    parsed = Annotation::new(role_name, &param_name);
                }
                RoleKind::Header => {
                    parsed = Annotation::new(role_name, param_name.to_train_case());
                }
                RoleKind::Body | RoleKind::Unclassified => {}
            }
        }
        slot = slot.annotate(parsed);
    }

    pat_type.attrs.retain(|attr| {
        !attr_name(attr).is_some_and(|name| RoleKind::from_annotation(&name).is_some())
    });

    let ty = (*pat_type.ty).clone();
    let param = ClientParam {
        name,
        is_optional: is_option_type(&ty),
        ty,
    };

    Ok((param, slot))
}

/// The attribute's name, for single-identifier paths.
pub fn attr_name(attr: &Attribute) -> Option<String> {
    attr.path().get_ident().map(|ident| ident.to_string())
}

/// Read an attribute as an [`Annotation`].
///
/// `#[name]` and `#[name()]` carry no value, `#[name("x")]` and
/// `#[name = "x"]` carry a string, anything else is kept as raw text.
pub fn annotation(name: &str, attr: &Attribute) -> Annotation {
    match &attr.meta {
        Meta::Path(_) => Annotation::marker(name),
        Meta::List(list) if list.tokens.is_empty() => Annotation::marker(name),
        Meta::List(list) => match syn::parse2::<LitStr>(list.tokens.clone()) {
            Ok(lit) => Annotation::new(name, lit.value()),
            Err(_) => Annotation::with_raw(name, list.tokens.to_string()),
        },
        Meta::NameValue(meta) => match &meta.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) => Annotation::new(name, lit.value()),
            other => Annotation::with_raw(name, other.to_token_stream().to_string()),
        },
    }
}

/// Convert a `syn` type into a structural [`TypeRef`].
///
/// Paths keep their type arguments; `impl`/`dyn` bounds become a bounded
/// wildcard. Anything else is tagged by its source text.
pub fn type_ref(ty: &Type) -> TypeRef {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => path_ref(&type_path.path),
        Type::ImplTrait(impl_trait) => bounds_ref(&impl_trait.bounds),
        Type::TraitObject(trait_object) => bounds_ref(&trait_object.bounds),
        Type::Paren(paren) => type_ref(&paren.elem),
        Type::Group(group) => type_ref(&group.elem),
        other => TypeRef::named(other.to_token_stream().to_string()),
    }
}

fn path_ref(path: &syn::Path) -> TypeRef {
    let name = path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");

    let args = match path.segments.last().map(|segment| &segment.arguments) {
        Some(PathArguments::AngleBracketed(args)) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(type_ref(ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    TypeRef::generic(name, args)
}

fn bounds_ref(bounds: &Punctuated<TypeParamBound, Token![+]>) -> TypeRef {
    TypeRef::bounded(bounds.iter().filter_map(|bound| match bound {
        TypeParamBound::Trait(trait_bound)
            if !matches!(trait_bound.modifier, TraitBoundModifier::Maybe(_)) =>
        {
            Some(path_ref(&trait_bound.path))
        }
        _ => None,
    }))
}

/// The payload type named by the completion handler, e.g. `User` in
/// `impl Callback<User>`.
fn payload_type(
    method: &TraitItemFn,
    compiler: &DescriptorCompiler,
    descriptor: &RequestDescriptor,
) -> syn::Result<Type> {
    let Some(FnArg::Typed(last)) = method.sig.inputs.last() else {
        return Err(syn::Error::new_spanned(&method.sig, "missing completion handler"));
    };
    let capability = compiler.handlers().capability();

    let payload = descriptor
        .response_type()
        .and_then(|_| handler_payload(&last.ty, capability))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &last.ty,
                format!(
                    "completion handler must name its payload type\n\
                     \n\
                     Example: cb: impl {capability}<User>"
                ),
            )
        })?;

    if matches!(payload, Type::ImplTrait(_) | Type::Infer(_)) {
        return Err(syn::Error::new_spanned(
            payload,
            "payload type must be concrete\n\
             \n\
             Hint: the response is deserialized into this type, name it directly,\n\
             e.g. impl Callback<User> rather than impl Callback<impl Into<User>>",
        ));
    }

    Ok(payload.clone())
}

fn handler_payload<'a>(ty: &'a Type, capability: &str) -> Option<&'a Type> {
    match ty {
        Type::ImplTrait(impl_trait) => bounds_payload(&impl_trait.bounds, capability),
        Type::TraitObject(trait_object) => bounds_payload(&trait_object.bounds, capability),
        Type::Paren(paren) => handler_payload(&paren.elem, capability),
        Type::Group(group) => handler_payload(&group.elem, capability),
        Type::Path(type_path) => capability_arg(&type_path.path, capability),
        _ => None,
    }
}

fn bounds_payload<'a>(
    bounds: &'a Punctuated<TypeParamBound, Token![+]>,
    capability: &str,
) -> Option<&'a Type> {
    bounds.iter().find_map(|bound| match bound {
        TypeParamBound::Trait(trait_bound) => capability_arg(&trait_bound.path, capability),
        _ => None,
    })
}

fn capability_arg<'a>(path: &'a syn::Path, capability: &str) -> Option<&'a Type> {
    let segment = path.segments.last()?;
    if segment.ident != capability {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Check if a type is `Option<T>`
pub fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Option"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
    {
        return matches!(args.args.first(), Some(GenericArgument::Type(_)));
    }
    false
}

/// Check if a type is ()
pub fn is_unit_type(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Turn a compiler error into a compile error at the offending tokens.
fn config_error(error: ConfigError, method: &TraitItemFn, signature: &MethodSignature) -> syn::Error {
    let span = error_span(error.kind(), method, signature);
    let message = match hint(error.kind()) {
        Some(hint) => format!("{error}\n\nHint: {hint}"),
        None => error.to_string(),
    };
    syn::Error::new(span, message)
}

fn error_span(kind: &ConfigErrorKind, method: &TraitItemFn, signature: &MethodSignature) -> Span {
    let attr_span = |name: &str| {
        method
            .attrs
            .iter()
            .rev()
            .find(|attr| attr_name(attr).as_deref() == Some(name))
            .map(|attr| attr.span())
    };
    let param_span = |name: &str| {
        method.sig.inputs.iter().find_map(|arg| match arg {
            FnArg::Typed(pat_type)
                if matches!(pat_type.pat.as_ref(), Pat::Ident(p) if p.ident.unraw() == name) =>
            {
                Some(pat_type.span())
            }
            _ => None,
        })
    };

    let span = match kind {
        ConfigErrorKind::MalformedVerbAnnotation { annotation } => attr_span(annotation),
        ConfigErrorKind::MultipleVerbAnnotations { second, .. } => attr_span(second),
        ConfigErrorKind::InvalidLastParameter { .. } => match method.sig.inputs.last() {
            Some(FnArg::Typed(pat_type)) => Some(pat_type.ty.span()),
            _ => None,
        },
        ConfigErrorKind::DuplicateParameterName { role, name } => signature
            .params
            .iter()
            .filter(|param| {
                param.annotations.iter().any(|a| {
                    RoleKind::from_annotation(&a.name) == Some(*role)
                        && a.str_value() == Some(name.as_str())
                })
            })
            .nth(1)
            .and_then(|param| param_span(&param.name)),
        ConfigErrorKind::ConflictingParameterRoles { param, .. }
        | ConfigErrorKind::MalformedParameterAnnotation { param, .. } => param_span(param),
        ConfigErrorKind::MultipleBodyParameters { second, .. } => param_span(second),
        ConfigErrorKind::MissingVerbAnnotation { .. }
        | ConfigErrorKind::MissingParameters
        | ConfigErrorKind::UnknownHttpMethod { .. } => None,
    };

    span.unwrap_or_else(|| method.sig.ident.span())
}

fn hint(kind: &ConfigErrorKind) -> Option<&'static str> {
    match kind {
        ConfigErrorKind::MissingVerbAnnotation { .. } => {
            Some("annotate the method with its verb and path, e.g. #[get(\"/users/{id}\")]")
        }
        ConfigErrorKind::MalformedVerbAnnotation { .. } => {
            Some("the path must be a string literal, e.g. #[post(\"/users\")]")
        }
        ConfigErrorKind::MultipleVerbAnnotations { .. } => {
            Some("keep exactly one verb annotation per method")
        }
        ConfigErrorKind::MissingParameters | ConfigErrorKind::InvalidLastParameter { .. } => {
            Some("the last parameter receives the response, e.g. cb: impl Callback<User>")
        }
        ConfigErrorKind::DuplicateParameterName { .. } => {
            Some("each path, query and header name may be bound once per method")
        }
        ConfigErrorKind::ConflictingParameterRoles { .. } => {
            Some("a parameter takes exactly one of #[path], #[query], #[header] or #[body]")
        }
        ConfigErrorKind::MultipleBodyParameters { .. } => {
            Some("combine the values into one serializable type")
        }
        ConfigErrorKind::MalformedParameterAnnotation { .. } => Some(
            "use a string literal, e.g. #[query(\"page\")], or omit it to use the parameter name",
        ),
        ConfigErrorKind::UnknownHttpMethod { .. } => None,
    }
}

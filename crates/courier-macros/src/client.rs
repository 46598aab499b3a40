//! REST client generation macro.
//!
//! Generates a client struct implementing an annotated trait. Every method
//! is compiled into a [`RequestDescriptor`](courier_core::RequestDescriptor)
//! twice: once at expansion time, so misconfigured methods fail the build,
//! and once when the client is constructed, from the signatures the macro
//! records.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[rest_client]
//! pub trait UserApi {
//!     #[get("/users/{id}")]
//!     fn get_user(&self, #[path] id: u64, cb: impl Callback<User>);
//!
//!     #[post("/users")]
//!     fn create_user(&self, #[body] user: NewUser, cb: impl Callback<User>);
//! }
//!
//! let api = UserApiClient::new(RestClient::new(config, transport)?)?;
//! api.get_user(7, |result: Result<User, ClientError>| println!("{result:?}"));
//! ```
//!
//! # Generated Items
//!
//! - `UserApiClient<T: Transport>`, implementing `UserApi`
//! - `signatures()`: the recorded method signatures
//! - `compiler()`: the descriptor compiler, with any extension verbs
//! - `new(RestClient<T>)`: compiles the descriptors and builds the client
//! - `descriptors()` / `descriptor(name)`: the compiled descriptors

use courier_core::{Annotation, AnnotationValue, MethodSignature, ParamRole, TypeRef};
use courier_parse::{ClientArgs, ClientMethod, ClientParam, ClientTrait};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemTrait;

pub(crate) fn expand_rest_client(args: ClientArgs, item: ItemTrait) -> syn::Result<TokenStream2> {
    let client = ClientTrait::parse(args, item)?;

    let trait_item = &client.item;
    let vis = &trait_item.vis;
    let trait_ident = &trait_item.ident;
    let client_ident = &client.client_ident;
    let owner = trait_ident.to_string();
    let doc = format!("Generated HTTP client for [`{trait_ident}`].");

    let signatures = client.methods.iter().map(|m| signature_tokens(&m.signature));
    let compiler = compiler_tokens(&client, &owner);
    let methods = client
        .methods
        .iter()
        .enumerate()
        .map(|(index, method)| method_tokens(index, method))
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        #trait_item

        #[doc = #doc]
        #vis struct #client_ident<T> {
            inner: ::courier::RestClient<T>,
            descriptors: ::std::sync::Arc<[::courier::RequestDescriptor]>,
        }

        impl<T> ::core::clone::Clone for #client_ident<T> {
            fn clone(&self) -> Self {
                Self {
                    inner: ::core::clone::Clone::clone(&self.inner),
                    descriptors: ::std::sync::Arc::clone(&self.descriptors),
                }
            }
        }

        impl<T: ::courier::Transport> #client_ident<T> {
            /// Method signatures as declared on the trait.
            pub fn signatures() -> ::std::vec::Vec<::courier::MethodSignature> {
                ::std::vec![#(#signatures),*]
            }

            /// The compiler used to build this client's descriptors.
            pub fn compiler() -> ::core::result::Result<::courier::DescriptorCompiler, ::courier::ConfigError> {
                #compiler
            }

            /// Compile every method's descriptor and wrap `inner`.
            pub fn new(inner: ::courier::RestClient<T>) -> ::core::result::Result<Self, ::courier::ConfigError> {
                let descriptors = Self::compiler()?.compile_all(&Self::signatures())?;
                ::core::result::Result::Ok(Self {
                    inner,
                    descriptors: descriptors.into(),
                })
            }

            pub fn descriptors(&self) -> &[::courier::RequestDescriptor] {
                &self.descriptors
            }

            /// The descriptor of the named method.
            pub fn descriptor(&self, method: &str) -> ::core::option::Option<&::courier::RequestDescriptor> {
                self.descriptors.iter().find(|d| d.method_name() == method)
            }

            pub fn client(&self) -> &::courier::RestClient<T> {
                &self.inner
            }
        }

        impl<T: ::courier::Transport> #trait_ident for #client_ident<T> {
            #(#methods)*
        }
    })
}

fn compiler_tokens(client: &ClientTrait, owner: &str) -> TokenStream2 {
    if client.verbs.is_empty() {
        return quote! {
            ::core::result::Result::Ok(::courier::DescriptorCompiler::default())
        };
    }

    let registrations = client.verbs.iter().map(|verb| {
        let marker = verb.marker_name();
        let method = &verb.method;
        quote! {
            let method = ::courier::http::Method::from_bytes(#method.as_bytes()).map_err(|_| {
                ::courier::ConfigError::interface(
                    #owner,
                    ::courier::ConfigErrorKind::UnknownHttpMethod { verb: #method.to_string() },
                )
            })?;
            compiler.verbs_mut().register(#marker, method);
        }
    });

    quote! {
        let mut compiler = ::courier::DescriptorCompiler::default();
        #(#registrations)*
        ::core::result::Result::Ok(compiler)
    }
}

fn method_tokens(index: usize, method: &ClientMethod) -> syn::Result<TokenStream2> {
    let sig = &method.sig;
    let payload = &method.payload;

    let Some(callback) = method.params.last().map(|param| &param.name) else {
        return Err(syn::Error::new_spanned(sig, "missing completion handler"));
    };
    let arguments = method
        .params
        .iter()
        .zip(method.descriptor.roles())
        .map(|(param, role)| argument_tokens(param, role));

    Ok(quote! {
        #[allow(unused_variables)]
        #sig {
            self.inner.invoke::<#payload, _>(
                &self.descriptors[#index],
                ::std::vec![#(#arguments),*],
                #callback,
            );
        }
    })
}

/// How one argument reaches the request.
fn argument_tokens(param: &ClientParam, role: &ParamRole) -> TokenStream2 {
    let name = &param.name;
    match role {
        ParamRole::Path(_) | ParamRole::Query(_) | ParamRole::Header(_) if param.is_optional => {
            quote!(::courier::Argument::optional(#name.as_ref()))
        }
        ParamRole::Path(_) | ParamRole::Query(_) | ParamRole::Header(_) => {
            quote!(::courier::Argument::text(&#name))
        }
        ParamRole::Body => quote!(::courier::Argument::json(&#name)),
        ParamRole::Unclassified => quote!(::courier::Argument::Skip),
    }
}

fn signature_tokens(signature: &MethodSignature) -> TokenStream2 {
    let owner = &signature.owner;
    let name = &signature.name;
    let annotations = signature.annotations.iter().map(annotation_tokens);
    let params = signature.params.iter().map(|param| {
        let name = &param.name;
        let ty = type_ref_tokens(&param.ty);
        let annotations = param.annotations.iter().map(annotation_tokens);
        quote! {
            ::courier::ParamSlot::new(#name, #ty) #(.annotate(#annotations))*
        }
    });

    quote! {
        ::courier::MethodSignature::new(#owner, #name)
            #(.annotate(#annotations))*
            #(.param(#params))*
    }
}

fn annotation_tokens(annotation: &Annotation) -> TokenStream2 {
    let name = &annotation.name;
    match &annotation.value {
        AnnotationValue::None => quote!(::courier::Annotation::marker(#name)),
        AnnotationValue::Str(value) => quote!(::courier::Annotation::new(#name, #value)),
        AnnotationValue::Other(raw) => quote!(::courier::Annotation::with_raw(#name, #raw)),
    }
}

fn type_ref_tokens(ty: &TypeRef) -> TokenStream2 {
    match ty {
        TypeRef::Named { name, args } if args.is_empty() => {
            quote!(::courier::TypeRef::named(#name))
        }
        TypeRef::Named { name, args } => {
            let args = args.iter().map(type_ref_tokens);
            quote!(::courier::TypeRef::generic(#name, [#(#args),*]))
        }
        TypeRef::Bounded(bounds) if bounds.is_empty() => {
            quote!(::courier::TypeRef::Bounded(::std::vec::Vec::new()))
        }
        TypeRef::Bounded(bounds) => {
            let bounds = bounds.iter().map(type_ref_tokens);
            quote!(::courier::TypeRef::bounded([#(#bounds),*]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{FnArg, Pat, parse_quote};

    fn param_names(sig: &syn::Signature) -> Vec<String> {
        sig.inputs
            .iter()
            .filter_map(|arg| match arg {
                FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
                    Pat::Ident(ident) => Some(ident.ident.to_string()),
                    _ => None,
                },
                FnArg::Receiver(_) => None,
            })
            .collect()
    }

    fn expand(args: &str, item: ItemTrait) -> syn::Result<String> {
        let args: ClientArgs = syn::parse_str(args)?;
        expand_rest_client(args, item).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_type_ref_tokens() {
        let ty = TypeRef::bounded([TypeRef::generic("Callback", [TypeRef::named("User")])]);
        assert_eq!(
            type_ref_tokens(&ty).to_string(),
            quote!(::courier::TypeRef::bounded([::courier::TypeRef::generic(
                "Callback",
                [::courier::TypeRef::named("User")]
            )]))
            .to_string()
        );
    }

    #[test]
    fn test_argument_tokens() {
        let param = ClientParam {
            name: parse_quote!(limit),
            ty: parse_quote!(Option<u32>),
            is_optional: true,
        };
        assert_eq!(
            argument_tokens(&param, &ParamRole::Query("limit".into())).to_string(),
            quote!(::courier::Argument::optional(limit.as_ref())).to_string()
        );
        assert_eq!(
            argument_tokens(&param, &ParamRole::Unclassified).to_string(),
            quote!(::courier::Argument::Skip).to_string()
        );
    }

    #[test]
    fn test_expansion_shape() {
        let output = expand(
            "",
            parse_quote! {
                pub trait UserApi {
                    #[get("/users/{id}")]
                    fn get_user(&self, #[path] id: u64, cb: impl Callback<User>);
                }
            },
        )
        .unwrap();

        assert!(output.contains("pub struct UserApiClient < T >"));
        assert!(output.contains("impl < T : :: courier :: Transport > UserApi for UserApiClient < T >"));
        assert!(output.contains("invoke :: < User , _ >"));
        assert!(!output.contains("# [get"));
        assert!(!output.contains("# [path]"));
    }

    #[test]
    fn test_extension_verbs_are_registered() {
        let output = expand(
            r#"client = "Cache", verbs(purge = "PURGE")"#,
            parse_quote! {
                trait CacheApi {
                    #[purge("/cache/{key}")]
                    fn purge(&self, #[path] key: String, cb: impl Callback<()>);
                }
            },
        )
        .unwrap();

        assert!(output.contains("struct Cache < T >"));
        assert!(output.contains("compiler . verbs_mut () . register (\"purge\" , method)"));
    }

    #[test]
    fn test_configuration_errors_abort_expansion() {
        let err = expand(
            "",
            parse_quote! {
                trait UserApi {
                    #[get("/users/{id}")]
                    fn get_user(&self, #[path] id: u64);
                }
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("last parameter must be a completion handler"));
    }

    #[test]
    fn test_stripped_signature_keeps_parameters() {
        let client = ClientTrait::parse(
            ClientArgs::default(),
            parse_quote! {
                trait UserApi {
                    #[get("/users")]
                    fn list_users(&self, #[query] page: Option<u32>, cb: impl Callback<Vec<User>>);
                }
            },
        )
        .unwrap();
        assert_eq!(param_names(&client.methods[0].sig), vec!["page", "cb"]);
    }
}

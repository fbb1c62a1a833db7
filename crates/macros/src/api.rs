use proc_macro2::{Span, TokenStream};
use syn::{Attribute, Ident, Lit, LitStr, Meta, NestedMeta, spanned::Spanned};
use synstructure::{BindingInfo, Structure, VariantInfo};

/// Contents of a single `#[api(...)]` attribute.
#[derive(Default)]
struct Api {
    /// Span of the `internal` flag, if present.
    internal: Option<Span>,
    /// Error code reported to the user.
    code: Option<LitStr>,
    /// Name of an associated constant on `StatusCode`.
    status: Option<Ident>,
}

pub fn derive_error(s: Structure) -> TokenStream {
    let statuses = s.each_variant(|v| match status_of(v) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    });

    let codes = s.each_variant(|v| match code_of(v) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    });

    s.gen_impl(quote! {
        use std::borrow::Cow;

        gen impl ::lectern_error::ApiError for @Self {
            fn status(&self) -> ::lectern_error::StatusCode {
                match *self { #statuses }
            }

            fn code(&self) -> Option<Cow<str>> {
                match *self { #codes }
            }
        }
    })
}

/// Tokens computing [`ApiError::status()`] for a variant.
fn status_of(v: &VariantInfo) -> syn::Result<TokenStream> {
    let api = match Api::find(v.ast().attrs)? {
        Some(api) => api,
        None => return delegate(v, quote!(status)),
    };

    Ok(match api.status {
        Some(status) => quote!(::lectern_error::StatusCode::#status),
        None => quote!(::lectern_error::StatusCode::INTERNAL_SERVER_ERROR),
    })
}

/// Tokens computing [`ApiError::code()`] for a variant.
fn code_of(v: &VariantInfo) -> syn::Result<TokenStream> {
    let api = match Api::find(v.ast().attrs)? {
        Some(api) => api,
        None => return delegate(v, quote!(code)),
    };

    Ok(match api.code {
        Some(code) => quote!(Some(Cow::Borrowed(#code))),
        None => quote!(None),
    })
}

/// Variants without an `#[api]` attribute forward to their `#[cause]`.
fn delegate(v: &VariantInfo, method: TokenStream) -> syn::Result<TokenStream> {
    v.bindings()
        .iter()
        .find(is_cause)
        .map(|cause| quote!(::lectern_error::ApiError::#method(#cause)))
        .ok_or_else(|| syn::Error::new(
            v.ast().ident.span(),
            "each variant must be #[api]-annotated or have a #[cause]",
        ))
}

impl Api {
    /// Find and parse the `#[api(...)]` attribute, ensuring there is at most
    /// one.
    fn find(attrs: &[Attribute]) -> syn::Result<Option<Api>> {
        let mut attrs = attrs.iter().filter(|attr| attr.path.is_ident("api"));

        let attr = match attrs.next() {
            Some(attr) => attr,
            None => return Ok(None),
        };

        if let Some(duplicate) = attrs.next() {
            return Err(syn::Error::new(
                duplicate.span(),
                "api attribute must be used exactly once",
            ));
        }

        let list = match attr.parse_meta()? {
            Meta::List(list) => list,
            meta => return Err(syn::Error::new(
                meta.span(),
                "api attribute must take a list in parentheses",
            )),
        };

        if list.nested.is_empty() {
            return Err(syn::Error::new(
                list.span(),
                "api attribute requires at least one argument",
            ));
        }

        let mut api = Api::default();

        for item in list.nested.iter() {
            match item {
                NestedMeta::Meta(Meta::Path(path)) if path.is_ident("internal") =>
                    api.internal = Some(path.span()),
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("code") =>
                    api.code = Some(string(&nv.lit)?),
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("status") => {
                    let status = string(&nv.lit)?;
                    api.status = Some(Ident::new(&status.value(), status.span()));
                }
                _ => return Err(syn::Error::new(
                    item.span(),
                    "expected one of: internal, code, status",
                )),
            }
        }

        if let Some(span) = api.internal {
            if api.code.is_some() || api.status.is_some() {
                return Err(syn::Error::new(
                    span,
                    "internal errors can't have codes or statuses",
                ));
            }
        }

        Ok(Some(api))
    }
}

fn string(lit: &Lit) -> syn::Result<LitStr> {
    match lit {
        Lit::Str(s) => Ok(s.clone()),
        _ => Err(syn::Error::new(lit.span(), "expected a string")),
    }
}

fn is_cause(bi: &&BindingInfo) -> bool {
    bi.ast().attrs.iter().any(|attr| attr.path.is_ident("cause"))
}

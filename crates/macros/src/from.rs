use proc_macro2::TokenStream;
use syn::{Data, DeriveInput, Field, Fields, spanned::Spanned};

pub fn derive_from(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let variants = match input.data {
        Data::Enum(ref data) => &data.variants,
        _ => return Err(syn::Error::new(
            input.ident.span(),
            "From can only be derived for enums",
        )),
    };

    let mut impls = TokenStream::new();

    for variant in variants {
        if !variant.fields.iter().any(is_from) {
            continue;
        }

        let field = match only_field(&variant.fields) {
            Some(field) => field,
            None => return Err(syn::Error::new(
                variant.span(),
                "#[from] can only be used on a variant with exactly one field",
            )),
        };

        let ident = &variant.ident;
        let ty = &field.ty;
        let construct = match field.ident {
            Some(ref field) => quote!(#name::#ident { #field: value }),
            None => quote!(#name::#ident(value)),
        };

        impls.extend(quote! {
            impl #impl_generics From<#ty> for #name #ty_generics #where_clause {
                fn from(value: #ty) -> Self {
                    #construct
                }
            }
        });
    }

    Ok(impls)
}

fn only_field(fields: &Fields) -> Option<&Field> {
    let mut iter = fields.iter();
    match (iter.next(), iter.next()) {
        (Some(field), None) => Some(field),
        _ => None,
    }
}

fn is_from(field: &Field) -> bool {
    field.attrs.iter().any(|attr| attr.path.is_ident("from"))
}

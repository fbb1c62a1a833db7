extern crate proc_macro;

#[macro_use] extern crate quote;
#[macro_use] extern crate synstructure;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod api;
mod from;

decl_derive!([ApiError, attributes(api)] => api::derive_error);

/// Derive [`From`] for each enum variant whose only field is marked
/// `#[from]`.
#[proc_macro_derive(From, attributes(from))]
pub fn derive_from(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    match from::derive_from(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

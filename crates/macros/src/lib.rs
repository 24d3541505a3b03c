// Path: crates/macros/src/lib.rs

//! Derives `alephium_types::error::ErrorCode` for an enum whose variants
//! carry a `#[code("...")]` attribute, so the kernel's error taxonomy
//! (`IoError`, `InvalidBlockError`, `ExeFailure`, ...) gets its stable
//! machine-readable code from the same place its `thiserror` message is
//! declared, instead of a second hand-maintained `match`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// `#[derive(ErrorCode)]`: generates
/// `impl alephium_types::error::ErrorCode for #name`, matching each
/// variant's `#[code("...")]` attribute to its string. Every variant of
/// the enum must carry exactly one `#[code("...")]` attribute.
#[proc_macro_derive(ErrorCode, attributes(code))]
pub fn derive_error_code(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return syn::Error::new_spanned(&input, "ErrorCode can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let mut arms = Vec::new();
    for variant in variants {
        let variant_ident = &variant.ident;
        let code = match find_code_attr(variant) {
            Ok(code) => code,
            Err(e) => return e.to_compile_error().into(),
        };
        let pattern = match &variant.fields {
            Fields::Unit => quote! { #name::#variant_ident },
            Fields::Unnamed(_) => quote! { #name::#variant_ident(..) },
            Fields::Named(_) => quote! { #name::#variant_ident { .. } },
        };
        arms.push(quote! { #pattern => #code });
    }

    let expanded = quote! {
        impl crate::error::ErrorCode for #name {
            fn code(&self) -> &'static str {
                match self {
                    #(#arms,)*
                }
            }
        }
    };

    expanded.into()
}

fn find_code_attr(variant: &syn::Variant) -> syn::Result<LitStr> {
    for attr in &variant.attrs {
        if attr.path().is_ident("code") {
            let value: LitStr = attr.parse_args()?;
            return Ok(value);
        }
    }
    Err(syn::Error::new_spanned(
        &variant.ident,
        format!("variant `{}` is missing a `#[code(\"...\")]` attribute", variant.ident),
    ))
}

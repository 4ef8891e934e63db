//! Proc macros for billboard API types.
//!
//! Current list (see function docs for details):
//!   - [`http_status_code_derive`] (for `#[derive(HttpStatusCode)]`)

use attribute_derive::FromAttr;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

// --- #[derive(HttpStatusCode)] -------------------------------------------------------------------

/// Attach an HTTP status code to every variant of a response enum.
///
/// Syntax:
///
/// ```rs
/// use serde::{Serialize, Deserialize};
/// use bb_server_macros::HttpStatusCode;
///
/// #[derive(HttpStatusCode, Serialize, Deserialize)]
/// #[serde(tag = "type", rename_all = "snake_case")]
/// enum Response {
///     #[http(status = 200)]
///     Ok { images: Vec<String> },
///     #[http(status = 401)]
///     Unauthorized,
///     #[http(status = 500)]
///     Internal,
/// }
/// ```
///
/// The generated impl is `bb_server_traits::JsonProxiedStatus`, so the deriving crate needs
/// both `bb-server-traits` and `http` as dependencies. A test module is emitted alongside it
/// that checks every listed code is a valid HTTP status.
#[proc_macro_derive(HttpStatusCode, attributes(http))]
pub fn http_status_code_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_http_status_code_derive(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(FromAttr)]
#[attribute(ident = http)]
#[attribute(error(missing_field = "`{field}` was not specified"))]
struct HttpAttrs {
    #[attribute(example = "#[http(status = 404)")]
    status: u16,
}

fn expand_http_status_code_derive(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Enum(data) = input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(HttpStatusCode)] only works on enums.",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            input.ident.span(),
            "#[derive(HttpStatusCode)] needs at least one variant.",
        ));
    }

    let mut match_arms = vec![];
    let mut variant_idents = vec![];
    let mut variant_codes = vec![];
    for variant in data.variants {
        let attrs = HttpAttrs::from_attributes(&variant.attrs)?;
        let ident = variant.ident;
        let code = attrs.status;
        let pattern = match &variant.fields {
            Fields::Named(_) => quote!({ .. }),
            Fields::Unnamed(_) => quote!((..)),
            Fields::Unit => quote!(),
        };
        match_arms.push(quote! {
            Self::#ident #pattern => http::StatusCode::from_u16(#code)
                .expect("invalid HTTP status code in #[derive(HttpStatusCode)]")
        });
        variant_idents.push(ident);
        variant_codes.push(code);
    }

    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let test_mod = format_ident!("__{}_http_status_tests", name.to_string().to_lowercase());

    Ok(quote! {
        impl #impl_generics bb_server_traits::JsonProxiedStatus for #name #ty_generics #where_clause {
            fn status_code(&self) -> http::StatusCode {
                match self {
                    #(#match_arms),*
                }
            }
        }
        #[cfg(test)]
        #[allow(non_snake_case)]
        mod #test_mod {
            #[test]
            fn status_codes_are_valid() {
                #(
                    assert!(
                        http::StatusCode::from_u16(#variant_codes).is_ok(),
                        "invalid HTTP status {} for {}::{}",
                        #variant_codes,
                        stringify!(#name),
                        stringify!(#variant_idents),
                    );
                )*
            }
        }
    })
}

// Copyright (C) 2024-present The NetGauze Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;

fn has_attribute(field: &syn::Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// The single unnamed field of `variant`, anything else can't be converted
/// into
fn single_field(variant: &syn::Variant) -> syn::Result<&syn::Field> {
    match &variant.fields {
        syn::Fields::Unnamed(fields) if fields.unnamed.len() == 1 => Ok(&fields.unnamed[0]),
        other => Err(syn::Error::new(
            other.span(),
            "Conversion attributes need a variant with exactly one unnamed field",
        )),
    }
}

fn writing_error_impls(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let syn::Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Works only with enum error types",
        ));
    };
    let ident = &input.ident;
    let mut output = TokenStream::new();
    for variant in &data.variants {
        let is_io = variant
            .fields
            .iter()
            .any(|field| has_attribute(field, "from_std_io_error"));
        let is_from = variant.fields.iter().any(|field| has_attribute(field, "from"));
        if !is_io && !is_from {
            continue;
        }
        let field = single_field(variant)?;
        let variant_ident = &variant.ident;
        if is_io {
            output.extend(quote! {
                #[automatically_derived]
                impl From<std::io::Error> for #ident {
                    fn from(err: std::io::Error) -> Self {
                        #ident::#variant_ident(err.to_string())
                    }
                }
            });
        }
        if is_from {
            let ty = &field.ty;
            output.extend(quote! {
                #[automatically_derived]
                impl From<#ty> for #ident {
                    fn from(err: #ty) -> Self {
                        #ident::#variant_ident(err)
                    }
                }
            });
        }
    }
    Ok(output)
}

/// Decorate an error `enum` returned while writing a buffer.
///
/// 1. `#[from_std_io_error]` on a `String` field generates a [`From`]
///    implementation from [`std::io::Error`].
///
/// 2. `#[from]` generates a [`From`] implementation for the field type.
///
/// Example:
/// ```no_compile
/// use nanpath_serde_macros::WritingError;
///
/// #[derive(WritingError, PartialEq, Clone, Debug)]
/// pub enum AttributeWritingError {
///     StdIOError(#[from_std_io_error] String),
/// }
///
/// #[derive(WritingError, PartialEq, Clone, Debug)]
/// pub enum EventWritingError {
///     StdIOError(#[from_std_io_error] String),
///     AttributeError(#[from] AttributeWritingError),
/// }
/// ```
#[proc_macro_derive(WritingError, attributes(from_std_io_error, from))]
pub fn writing_error(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    writing_error_impls(&ast)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

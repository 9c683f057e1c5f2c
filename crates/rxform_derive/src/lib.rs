use std::collections::BTreeSet;

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Implements `FromSnapshot<&'static str>` by reading each named field from
/// the snapshot entry with the same id. `#[form(id = "...")]` overrides the id.
#[proc_macro_derive(FormValues, attributes(form))]
pub fn derive_form_values(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormValues derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormValues derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormValues derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let rxform = rxform_path();
    let mut seen = BTreeSet::new();
    let mut field_ids = Vec::new();
    let mut initializers = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let field_id = match field_id(&field, field_ident.to_string()) {
            Ok(id) => id,
            Err(error) => return error.to_compile_error().into(),
        };
        if !seen.insert(field_id.clone()) {
            return syn::Error::new_spanned(
                &field_ident,
                format!("field id `{field_id}` is used more than once"),
            )
            .to_compile_error()
            .into();
        }
        let field_ty = field.ty;

        initializers.push(quote! {
            #field_ident: snapshot.require::<#field_ty>(&#field_id)?
        });
        field_ids.push(field_id);
    }

    quote! {
        impl #model_ident {
            pub const FIELD_IDS: &'static [&'static str] = &[#(#field_ids),*];
        }

        impl #rxform::form::FromSnapshot<&'static str> for #model_ident {
            fn from_snapshot(
                snapshot: &#rxform::form::FormSnapshot<&'static str>,
            ) -> #rxform::form::FormResult<Self> {
                Ok(Self {
                    #(#initializers,)*
                })
            }
        }
    }
    .into()
}

fn field_id(field: &syn::Field, default: String) -> syn::Result<String> {
    let mut id = default;
    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value: LitStr = meta.value()?.parse()?;
                id = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `id = \"...\"`"))
            }
        })?;
    }
    Ok(id)
}

fn rxform_path() -> TokenStream2 {
    match crate_name("rxform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::rxform),
    }
}

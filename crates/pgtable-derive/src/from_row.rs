//! FromRow derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

/// Per-field `#[pgtable(...)]` options.
#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    skip: bool,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "FromRow can only be derived for structs",
            ));
        }
    };

    let mut extracts = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            extracts.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }
        let column = attrs.column.unwrap_or_else(|| ident.to_string());
        extracts.push(quote! { #ident: row.try_get_column(#column)? });
    }

    Ok(quote! {
        impl #impl_generics ::pgtable::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::pgtable::tokio_postgres::Row) -> ::pgtable::TableResult<Self> {
                use ::pgtable::RowExt;
                Ok(Self {
                    #(#extracts),*
                })
            }
        }
    })
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("pgtable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.column = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported pgtable attribute, expected `column = \"...\"` or `skip`"))
            }
        })?;
    }
    if attrs.skip && attrs.column.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` and `column` cannot be combined",
        ));
    }
    Ok(attrs)
}

//! Derive macro for binding result columns onto struct fields.
//!
//! This crate provides `#[derive(Record)]`, which generates the field table
//! and the per-field scan dispatch used by `oxide-sqly-core`.

use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, Type};

/// Derives `Record`, `ScanField` and `FromRow` for a struct with named fields.
///
/// Every field receives the column named after it. A field whose type is
/// itself a `Record` (directly, boxed, or in an `Option`) is flattened: its
/// own columns are registered in place of the field name.
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Receives the column `column_name`
///   instead of the field name
/// - `#[column(skip)]` - Never receives a column; keeps its `Default` value
///
/// The struct must implement `Default`.
#[proc_macro_derive(Record, attributes(column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

struct FieldInfo {
    index: usize,
    ident: Ident,
    ty: Type,
    column: String,
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive only supports structs",
            ));
        }
    };

    let mut infos = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        infos.push(FieldInfo {
            index,
            column: attrs.name.unwrap_or_else(|| ident.unraw().to_string()),
            ident,
            ty: field.ty.clone(),
        });
    }

    let record = record_impl(struct_name, &infos);
    let nested = quote! {
        impl ::oxide_sqly_core::mapping::ScanField for #struct_name {
            fn register(
                _name: &str,
                path: &mut ::std::vec::Vec<usize>,
                table: &mut ::oxide_sqly_core::mapping::FieldTable,
            ) {
                <Self as ::oxide_sqly_core::mapping::Record>::register_fields(path, table);
            }

            fn scan_at(
                &mut self,
                path: &[usize],
                value: ::oxide_sqly_core::DbValue,
            ) -> ::std::result::Result<(), ::oxide_sqly_core::scan::ScanError> {
                <Self as ::oxide_sqly_core::mapping::Record>::scan_field(self, path, value)
            }
        }
    };
    let from_row = quote! {
        impl ::oxide_sqly_core::bind::FromRow for #struct_name {
            const SHAPE: ::oxide_sqly_core::bind::Shape = ::oxide_sqly_core::bind::Shape::Struct;

            fn plan(
                columns: &[::std::string::String],
                _column_types: &[::oxide_sqly_core::ColumnType],
            ) -> ::oxide_sqly_core::Result<::oxide_sqly_core::bind::RowPlan> {
                ::oxide_sqly_core::bind::RowPlan::for_record::<Self>(columns)
            }

            fn from_row(
                plan: &::oxide_sqly_core::bind::RowPlan,
                values: ::std::vec::Vec<::oxide_sqly_core::DbValue>,
            ) -> ::oxide_sqly_core::Result<Self> {
                ::oxide_sqly_core::bind::scan_record(plan, values)
            }
        }
    };

    Ok(quote! {
        #record
        #nested
        #from_row
    })
}

/// Generates the `Record` impl: the cached field table and the scan dispatch.
fn record_impl(struct_name: &Ident, infos: &[FieldInfo]) -> TokenStream2 {
    let registrations = infos.iter().map(|info| {
        let index = Literal::usize_unsuffixed(info.index);
        let ty = &info.ty;
        let column = &info.column;
        quote! {
            prefix.push(#index);
            <#ty as ::oxide_sqly_core::mapping::ScanField>::register(#column, prefix, table);
            prefix.pop();
        }
    });

    let dispatch = infos.iter().map(|info| {
        let index = Literal::usize_unsuffixed(info.index);
        let ident = &info.ident;
        quote! {
            ::std::option::Option::Some((#index, rest)) => {
                ::oxide_sqly_core::mapping::ScanField::scan_at(&mut self.#ident, rest, value)
            }
        }
    });

    quote! {
        impl ::oxide_sqly_core::mapping::Record for #struct_name {
            fn field_table() -> &'static ::oxide_sqly_core::mapping::FieldTable {
                static TABLE: ::std::sync::OnceLock<::oxide_sqly_core::mapping::FieldTable> =
                    ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    let mut table = ::oxide_sqly_core::mapping::FieldTable::new();
                    <Self as ::oxide_sqly_core::mapping::Record>::register_fields(
                        &mut ::std::vec::Vec::new(),
                        &mut table,
                    );
                    table
                })
            }

            #[allow(unused_variables)]
            fn register_fields(
                prefix: &mut ::std::vec::Vec<usize>,
                table: &mut ::oxide_sqly_core::mapping::FieldTable,
            ) {
                #(#registrations)*
            }

            #[allow(unused_variables)]
            fn scan_field(
                &mut self,
                path: &[usize],
                value: ::oxide_sqly_core::DbValue,
            ) -> ::std::result::Result<(), ::oxide_sqly_core::scan::ScanError> {
                match path.split_first() {
                    #(#dispatch)*
                    _ => ::std::result::Result::Err(
                        ::oxide_sqly_core::scan::ScanError::FieldPath(path.to_vec()),
                    ),
                }
            }
        }
    }
}

/// Parsed column attributes.
#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    skip: bool,
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    result.skip = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute, expected `name` or `skip`"))
                }
            })?;
        }
    }

    Ok(result)
}

//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level and field-level `#[orm(...)]` attributes.

use syn::{DeriveInput, Result};

/// Parsed field-level `#[orm(...)]` attributes.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub is_id: bool,
    pub is_relation: bool,
    pub column: Option<String>,
    /// Related column matched against this record's JSON array column.
    pub json_agg: Option<String>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            if ident == "id" {
                attr.is_id = true;
            } else if ident == "relation" {
                attr.is_relation = true;
            } else {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;

                if ident == "column" {
                    attr.column = Some(value.value());
                } else if ident == "json_agg" {
                    attr.json_agg = Some(value.value());
                } else {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown field attribute `{ident}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` attribute of a field.
pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.is_relation |= parsed.is_relation;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
        if parsed.json_agg.is_some() {
            merged.json_agg = parsed.json_agg;
        }
    }

    if merged.is_relation && merged.json_agg.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "`relation` and `json_agg` cannot be combined",
        ));
    }
    Ok(merged)
}

/// Extract the table name from a struct-level `#[orm(table = "...")]` attribute.
pub(crate) fn table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested: syn::MetaNameValue = attr.parse_args()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected `table = \"...\"`",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(None)
}

//! Record derive macro implementation

use crate::attrs::{field_attr, table_name};
use crate::syn_types::{box_inner, is_container, option_inner, vec_inner};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

enum Kind {
    Scalar,
    /// Related record held directly.
    Relation,
    /// `Option<Box<T>>`, holding `T`.
    BoxedRelation(syn::Type),
    /// Any other `Related` container.
    WrappedRelation,
    JsonAggregate(String),
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let table = match table_name(&input)? {
        Some(t) => quote! { ::core::option::Option::Some(#t) },
        None => quote! { ::core::option::Option::None },
    };

    let mut specs = Vec::new();
    let mut value_arms = Vec::new();
    let mut decode_arms = Vec::new();
    let mut relation_arms = Vec::new();
    let mut has_id = false;

    for (index, field) in fields.iter().enumerate() {
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "Record fields must be named")
        })?;
        let field_name = ident.to_string();
        let ty = &field.ty;
        let attr = field_attr(field)?;

        let kind = if let Some(contains) = attr.json_agg.clone() {
            if vec_inner(ty).is_none() {
                return Err(syn::Error::new_spanned(
                    ty,
                    "`json_agg` fields must be `Vec<T>` of a Record type",
                ));
            }
            Kind::JsonAggregate(contains)
        } else if attr.is_relation {
            match option_inner(ty).and_then(box_inner) {
                Some(inner) => Kind::BoxedRelation(inner.clone()),
                None if is_container(ty) => Kind::WrappedRelation,
                None => Kind::Relation,
            }
        } else {
            Kind::Scalar
        };

        if attr.is_id {
            if !matches!(kind, Kind::Scalar) {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[orm(id)] can only mark a column field",
                ));
            }
            if has_id {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[orm(id)]",
                ));
            }
            has_id = true;
        }

        let mut spec = match &kind {
            Kind::Scalar => quote! {
                ::rowbind::FieldSpec::scalar(#field_name, <#ty as ::rowbind::Column>::KIND)
            },
            Kind::WrappedRelation => quote! {
                ::rowbind::FieldSpec::relation::<<#ty as ::rowbind::Related>::Target>(#field_name)
            },
            Kind::BoxedRelation(inner) => quote! {
                ::rowbind::FieldSpec::relation::<#inner>(#field_name)
            },
            Kind::Relation => quote! {
                ::rowbind::FieldSpec::relation::<#ty>(#field_name)
            },
            Kind::JsonAggregate(contains) => quote! {
                ::rowbind::FieldSpec::json_aggregate::<<#ty as ::rowbind::Related>::Target>(
                    #field_name,
                    #contains,
                )
            },
        };
        if let Some(column) = &attr.column {
            spec = quote! { #spec.column(#column) };
        }
        if attr.is_id {
            spec = quote! { #spec.primary_key() };
        }
        specs.push(spec);

        match kind {
            Kind::Scalar => {
                value_arms.push(quote! {
                    #index => ::core::option::Option::Some(
                        ::rowbind::Column::to_value(&self.#ident)
                    ),
                });
                decode_arms.push(quote! {
                    #index => {
                        self.#ident = <#ty as ::rowbind::Column>::decode(raw, #field_name)?;
                    }
                });
            }
            Kind::Relation => {
                decode_arms.push(unsupported_arm(index, &field_name));
                relation_arms.push(quote! {
                    #index => ::rowbind::fill_record(&mut self.#ident, #field_name, row, slot)?,
                });
            }
            Kind::BoxedRelation(_) => {
                decode_arms.push(unsupported_arm(index, &field_name));
                relation_arms.push(quote! {
                    #index => ::rowbind::fill_boxed(&mut self.#ident, #field_name, row, slot)?,
                });
            }
            Kind::WrappedRelation | Kind::JsonAggregate(_) => {
                decode_arms.push(unsupported_arm(index, &field_name));
                relation_arms.push(quote! {
                    #index => ::rowbind::fill_related(&mut self.#ident, #field_name, row, slot)?,
                });
            }
        }
    }

    Ok(quote! {
        impl ::rowbind::Record for #name {
            fn entity() -> &'static ::rowbind::Entity {
                static ENTITY: ::std::sync::OnceLock<::rowbind::Entity> =
                    ::std::sync::OnceLock::new();
                ENTITY.get_or_init(|| {
                    ::rowbind::Entity::new(#type_name, #table, &[#(#specs),*])
                })
            }

            fn value(&self, index: usize) -> ::core::option::Option<::rowbind::Value> {
                match index {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn decode_field(
                &mut self,
                index: usize,
                raw: ::core::option::Option<&[u8]>,
            ) -> ::rowbind::OrmResult<()> {
                match index {
                    #(#decode_arms)*
                    _ => {}
                }
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn fill_relation(
                &mut self,
                index: usize,
                row: &::rowbind::RawRow,
                slot: &::rowbind::Slot,
            ) -> ::rowbind::OrmResult<()> {
                match index {
                    #(#relation_arms)*
                    _ => {}
                }
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn unsupported_arm(index: usize, field_name: &str) -> TokenStream {
    quote! {
        #index => {
            return ::core::result::Result::Err(
                ::rowbind::OrmError::unsupported(#field_name, "relation"),
            );
        }
    }
}

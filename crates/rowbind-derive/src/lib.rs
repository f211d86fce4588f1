//! Derive macro for rowbind
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;
mod syn_types;

/// Derive `Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use rowbind::Record;
///
/// #[derive(Default, Record)]
/// #[orm(table = "people")]
/// struct Person {
///     #[orm(id)]
///     person_id: i64,
///     #[orm(column = "full_name")]
///     name: String,
///     nickname: Option<String>,
/// }
///
/// #[derive(Default, Record)]
/// struct Post {
///     id: Option<i64>,
///     author_id: i64,
///     #[orm(relation)]
///     author: Option<Person>,
///     tag_ids: String,
///     #[orm(json_agg = "id", column = "tag_ids")]
///     tags: Vec<Tag>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name; defaults to the pluralized snake_case type name
/// - `#[orm(id)]` - Mark the primary key; defaults to the field mapped to `id`
/// - `#[orm(column = "name")]` - Column name; defaults to the snake_case field name
/// - `#[orm(relation)]` - Related record (`T`, `Box<T>`, `Option<T>`, `Option<Box<T>>`)
///   populated through a registered join
/// - `#[orm(json_agg = "column")]` - `Vec<T>` aggregated from the related table rows whose
///   `column` value is listed in this record's JSON array column
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

//! Table and column naming rules.
//!
//! Both rules are mechanical: `snake_case` splits before uppercase letters, keeping runs of
//! them together, and `pluralize` only knows the `-y` → `-ies` case. Record
//! types whose names do not pluralize this way (e.g. `Person`) override their table with
//! `#[orm(table = "...")]`.

/// Convert a Rust type or field name to its snake_case identifier.
///
/// An underscore is inserted before every uppercase ASCII letter except the first one and
/// those directly following another uppercase letter, and uppercase letters are lowercased.
/// `UserID` becomes `user_id`, `created_at` is unchanged.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut first = true;
    let mut prev_upper = false;

    for ch in name.chars() {
        let upper = ch.is_ascii_uppercase();
        if upper {
            if first {
                first = false;
            } else if !prev_upper {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
        prev_upper = upper;
    }

    out
}

/// Naive English pluralization: `category` → `categories`, `user` → `users`.
pub fn pluralize(word: &str) -> String {
    match word.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{word}s"),
    }
}

/// Default table name for a record type name.
pub fn table_name(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}

/// Column name for a field name.
pub fn column_name(field_name: &str) -> String {
    snake_case(field_name)
}

/// Prefix `column` with `table.`.
pub fn qualify(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

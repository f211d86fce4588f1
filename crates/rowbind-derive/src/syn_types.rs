//! Type helper utilities for syn type analysis.

/// The last path segment of `ty` if it is `<wrapper><T>` with exactly one type argument.
fn single_arg<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Extract the inner type T from Option<T>.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_arg(ty, "Option")
}

/// Extract the inner type T from Vec<T>.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_arg(ty, "Vec")
}

/// Extract the inner type T from Box<T>.
pub fn box_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_arg(ty, "Box")
}

/// Whether a relation field wraps its record in a container (`Option`, `Box`, `Vec`).
pub fn is_container(ty: &syn::Type) -> bool {
    option_inner(ty).is_some() || box_inner(ty).is_some() || vec_inner(ty).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_wrappers() {
        let ty: syn::Type = syn::parse_quote!(Option<Box<Person>>);
        let inner = option_inner(&ty).unwrap();
        assert!(box_inner(inner).is_some());
        assert!(is_container(&ty));

        let ty: syn::Type = syn::parse_quote!(std::vec::Vec<Tag>);
        assert!(vec_inner(&ty).is_some());

        let ty: syn::Type = syn::parse_quote!(Person);
        assert!(!is_container(&ty));
    }
}

//! Declaration lookup and folding.
//!
//! Lookups never fail: an element without declarations of the requested
//! kinds yields `None`, which callers treat as "fall back to the default".

use crate::metadata::attributes::{Attribute, AttributeKind};

/// Anything that carries routing declarations (handler classes and methods).
pub trait Annotated {
    fn attributes(&self) -> &[Attribute];
}

/// Every declaration matching `kinds`, grouped by kind in the order the
/// kinds are listed, each group in declaration order.
pub fn declarations<'a, E>(element: &'a E, kinds: &[AttributeKind]) -> Vec<&'a Attribute>
where
    E: Annotated + ?Sized,
{
    kinds
        .iter()
        .flat_map(|kind| {
            element
                .attributes()
                .iter()
                .filter(move |attribute| kind.matches(attribute))
        })
        .collect()
}

/// Folds matching declarations left to right starting from `seed`.
///
/// Returns `None` when nothing matches, so the seed is only observable when
/// at least one declaration exists.
pub fn fold<E, T, F>(element: &E, kinds: &[AttributeKind], seed: T, mut combine: F) -> Option<T>
where
    E: Annotated + ?Sized,
    F: FnMut(T, &Attribute) -> T,
{
    let found = declarations(element, kinds);
    if found.is_empty() {
        return None;
    }
    Some(found.into_iter().fold(seed, |acc, attribute| combine(acc, attribute)))
}

/// Value of the last matching declaration that `extract` accepts.
pub fn last<E, T, F>(element: &E, kinds: &[AttributeKind], mut extract: F) -> Option<T>
where
    E: Annotated + ?Sized,
    F: FnMut(&Attribute) -> Option<T>,
{
    fold(element, kinds, None, |acc, attribute| extract(attribute).or(acc)).flatten()
}

/// Whether any declaration of `kinds` is present.
pub fn has<E>(element: &E, kinds: &[AttributeKind]) -> bool
where
    E: Annotated + ?Sized,
{
    element
        .attributes()
        .iter()
        .any(|attribute| kinds.iter().any(|kind| kind.matches(attribute)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::attributes::{Middleware, Prefix, Resource, Singleton};

    struct Element(Vec<Attribute>);

    impl Annotated for Element {
        fn attributes(&self) -> &[Attribute] {
            &self.0
        }
    }

    fn prefix(p: &str) -> Attribute {
        Prefix { prefix: p.into() }.into()
    }

    #[test]
    fn test_absent_declaration_is_none() {
        let element = Element(vec![prefix("a")]);
        let folded = fold(&element, &[AttributeKind::Middleware], 0, |acc, _| acc + 1);
        assert_eq!(folded, None);
    }

    #[test]
    fn test_fold_appends_in_declaration_order() {
        let element = Element(vec![
            Middleware { middleware: vec!["a".into()] }.into(),
            prefix("ignored"),
            Middleware { middleware: vec!["b".into(), "c".into()] }.into(),
        ]);
        let folded = fold(&element, &[AttributeKind::Middleware], Vec::new(), |mut acc, attr| {
            if let Attribute::Middleware(m) = attr {
                acc.extend(m.middleware.iter().cloned());
            }
            acc
        });
        assert_eq!(folded, Some(vec!["a".to_string(), "b".into(), "c".into()]));
    }

    #[test]
    fn test_last_value_wins() {
        let element = Element(vec![prefix("first"), prefix("second")]);
        let value = last(&element, &[AttributeKind::Prefix], |attr| match attr {
            Attribute::Prefix(p) => Some(p.prefix.clone()),
            _ => None,
        });
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[test]
    fn test_kind_list_groups_by_kind() {
        let element = Element(vec![
            Singleton::new("profile").into(),
            Resource::new("photos").into(),
        ]);
        let found = declarations(&element, &[AttributeKind::Resource, AttributeKind::Singleton]);
        assert!(matches!(found[0], Attribute::Resource(_)));
        assert!(matches!(found[1], Attribute::Singleton(_)));
        assert!(has(&element, &[AttributeKind::ResourceContract]));
    }
}

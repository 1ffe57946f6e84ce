//! The super-selector oracle: `a` is a super-selector of `b` iff every
//! element matched by `b` is also matched by `a`.
//!
//! All functions here take component slices in implicit form (see
//! [`ComplexSelector::implicit_components`]): descendant combinators are
//! expressed by compound adjacency, the way the embedding walk wants them.

use crate::ast::{
    Combinator, ComplexSelector, Component, CompoundSelector, Pseudo, PseudoKind, SimpleSelector,
};

/// Selector pseudos that can stand in for a plain simple selector when every
/// branch is a single compound containing it.
const SUBSELECTOR_PSEUDOS: &[&str] = &["matches", "is", "any", "where", "nth-child", "nth-last-child"];

/// True when every complex selector in `list2` has a super-selector in `list1`.
pub fn list_is_superselector(list1: &[ComplexSelector], list2: &[ComplexSelector]) -> bool {
    list2.iter().all(|complex2| {
        list1.iter().any(|complex1| {
            complex_is_superselector(
                &complex1.implicit_components(),
                &complex2.implicit_components(),
            )
        })
    })
}

/// Order-preserving embedding of `complex1`'s compounds into `complex2`'s,
/// with combinator-run compatibility between embedded neighbors.
pub fn complex_is_superselector(complex1: &[Component], complex2: &[Component]) -> bool {
    if matches!(complex1.last(), Some(Component::Combinator(_))) {
        return false;
    }
    if matches!(complex2.last(), Some(Component::Combinator(_))) {
        return false;
    }

    let mut i1 = 0;
    let mut i2 = 0;
    loop {
        let remaining1 = complex1.len() - i1;
        let remaining2 = complex2.len() - i2;
        if remaining1 == 0 || remaining2 == 0 {
            return false;
        }
        // More unmatched components than the target has left can never embed.
        if remaining1 > remaining2 {
            return false;
        }
        let compound1 = match &complex1[i1] {
            Component::Compound(compound) => compound,
            Component::Combinator(_) => return false,
        };

        if remaining1 == 1 {
            let last2 = match complex2.last() {
                Some(Component::Compound(compound)) => compound,
                _ => return false,
            };
            return compound_is_superselector(
                compound1,
                last2,
                Some(&complex2[i2..complex2.len() - 1]),
            );
        }

        // Find the first position whose compound `compound1` covers.
        let mut after = i2 + 1;
        while after < complex2.len() {
            if let Component::Compound(compound2) = &complex2[after - 1] {
                if compound_is_superselector(compound1, compound2, Some(&complex2[i2..after - 1])) {
                    break;
                }
            }
            after += 1;
        }
        if after == complex2.len() {
            return false;
        }

        let component1 = &complex1[i1 + 1];
        let component2 = &complex2[after];
        match component1 {
            Component::Combinator(combinator1) => {
                let combinator2 = match component2 {
                    Component::Combinator(combinator) => combinator,
                    Component::Compound(_) => return false,
                };
                // `.a ~ .b` covers `.a + .b`; all other combinators must match.
                if *combinator1 == Combinator::FollowingSibling {
                    if *combinator2 == Combinator::Child {
                        return false;
                    }
                } else if combinator2 != combinator1 {
                    return false;
                }
                // `.a > .c` does not cover `.a > .b > .c` even though `.c`
                // covers `.b > .c`; the child run must be exact.
                if remaining1 == 3 && remaining2 > 3 {
                    return false;
                }
                i1 += 2;
                i2 = after + 1;
            }
            Component::Compound(_) => {
                match component2 {
                    Component::Combinator(combinator2) => {
                        if *combinator2 != Combinator::Child {
                            return false;
                        }
                        i2 = after + 1;
                    }
                    Component::Compound(_) => i2 = after,
                }
                i1 += 1;
            }
        }
    }
}

/// Every simple in `compound1` must cover some simple in `compound2`, and
/// `compound2` may not carry pseudo-elements `compound1` lacks.
pub fn compound_is_superselector(
    compound1: &CompoundSelector,
    compound2: &CompoundSelector,
    parents: Option<&[Component]>,
) -> bool {
    for simple1 in &compound1.parts {
        match simple1 {
            SimpleSelector::Universal { namespace, .. } => {
                if !universal_covers(namespace.as_deref(), compound2) {
                    return false;
                }
            }
            SimpleSelector::Pseudo(pseudo) if pseudo.selector.is_some() => {
                if !selector_pseudo_is_superselector(pseudo, compound2, parents) {
                    return false;
                }
            }
            _ => {
                if !simple_is_superselector_of_compound(simple1, compound2) {
                    return false;
                }
            }
        }
    }
    for simple2 in &compound2.parts {
        if let SimpleSelector::Pseudo(pseudo) = simple2 {
            if pseudo.is_element() && !compound1.parts.iter().any(|simple1| simple1 == simple2) {
                return false;
            }
        }
    }
    true
}

/// `*` covers everything; `ns|*` only covers selectors in that namespace.
fn universal_covers(namespace: Option<&str>, compound2: &CompoundSelector) -> bool {
    match namespace {
        None | Some("*") => true,
        Some(ns) => compound2.parts.iter().any(|simple| match simple {
            SimpleSelector::Type {
                namespace: Some(their), ..
            }
            | SimpleSelector::Universal {
                namespace: Some(their),
                ..
            } => their == ns,
            _ => false,
        }),
    }
}

fn simple_is_superselector_of_compound(
    simple: &SimpleSelector,
    compound: &CompoundSelector,
) -> bool {
    compound.parts.iter().any(|their_simple| {
        if simple == their_simple {
            return true;
        }
        // `:matches(.foo)` and friends can match on behalf of `.foo` when
        // every branch is a lone compound containing it.
        if let SimpleSelector::Pseudo(pseudo) = their_simple {
            if let Some(selector) = &pseudo.selector {
                if SUBSELECTOR_PSEUDOS.contains(&pseudo.normalized.as_str()) {
                    return selector.members.iter().all(|complex| {
                        complex.components.len() == 1
                            && complex
                                .first_compound()
                                .map_or(false, |compound| compound.contains(simple))
                    });
                }
            }
        }
        false
    })
}

fn selector_pseudo_is_superselector(
    pseudo1: &Pseudo,
    compound2: &CompoundSelector,
    parents: Option<&[Component]>,
) -> bool {
    let selector1 = match &pseudo1.selector {
        Some(selector) => selector,
        None => return false,
    };
    match pseudo1.normalized.as_str() {
        "matches" | "is" | "any" | "where" => {
            pseudos_named(compound2, &pseudo1.normalized, true).any(|pseudo2| {
                selector1.is_superselector(pseudo2.selector.as_ref().unwrap())
            }) || selector1.members.iter().any(|complex1| {
                let mut with_compound: Vec<Component> =
                    parents.map(|p| p.to_vec()).unwrap_or_default();
                with_compound.push(Component::Compound(compound2.clone()));
                complex_is_superselector(&complex1.implicit_components(), &with_compound)
            })
        }
        "has" | "host" | "host-context" => {
            // Each layer of these adds semantics, so the nested list must be
            // covered by an identically named pseudo.
            pseudos_named(compound2, &pseudo1.normalized, true).any(|pseudo2| {
                selector1.is_superselector(pseudo2.selector.as_ref().unwrap())
            })
        }
        "slotted" => pseudos_named(compound2, &pseudo1.normalized, false).any(|pseudo2| {
            selector1.is_superselector(pseudo2.selector.as_ref().unwrap())
        }),
        "not" => selector1.members.iter().all(|complex| {
            compound2.parts.iter().any(|simple2| match simple2 {
                SimpleSelector::Type { .. } => complex
                    .last_compound()
                    .map_or(false, |compound1| {
                        compound1.parts.iter().any(|simple1| {
                            matches!(simple1, SimpleSelector::Type { .. }) && simple1 != simple2
                        })
                    }),
                SimpleSelector::Id { .. } => complex
                    .last_compound()
                    .map_or(false, |compound1| {
                        compound1.parts.iter().any(|simple1| {
                            matches!(simple1, SimpleSelector::Id { .. }) && simple1 != simple2
                        })
                    }),
                SimpleSelector::Pseudo(pseudo2) => {
                    pseudo2.normalized == pseudo1.normalized
                        && pseudo2.selector.as_ref().map_or(false, |selector2| {
                            list_is_superselector(
                                &selector2.members,
                                std::slice::from_ref(complex),
                            )
                        })
                }
                _ => false,
            })
        }),
        "current" => pseudos_named(compound2, "current", true)
            .any(|pseudo2| pseudo1.selector == pseudo2.selector),
        "nth-child" | "nth-last-child" => compound2.parts.iter().any(|simple2| {
            match simple2 {
                SimpleSelector::Pseudo(pseudo2) => {
                    pseudo2.normalized == pseudo1.normalized
                        && pseudo2.argument == pseudo1.argument
                        && pseudo2.selector.as_ref().map_or(false, |selector2| {
                            selector1.is_superselector(selector2)
                        })
                }
                _ => false,
            }
        }),
        _ => false,
    }
}

fn pseudos_named<'a>(
    compound: &'a CompoundSelector,
    name: &'a str,
    is_class: bool,
) -> impl Iterator<Item = &'a Pseudo> {
    compound.parts.iter().filter_map(move |simple| match simple {
        SimpleSelector::Pseudo(pseudo)
            if pseudo.selector.is_some()
                && pseudo.normalized == name
                && (pseudo.kind == PseudoKind::Class) == is_class =>
        {
            Some(pseudo)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use crate::parse_selector;

    fn is_super(a: &str, b: &str) -> bool {
        let a = parse_selector(a).unwrap();
        let b = parse_selector(b).unwrap();
        a.is_superselector(&b)
    }

    #[test]
    fn reflexive() {
        for source in [".a", ".a .b", ".a > .b + .c", "div#x.y:hover", ":not(.a, .b)"] {
            assert!(is_super(source, source), "{} should cover itself", source);
        }
    }

    #[test]
    fn compound_subset() {
        assert!(is_super(".a", ".a.b"));
        assert!(!is_super(".a.b", ".a"));
        assert!(is_super("div", "div.a"));
        assert!(!is_super("div", "span.a"));
    }

    #[test]
    fn universal() {
        assert!(is_super("*", "div"));
        assert!(is_super("*", ".a"));
        assert!(!is_super("div", "*"));
    }

    #[test]
    fn descendant_embedding() {
        assert!(is_super(".a .c", ".a .b .c"));
        assert!(is_super(".b", ".a .b"));
        assert!(!is_super(".a .b", ".b"));
        assert!(!is_super(".a .b", ".a"));
    }

    #[test]
    fn combinator_compatibility() {
        assert!(is_super(".a ~ .b", ".a + .b"));
        assert!(!is_super(".a + .b", ".a ~ .b"));
        assert!(is_super(".a .b", ".a > .b"));
        assert!(!is_super(".a > .b", ".a .b"));
        // An exact child chain is not covered by a shorter one.
        assert!(!is_super(".a > .c", ".a > .b > .c"));
    }

    #[test]
    fn pseudo_elements_block_coverage() {
        assert!(!is_super(".a", ".a::before"));
        assert!(is_super(".a::before", ".a.b::before"));
    }

    #[test]
    fn matches_any_of() {
        assert!(is_super(":matches(.a, .b)", ".a"));
        assert!(is_super(":matches(.a, .b)", ".b.c"));
        assert!(!is_super(":matches(.a, .b)", ".c"));
    }

    #[test]
    fn not_inverted() {
        assert!(is_super(":not(div)", "span"));
        assert!(!is_super(":not(div)", ".a"));
        assert!(is_super(":not(#x)", "#y"));
    }

    #[test]
    fn has_is_opaque() {
        assert!(is_super(":has(img)", ":has(img)"));
        assert!(!is_super(":has(img)", "div"));
    }

    #[test]
    fn list_semantics() {
        assert!(is_super(".a, .b", ".a"));
        assert!(is_super(".a, .b", ".b.c"));
        assert!(!is_super(".a", ".a, .b"));
    }
}

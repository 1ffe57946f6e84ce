//! Integer specificity following the CSS cascade: each id contributes
//! 1,000,000, each class/attribute/pseudo-class 1,000, each type or
//! pseudo-element 1. Pseudos with nested selector lists take their
//! specificity from the branches, which is where `min` and `max` diverge.

use crate::ast::{ComplexSelector, Component, CompoundSelector, Pseudo, SimpleSelector};

pub const ID_SPECIFICITY: u32 = 1_000_000;
pub const CLASS_SPECIFICITY: u32 = 1_000;
pub const ELEMENT_SPECIFICITY: u32 = 1;

impl SimpleSelector {
    pub fn min_specificity(&self) -> u32 {
        match self {
            SimpleSelector::Universal { .. } => 0,
            SimpleSelector::Type { .. } => ELEMENT_SPECIFICITY,
            SimpleSelector::Id { .. } => ID_SPECIFICITY,
            SimpleSelector::Class { .. }
            | SimpleSelector::Attribute { .. }
            | SimpleSelector::Placeholder { .. }
            | SimpleSelector::Parent { .. } => CLASS_SPECIFICITY,
            SimpleSelector::Pseudo(pseudo) => pseudo_specificity(pseudo, false),
        }
    }

    pub fn max_specificity(&self) -> u32 {
        match self {
            SimpleSelector::Pseudo(pseudo) => pseudo_specificity(pseudo, true),
            _ => self.min_specificity(),
        }
    }
}

fn pseudo_specificity(pseudo: &Pseudo, max: bool) -> u32 {
    let base = if pseudo.is_element() {
        ELEMENT_SPECIFICITY
    } else {
        CLASS_SPECIFICITY
    };
    let selector = match &pseudo.selector {
        Some(selector) if !selector.members.is_empty() => selector,
        _ => return base,
    };

    let branches = selector.members.iter().map(|complex| {
        if max {
            complex.max_specificity()
        } else {
            complex.min_specificity()
        }
    });

    // `:not` must outweigh every branch; `:matches`-style pseudos can match
    // via their cheapest branch.
    if pseudo.normalized == "not" || max {
        branches.max().unwrap_or(0)
    } else {
        branches.min().unwrap_or(0)
    }
}

impl CompoundSelector {
    pub fn min_specificity(&self) -> u32 {
        self.parts.iter().map(SimpleSelector::min_specificity).sum()
    }

    pub fn max_specificity(&self) -> u32 {
        self.parts.iter().map(SimpleSelector::max_specificity).sum()
    }
}

impl ComplexSelector {
    pub fn min_specificity(&self) -> u32 {
        self.components
            .iter()
            .filter_map(Component::as_compound)
            .map(CompoundSelector::min_specificity)
            .sum()
    }

    pub fn max_specificity(&self) -> u32 {
        self.components
            .iter()
            .filter_map(Component::as_compound)
            .map(CompoundSelector::max_specificity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_selector;

    fn max(source: &str) -> u32 {
        parse_selector(source).unwrap().members[0].max_specificity()
    }

    fn min(source: &str) -> u32 {
        parse_selector(source).unwrap().members[0].min_specificity()
    }

    #[test]
    fn basic_weights() {
        assert_eq!(max("*"), 0);
        assert_eq!(max("div"), 1);
        assert_eq!(max(".a"), 1_000);
        assert_eq!(max("#a"), 1_000_000);
        assert_eq!(max("div.a#b:hover::before"), 1_002_002);
    }

    #[test]
    fn complex_sums_compounds() {
        assert_eq!(max(".a .b > #c"), 1_002_000);
    }

    #[test]
    fn placeholder_counts_as_class() {
        assert_eq!(max("%a"), 1_000);
    }

    #[test]
    fn nested_pseudo_branches() {
        // :matches(.a, #b) spans from a class to an id.
        assert_eq!(min(":matches(.a, #b)"), 1_000);
        assert_eq!(max(":matches(.a, #b)"), 1_000_000);
        // :not takes the heaviest branch either way.
        assert_eq!(min(":not(.a, #b)"), 1_000_000);
        assert_eq!(max(":not(.a, #b)"), 1_000_000);
    }
}

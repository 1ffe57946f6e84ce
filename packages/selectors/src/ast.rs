use crate::error::{SelectorError, SelectorResult};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Byte span of a node in its source file.
///
/// Selectors fabricated by the engine (e.g. while crossing extensions) carry
/// a phony span that must never surface in user diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span for synthetic selectors with no source location.
    pub fn phony() -> Self {
        Self {
            start: usize::MAX,
            end: usize::MAX,
        }
    }

    pub fn is_phony(&self) -> bool {
        self.start == usize::MAX
    }

    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Combinator between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    /// Whitespace: `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    FollowingSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::Descendant => write!(f, " "),
            Combinator::Child => write!(f, ">"),
            Combinator::NextSibling => write!(f, "+"),
            Combinator::FollowingSibling => write!(f, "~"),
        }
    }
}

/// Attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=val]`
    Equals,
    /// `[attr~=val]`
    Includes,
    /// `[attr|=val]`
    DashMatch,
    /// `[attr^=val]`
    Prefix,
    /// `[attr$=val]`
    Suffix,
    /// `[attr*=val]`
    Substring,
}

impl fmt::Display for AttrOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AttrOp::Exists => "",
            AttrOp::Equals => "=",
            AttrOp::Includes => "~=",
            AttrOp::DashMatch => "|=",
            AttrOp::Prefix => "^=",
            AttrOp::Suffix => "$=",
            AttrOp::Substring => "*=",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PseudoKind {
    Class,
    Element,
}

/// Pseudo-class or pseudo-element selector, optionally carrying an opaque
/// argument (`:nth-child(2n+1)`) and/or a nested selector list (`:not(.a, .b)`).
///
/// Identity is (kind, normalized name, argument, nested list); the name as
/// written is kept only for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pseudo {
    pub name: String,
    pub normalized: String,
    pub kind: PseudoKind,
    pub argument: Option<String>,
    pub selector: Option<SelectorList>,
    pub span: Span,
}

impl Pseudo {
    pub fn new(name: &str, kind: PseudoKind, span: Span) -> Self {
        Self {
            name: name.to_string(),
            normalized: unvendor(&name.to_ascii_lowercase()).to_string(),
            kind,
            argument: None,
            selector: None,
            span,
        }
    }

    pub fn with_selector(&self, selector: SelectorList) -> Self {
        let mut pseudo = self.clone();
        pseudo.selector = Some(selector);
        pseudo
    }

    pub fn is_element(&self) -> bool {
        self.kind == PseudoKind::Element
    }
}

/// Strips a leading `-vendor-` prefix so `:-webkit-any` and `:any` compare equal.
pub fn unvendor(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'-' || bytes[1] == b'-' {
        return name;
    }
    match name[1..].find('-') {
        Some(i) => &name[i + 2..],
        None => name,
    }
}

impl PartialEq for Pseudo {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.normalized == other.normalized
            && self.argument == other.argument
            && self.selector == other.selector
    }
}

impl Eq for Pseudo {}

impl Hash for Pseudo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.normalized.hash(state);
        self.argument.hash(state);
        self.selector.hash(state);
    }
}

/// A single simple selector. Spans are carried for diagnostics and excluded
/// from equality and hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimpleSelector {
    /// `*`, optionally `ns|*`
    Universal {
        namespace: Option<String>,
        span: Span,
    },
    /// `div`, optionally `ns|div`
    Type {
        name: String,
        namespace: Option<String>,
        span: Span,
    },
    /// `.foo`
    Class { name: String, span: Span },
    /// `#foo`
    Id { name: String, span: Span },
    /// `[name op value i]`
    Attribute {
        name: String,
        op: AttrOp,
        value: Option<String>,
        modifier: Option<char>,
        span: Span,
    },
    /// `:hover`, `::before`, `:not(...)`
    Pseudo(Pseudo),
    /// `%foo`, visible only as an extend target
    Placeholder { name: String, span: Span },
    /// `&`, optionally with a suffix as in `&-item`
    Parent { suffix: Option<String>, span: Span },
}

/// Span-less view used for equality and hashing.
#[derive(PartialEq, Eq, Hash)]
enum SimpleKey<'a> {
    Universal(Option<&'a str>),
    Type(Option<&'a str>, &'a str),
    Class(&'a str),
    Id(&'a str),
    Attribute(&'a str, AttrOp, Option<&'a str>, Option<char>),
    Pseudo(&'a Pseudo),
    Placeholder(&'a str),
    Parent(Option<&'a str>),
}

impl SimpleSelector {
    fn key(&self) -> SimpleKey<'_> {
        match self {
            SimpleSelector::Universal { namespace, .. } => {
                SimpleKey::Universal(namespace.as_deref())
            }
            SimpleSelector::Type {
                name, namespace, ..
            } => SimpleKey::Type(namespace.as_deref(), name),
            SimpleSelector::Class { name, .. } => SimpleKey::Class(name),
            SimpleSelector::Id { name, .. } => SimpleKey::Id(name),
            SimpleSelector::Attribute {
                name,
                op,
                value,
                modifier,
                ..
            } => SimpleKey::Attribute(name, *op, value.as_deref(), *modifier),
            SimpleSelector::Pseudo(pseudo) => SimpleKey::Pseudo(pseudo),
            SimpleSelector::Placeholder { name, .. } => SimpleKey::Placeholder(name),
            SimpleSelector::Parent { suffix, .. } => SimpleKey::Parent(suffix.as_deref()),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SimpleSelector::Universal { span, .. }
            | SimpleSelector::Type { span, .. }
            | SimpleSelector::Class { span, .. }
            | SimpleSelector::Id { span, .. }
            | SimpleSelector::Attribute { span, .. }
            | SimpleSelector::Placeholder { span, .. }
            | SimpleSelector::Parent { span, .. } => *span,
            SimpleSelector::Pseudo(pseudo) => pseudo.span,
        }
    }

    pub fn as_pseudo(&self) -> Option<&Pseudo> {
        match self {
            SimpleSelector::Pseudo(pseudo) => Some(pseudo),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SimpleSelector::Placeholder { .. })
    }

    pub fn is_parent(&self) -> bool {
        matches!(self, SimpleSelector::Parent { .. })
    }

    /// A simple selector produces no CSS when it is a placeholder or wraps a
    /// selector list that itself produces none.
    pub fn is_invisible(&self) -> bool {
        match self {
            SimpleSelector::Placeholder { .. } => true,
            SimpleSelector::Pseudo(pseudo) => pseudo
                .selector
                .as_ref()
                .map_or(false, |sel| pseudo.normalized != "not" && sel.is_invisible()),
            _ => false,
        }
    }

    pub fn into_compound(self) -> CompoundSelector {
        CompoundSelector { parts: vec![self] }
    }

    pub fn into_complex(self) -> ComplexSelector {
        self.into_compound().into_complex()
    }
}

impl PartialEq for SimpleSelector {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SimpleSelector {}

impl Hash for SimpleSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Universal { namespace, .. } => {
                if let Some(ns) = namespace {
                    write!(f, "{}|", ns)?;
                }
                write!(f, "*")
            }
            SimpleSelector::Type {
                name, namespace, ..
            } => {
                if let Some(ns) = namespace {
                    write!(f, "{}|", ns)?;
                }
                write!(f, "{}", name)
            }
            SimpleSelector::Class { name, .. } => write!(f, ".{}", name),
            SimpleSelector::Id { name, .. } => write!(f, "#{}", name),
            SimpleSelector::Attribute {
                name,
                op,
                value,
                modifier,
                ..
            } => {
                write!(f, "[{}", name)?;
                if let Some(value) = value {
                    write!(f, "{}{}", op, value)?;
                    if let Some(modifier) = modifier {
                        write!(f, " {}", modifier)?;
                    }
                }
                write!(f, "]")
            }
            SimpleSelector::Pseudo(pseudo) => {
                let colons = if pseudo.kind == PseudoKind::Element {
                    "::"
                } else {
                    ":"
                };
                write!(f, "{}{}", colons, pseudo.name)?;
                match (&pseudo.argument, &pseudo.selector) {
                    (Some(arg), Some(sel)) => write!(f, "({} of {})", arg, sel),
                    (Some(arg), None) => write!(f, "({})", arg),
                    (None, Some(sel)) => write!(f, "({})", sel),
                    (None, None) => Ok(()),
                }
            }
            SimpleSelector::Placeholder { name, .. } => write!(f, "%{}", name),
            SimpleSelector::Parent { suffix, .. } => {
                write!(f, "&")?;
                if let Some(suffix) = suffix {
                    write!(f, "{}", suffix)?;
                }
                Ok(())
            }
        }
    }
}

/// Non-empty sequence of simple selectors that must all match one element.
///
/// At most one type selector is allowed and it must come first; equality is
/// order-insensitive for the remaining simples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundSelector {
    pub parts: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn new(parts: Vec<SimpleSelector>) -> Self {
        Self { parts }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn contains(&self, simple: &SimpleSelector) -> bool {
        self.parts.iter().any(|part| part == simple)
    }

    pub fn is_invisible(&self) -> bool {
        self.parts.iter().any(|part| part.is_invisible())
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.parts.iter().any(|part| part.is_parent())
    }

    pub fn into_complex(self) -> ComplexSelector {
        ComplexSelector {
            components: vec![Component::Compound(self)],
            line_break: false,
        }
    }
}

impl PartialEq for CompoundSelector {
    fn eq(&self, other: &Self) -> bool {
        if self.parts.len() != other.parts.len() {
            return false;
        }
        // Multiset comparison; compounds are short so the quadratic walk is fine.
        self.parts.iter().all(|part| {
            let ours = self.parts.iter().filter(|p| *p == part).count();
            let theirs = other.parts.iter().filter(|p| *p == part).count();
            ours == theirs
        })
    }
}

impl Eq for CompoundSelector {}

impl Hash for CompoundSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-insensitive: combine per-part hashes commutatively.
        let mut combined: u64 = 0;
        for part in &self.parts {
            let mut hasher = DefaultHasher::new();
            part.hash(&mut hasher);
            combined = combined.wrapping_add(hasher.finish());
        }
        self.parts.len().hash(state);
        combined.hash(state);
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// One element of a complex selector: either a compound selector or a
/// combinator. Combinators never appear adjacent; the first and last
/// components are always compounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

impl Component {
    pub fn as_compound(&self) -> Option<&CompoundSelector> {
        match self {
            Component::Compound(compound) => Some(compound),
            Component::Combinator(_) => None,
        }
    }

    pub fn is_combinator(&self) -> bool {
        matches!(self, Component::Combinator(_))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Compound(compound) => write!(f, "{}", compound),
            Component::Combinator(combinator) => write!(f, "{}", combinator),
        }
    }
}

/// Sequence of compound selectors joined by combinators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexSelector {
    pub components: Vec<Component>,
    /// Preserves an intentional line break before this selector in NESTED
    /// output. Not part of the selector's identity.
    pub line_break: bool,
}

impl ComplexSelector {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            components,
            line_break: false,
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn first_compound(&self) -> Option<&CompoundSelector> {
        self.components.first().and_then(Component::as_compound)
    }

    pub fn last_compound(&self) -> Option<&CompoundSelector> {
        self.components.last().and_then(Component::as_compound)
    }

    pub fn is_invisible(&self) -> bool {
        self.components.iter().any(|component| match component {
            Component::Compound(compound) => compound.is_invisible(),
            Component::Combinator(_) => false,
        })
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.components.iter().any(|component| match component {
            Component::Compound(compound) => compound.contains_parent_ref(),
            Component::Combinator(_) => false,
        })
    }

    pub fn into_list(self) -> SelectorList {
        SelectorList {
            members: vec![self],
        }
    }

    /// Component view with descendant combinators left implicit: two
    /// adjacent compounds mean "descendant". The selector algebra
    /// (super-selector tests, unification, weaving) works on this form.
    pub fn implicit_components(&self) -> Vec<Component> {
        self.components
            .iter()
            .filter(|component| {
                !matches!(component, Component::Combinator(Combinator::Descendant))
            })
            .cloned()
            .collect()
    }

    /// Rebuilds a complex selector from implicit-form components, inserting
    /// explicit descendant combinators between adjacent compounds.
    pub fn from_implicit(components: Vec<Component>) -> Self {
        let mut explicit = Vec::with_capacity(components.len());
        for component in components {
            if let (Some(Component::Compound(_)), Component::Compound(_)) =
                (explicit.last(), &component)
            {
                explicit.push(Component::Combinator(Combinator::Descendant));
            }
            explicit.push(component);
        }
        ComplexSelector::new(explicit)
    }

    /// Serializes with compressed spacing (`a>b`) when `compressed` is set.
    pub fn write_css(&self, out: &mut String, compressed: bool) {
        let mut last_was_compound = false;
        for component in &self.components {
            match component {
                Component::Compound(compound) => {
                    if last_was_compound {
                        out.push(' ');
                    }
                    out.push_str(&compound.to_string());
                    last_was_compound = true;
                }
                Component::Combinator(Combinator::Descendant) => {
                    out.push(' ');
                    last_was_compound = false;
                }
                Component::Combinator(combinator) => {
                    if !compressed {
                        // A previous descendant combinator already wrote a space.
                        if last_was_compound {
                            out.push(' ');
                        }
                        out.push_str(&combinator.to_string());
                        out.push(' ');
                    } else {
                        out.push_str(&combinator.to_string());
                    }
                    last_was_compound = false;
                }
            }
        }
    }
}

impl PartialEq for ComplexSelector {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for ComplexSelector {}

impl Hash for ComplexSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_css(&mut out, false);
        write!(f, "{}", out)
    }
}

/// Ordered, comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SelectorList {
    pub members: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(members: Vec<ComplexSelector>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A list is invisible when every complex selector in it would produce
    /// no CSS (placeholders, or pseudos over invisible lists).
    pub fn is_invisible(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(ComplexSelector::is_invisible)
    }

    pub fn contains_parent_ref(&self) -> bool {
        self.members.iter().any(ComplexSelector::contains_parent_ref)
    }

    /// Replaces `&` by the parent context. With `implicit_parent`, members
    /// without an explicit `&` are nested under the parent as descendants.
    pub fn resolve_parent(
        &self,
        parent: Option<&SelectorList>,
        implicit_parent: bool,
    ) -> SelectorResult<SelectorList> {
        let mut members = Vec::new();
        for complex in &self.members {
            if !complex.contains_parent_ref() {
                match parent {
                    Some(parent_list) if implicit_parent => {
                        for parent_complex in &parent_list.members {
                            let mut components = parent_complex.components.clone();
                            components.push(Component::Combinator(Combinator::Descendant));
                            components.extend(complex.components.iter().cloned());
                            let mut resolved = ComplexSelector::new(components);
                            resolved.line_break =
                                parent_complex.line_break || complex.line_break;
                            members.push(resolved);
                        }
                    }
                    _ => members.push(complex.clone()),
                }
                continue;
            }

            let parent_list = parent.ok_or_else(|| SelectorError::TopLevelParent {
                span: complex
                    .components
                    .iter()
                    .find_map(|component| {
                        component.as_compound().and_then(|compound| {
                            compound
                                .parts
                                .iter()
                                .find(|part| part.is_parent())
                                .map(|part| part.span())
                        })
                    })
                    .unwrap_or_else(Span::phony),
            })?;

            for resolved in substitute_parent(complex, parent_list)? {
                members.push(resolved);
            }
        }
        Ok(SelectorList::new(members))
    }

    pub fn is_superselector(&self, other: &SelectorList) -> bool {
        crate::superselector::list_is_superselector(&self.members, &other.members)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, complex) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", complex)?;
        }
        Ok(())
    }
}

/// Expands every `&` occurrence in `complex` against each member of `parent`.
fn substitute_parent(
    complex: &ComplexSelector,
    parent: &SelectorList,
) -> SelectorResult<Vec<ComplexSelector>> {
    // Partial expansions, grown component by component.
    let mut partials: Vec<Vec<Component>> = vec![Vec::new()];

    for component in &complex.components {
        let compound = match component {
            Component::Compound(compound) if compound.contains_parent_ref() => compound,
            other => {
                for partial in &mut partials {
                    partial.push(other.clone());
                }
                continue;
            }
        };

        let (parent_ref, rest) = match compound.parts.split_first() {
            Some((first @ SimpleSelector::Parent { .. }, rest)) => (first, rest),
            _ => {
                return Err(SelectorError::InvalidParent {
                    message: format!(
                        "\"&\" may only occur at the beginning of a compound selector in \"{}\"",
                        compound
                    ),
                    span: compound.parts[0].span(),
                })
            }
        };
        let suffix = match parent_ref {
            SimpleSelector::Parent { suffix, .. } => suffix.clone(),
            _ => unreachable!(),
        };

        let mut next = Vec::new();
        for partial in &partials {
            for parent_complex in &parent.members {
                let mut components = partial.clone();
                let (head, last) = parent_complex
                    .components
                    .split_at(parent_complex.components.len() - 1);
                components.extend(head.iter().cloned());

                let mut merged = match &last[0] {
                    Component::Compound(compound) => compound.clone(),
                    Component::Combinator(_) => {
                        return Err(SelectorError::InvalidParent {
                            message: format!(
                                "Invalid parent selector \"{}\"",
                                parent_complex
                            ),
                            span: Span::phony(),
                        })
                    }
                };
                if let Some(suffix) = &suffix {
                    append_suffix(&mut merged, suffix)?;
                }
                merged.parts.extend(rest.iter().cloned());
                components.push(Component::Compound(merged));
                next.push(components);
            }
        }
        partials = next;
    }

    Ok(partials
        .into_iter()
        .map(|components| {
            let mut resolved = ComplexSelector::new(components);
            resolved.line_break = complex.line_break;
            resolved
        })
        .collect())
}

/// Appends a `&`-suffix (`&-item`) to the last name-bearing simple of the
/// parent's trailing compound.
fn append_suffix(compound: &mut CompoundSelector, suffix: &str) -> SelectorResult<()> {
    let last = compound.parts.last_mut().expect("compound is never empty");
    match last {
        SimpleSelector::Type { name, .. }
        | SimpleSelector::Class { name, .. }
        | SimpleSelector::Id { name, .. }
        | SimpleSelector::Placeholder { name, .. } => {
            name.push_str(suffix);
            Ok(())
        }
        other => Err(SelectorError::InvalidParent {
            message: format!("Parent \"{}\" is incompatible with this selector", other),
            span: other.span(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selector;

    fn list(source: &str) -> SelectorList {
        parse_selector(source).expect("selector should parse")
    }

    #[test]
    fn simple_equality_ignores_spans() {
        let a = SimpleSelector::Class {
            name: "foo".into(),
            span: Span::new(0, 4),
        };
        let b = SimpleSelector::Class {
            name: "foo".into(),
            span: Span::new(10, 14),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn compound_equality_is_order_insensitive() {
        assert_eq!(
            list(".a.b").members[0],
            list(".b.a").members[0],
        );
        assert_ne!(
            list(".a.b").members[0],
            list(".a.c").members[0],
        );
    }

    #[test]
    fn pseudo_identity_uses_normalized_name() {
        let a = list(":HOVER").members[0].clone();
        let b = list(":hover").members[0].clone();
        assert_eq!(a, b);
    }

    #[test]
    fn placeholder_lists_are_invisible() {
        assert!(list("%a, %b .c").is_invisible());
        assert!(!list("%a, .b").is_invisible());
    }

    #[test]
    fn resolve_parent_prepends_implicitly() {
        let parent = list(".a");
        let resolved = list(".b")
            .resolve_parent(Some(&parent), true)
            .unwrap();
        assert_eq!(resolved.to_string(), ".a .b");
    }

    #[test]
    fn resolve_parent_substitutes_ampersand() {
        let parent = list(".a, .b");
        let resolved = list("&:hover")
            .resolve_parent(Some(&parent), true)
            .unwrap();
        assert_eq!(resolved.to_string(), ".a:hover, .b:hover");
    }

    #[test]
    fn resolve_parent_suffix() {
        let parent = list(".menu");
        let resolved = list("&-item")
            .resolve_parent(Some(&parent), true)
            .unwrap();
        assert_eq!(resolved.to_string(), ".menu-item");
    }

    #[test]
    fn top_level_parent_is_an_error() {
        assert!(list("& .a").resolve_parent(None, true).is_err());
    }

    #[test]
    fn display_round_trip() {
        for source in [
            ".a .b > .c + .d ~ .e",
            "a.b#c[href^=\"http\"]:hover::before",
            "*, ns|div",
            ":not(.a, .b)",
            ":nth-child(2n+1 of .x)",
        ] {
            assert_eq!(list(source).to_string(), source);
        }
    }
}

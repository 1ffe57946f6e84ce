//! Selector unification and weaving.
//!
//! `unify_compound` merges two compound selectors into one matching their
//! intersection; `weave` produces every component sequence that is a
//! super-sequence of its inputs, merging shared prefixes and suffixes and
//! unifying trailing compounds where combinators permit.
//!
//! Like the super-selector oracle, everything here works on component
//! slices in implicit form (no explicit descendant combinators).

use crate::ast::{
    Combinator, ComplexSelector, Component, CompoundSelector, SelectorList, SimpleSelector, Span,
};
use crate::superselector::{complex_is_superselector, compound_is_superselector};
use std::collections::{HashSet, VecDeque};

pub type Components = Vec<Component>;

/// Unifies `simple` into the parts of a compound selector, returning `None`
/// on contradiction (two ids, two incompatible types).
pub fn unify_simple(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    match simple {
        SimpleSelector::Type { .. } | SimpleSelector::Universal { .. } => {
            unify_type_or_universal(simple, compound)
        }
        SimpleSelector::Id { .. } => {
            if compound
                .iter()
                .any(|their| matches!(their, SimpleSelector::Id { .. }) && their != simple)
            {
                return None;
            }
            unify_default(simple, compound)
        }
        SimpleSelector::Pseudo(pseudo) => {
            if let [SimpleSelector::Universal { .. }] = compound {
                return unify_type_or_universal(&compound[0], &[simple.clone()]);
            }
            if compound.contains(simple) {
                return Some(compound.to_vec());
            }
            let mut result = Vec::with_capacity(compound.len() + 1);
            let mut added = false;
            for their in compound {
                if let SimpleSelector::Pseudo(their_pseudo) = their {
                    if their_pseudo.is_element() {
                        // A compound may carry only one pseudo-element, and
                        // pseudo-classes sort before it.
                        if pseudo.is_element() {
                            return None;
                        }
                        if !added {
                            result.push(simple.clone());
                            added = true;
                        }
                    }
                }
                result.push(their.clone());
            }
            if !added {
                result.push(simple.clone());
            }
            Some(result)
        }
        _ => unify_default(simple, compound),
    }
}

/// Base unification: dedupe equal simples and keep pseudos last.
fn unify_default(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    if let [SimpleSelector::Universal { .. }] = compound {
        return unify_type_or_universal(&compound[0], &[simple.clone()]);
    }
    if compound.contains(simple) {
        return Some(compound.to_vec());
    }
    let mut result = Vec::with_capacity(compound.len() + 1);
    let mut added = false;
    for their in compound {
        if !added && matches!(their, SimpleSelector::Pseudo(_)) {
            result.push(simple.clone());
            added = true;
        }
        result.push(their.clone());
    }
    if !added {
        result.push(simple.clone());
    }
    Some(result)
}

fn unify_type_or_universal(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    match compound.first() {
        Some(first @ (SimpleSelector::Universal { .. } | SimpleSelector::Type { .. })) => {
            let unified = unify_universal_and_element(simple, first)?;
            let mut result = vec![unified];
            result.extend(compound[1..].iter().cloned());
            Some(result)
        }
        _ => {
            if let SimpleSelector::Universal { namespace, .. } = simple {
                let keeps_namespace =
                    matches!(namespace.as_deref(), Some(ns) if ns != "*");
                if !keeps_namespace {
                    return Some(if compound.is_empty() {
                        vec![simple.clone()]
                    } else {
                        compound.to_vec()
                    });
                }
            }
            let mut result = vec![simple.clone()];
            result.extend(compound.iter().cloned());
            Some(result)
        }
    }
}

/// Unifies two type/universal selectors into the most specific selector
/// matching both, or `None` when their names or namespaces conflict.
fn unify_universal_and_element(
    selector1: &SimpleSelector,
    selector2: &SimpleSelector,
) -> Option<SimpleSelector> {
    let (namespace1, name1) = type_parts(selector1)?;
    let (namespace2, name2) = type_parts(selector2)?;

    let namespace = if namespace1 == namespace2 || namespace2.as_deref() == Some("*") {
        namespace1
    } else if namespace1.as_deref() == Some("*") {
        namespace2
    } else {
        return None;
    };

    let name = if name1 == name2 || name2.is_none() {
        name1
    } else if name1.is_none() {
        name2
    } else {
        return None;
    };

    Some(match name {
        Some(name) => SimpleSelector::Type {
            name,
            namespace,
            span: Span::phony(),
        },
        None => SimpleSelector::Universal {
            namespace,
            span: Span::phony(),
        },
    })
}

fn type_parts(simple: &SimpleSelector) -> Option<(Option<String>, Option<String>)> {
    match simple {
        SimpleSelector::Universal { namespace, .. } => Some((namespace.clone(), None)),
        SimpleSelector::Type {
            name, namespace, ..
        } => Some((namespace.clone(), Some(name.clone()))),
        _ => None,
    }
}

/// Unifies two compound selectors into one matching their intersection.
pub fn unify_compound(
    compound1: &CompoundSelector,
    compound2: &CompoundSelector,
) -> Option<CompoundSelector> {
    let mut result = compound2.parts.clone();
    for simple in &compound1.parts {
        result = unify_simple(simple, &result)?;
    }
    Some(CompoundSelector::new(result))
}

/// Unifies the trailing compounds of all inputs, then weaves the leading
/// parts around the unified base.
pub fn unify_complex(complexes: &[Components]) -> Option<Vec<Components>> {
    if complexes.len() == 1 {
        return Some(complexes.to_vec());
    }

    let mut unified_base: Option<Vec<SimpleSelector>> = None;
    for complex in complexes {
        let base = match complex.last() {
            Some(Component::Compound(compound)) => compound,
            _ => return None,
        };
        match &mut unified_base {
            None => unified_base = Some(base.parts.clone()),
            Some(parts) => {
                for simple in &base.parts {
                    *parts = unify_simple(simple, parts)?;
                }
            }
        }
    }

    let mut without_bases: Vec<Components> = complexes
        .iter()
        .map(|complex| complex[..complex.len() - 1].to_vec())
        .collect();
    without_bases
        .last_mut()
        .expect("at least two complexes")
        .push(Component::Compound(CompoundSelector::new(
            unified_base.expect("at least one base"),
        )));
    Some(weave(&without_bases))
}

/// Produces all component sequences that are super-sequences of every input.
pub fn weave(complexes: &[Components]) -> Vec<Components> {
    let mut prefixes: Vec<Components> = vec![complexes[0].clone()];

    for complex in &complexes[1..] {
        if complex.is_empty() {
            continue;
        }
        let target = complex.last().expect("checked non-empty").clone();
        if complex.len() == 1 {
            for prefix in &mut prefixes {
                prefix.push(target.clone());
            }
            continue;
        }

        let parents = &complex[..complex.len() - 1];
        let mut new_prefixes = Vec::new();
        for prefix in &prefixes {
            if let Some(parent_prefixes) = weave_parents(prefix, parents) {
                for mut parent_prefix in parent_prefixes {
                    parent_prefix.push(target.clone());
                    new_prefixes.push(parent_prefix);
                }
            }
        }
        prefixes = new_prefixes;
    }

    prefixes
}

/// Interleaves two parent sequences into every sequence that matches both,
/// merging shared prefixes/suffixes and unifying where required.
fn weave_parents(parents1: &[Component], parents2: &[Component]) -> Option<Vec<Components>> {
    let mut queue1: VecDeque<Component> = parents1.iter().cloned().collect();
    let mut queue2: VecDeque<Component> = parents2.iter().cloned().collect();

    let initial = merge_initial_combinators(&mut queue1, &mut queue2)?;
    let mut finals: VecDeque<Vec<Components>> = VecDeque::new();
    merge_final_combinators(&mut queue1, &mut queue2, &mut finals)?;

    // `:root` can only appear once, so shared roots must unify.
    match (first_if_root(&mut queue1), first_if_root(&mut queue2)) {
        (Some(root1), Some(root2)) => {
            let root = unify_compound(&root1, &root2)?;
            queue1.push_front(Component::Compound(root.clone()));
            queue2.push_front(Component::Compound(root));
        }
        (Some(root1), None) => queue2.push_front(Component::Compound(root1)),
        (None, Some(root2)) => queue1.push_front(Component::Compound(root2)),
        (None, None) => {}
    }

    let mut groups1 = group_selectors(queue1);
    let mut groups2 = group_selectors(queue2);

    let list1: Vec<Components> = groups2.iter().cloned().collect();
    let list2: Vec<Components> = groups1.iter().cloned().collect();
    let lcs = longest_common_subsequence(&list1, &list2, &|group1, group2| {
        if group1 == group2 {
            return Some(group1.clone());
        }
        if !matches!(group1.first(), Some(Component::Compound(_)))
            || !matches!(group2.first(), Some(Component::Compound(_)))
        {
            return None;
        }
        if complex_is_parent_superselector(group1, group2) {
            return Some(group2.clone());
        }
        if complex_is_parent_superselector(group2, group1) {
            return Some(group1.clone());
        }
        if !must_unify(group1, group2) {
            return None;
        }
        let unified = unify_complex(&[group1.clone(), group2.clone()])?;
        if unified.len() > 1 {
            return None;
        }
        unified.into_iter().next()
    });

    let mut choices: Vec<Vec<Components>> = vec![vec![initial]];
    for group in lcs {
        let chunk_choice: Vec<Components> =
            chunks(&mut groups1, &mut groups2, |queue| {
                queue
                    .front()
                    .map_or(true, |seq| complex_is_parent_superselector(seq, &group))
            })
            .into_iter()
            .map(|chunk| chunk.into_iter().flatten().collect())
            .collect();
        choices.push(chunk_choice);
        choices.push(vec![group]);
        groups1.pop_front();
        groups2.pop_front();
    }
    let tail_choice: Vec<Components> = chunks(&mut groups1, &mut groups2, |queue| queue.is_empty())
        .into_iter()
        .map(|chunk| chunk.into_iter().flatten().collect())
        .collect();
    choices.push(tail_choice);
    choices.extend(finals.drain(..));

    let filtered: Vec<Vec<Components>> = choices
        .into_iter()
        .filter(|choice| !choice.is_empty())
        .collect();

    Some(
        paths(&filtered)
            .into_iter()
            .map(|path| path.into_iter().flatten().collect())
            .collect(),
    )
}

/// Pops leading combinators off both queues; one run must be a
/// subsequence of the other or the parents cannot be woven.
fn merge_initial_combinators(
    queue1: &mut VecDeque<Component>,
    queue2: &mut VecDeque<Component>,
) -> Option<Components> {
    let mut combinators1 = Vec::new();
    while matches!(queue1.front(), Some(Component::Combinator(_))) {
        combinators1.push(queue1.pop_front().expect("front checked"));
    }
    let mut combinators2 = Vec::new();
    while matches!(queue2.front(), Some(Component::Combinator(_))) {
        combinators2.push(queue2.pop_front().expect("front checked"));
    }

    let lcs = longest_common_subsequence(&combinators1, &combinators2, &|a, b| {
        if a == b {
            Some(a.clone())
        } else {
            None
        }
    });
    if lcs == combinators1 {
        Some(combinators2)
    } else if lcs == combinators2 {
        Some(combinators1)
    } else {
        None
    }
}

/// Merges trailing `compound combinator` pairs off both queues into the
/// choice groups of `result`, front-first so output order matches input
/// order. The interactions between `>`/`+`/`~` each get their own case.
fn merge_final_combinators(
    queue1: &mut VecDeque<Component>,
    queue2: &mut VecDeque<Component>,
    result: &mut VecDeque<Vec<Components>>,
) -> Option<()> {
    use Combinator::{Child, FollowingSibling, NextSibling};

    if !matches!(queue1.back(), Some(Component::Combinator(_)))
        && !matches!(queue2.back(), Some(Component::Combinator(_)))
    {
        return Some(());
    }

    let mut combinators1 = Vec::new();
    while let Some(Component::Combinator(combinator)) = queue1.back() {
        combinators1.push(*combinator);
        queue1.pop_back();
    }
    let mut combinators2 = Vec::new();
    while let Some(Component::Combinator(combinator)) = queue2.back() {
        combinators2.push(*combinator);
        queue2.pop_back();
    }

    if combinators1.len() > 1 || combinators2.len() > 1 {
        // Multiple trailing combinators only merge when one run is a
        // supersequence of the other.
        let lcs = longest_common_subsequence(&combinators1, &combinators2, &|a, b| {
            if a == b {
                Some(*a)
            } else {
                None
            }
        });
        if lcs == combinators1 {
            result.push_front(vec![combinators2
                .iter()
                .rev()
                .map(|combinator| Component::Combinator(*combinator))
                .collect()]);
        } else if lcs == combinators2 {
            result.push_front(vec![combinators1
                .iter()
                .rev()
                .map(|combinator| Component::Combinator(*combinator))
                .collect()]);
        } else {
            return None;
        }
        return Some(());
    }

    match (combinators1.first().copied(), combinators2.first().copied()) {
        (Some(combinator1), Some(combinator2)) => {
            let compound1 = match queue1.pop_back() {
                Some(Component::Compound(compound)) => compound,
                _ => return None,
            };
            let compound2 = match queue2.pop_back() {
                Some(Component::Compound(compound)) => compound,
                _ => return None,
            };

            match (combinator1, combinator2) {
                (FollowingSibling, FollowingSibling) => {
                    if compound_is_superselector(&compound1, &compound2, None) {
                        result.push_front(vec![vec![
                            Component::Compound(compound2),
                            Component::Combinator(FollowingSibling),
                        ]]);
                    } else if compound_is_superselector(&compound2, &compound1, None) {
                        result.push_front(vec![vec![
                            Component::Compound(compound1),
                            Component::Combinator(FollowingSibling),
                        ]]);
                    } else {
                        let mut choices = vec![
                            vec![
                                Component::Compound(compound1.clone()),
                                Component::Combinator(FollowingSibling),
                                Component::Compound(compound2.clone()),
                                Component::Combinator(FollowingSibling),
                            ],
                            vec![
                                Component::Compound(compound2.clone()),
                                Component::Combinator(FollowingSibling),
                                Component::Compound(compound1.clone()),
                                Component::Combinator(FollowingSibling),
                            ],
                        ];
                        if let Some(unified) = unify_compound(&compound1, &compound2) {
                            choices.push(vec![
                                Component::Compound(unified),
                                Component::Combinator(FollowingSibling),
                            ]);
                        }
                        result.push_front(choices);
                    }
                }
                (FollowingSibling, NextSibling) | (NextSibling, FollowingSibling) => {
                    let (following, next) = if combinator1 == FollowingSibling {
                        (compound1.clone(), compound2.clone())
                    } else {
                        (compound2.clone(), compound1.clone())
                    };
                    if compound_is_superselector(&following, &next, None) {
                        result.push_front(vec![vec![
                            Component::Compound(next),
                            Component::Combinator(NextSibling),
                        ]]);
                    } else {
                        let mut choices = vec![vec![
                            Component::Compound(following),
                            Component::Combinator(FollowingSibling),
                            Component::Compound(next),
                            Component::Combinator(NextSibling),
                        ]];
                        if let Some(unified) = unify_compound(&compound1, &compound2) {
                            choices.push(vec![
                                Component::Compound(unified),
                                Component::Combinator(NextSibling),
                            ]);
                        }
                        result.push_front(choices);
                    }
                }
                (Child, NextSibling | FollowingSibling) => {
                    result.push_front(vec![vec![
                        Component::Compound(compound2),
                        Component::Combinator(combinator2),
                    ]]);
                    queue1.push_back(Component::Compound(compound1));
                    queue1.push_back(Component::Combinator(Child));
                }
                (NextSibling | FollowingSibling, Child) => {
                    result.push_front(vec![vec![
                        Component::Compound(compound1),
                        Component::Combinator(combinator1),
                    ]]);
                    queue2.push_back(Component::Compound(compound2));
                    queue2.push_back(Component::Combinator(Child));
                }
                _ if combinator1 == combinator2 => {
                    let unified = unify_compound(&compound1, &compound2)?;
                    result.push_front(vec![vec![
                        Component::Compound(unified),
                        Component::Combinator(combinator1),
                    ]]);
                }
                _ => return None,
            }
            merge_final_combinators(queue1, queue2, result)
        }
        (Some(combinator1), None) => {
            if combinator1 == Child {
                if let (Some(Component::Compound(last2)), Some(Component::Compound(last1))) =
                    (queue2.back(), queue1.back())
                {
                    if compound_is_superselector(last2, last1, None) {
                        queue2.pop_back();
                    }
                }
            }
            let last1 = queue1.pop_back()?;
            result.push_front(vec![vec![last1, Component::Combinator(combinator1)]]);
            merge_final_combinators(queue1, queue2, result)
        }
        (None, Some(combinator2)) => {
            if combinator2 == Child {
                if let (Some(Component::Compound(last1)), Some(Component::Compound(last2))) =
                    (queue1.back(), queue2.back())
                {
                    if compound_is_superselector(last1, last2, None) {
                        queue1.pop_back();
                    }
                }
            }
            let last2 = queue2.pop_back()?;
            result.push_front(vec![vec![last2, Component::Combinator(combinator2)]]);
            merge_final_combinators(queue1, queue2, result)
        }
        (None, None) => Some(()),
    }
}

/// Pops a leading `:root` compound so it can be shared between both sides.
fn first_if_root(queue: &mut VecDeque<Component>) -> Option<CompoundSelector> {
    if let Some(Component::Compound(compound)) = queue.front() {
        let has_root = compound.parts.iter().any(|simple| {
            matches!(
                simple,
                SimpleSelector::Pseudo(pseudo)
                    if !pseudo.is_element() && pseudo.normalized == "root"
            )
        });
        if has_root {
            if let Some(Component::Compound(compound)) = queue.pop_front() {
                return Some(compound);
            }
        }
    }
    None
}

/// Groups a component sequence into `[compound, combinator...]` runs.
fn group_selectors(components: impl IntoIterator<Item = Component>) -> VecDeque<Components> {
    let mut groups: VecDeque<Components> = VecDeque::new();
    let mut group: Components = Vec::new();
    for component in components {
        let starts_new_group = !group.is_empty()
            && !component.is_combinator()
            && !group.last().expect("group is non-empty").is_combinator();
        if starts_new_group {
            groups.push_back(std::mem::take(&mut group));
        }
        group.push(component);
    }
    if !group.is_empty() {
        groups.push_back(group);
    }
    groups
}

/// Pops elements off both queues until `done`, returning the orderings in
/// which the two chunks can be emitted.
fn chunks<T: Clone>(
    queue1: &mut VecDeque<T>,
    queue2: &mut VecDeque<T>,
    done: impl Fn(&VecDeque<T>) -> bool,
) -> Vec<Vec<T>> {
    let mut chunk1 = Vec::new();
    while !done(queue1) {
        chunk1.push(queue1.pop_front().expect("done is true for empty queues"));
    }
    let mut chunk2 = Vec::new();
    while !done(queue2) {
        chunk2.push(queue2.pop_front().expect("done is true for empty queues"));
    }
    match (chunk1.is_empty(), chunk2.is_empty()) {
        (true, true) => Vec::new(),
        (true, false) => vec![chunk2],
        (false, true) => vec![chunk1],
        (false, false) => {
            let mut forward = chunk1.clone();
            forward.extend(chunk2.iter().cloned());
            let mut backward = chunk2;
            backward.extend(chunk1);
            vec![forward, backward]
        }
    }
}

/// Whether two complexes share an id or pseudo-element, in which case a
/// woven result only matches if they are unified.
fn must_unify(complex1: &[Component], complex2: &[Component]) -> bool {
    let mut unique: HashSet<&SimpleSelector> = HashSet::new();
    for component in complex1 {
        if let Component::Compound(compound) = component {
            unique.extend(compound.parts.iter().filter(|simple| is_unique(simple)));
        }
    }
    if unique.is_empty() {
        return false;
    }
    complex2.iter().any(|component| {
        matches!(
            component,
            Component::Compound(compound)
                if compound.parts.iter().any(|simple| is_unique(simple) && unique.contains(simple))
        )
    })
}

fn is_unique(simple: &SimpleSelector) -> bool {
    match simple {
        SimpleSelector::Id { .. } => true,
        SimpleSelector::Pseudo(pseudo) => pseudo.is_element(),
        _ => false,
    }
}

/// Whether `complex1` matches every element `complex2` matches when both are
/// extended with the same trailing compound.
pub fn complex_is_parent_superselector(complex1: &[Component], complex2: &[Component]) -> bool {
    if matches!(complex1.first(), Some(Component::Combinator(_))) {
        return false;
    }
    if matches!(complex2.first(), Some(Component::Combinator(_))) {
        return false;
    }
    if complex1.len() > complex2.len() {
        return false;
    }
    let base = Component::Compound(
        SimpleSelector::Placeholder {
            name: "<temp>".to_string(),
            span: Span::phony(),
        }
        .into_compound(),
    );
    let mut with_base1 = complex1.to_vec();
    with_base1.push(base.clone());
    let mut with_base2 = complex2.to_vec();
    with_base2.push(base);
    complex_is_superselector(&with_base1, &with_base2)
}

/// Cartesian product over the options of each choice, first axis fastest.
pub fn paths<T: Clone>(choices: &[Vec<T>]) -> Vec<Vec<T>> {
    choices.iter().fold(vec![Vec::new()], |acc, choice| {
        choice
            .iter()
            .flat_map(|option| {
                acc.iter().map(move |path| {
                    let mut extended = path.clone();
                    extended.push(option.clone());
                    extended
                })
            })
            .collect()
    })
}

/// Longest common subsequence where `select` both tests compatibility and
/// chooses the element the subsequence keeps.
pub fn longest_common_subsequence<T: Clone>(
    list1: &[T],
    list2: &[T],
    select: &dyn Fn(&T, &T) -> Option<T>,
) -> Vec<T> {
    let mut lengths = vec![vec![0usize; list2.len() + 1]; list1.len() + 1];
    let mut selections: Vec<Vec<Option<T>>> = vec![vec![None; list2.len()]; list1.len()];

    for i in 0..list1.len() {
        for j in 0..list2.len() {
            selections[i][j] = select(&list1[i], &list2[j]);
            lengths[i + 1][j + 1] = match selections[i][j] {
                None => lengths[i + 1][j].max(lengths[i][j + 1]),
                Some(_) => lengths[i][j] + 1,
            };
        }
    }

    fn backtrack<T: Clone>(
        selections: &[Vec<Option<T>>],
        lengths: &[Vec<usize>],
        i: isize,
        j: isize,
    ) -> Vec<T> {
        if i == -1 || j == -1 {
            return Vec::new();
        }
        let (iu, ju) = (i as usize, j as usize);
        if let Some(selection) = &selections[iu][ju] {
            let mut result = backtrack(selections, lengths, i - 1, j - 1);
            result.push(selection.clone());
            return result;
        }
        if lengths[iu + 1][ju] > lengths[iu][ju + 1] {
            backtrack(selections, lengths, i, j - 1)
        } else {
            backtrack(selections, lengths, i - 1, j)
        }
    }

    backtrack(
        &selections,
        &lengths,
        list1.len() as isize - 1,
        list2.len() as isize - 1,
    )
}

impl SelectorList {
    /// Unifies two selector lists into one matching their intersection, or
    /// `None` when no pair of members unifies.
    pub fn unify(&self, other: &SelectorList) -> Option<SelectorList> {
        let mut members = Vec::new();
        for complex1 in &self.members {
            for complex2 in &other.members {
                if let Some(unified) = unify_complex(&[
                    complex1.implicit_components(),
                    complex2.implicit_components(),
                ]) {
                    for components in unified {
                        members.push(ComplexSelector::from_implicit(components));
                    }
                }
            }
        }
        if members.is_empty() {
            None
        } else {
            Some(SelectorList::new(members))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selector;

    fn compound(source: &str) -> CompoundSelector {
        parse_selector(source).unwrap().members[0]
            .first_compound()
            .unwrap()
            .clone()
    }

    fn implicit(source: &str) -> Components {
        parse_selector(source).unwrap().members[0].implicit_components()
    }

    fn render(components: &Components) -> String {
        ComplexSelector::from_implicit(components.clone()).to_string()
    }

    #[test]
    fn compound_unification_dedupes() {
        let unified = unify_compound(&compound(".a.b"), &compound(".b.c")).unwrap();
        assert_eq!(unified.to_string(), ".b.c.a");
    }

    #[test]
    fn compound_unification_type_first() {
        let unified = unify_compound(&compound("div"), &compound(".a")).unwrap();
        assert_eq!(unified.to_string(), "div.a");
    }

    #[test]
    fn conflicting_ids_refuse_to_unify() {
        assert!(unify_compound(&compound("#a"), &compound("#b")).is_none());
        assert!(unify_compound(&compound("#a"), &compound("#a")).is_some());
    }

    #[test]
    fn conflicting_types_refuse_to_unify() {
        assert!(unify_compound(&compound("div"), &compound("span")).is_none());
        let unified = unify_compound(&compound("div"), &compound("*")).unwrap();
        assert_eq!(unified.to_string(), "div");
    }

    #[test]
    fn pseudo_elements_stay_last() {
        let unified = unify_compound(&compound(".a"), &compound(".b::before")).unwrap();
        assert_eq!(unified.to_string(), ".b.a::before");
        assert!(unify_compound(&compound("::before"), &compound("::after")).is_none());
    }

    #[test]
    fn weave_single_inputs_concatenate() {
        let woven = weave(&[implicit(".a"), implicit(".b")]);
        assert_eq!(woven.len(), 1);
        assert_eq!(render(&woven[0]), ".a .b");
    }

    #[test]
    fn weave_interleaves_parents() {
        let woven = weave(&[implicit(".x"), implicit(".a .b")]);
        let rendered: Vec<String> = woven.iter().map(render).collect();
        assert_eq!(rendered, vec![".x .a .b", ".a .x .b"]);
    }

    #[test]
    fn weave_merges_shared_prefix() {
        let woven = weave(&[implicit(".a .x"), implicit(".a .y")]);
        let rendered: Vec<String> = woven.iter().map(render).collect();
        assert!(rendered.contains(&".a .x .y".to_string()), "{:?}", rendered);
    }

    #[test]
    fn unify_complex_merges_bases() {
        let unified = unify_complex(&[implicit(".x .y"), implicit(".a .b")]).unwrap();
        let rendered: Vec<String> = unified.iter().map(render).collect();
        assert_eq!(rendered, vec![".x .a .y.b", ".a .x .y.b"]);
    }

    #[test]
    fn unify_complex_fails_on_contradiction() {
        assert!(unify_complex(&[implicit("div"), implicit("span")]).is_none());
    }

    #[test]
    fn list_unify() {
        let list1 = parse_selector(".a").unwrap();
        let list2 = parse_selector(".b").unwrap();
        assert_eq!(list1.unify(&list2).unwrap().to_string(), ".a.b");
        let conflicting = parse_selector("#x").unwrap().unify(&parse_selector("#y").unwrap());
        assert!(conflicting.is_none());
    }

    #[test]
    fn paths_is_a_cartesian_product() {
        let product = paths(&[vec![1, 2], vec![3, 4]]);
        assert_eq!(product, vec![vec![1, 3], vec![2, 3], vec![1, 4], vec![2, 4]]);
    }

    #[test]
    fn lcs_prefers_matching_runs() {
        let lcs = longest_common_subsequence(&[1, 2, 3, 4], &[2, 4, 5], &|a, b| {
            if a == b {
                Some(*a)
            } else {
                None
            }
        });
        assert_eq!(lcs, vec![2, 4]);
    }

    #[test]
    fn child_combinators_unify_pairwise() {
        let unified = unify_complex(&[implicit(".a > .x"), implicit(".b > .x")]).unwrap();
        let rendered: Vec<String> = unified.iter().map(render).collect();
        assert_eq!(rendered, vec![".b.a > .x"]);
    }
}

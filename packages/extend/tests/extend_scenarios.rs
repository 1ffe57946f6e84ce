use cascade_extend::{ExtendError, Extender, ListId, SelectorStore};
use cascade_selectors::{parse_selector, SelectorList, SimpleSelector, Span};
use std::rc::Rc;

struct Harness {
    store: Rc<SelectorStore>,
    extender: Extender,
}

impl Harness {
    fn new() -> Self {
        let store = Rc::new(SelectorStore::new());
        let extender = Extender::new(store.clone());
        Self { store, extender }
    }

    fn rule(&mut self, selector: &str) -> ListId {
        self.rule_in_media(selector, None)
    }

    fn rule_in_media(&mut self, selector: &str, media: Option<&str>) -> ListId {
        let id = self.store.insert(parse_selector(selector).unwrap());
        self.extender
            .add_selector(id, media.map(|query| vec![query.to_string()]));
        id
    }

    fn extend(&mut self, extender: &str, target: &str, optional: bool) {
        self.extend_in_media(extender, target, optional, None)
    }

    fn extend_in_media(&mut self, extender: &str, target: &str, optional: bool, media: Option<&str>) {
        let extender_list = parse_selector(extender).unwrap();
        let target = single_simple(target);
        self.extender.add_extension(
            &extender_list,
            &target,
            optional,
            media.map(|query| vec![query.to_string()]),
            Span::new(0, 0),
        );
    }

    fn selector(&self, id: ListId) -> String {
        self.store.get(id).to_string()
    }
}

fn single_simple(source: &str) -> SimpleSelector {
    parse_selector(source).unwrap().members[0]
        .first_compound()
        .unwrap()
        .parts[0]
        .clone()
}

fn list(source: &str) -> SelectorList {
    parse_selector(source).unwrap()
}

#[test]
fn basic_extend() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend(".b", ".a", false);
    assert_eq!(h.selector(rule), ".a, .b");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn transitive_extend() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend(".b", ".a", false);
    h.extend(".c", ".b", false);
    assert_eq!(h.selector(rule), ".a, .b, .c");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn compound_target_extends_inner_simple() {
    let mut h = Harness::new();
    let rule = h.rule(".a.b");
    h.extend(".c", ".a", false);
    assert_eq!(h.selector(rule), ".a.b, .b.c");
}

#[test]
fn selector_weaving() {
    let mut h = Harness::new();
    let rule = h.rule(".x .y");
    h.extend(".a .b", ".y", false);
    assert_eq!(h.selector(rule), ".x .y, .x .a .b, .a .x .b");
}

#[test]
fn optional_unmatched_is_silent() {
    let mut h = Harness::new();
    h.extend(".a", ".b", true);
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn mandatory_unmatched_fails_at_finalize() {
    let mut h = Harness::new();
    h.extend(".a", ".b", false);
    let failures = h.extender.finalize();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        ExtendError::UnsatisfiedExtend { .. }
    ));
}

#[test]
fn extend_across_media_is_reported_and_isolated() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend_in_media(".b", ".a", false, Some("print"));
    // The top-level rule is never mutated by the media-scoped extension.
    assert_eq!(h.selector(rule), ".a");
    let failures = h.extender.finalize();
    assert!(failures
        .iter()
        .any(|failure| matches!(failure, ExtendError::ExtendAcrossMedia { .. })));
}

#[test]
fn extend_within_same_media_applies() {
    let mut h = Harness::new();
    let rule = h.rule_in_media(".a", Some("print"));
    h.extend_in_media(".b", ".a", false, Some("print"));
    assert_eq!(h.selector(rule), ".a, .b");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn top_level_extension_reaches_into_media() {
    let mut h = Harness::new();
    let rule = h.rule_in_media(".a", Some("print"));
    h.extend(".b", ".a", false);
    assert_eq!(h.selector(rule), ".a, .b");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn register_is_idempotent() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend(".b", ".a", false);
    let first = h.selector(rule);
    // Re-registering the same selector under the same extensions changes
    // nothing.
    h.extender.add_selector(rule, None);
    assert_eq!(h.selector(rule), first);
}

#[test]
fn late_rule_registration_picks_up_extensions() {
    let mut h = Harness::new();
    h.extend(".b", ".a", false);
    let rule = h.rule(".a");
    assert_eq!(h.selector(rule), ".a, .b");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn optional_extend_never_shrinks_output() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend(".b", ".a", false);
    let before: Vec<String> = h
        .store
        .get(rule)
        .members
        .iter()
        .map(|member| member.to_string())
        .collect();
    h.extend(".c", ".a", true);
    let after: Vec<String> = h
        .store
        .get(rule)
        .members
        .iter()
        .map(|member| member.to_string())
        .collect();
    for member in &before {
        assert!(after.contains(member), "{} disappeared", member);
    }
}

#[test]
fn originals_survive_trimming() {
    let mut h = Harness::new();
    // `.a.b` is a sub-selector of `.a`, but both are source selectors and
    // must both survive.
    let rule = h.rule(".a, .a.b");
    h.extend(".c", ".a", false);
    let selector = h.selector(rule);
    assert!(selector.contains(".a.b"), "{}", selector);
    assert!(selector.starts_with(".a"), "{}", selector);
}

#[test]
fn produced_duplicates_are_trimmed() {
    let mut h = Harness::new();
    let rule = h.rule(".a");
    h.extend(".c", ".a", false);
    h.extend(".c", ".a", false);
    assert_eq!(h.selector(rule), ".a, .c");
}

#[test]
fn chained_extends_compose() {
    // .c extends .a; a later rule `.a { @extend .b }` carries its own
    // extensions along. The evaluator always passes the rule's current
    // (already extended) selector list as the extender.
    let mut h = Harness::new();
    let a = h.rule(".a");
    let b = h.rule(".b");
    h.extend(".c", ".a", false);
    assert_eq!(h.selector(a), ".a, .c");

    let extend_rule = h.rule(".a");
    assert_eq!(h.selector(extend_rule), ".a, .c");
    let extender_list = h.store.get(extend_rule);
    h.extender.add_extension(
        &extender_list,
        &single_simple(".b"),
        false,
        None,
        Span::new(0, 0),
    );
    assert_eq!(h.selector(b), ".b, .a, .c");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn extension_loop_closure_reaches_earlier_extensions() {
    // Adding `.c { @extend .b }` after `.b { @extend .a }` must flow .c
    // through the pre-existing extension onto .a's rules.
    let mut h = Harness::new();
    let a = h.rule(".a");
    h.rule(".b");
    h.extend(".b", ".a", false);
    h.extend(".c", ".b", false);
    assert_eq!(h.selector(a), ".a, .b, .c");
    assert!(h.extender.finalize().is_empty());
}

#[test]
fn placeholder_targets_stay_invisible() {
    let mut h = Harness::new();
    let rule = h.rule("%base");
    h.extend(".b", "%base", false);
    let selector = h.store.get(rule);
    assert_eq!(selector.to_string(), "%base, .b");
    assert!(!selector.is_invisible());
}

#[test]
fn pseudo_selectors_extend_recursively() {
    let mut h = Harness::new();
    let rule = h.rule(":not(.a)");
    h.extend(".b", ".a", false);
    assert_eq!(h.selector(rule), ":not(.a):not(.b)");
}

#[test]
fn one_shot_extend() {
    let extended =
        Extender::one_shot_extend(&list(".a.b"), &list(".c"), &list(".a")).unwrap();
    assert_eq!(extended.to_string(), ".a.b, .b.c");
}

#[test]
fn one_shot_replace() {
    let replaced =
        Extender::one_shot_replace(&list(".a.b"), &list(".c"), &list(".a")).unwrap();
    assert_eq!(replaced.to_string(), ".b.c");
}

#[test]
fn one_shot_extend_rejects_complex_targets() {
    let result = Extender::one_shot_extend(&list(".a"), &list(".b"), &list(".x .y"));
    assert!(matches!(result, Err(ExtendError::ComplexTarget { .. })));
}

#[test]
fn specificity_of_originals_is_preserved() {
    let mut h = Harness::new();
    let rule = h.rule("#page .a");
    h.extend(".b", ".a", false);
    let selector = h.store.get(rule);
    // The original member keeps its own specificity untouched.
    assert_eq!(selector.members[0].max_specificity(), 1_001_000);
}

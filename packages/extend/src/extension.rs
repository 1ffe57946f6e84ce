use crate::error::ExtendError;
use cascade_selectors::{ComplexSelector, SimpleSelector, Span};

/// The stack of `@media` queries active at a rule's or extension's
/// definition site, already merged by the evaluator. `None` means top level.
pub type MediaContext = Vec<String>;

/// Lifecycle of an extension: created, propagated to at least one rule or
/// pre-existing extension, then closed at finalize. No backward moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionState {
    Pending,
    Applied,
    Closed,
}

/// A single `extender { @extend target }` registration.
#[derive(Debug, Clone)]
pub struct Extension {
    /// The selector of the style rule the `@extend` appeared in.
    pub extender: ComplexSelector,
    /// The simple selector being extended. One-off extensions built while
    /// crossing paths have no target.
    pub target: Option<SimpleSelector>,
    /// Specificity of the extender at registration time; outputs inherit it
    /// rather than re-deriving their own.
    pub specificity: u32,
    pub is_optional: bool,
    /// Marks the pseudo-extension that stands for "keep the original simple".
    pub is_original: bool,
    pub media_context: Option<MediaContext>,
    pub state: ExtensionState,
    pub span: Span,
}

impl Extension {
    /// An extension standing in for a selector itself, used while crossing
    /// real extensions with the selectors they apply to.
    pub fn one_off(extender: ComplexSelector) -> Self {
        let specificity = extender.max_specificity();
        Self {
            extender,
            target: None,
            specificity,
            is_optional: false,
            is_original: false,
            media_context: None,
            state: ExtensionState::Pending,
            span: Span::phony(),
        }
    }

    /// Copy of this extension with a different extender selector.
    pub fn with_extender(&self, extender: ComplexSelector) -> Self {
        Self {
            extender,
            target: self.target.clone(),
            specificity: self.specificity,
            is_optional: self.is_optional,
            is_original: false,
            media_context: self.media_context.clone(),
            state: self.state,
            span: self.span,
        }
    }

    /// Verifies that this extension may reach a rule defined under
    /// `context`. An extension without a media context reaches anywhere; one
    /// with a context requires a value-equal context on the rule.
    pub fn check_media_context(&self, context: Option<&MediaContext>) -> Result<(), ExtendError> {
        let own = match &self.media_context {
            None => return Ok(()),
            Some(own) => own,
        };
        if context == Some(own) {
            return Ok(());
        }
        Err(ExtendError::ExtendAcrossMedia {
            target: self
                .target
                .as_ref()
                .map(|target| target.to_string())
                .unwrap_or_else(|| self.extender.to_string()),
            span: self.span,
        })
    }
}

/// Combines two extensions with the same extender and target.
pub fn merge_extension(lhs: Extension, rhs: Extension) -> Extension {
    // An optional extension without a media context adds nothing.
    if rhs.is_optional && rhs.media_context.is_none() {
        return lhs;
    }
    if lhs.is_optional && lhs.media_context.is_none() {
        return rhs;
    }
    let mut merged = lhs;
    merged.is_optional = true;
    merged.is_original = false;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_selectors::parse_selector;

    fn extension(media: Option<Vec<String>>) -> Extension {
        let mut extension =
            Extension::one_off(parse_selector(".a").unwrap().members[0].clone());
        extension.media_context = media;
        extension
    }

    #[test]
    fn contextless_extension_reaches_anywhere() {
        let top_level = extension(None);
        assert!(top_level.check_media_context(None).is_ok());
        assert!(top_level
            .check_media_context(Some(&vec!["print".to_string()]))
            .is_ok());
    }

    #[test]
    fn media_extension_requires_equal_context() {
        let print = extension(Some(vec!["print".to_string()]));
        assert!(print
            .check_media_context(Some(&vec!["print".to_string()]))
            .is_ok());
        assert!(print.check_media_context(None).is_err());
        assert!(print
            .check_media_context(Some(&vec!["screen".to_string()]))
            .is_err());
    }

    #[test]
    fn merging_keeps_the_stricter_side() {
        let optional = Extension {
            is_optional: true,
            ..extension(None)
        };
        let mandatory = extension(None);
        let merged = merge_extension(mandatory.clone(), optional.clone());
        assert!(!merged.is_optional);
        let merged = merge_extension(optional, mandatory);
        assert!(!merged.is_optional);
    }
}

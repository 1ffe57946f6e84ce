use cascade_selectors::Span;
use thiserror::Error;

pub type ExtendResult<T> = Result<T, ExtendError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtendError {
    #[error(
        "The target selector was not found.\nUse \"@extend {target} !optional\" to avoid this error."
    )]
    UnsatisfiedExtend { target: String, span: Span },

    #[error(
        "You may not @extend selectors across media queries.\nUse \"@extend {target} !optional\" to avoid this error."
    )]
    ExtendAcrossMedia { target: String, span: Span },

    #[error("Can't extend complex selector {selector}.")]
    ComplexTarget { selector: String },

    #[error("Extension recursion exceeded {limit} levels")]
    NestingLimit { limit: usize },
}

impl ExtendError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnsatisfiedExtend { span, .. } | Self::ExtendAcrossMedia { span, .. } => {
                Some(*span)
            }
            Self::ComplexTarget { .. } | Self::NestingLimit { .. } => None,
        }
    }
}

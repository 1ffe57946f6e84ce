use cascade_extend::ExtendError;
use cascade_selectors::{SelectorError, Span};
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Incompatible units: '{rhs}' and '{lhs}'.")]
    IncompatibleUnits { lhs: String, rhs: String, span: Span },

    #[error("divided by 0")]
    ZeroDivision { span: Span },

    #[error("Undefined operation: \"{lhs} {op} {rhs}\".")]
    UndefinedOperation {
        lhs: String,
        op: String,
        rhs: String,
        span: Span,
    },

    #[error("{value} isn't a valid CSS value.")]
    InvalidValue { value: String, span: Span },

    #[error("Undefined variable: \"${name}\".")]
    UndefinedVariable { name: String, span: Span },

    #[error("Undefined mixin '{name}'.")]
    UndefinedMixin { name: String, span: Span },

    #[error("stack level too deep")]
    NestingLimit { span: Span },

    #[error("{message}")]
    UserError { message: String, span: Span },

    #[error("{message}")]
    InvalidArguments { message: String, span: Span },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Extend(#[from] ExtendError),
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            Self::IncompatibleUnits { span, .. }
            | Self::ZeroDivision { span }
            | Self::UndefinedOperation { span, .. }
            | Self::InvalidValue { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::UndefinedMixin { span, .. }
            | Self::NestingLimit { span }
            | Self::UserError { span, .. }
            | Self::InvalidArguments { span, .. } => *span,
            Self::Selector(error) => error.span(),
            Self::Extend(error) => error.span().unwrap_or_else(Span::phony),
        }
    }
}

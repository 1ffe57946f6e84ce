use crate::ast::Span;
use thiserror::Error;

pub type SelectorResult<T> = Result<T, SelectorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Invalid selector syntax at {}: {message}", span.start)]
    InvalidSyntax { span: Span, message: String },

    #[error("Unexpected end of selector")]
    UnexpectedEof { span: Span },

    #[error("Top-level selectors may not contain the parent selector \"&\"")]
    TopLevelParent { span: Span },

    #[error("{message}")]
    InvalidParent { message: String, span: Span },
}

impl SelectorError {
    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::InvalidSyntax { span, .. }
            | Self::UnexpectedEof { span }
            | Self::TopLevelParent { span }
            | Self::InvalidParent { span, .. } => *span,
        }
    }
}

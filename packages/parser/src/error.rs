use cascade_selectors::Span;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {}: expected {expected}, found {found}", span.start)]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {}", span.start)]
    UnexpectedEof { span: Span },

    #[error("Invalid syntax at {}: {message}", span.start)]
    InvalidSyntax { span: Span, message: String },

    #[error("Unrecognized character at {}", span.start)]
    LexerError { span: Span },
}

impl ParseError {
    pub fn unexpected_token(
        span: Span,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::UnexpectedEof { span }
    }

    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span }
            | Self::InvalidSyntax { span, .. }
            | Self::LexerError { span } => *span,
        }
    }
}

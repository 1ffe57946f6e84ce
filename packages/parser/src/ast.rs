use cascade_selectors::Span;
use serde::{Deserialize, Serialize};

/// Root of a parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub statements: Vec<Stmt>,
}

/// Text that may contain `#{...}` interpolation, kept raw until evaluation
/// (selectors, media queries, at-rule preludes, declaration names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpolationPart {
    Raw(String),
    Expr(Expr),
}

impl Interpolation {
    /// The raw text when no interpolation is present.
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [InterpolationPart::Raw(text)] => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `selector { ... }`
    RuleSet {
        selector: Interpolation,
        body: Vec<Stmt>,
        span: Span,
    },

    /// `name: value [!important];`
    Declaration {
        name: Interpolation,
        value: Expr,
        important: bool,
        span: Span,
    },

    /// `$name: value [!default] [!global];`
    VariableDecl {
        name: String,
        value: Expr,
        default: bool,
        global: bool,
        span: Span,
    },

    /// `@extend selector [!optional];`
    Extend {
        selector: Interpolation,
        optional: bool,
        span: Span,
    },

    /// `@media query { ... }`
    Media {
        query: Interpolation,
        body: Vec<Stmt>,
        span: Span,
    },

    /// Any other at-rule (`@supports`, `@keyframes`, `@font-face`, ...)
    /// passed through with its prelude.
    AtRule {
        name: String,
        prelude: Interpolation,
        body: Option<Vec<Stmt>>,
        span: Span,
    },

    /// `@mixin name($params...) { ... }`
    MixinDef {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
        span: Span,
    },

    /// `@include name(args) [{ ... }];`
    Include {
        name: String,
        args: CallArgs,
        body: Option<Vec<Stmt>>,
        span: Span,
    },

    /// `@content;` inside a mixin body.
    Content { span: Span },

    /// `@function name($params) { ... }`
    FunctionDef {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
        span: Span,
    },

    /// `@return value;`
    Return { value: Expr, span: Span },

    /// `@if` / `@else if` / `@else` chain.
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
        span: Span,
    },

    /// `@each $a, $b in list { ... }`
    Each {
        names: Vec<String>,
        list: Expr,
        body: Vec<Stmt>,
        span: Span,
    },

    /// `@for $i from a through|to b { ... }`
    For {
        name: String,
        from: Expr,
        to: Expr,
        inclusive: bool,
        body: Vec<Stmt>,
        span: Span,
    },

    /// `@while condition { ... }`
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },

    Warn { value: Expr, span: Span },
    Debug { value: Expr, span: Span },
    Error { value: Expr, span: Span },

    /// `@import "a", "b";`
    Import { urls: Vec<ImportUrl>, span: Span },

    /// `/* ... */` at statement position.
    Comment { text: String, loud: bool, span: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportUrl {
    /// A Sass file to inline, resolved against the include paths.
    Sass(String),
    /// A plain CSS import emitted verbatim (`url(...)`, `http://`, `.css`).
    Css(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CallArgs {
    pub positional: Vec<Expr>,
    pub named: Vec<(String, Expr)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListSeparator {
    Space,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `12`, `1.5em`, `50%`
    Number {
        value: f64,
        unit: Option<String>,
        span: Span,
    },

    /// `#fff`: hex digits without the `#`.
    HexColor { hex: String, span: Span },

    /// Quoted or unquoted string; `quote` is the original quote mark.
    Str {
        value: String,
        quote: Option<char>,
        span: Span,
    },

    /// A bare identifier; `true`/`false`/`null` and named colors are
    /// resolved at evaluation time.
    Ident { name: String, span: Span },

    Variable { name: String, span: Span },

    List {
        items: Vec<Expr>,
        separator: ListSeparator,
        span: Span,
    },

    Map {
        entries: Vec<(Expr, Expr)>,
        span: Span,
    },

    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// `a/b` between plain literals stays a literal slash in CSS.
        slash_literal: bool,
        span: Span,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    FunctionCall {
        name: String,
        args: CallArgs,
        span: Span,
    },

    /// Mixed raw text and interpolation in value position.
    Interp(Interpolation),

    /// Parenthesized expression (forces division, drops literal slashes).
    Parens { inner: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. }
            | Expr::HexColor { span, .. }
            | Expr::Str { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Variable { span, .. }
            | Expr::List { span, .. }
            | Expr::Map { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::Parens { span, .. } => *span,
            Expr::Interp(interp) => interp.span,
        }
    }

    /// Clears the literal-slash marker on division nodes; used when an
    /// expression becomes an operand or is parenthesized.
    pub fn force_division(&mut self) {
        if let Expr::Binary {
            op: BinOp::Div,
            slash_literal,
            lhs,
            rhs,
            ..
        } = self
        {
            *slash_literal = false;
            lhs.force_division();
            rhs.force_division();
        }
    }
}

//! AST evaluation for the Cascade compiler: the value model with unit
//! arithmetic, lexical environments, the built-in function library, and the
//! evaluator that flattens nesting, bubbles `@media`, and drives the
//! selector-inheritance engine while building the CSS tree.

pub mod builtins;
pub mod css_tree;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod value;

pub use css_tree::{
    CssAtRule, CssComment, CssDeclaration, CssMediaRule, CssRoot, CssRule, CssSelector, CssStmt,
};
pub use environment::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::{
    Diagnostic, DiagnosticLevel, Evaluator, HostFunction, ImportResolver, ResolvedImport,
};
pub use value::{format_double, named_color, Color, Number, SassStr, Value};

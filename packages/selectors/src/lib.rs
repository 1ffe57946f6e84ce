//! Selector data model and set algebra for the Cascade compiler.
//!
//! This crate owns everything the selector-inheritance engine needs to know
//! about selectors: the data model ([`ast`]), a parser for the CSS Selectors 3
//! grammar plus the Sass extensions `&` and `%name` ([`parser`]), cascade
//! specificity ([`specificity`]), the super-selector oracle
//! ([`superselector`]), and compound/complex unification and weaving
//! ([`unify`]).

pub mod ast;
pub mod error;
pub mod parser;
pub mod specificity;
pub mod superselector;
pub mod unify;

pub use ast::{
    AttrOp, Combinator, ComplexSelector, Component, CompoundSelector, Pseudo, PseudoKind,
    SelectorList, SimpleSelector, Span,
};
pub use error::{SelectorError, SelectorResult};
pub use parser::{parse_selector, SelectorParser};

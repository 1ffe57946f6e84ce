use crate::value::Value;
use cascade_extend::ListId;
use cascade_selectors::Span;

/// The evaluated CSS tree handed to the output stage. Selector lists are
/// referenced through [`ListId`] handles into the shared `SelectorStore`,
/// which the extender may still mutate until finalization.
#[derive(Debug, Default)]
pub struct CssRoot {
    pub statements: Vec<CssStmt>,
}

#[derive(Debug)]
pub enum CssStmt {
    Rule(CssRule),
    Media(CssMediaRule),
    AtRule(CssAtRule),
    Comment(CssComment),
    /// A plain-CSS `@import` emitted verbatim.
    Import { url: String, span: Span },
}

#[derive(Debug)]
pub struct CssRule {
    pub selector: CssSelector,
    pub declarations: Vec<CssDeclaration>,
    pub span: Span,
}

/// Style rules normally point at a registered selector list; rules inside
/// `@keyframes` and friends keep their raw prelude text and stay outside
/// the extend engine.
#[derive(Debug)]
pub enum CssSelector {
    Handle(ListId),
    Raw(String),
}

#[derive(Debug)]
pub struct CssDeclaration {
    pub name: String,
    pub value: Value,
    pub important: bool,
    pub name_span: Span,
    pub value_span: Span,
}

#[derive(Debug)]
pub struct CssMediaRule {
    /// The merged query text as written in the output.
    pub query: String,
    /// The same query split into its comma-separated parts; this is the
    /// media context used for extension compatibility.
    pub context: Vec<String>,
    pub body: Vec<CssStmt>,
    pub span: Span,
}

#[derive(Debug)]
pub struct CssAtRule {
    pub name: String,
    pub prelude: String,
    pub body: Option<Vec<CssStmt>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct CssComment {
    pub text: String,
    pub loud: bool,
    pub span: Span,
}

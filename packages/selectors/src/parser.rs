use crate::ast::{
    AttrOp, Combinator, ComplexSelector, Component, CompoundSelector, Pseudo, PseudoKind,
    SelectorList, SimpleSelector, Span,
};
use crate::error::{SelectorError, SelectorResult};
use logos::Logos;
use std::ops::Range;

/// Token types for the selector grammar. Whitespace is significant (it
/// becomes the descendant combinator), so it is a token rather than skipped.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"(--|-)?[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    String(&'src str),

    #[regex(r"[+-]?[0-9]+(\.[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,

    #[token("%")]
    Percent,

    #[token("&")]
    Ampersand,

    #[token("*=")]
    SubstringMatch,

    #[token("*")]
    Star,

    #[token("|=")]
    DashMatch,

    #[token("|")]
    Pipe,

    #[token(">")]
    Greater,

    #[token("+")]
    Plus,

    #[token("~=")]
    IncludesMatch,

    #[token("~")]
    Tilde,

    #[token("^=")]
    PrefixMatch,

    #[token("$=")]
    SuffixMatch,

    #[token("=")]
    Equals,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("::")]
    DoubleColon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

/// Pseudo classes whose argument is a full selector list.
const SELECTOR_PSEUDOS: &[&str] = &[
    "not",
    "matches",
    "is",
    "any",
    "where",
    "current",
    "has",
    "host",
    "host-context",
    "slotted",
];

/// Pseudo classes taking an `an+b` argument with an optional `of <selector>`.
const NTH_PSEUDOS: &[&str] = &["nth-child", "nth-last-child"];

/// Pseudo elements historically written with a single colon.
const LEGACY_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// Recursive-descent parser over the selector token stream.
pub struct SelectorParser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

/// Parses a selector list from source.
pub fn parse_selector(source: &str) -> SelectorResult<SelectorList> {
    SelectorParser::new(source)?.parse()
}

impl<'src> SelectorParser<'src> {
    pub fn new(source: &'src str) -> SelectorResult<Self> {
        let mut tokens = Vec::new();
        for (result, span) in Token::lexer(source).spanned() {
            match result {
                Ok(token) => tokens.push((token, span)),
                Err(_) => {
                    return Err(SelectorError::invalid_syntax(
                        Span::new(span.start, span.end),
                        format!("unexpected character {:?}", &source[span.clone()]),
                    ))
                }
            }
        }
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    pub fn parse(&mut self) -> SelectorResult<SelectorList> {
        let list = self.parse_list(false)?;
        if let Some((_, range)) = self.tokens.get(self.pos) {
            return Err(SelectorError::invalid_syntax(
                Span::new(range.start, range.end),
                "expected end of selector",
            ));
        }
        Ok(list)
    }

    fn parse_list(&mut self, _nested: bool) -> SelectorResult<SelectorList> {
        let mut members = Vec::new();
        loop {
            let saw_break = self.skip_whitespace();
            let mut complex = self.parse_complex()?;
            complex.line_break = saw_break && !members.is_empty();
            members.push(complex);
            self.skip_whitespace();
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(SelectorList::new(members))
    }

    fn parse_complex(&mut self) -> SelectorResult<ComplexSelector> {
        let mut components: Vec<Component> = Vec::new();
        loop {
            let saw_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Some(Token::Greater) => Some(Combinator::Child),
                Some(Token::Plus) => Some(Combinator::NextSibling),
                Some(Token::Tilde) => Some(Combinator::FollowingSibling),
                _ => None,
            };
            if let Some(combinator) = combinator {
                let span = self.current_span();
                if components.is_empty()
                    || matches!(components.last(), Some(Component::Combinator(_)))
                {
                    return Err(SelectorError::invalid_syntax(
                        span,
                        "a combinator must follow a compound selector",
                    ));
                }
                self.advance();
                components.push(Component::Combinator(combinator));
                continue;
            }

            if !self.starts_simple() {
                break;
            }
            if saw_whitespace
                && !components.is_empty()
                && !matches!(components.last(), Some(Component::Combinator(_)))
            {
                components.push(Component::Combinator(Combinator::Descendant));
            }
            let compound = self.parse_compound()?;
            components.push(Component::Compound(compound));
        }

        match components.last() {
            None => Err(SelectorError::invalid_syntax(
                self.current_span(),
                "expected a selector",
            )),
            Some(Component::Combinator(_)) => Err(SelectorError::invalid_syntax(
                self.current_span(),
                "a selector may not end with a combinator",
            )),
            Some(Component::Compound(_)) => Ok(ComplexSelector::new(components)),
        }
    }

    fn starts_simple(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Ident(_)
                    | Token::Star
                    | Token::Dot
                    | Token::Hash
                    | Token::Percent
                    | Token::Ampersand
                    | Token::LBracket
                    | Token::Colon
                    | Token::DoubleColon
                    | Token::Pipe
            )
        )
    }

    fn parse_compound(&mut self) -> SelectorResult<CompoundSelector> {
        let mut parts = Vec::new();
        loop {
            let start = self.current_offset();
            let simple = match self.peek() {
                Some(Token::Ident(name)) => {
                    if !parts.is_empty() {
                        return Err(SelectorError::invalid_syntax(
                            self.current_span(),
                            "a type selector must be the first simple selector in a compound",
                        ));
                    }
                    self.advance();
                    self.finish_type(Some(name.to_string()), start)?
                }
                Some(Token::Star) => {
                    if !parts.is_empty() {
                        return Err(SelectorError::invalid_syntax(
                            self.current_span(),
                            "\"*\" must be the first simple selector in a compound",
                        ));
                    }
                    self.advance();
                    self.finish_type(None, start)?
                }
                Some(Token::Pipe) => {
                    // `|div`: explicit empty namespace.
                    self.advance();
                    let name = self.expect_ident()?;
                    SimpleSelector::Type {
                        name: name.to_string(),
                        namespace: Some(String::new()),
                        span: self.span_from(start),
                    }
                }
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.expect_ident()?;
                    SimpleSelector::Class {
                        name: name.to_string(),
                        span: self.span_from(start),
                    }
                }
                Some(Token::Hash) => {
                    self.advance();
                    let name = self.expect_ident()?;
                    let simple = SimpleSelector::Id {
                        name: name.to_string(),
                        span: self.span_from(start),
                    };
                    if parts.contains(&simple) {
                        return Err(SelectorError::invalid_syntax(
                            self.span_from(start),
                            format!("duplicate id selector \"#{}\"", name),
                        ));
                    }
                    simple
                }
                Some(Token::Percent) => {
                    self.advance();
                    let name = self.expect_ident()?;
                    SimpleSelector::Placeholder {
                        name: name.to_string(),
                        span: self.span_from(start),
                    }
                }
                Some(Token::Ampersand) => {
                    self.advance();
                    let suffix = match self.peek_adjacent() {
                        Some(Token::Ident(name)) => {
                            self.advance();
                            Some(name.to_string())
                        }
                        _ => None,
                    };
                    SimpleSelector::Parent {
                        suffix,
                        span: self.span_from(start),
                    }
                }
                Some(Token::LBracket) => self.parse_attribute()?,
                Some(Token::Colon) | Some(Token::DoubleColon) => self.parse_pseudo()?,
                _ => break,
            };
            parts.push(simple);
            // A compound ends at whitespace, a combinator, or any delimiter.
            match self.peek_adjacent() {
                Some(
                    Token::Dot
                    | Token::Hash
                    | Token::Percent
                    | Token::Ampersand
                    | Token::LBracket
                    | Token::Colon
                    | Token::DoubleColon
                    | Token::Star
                    | Token::Ident(_),
                ) => continue,
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(SelectorError::invalid_syntax(
                self.current_span(),
                "expected a simple selector",
            ));
        }
        Ok(CompoundSelector::new(parts))
    }

    /// Completes a type or universal selector, resolving an optional
    /// `ns|name` namespace written before the current position.
    fn finish_type(
        &mut self,
        name: Option<String>,
        start: usize,
    ) -> SelectorResult<SimpleSelector> {
        if self.peek_adjacent() == Some(Token::Pipe) {
            self.advance();
            let namespace = Some(match name {
                Some(name) => name,
                None => "*".to_string(),
            });
            return Ok(match self.peek_adjacent() {
                Some(Token::Ident(local)) => {
                    self.advance();
                    SimpleSelector::Type {
                        name: local.to_string(),
                        namespace,
                        span: self.span_from(start),
                    }
                }
                Some(Token::Star) => {
                    self.advance();
                    SimpleSelector::Universal {
                        namespace,
                        span: self.span_from(start),
                    }
                }
                _ => {
                    return Err(SelectorError::invalid_syntax(
                        self.current_span(),
                        "expected a type name after \"|\"",
                    ))
                }
            });
        }
        Ok(match name {
            Some(name) => SimpleSelector::Type {
                name,
                namespace: None,
                span: self.span_from(start),
            },
            None => SimpleSelector::Universal {
                namespace: None,
                span: self.span_from(start),
            },
        })
    }

    fn parse_attribute(&mut self) -> SelectorResult<SimpleSelector> {
        let start = self.current_offset();
        self.advance(); // [
        self.skip_whitespace();
        let name = self.expect_ident()?.to_string();
        self.skip_whitespace();

        let op = match self.peek() {
            Some(Token::RBracket) => {
                self.advance();
                return Ok(SimpleSelector::Attribute {
                    name,
                    op: AttrOp::Exists,
                    value: None,
                    modifier: None,
                    span: self.span_from(start),
                });
            }
            Some(Token::Equals) => AttrOp::Equals,
            Some(Token::IncludesMatch) => AttrOp::Includes,
            Some(Token::DashMatch) => AttrOp::DashMatch,
            Some(Token::PrefixMatch) => AttrOp::Prefix,
            Some(Token::SuffixMatch) => AttrOp::Suffix,
            Some(Token::SubstringMatch) => AttrOp::Substring,
            _ => {
                return Err(SelectorError::invalid_syntax(
                    self.current_span(),
                    "expected an attribute operator or \"]\"",
                ))
            }
        };
        self.advance();
        self.skip_whitespace();

        let value = match self.peek() {
            Some(Token::Ident(text)) | Some(Token::String(text)) => {
                self.advance();
                Some(text.to_string())
            }
            _ => {
                return Err(SelectorError::invalid_syntax(
                    self.current_span(),
                    "expected an attribute value",
                ))
            }
        };
        self.skip_whitespace();

        let modifier = match self.peek() {
            Some(Token::Ident(flag)) if flag.len() == 1 => {
                self.advance();
                flag.chars().next()
            }
            _ => None,
        };
        self.skip_whitespace();
        self.expect(Token::RBracket)?;

        Ok(SimpleSelector::Attribute {
            name,
            op,
            value,
            modifier,
            span: self.span_from(start),
        })
    }

    fn parse_pseudo(&mut self) -> SelectorResult<SimpleSelector> {
        let start = self.current_offset();
        let element = match self.peek() {
            Some(Token::DoubleColon) => true,
            Some(Token::Colon) => false,
            _ => unreachable!("caller checked for a colon"),
        };
        self.advance();
        let name = self.expect_ident()?.to_string();

        let kind = if element || LEGACY_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            PseudoKind::Element
        } else {
            PseudoKind::Class
        };
        let mut pseudo = Pseudo::new(&name, kind, Span::phony());

        if self.peek_adjacent() == Some(Token::LParen) {
            self.advance();
            let normalized = pseudo.normalized.clone();
            if SELECTOR_PSEUDOS.contains(&normalized.as_str()) {
                pseudo.selector = Some(self.parse_list(true)?);
                self.expect(Token::RParen)?;
            } else if NTH_PSEUDOS.contains(&normalized.as_str()) {
                let argument = self.capture_argument(true)?;
                pseudo.argument = Some(argument);
                if self.peek_is_of() {
                    self.advance(); // `of`
                    pseudo.selector = Some(self.parse_list(true)?);
                }
                self.expect(Token::RParen)?;
            } else {
                pseudo.argument = Some(self.capture_argument(false)?);
                self.expect(Token::RParen)?;
            }
        }
        pseudo.span = self.span_from(start);
        Ok(SimpleSelector::Pseudo(pseudo))
    }

    /// Captures an opaque pseudo argument as trimmed raw source text, up to
    /// the matching `)` (or an `of` keyword when `stop_at_of`).
    fn capture_argument(&mut self, stop_at_of: bool) -> SelectorResult<String> {
        let from = self.current_offset();
        let mut to = from;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => {
                    return Err(SelectorError::UnexpectedEof {
                        span: Span::new(self.source.len(), self.source.len()),
                    })
                }
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Some(Token::Ident("of")) if stop_at_of && depth == 0 => break,
                Some(_) => {}
            }
            to = self.tokens[self.pos].1.end;
            self.advance();
        }
        Ok(self.source[from..to].trim().to_string())
    }

    fn peek_is_of(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident("of")))
    }

    // Token-stream helpers in the style of the stylesheet parser.

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    /// Peeks only when the next token starts exactly where the previous one
    /// ended, so `& -item` does not parse as a suffixed parent selector.
    fn peek_adjacent(&self) -> Option<Token<'src>> {
        let (token, range) = self.tokens.get(self.pos)?;
        if self.pos > 0 {
            let prev_end = self.tokens[self.pos - 1].1.end;
            if range.start != prev_end {
                return None;
            }
        }
        Some(*token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut saw_newline = false;
        while let Some((Token::Whitespace, range)) = self.tokens.get(self.pos) {
            saw_newline |= self.source[range.clone()].contains('\n');
            self.pos += 1;
        }
        saw_newline
    }

    fn expect(&mut self, expected: Token<'src>) -> SelectorResult<()> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(SelectorError::invalid_syntax(
                self.current_span(),
                format!("expected {:?}", expected),
            ))
        }
    }

    fn expect_ident(&mut self) -> SelectorResult<&'src str> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(SelectorError::invalid_syntax(
                self.current_span(),
                "expected an identifier",
            )),
        }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, range)| range.start)
            .unwrap_or(self.source.len())
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, range)) => Span::new(range.start, range.end),
            None => Span::new(self.source.len(), self.source.len()),
        }
    }

    fn span_from(&self, start: usize) -> Span {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, range)| range.end)
            .unwrap_or(start);
        Span::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SelectorList {
        parse_selector(source).expect("selector should parse")
    }

    #[test]
    fn whitespace_becomes_descendant() {
        let list = parse(".a\n  .b");
        assert_eq!(list.members[0].components.len(), 3);
        assert_eq!(
            list.members[0].components[1],
            Component::Combinator(Combinator::Descendant)
        );
    }

    #[test]
    fn explicit_combinators() {
        let list = parse(".a>.b+.c~.d");
        let combinators: Vec<_> = list.members[0]
            .components
            .iter()
            .filter_map(|c| match c {
                Component::Combinator(combinator) => Some(*combinator),
                _ => None,
            })
            .collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Child,
                Combinator::NextSibling,
                Combinator::FollowingSibling
            ]
        );
    }

    #[test]
    fn compound_parses_in_order() {
        let list = parse("a.b#c[d]:e");
        let compound = list.members[0].first_compound().unwrap();
        assert_eq!(compound.parts.len(), 5);
        assert!(matches!(compound.parts[0], SimpleSelector::Type { .. }));
    }

    #[test]
    fn nested_selector_pseudos() {
        let list = parse(":not(.a, .b:hover)");
        let pseudo = list.members[0].first_compound().unwrap().parts[0]
            .as_pseudo()
            .unwrap();
        assert_eq!(pseudo.normalized, "not");
        assert_eq!(pseudo.selector.as_ref().unwrap().members.len(), 2);
    }

    #[test]
    fn nth_child_with_of() {
        let list = parse(":nth-child(2n+1 of .item)");
        let pseudo = list.members[0].first_compound().unwrap().parts[0]
            .as_pseudo()
            .unwrap();
        assert_eq!(pseudo.argument.as_deref(), Some("2n+1"));
        assert!(pseudo.selector.is_some());
    }

    #[test]
    fn opaque_pseudo_argument() {
        let list = parse(":lang(en-US)");
        let pseudo = list.members[0].first_compound().unwrap().parts[0]
            .as_pseudo()
            .unwrap();
        assert_eq!(pseudo.argument.as_deref(), Some("en-US"));
        assert!(pseudo.selector.is_none());
    }

    #[test]
    fn parent_with_suffix() {
        let list = parse("&-item");
        match &list.members[0].first_compound().unwrap().parts[0] {
            SimpleSelector::Parent { suffix, .. } => {
                assert_eq!(suffix.as_deref(), Some("-item"))
            }
            other => panic!("expected parent selector, got {:?}", other),
        }
    }

    #[test]
    fn placeholder_selector() {
        let list = parse("%button");
        assert!(list.members[0].first_compound().unwrap().parts[0].is_placeholder());
    }

    #[test]
    fn line_break_flag_survives() {
        let list = parse(".a,\n.b");
        assert!(!list.members[0].line_break);
        assert!(list.members[1].line_break);
    }

    #[test]
    fn trailing_combinator_is_an_error() {
        assert!(parse_selector(".a >").is_err());
        assert!(parse_selector("> .a").is_err());
    }

    #[test]
    fn duplicate_ids_rejected() {
        assert!(parse_selector("#a#a").is_err());
        assert!(parse_selector("#a#b").is_ok());
    }

    #[test]
    fn type_must_be_first() {
        assert!(parse_selector(".a div").is_ok());
        assert!(parse_selector(".adiv").is_ok());
        assert!(parse_selector(":hover*").is_err());
    }
}

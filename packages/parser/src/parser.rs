use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use cascade_selectors::Span;
use std::ops::Range;

/// Recursive-descent parser for the stylesheet language.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

/// Parses a stylesheet from source.
pub fn parse(source: &str) -> ParseResult<Stylesheet> {
    Parser::new(source)?.parse_stylesheet()
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for (result, range) in tokenize(source) {
            match result {
                Ok(token) => tokens.push((token, range)),
                Err(_) => {
                    return Err(ParseError::LexerError {
                        span: Span::new(range.start, range.end),
                    })
                }
            }
        }
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    pub fn parse_stylesheet(&mut self) -> ParseResult<Stylesheet> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if self.match_token(Token::Semicolon) {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Stylesheet { statements })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "{")?;
        let mut statements = Vec::new();
        loop {
            if self.match_token(Token::Semicolon) {
                continue;
            }
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    break;
                }
                None => return Err(ParseError::unexpected_eof(self.current_span())),
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_offset();
        match self.peek() {
            Some(Token::BlockComment(text)) => {
                self.advance();
                Ok(Stmt::Comment {
                    text: text.to_string(),
                    loud: text.starts_with("/*!"),
                    span: self.span_from(start),
                })
            }
            Some(Token::AtWord(name)) => {
                let name = name.to_string();
                self.advance();
                self.parse_at_rule(&name, start)
            }
            Some(Token::Variable(name)) if self.peek_nth(1) == Some(Token::Colon) => {
                let name = name.to_string();
                self.advance();
                self.advance();
                let value = self.parse_value_expr()?;
                let mut default = false;
                let mut global = false;
                while self.peek() == Some(Token::Bang) {
                    self.advance();
                    match self.peek() {
                        Some(Token::Ident("default")) => {
                            default = true;
                            self.advance();
                        }
                        Some(Token::Ident("global")) => {
                            global = true;
                            self.advance();
                        }
                        _ => {
                            return Err(ParseError::invalid_syntax(
                                self.current_span(),
                                "expected \"default\" or \"global\" after \"!\"",
                            ))
                        }
                    }
                }
                self.end_statement()?;
                Ok(Stmt::VariableDecl {
                    name,
                    value,
                    default,
                    global,
                    span: self.span_from(start),
                })
            }
            Some(_) => self.parse_rule_or_declaration(start),
            None => Err(ParseError::unexpected_eof(self.current_span())),
        }
    }

    /// CSS-classic ambiguity: a statement is a nested rule if a `{` shows up
    /// before any `;` or `}` at the current nesting level.
    fn parse_rule_or_declaration(&mut self, start: usize) -> ParseResult<Stmt> {
        let mut depth = 0usize;
        let mut interp_depth = 0usize;
        let mut is_rule = false;
        for (token, _) in &self.tokens[self.pos..] {
            match token {
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
                Token::InterpStart => interp_depth += 1,
                Token::RBrace if interp_depth > 0 => interp_depth -= 1,
                Token::LBrace if depth == 0 && interp_depth == 0 => {
                    is_rule = true;
                    break;
                }
                Token::Semicolon | Token::RBrace if depth == 0 && interp_depth == 0 => break,
                _ => {}
            }
        }

        if is_rule {
            let selector = self.parse_interpolated_until(&[Token::LBrace])?;
            let body = self.parse_block()?;
            Ok(Stmt::RuleSet {
                selector,
                body,
                span: self.span_from(start),
            })
        } else {
            let name = self.parse_interpolated_until(&[Token::Colon])?;
            self.expect(Token::Colon, ":")?;
            let value = self.parse_value_expr()?;
            let mut important = false;
            if self.peek() == Some(Token::Bang) {
                self.advance();
                match self.peek() {
                    Some(Token::Ident("important")) => {
                        important = true;
                        self.advance();
                    }
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            self.current_span(),
                            "expected \"important\" after \"!\"",
                        ))
                    }
                }
            }
            self.end_statement()?;
            Ok(Stmt::Declaration {
                name,
                value,
                important,
                span: self.span_from(start),
            })
        }
    }

    fn parse_at_rule(&mut self, name: &str, start: usize) -> ParseResult<Stmt> {
        match name {
            "media" => {
                let query = self.parse_interpolated_until(&[Token::LBrace])?;
                let body = self.parse_block()?;
                Ok(Stmt::Media {
                    query,
                    body,
                    span: self.span_from(start),
                })
            }
            "extend" => {
                let selector =
                    self.parse_interpolated_until(&[Token::Semicolon, Token::Bang, Token::RBrace])?;
                let mut optional = false;
                if self.peek() == Some(Token::Bang) {
                    self.advance();
                    match self.peek() {
                        Some(Token::Ident("optional")) => {
                            optional = true;
                            self.advance();
                        }
                        _ => {
                            return Err(ParseError::invalid_syntax(
                                self.current_span(),
                                "expected \"optional\" after \"!\"",
                            ))
                        }
                    }
                }
                self.end_statement()?;
                Ok(Stmt::Extend {
                    selector,
                    optional,
                    span: self.span_from(start),
                })
            }
            "mixin" => {
                let mixin_name = self.expect_ident()?.to_string();
                let params = if self.peek() == Some(Token::LParen) {
                    self.parse_params()?
                } else {
                    Vec::new()
                };
                let body = self.parse_block()?;
                Ok(Stmt::MixinDef {
                    name: mixin_name,
                    params,
                    body,
                    span: self.span_from(start),
                })
            }
            "include" => {
                let include_name = self.expect_ident()?.to_string();
                let args = if self.peek() == Some(Token::LParen) {
                    self.parse_call_args()?
                } else {
                    CallArgs::default()
                };
                let body = if self.peek() == Some(Token::LBrace) {
                    Some(self.parse_block()?)
                } else {
                    self.end_statement()?;
                    None
                };
                Ok(Stmt::Include {
                    name: include_name,
                    args,
                    body,
                    span: self.span_from(start),
                })
            }
            "content" => {
                self.end_statement()?;
                Ok(Stmt::Content {
                    span: self.span_from(start),
                })
            }
            "function" => {
                let function_name = self.expect_ident()?.to_string();
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                Ok(Stmt::FunctionDef {
                    name: function_name,
                    params,
                    body,
                    span: self.span_from(start),
                })
            }
            "return" => {
                let mut value = self.parse_value_expr()?;
                // SassScript context: division always applies.
                value.force_division();
                self.end_statement()?;
                Ok(Stmt::Return {
                    value,
                    span: self.span_from(start),
                })
            }
            "if" => {
                let mut branches = Vec::new();
                let mut else_body = None;
                let condition = self.parse_value_expr()?;
                let body = self.parse_block()?;
                branches.push((condition, body));
                while self.peek() == Some(Token::AtWord("else")) {
                    self.advance();
                    if self.peek() == Some(Token::Ident("if")) {
                        self.advance();
                        let condition = self.parse_value_expr()?;
                        let body = self.parse_block()?;
                        branches.push((condition, body));
                    } else {
                        else_body = Some(self.parse_block()?);
                        break;
                    }
                }
                Ok(Stmt::If {
                    branches,
                    else_body,
                    span: self.span_from(start),
                })
            }
            "each" => {
                let mut names = vec![self.expect_variable()?];
                while self.match_token(Token::Comma) {
                    names.push(self.expect_variable()?);
                }
                self.expect_keyword("in")?;
                let list = self.parse_value_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::Each {
                    names,
                    list,
                    body,
                    span: self.span_from(start),
                })
            }
            "for" => {
                let variable = self.expect_variable()?;
                self.expect_keyword("from")?;
                let from = self.parse_single_expr()?;
                let inclusive = match self.peek() {
                    Some(Token::Ident("through")) => {
                        self.advance();
                        true
                    }
                    Some(Token::Ident("to")) => {
                        self.advance();
                        false
                    }
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            self.current_span(),
                            "expected \"through\" or \"to\"",
                        ))
                    }
                };
                let to = self.parse_single_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::For {
                    name: variable,
                    from,
                    to,
                    inclusive,
                    body,
                    span: self.span_from(start),
                })
            }
            "while" => {
                let condition = self.parse_value_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::While {
                    condition,
                    body,
                    span: self.span_from(start),
                })
            }
            "warn" | "debug" | "error" => {
                let mut value = self.parse_value_expr()?;
                value.force_division();
                self.end_statement()?;
                let span = self.span_from(start);
                Ok(match name {
                    "warn" => Stmt::Warn { value, span },
                    "debug" => Stmt::Debug { value, span },
                    _ => Stmt::Error { value, span },
                })
            }
            "import" => {
                let mut urls = Vec::new();
                loop {
                    match self.peek() {
                        Some(Token::String(text)) => {
                            let url = unquote(text);
                            self.advance();
                            if url.ends_with(".css")
                                || url.starts_with("http://")
                                || url.starts_with("https://")
                                || url.starts_with("//")
                            {
                                urls.push(ImportUrl::Css(format!("\"{}\"", url)));
                            } else {
                                urls.push(ImportUrl::Sass(url));
                            }
                        }
                        Some(Token::Url(text)) => {
                            urls.push(ImportUrl::Css(text.to_string()));
                            self.advance();
                        }
                        _ => {
                            return Err(ParseError::invalid_syntax(
                                self.current_span(),
                                "expected a string or url() in @import",
                            ))
                        }
                    }
                    if !self.match_token(Token::Comma) {
                        break;
                    }
                }
                self.end_statement()?;
                Ok(Stmt::Import {
                    urls,
                    span: self.span_from(start),
                })
            }
            _ => {
                let prelude =
                    self.parse_interpolated_until(&[Token::LBrace, Token::Semicolon, Token::RBrace])?;
                let body = if self.peek() == Some(Token::LBrace) {
                    Some(self.parse_block()?)
                } else {
                    self.end_statement()?;
                    None
                };
                Ok(Stmt::AtRule {
                    name: name.to_string(),
                    prelude,
                    body,
                    span: self.span_from(start),
                })
            }
        }
    }

    /// Collects raw source text (with `#{...}` expressions parsed out) up to
    /// any of `stops`, which is left unconsumed.
    fn parse_interpolated_until(&mut self, stops: &[Token<'src>]) -> ParseResult<Interpolation> {
        let start = self.current_offset();
        let mut parts = Vec::new();
        let mut raw_start = start;
        let mut depth = 0usize;
        loop {
            let token = match self.peek() {
                None => break,
                Some(token) => token,
            };
            if depth == 0 && stops.contains(&token) {
                break;
            }
            match token {
                Token::LParen | Token::LBracket => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                }
                Token::InterpStart => {
                    let interp_start = self.tokens[self.pos].1.start;
                    if interp_start > raw_start {
                        parts.push(InterpolationPart::Raw(
                            self.source[raw_start..interp_start].to_string(),
                        ));
                    }
                    self.advance();
                    let mut expr = self.parse_value_expr()?;
                    expr.force_division();
                    self.expect(Token::RBrace, "}")?;
                    parts.push(InterpolationPart::Expr(expr));
                    raw_start = self.previous_end();
                }
                _ => self.advance(),
            }
        }
        let end = self.current_offset();
        if end > raw_start {
            parts.push(InterpolationPart::Raw(self.source[raw_start..end].to_string()));
        }
        Ok(Interpolation {
            parts,
            span: Span::new(start, end),
        })
    }

    // ----- expressions -----

    /// Comma-separated list of space-separated lists; the usual entry point
    /// for declaration values and control-flow expressions.
    fn parse_value_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let first = self.parse_space_list()?;
        if self.peek() != Some(Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_token(Token::Comma) {
            if !self.starts_value() {
                break;
            }
            items.push(self.parse_space_list()?);
        }
        Ok(Expr::List {
            items,
            separator: ListSeparator::Comma,
            span: self.span_from(start),
        })
    }

    fn parse_space_list(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let first = self.parse_single_expr()?;
        if !self.starts_value() {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.starts_value() {
            items.push(self.parse_single_expr()?);
        }
        Ok(Expr::List {
            items,
            separator: ListSeparator::Space,
            span: self.span_from(start),
        })
    }

    fn parse_single_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(Token::Ident("or")) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = self.make_binary(BinOp::Or, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_equality()?;
        while self.peek() == Some(Token::Ident("and")) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = self.make_binary(BinOp::And, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::BangEq) => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = self.make_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.make_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            // `10px -5px` is a space list, not subtraction: a sign glued to
            // its operand after a space starts a new value.
            if self.gap_before(self.pos) && !self.gap_before(self.pos + 1) {
                break;
            }
            if !self.value_follows(self.pos + 1) {
                break;
            }
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.make_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            if !self.value_follows(self.pos + 1) {
                break;
            }
            self.advance();
            let rhs = self.parse_unary()?;
            if op == BinOp::Div {
                let slash_literal = is_plain_operand(&lhs) && is_plain_operand(&rhs);
                lhs = Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    slash_literal,
                    span: self.span_from(start),
                };
            } else {
                lhs = self.make_binary(op, lhs, rhs, start);
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let mut operand = self.parse_unary()?;
                operand.force_division();
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Plus,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            Some(Token::Ident("not")) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_offset();
        match self.peek() {
            Some(Token::Dimension(text)) => {
                self.advance();
                let (value, unit) = split_dimension(text);
                Ok(Expr::Number {
                    value,
                    unit,
                    span: self.span_from(start),
                })
            }
            Some(Token::Hash(text)) => {
                self.advance();
                let hex = &text[1..];
                if matches!(hex.len(), 3 | 4 | 6 | 8)
                    && hex.chars().all(|c| c.is_ascii_hexdigit())
                {
                    Ok(Expr::HexColor {
                        hex: hex.to_string(),
                        span: self.span_from(start),
                    })
                } else {
                    Ok(Expr::Ident {
                        name: text.to_string(),
                        span: self.span_from(start),
                    })
                }
            }
            Some(Token::String(text)) => {
                self.advance();
                let quote = text.chars().next();
                Ok(Expr::Str {
                    value: unquote(text),
                    quote,
                    span: self.span_from(start),
                })
            }
            Some(Token::Url(text)) => {
                self.advance();
                Ok(Expr::Ident {
                    name: text.to_string(),
                    span: self.span_from(start),
                })
            }
            Some(Token::Variable(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(Expr::Variable {
                    name,
                    span: self.span_from(start),
                })
            }
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                if self.peek() == Some(Token::LParen) && !self.gap_before(self.pos) {
                    if name.eq_ignore_ascii_case("calc") || name.eq_ignore_ascii_case("expression")
                    {
                        // calc() bodies are plain CSS, not Sass expressions.
                        let raw = self.capture_balanced_parens()?;
                        return Ok(Expr::Ident {
                            name: format!("{}{}", name, raw),
                            span: self.span_from(start),
                        });
                    }
                    let args = self.parse_call_args()?;
                    return Ok(Expr::FunctionCall {
                        name,
                        args,
                        span: self.span_from(start),
                    });
                }
                if self.peek() == Some(Token::InterpStart) && !self.gap_before(self.pos) {
                    return self.parse_interp_value(start);
                }
                Ok(Expr::Ident {
                    name,
                    span: self.span_from(start),
                })
            }
            Some(Token::InterpStart) => self.parse_interp_value(start),
            Some(Token::LParen) => {
                self.advance();
                if self.match_token(Token::RParen) {
                    return Ok(Expr::List {
                        items: Vec::new(),
                        separator: ListSeparator::Space,
                        span: self.span_from(start),
                    });
                }
                let first = self.parse_space_list()?;
                if self.peek() == Some(Token::Colon) {
                    // A map: (key: value, key: value)
                    self.advance();
                    let mut entries = Vec::new();
                    let mut value = self.parse_space_list()?;
                    value.force_division();
                    entries.push((first, value));
                    while self.match_token(Token::Comma) {
                        if self.peek() == Some(Token::RParen) {
                            break;
                        }
                        let key = self.parse_space_list()?;
                        self.expect(Token::Colon, ":")?;
                        let mut value = self.parse_space_list()?;
                        value.force_division();
                        entries.push((key, value));
                    }
                    self.expect(Token::RParen, ")")?;
                    return Ok(Expr::Map {
                        entries,
                        span: self.span_from(start),
                    });
                }
                // A parenthesized expression or a comma list.
                let mut inner = if self.peek() == Some(Token::Comma) {
                    let mut items = vec![first];
                    while self.match_token(Token::Comma) {
                        if self.peek() == Some(Token::RParen) {
                            break;
                        }
                        items.push(self.parse_space_list()?);
                    }
                    Expr::List {
                        items,
                        separator: ListSeparator::Comma,
                        span: self.span_from(start),
                    }
                } else {
                    first
                };
                self.expect(Token::RParen, ")")?;
                inner.force_division();
                Ok(Expr::Parens {
                    inner: Box::new(inner),
                    span: self.span_from(start),
                })
            }
            Some(other) => Err(ParseError::unexpected_token(
                self.current_span(),
                "a value",
                format!("{:?}", other),
            )),
            None => Err(ParseError::unexpected_eof(self.current_span())),
        }
    }

    /// Interpolated identifier in value position (`a#{$x}b`, `#{$x}`).
    fn parse_interp_value(&mut self, start: usize) -> ParseResult<Expr> {
        let mut parts = Vec::new();
        if start < self.current_offset() {
            // The caller already consumed a leading identifier.
            parts.push(InterpolationPart::Raw(
                self.source[start..self.previous_end()].to_string(),
            ));
        }
        loop {
            match self.peek() {
                Some(Token::InterpStart) if !self.gap_before(self.pos) || parts.is_empty() => {
                    self.advance();
                    let mut expr = self.parse_value_expr()?;
                    expr.force_division();
                    self.expect(Token::RBrace, "}")?;
                    parts.push(InterpolationPart::Expr(expr));
                }
                Some(Token::Ident(text)) | Some(Token::Dimension(text))
                    if !self.gap_before(self.pos) =>
                {
                    parts.push(InterpolationPart::Raw(text.to_string()));
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(Expr::Interp(Interpolation {
            parts,
            span: self.span_from(start),
        }))
    }

    fn parse_call_args(&mut self) -> ParseResult<CallArgs> {
        self.expect(Token::LParen, "(")?;
        let mut args = CallArgs::default();
        loop {
            if self.peek() == Some(Token::RParen) {
                break;
            }
            if let Some(Token::Variable(name)) = self.peek() {
                if self.peek_nth(1) == Some(Token::Colon) {
                    let name = name.to_string();
                    self.advance();
                    self.advance();
                    let mut value = self.parse_space_list()?;
                    value.force_division();
                    args.named.push((name, value));
                    if !self.match_token(Token::Comma) {
                        break;
                    }
                    continue;
                }
            }
            let mut value = self.parse_space_list()?;
            value.force_division();
            args.positional.push(value);
            // Spread markers are accepted and flattened at evaluation time.
            self.match_token(Token::Ellipsis);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(args)
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(Token::LParen, "(")?;
        let mut params = Vec::new();
        loop {
            if self.peek() == Some(Token::RParen) {
                break;
            }
            let name = self.expect_variable()?;
            let default = if self.match_token(Token::Colon) {
                let mut value = self.parse_space_list()?;
                value.force_division();
                Some(value)
            } else {
                None
            };
            let rest = self.match_token(Token::Ellipsis);
            params.push(Param {
                name,
                default,
                rest,
            });
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(params)
    }

    /// Captures a balanced `( ... )` region as raw text.
    fn capture_balanced_parens(&mut self) -> ParseResult<String> {
        let start = self.current_offset();
        self.expect(Token::LParen, "(")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => depth -= 1,
                None => return Err(ParseError::unexpected_eof(self.current_span())),
                _ => {}
            }
            self.advance();
        }
        Ok(self.source[start..self.previous_end()].to_string())
    }

    // ----- token-stream helpers -----

    fn starts_value(&self) -> bool {
        match self.peek() {
            Some(
                Token::Dimension(_)
                | Token::Hash(_)
                | Token::String(_)
                | Token::Url(_)
                | Token::Variable(_)
                | Token::InterpStart
                | Token::LParen,
            ) => true,
            Some(Token::Ident(name)) => !matches!(name, "and" | "or"),
            Some(Token::Minus | Token::Plus) => self.value_follows(self.pos + 1),
            _ => false,
        }
    }

    fn value_follows(&self, index: usize) -> bool {
        matches!(
            self.tokens.get(index).map(|(token, _)| *token),
            Some(
                Token::Dimension(_)
                    | Token::Hash(_)
                    | Token::String(_)
                    | Token::Url(_)
                    | Token::Variable(_)
                    | Token::Ident(_)
                    | Token::InterpStart
                    | Token::LParen
                    | Token::Minus
                    | Token::Plus
            )
        )
    }

    /// True when whitespace (or a comment) separates token `index` from the
    /// one before it.
    fn gap_before(&self, index: usize) -> bool {
        if index == 0 || index > self.tokens.len() {
            return true;
        }
        match (self.tokens.get(index - 1), self.tokens.get(index)) {
            (Some((_, prev)), Some((_, next))) => prev.end != next.start,
            _ => true,
        }
    }

    fn make_binary(&self, op: BinOp, mut lhs: Expr, mut rhs: Expr, start: usize) -> Expr {
        lhs.force_division();
        rhs.force_division();
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            slash_literal: false,
            span: self.span_from(start),
        }
    }

    fn end_statement(&mut self) -> ParseResult<()> {
        match self.peek() {
            Some(Token::Semicolon) => {
                self.advance();
                Ok(())
            }
            Some(Token::RBrace) | None => Ok(()),
            Some(other) => Err(ParseError::unexpected_token(
                self.current_span(),
                ";",
                format!("{:?}", other),
            )),
        }
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn peek_nth(&self, n: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + n).map(|(token, _)| *token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn match_token(&mut self, expected: Token<'src>) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'src>, label: &str) -> ParseResult<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.current_span(),
                label,
                match self.peek() {
                    Some(token) => format!("{:?}", token),
                    None => "end of file".to_string(),
                },
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<&'src str> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::unexpected_token(
                self.current_span(),
                "an identifier",
                match self.peek() {
                    Some(token) => format!("{:?}", token),
                    None => "end of file".to_string(),
                },
            )),
        }
    }

    fn expect_variable(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Variable(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::unexpected_token(
                self.current_span(),
                "a variable",
                match self.peek() {
                    Some(token) => format!("{:?}", token),
                    None => "end of file".to_string(),
                },
            )),
        }
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> ParseResult<()> {
        match self.peek() {
            Some(Token::Ident(name)) if name == keyword => {
                self.advance();
                Ok(())
            }
            _ => Err(ParseError::unexpected_token(
                self.current_span(),
                keyword,
                match self.peek() {
                    Some(token) => format!("{:?}", token),
                    None => "end of file".to_string(),
                },
            )),
        }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, range)| range.start)
            .unwrap_or(self.source.len())
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, range)| range.end)
            .unwrap_or(0)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, range)) => Span::new(range.start, range.end),
            None => Span::new(self.source.len(), self.source.len()),
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous_end().max(start))
    }
}

fn split_dimension(text: &str) -> (f64, Option<String>) {
    let split = text
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(text.len());
    let value = text[..split].parse().unwrap_or(0.0);
    let unit = if split < text.len() {
        Some(text[split..].to_string())
    } else {
        None
    };
    (value, unit)
}

fn is_plain_operand(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Number { .. } | Expr::Ident { .. } | Expr::HexColor { .. } | Expr::Str { .. }
    )
}

/// Strips the surrounding quotes and resolves simple escapes.
pub fn unquote(text: &str) -> String {
    if text.len() < 2 {
        return text.to_string();
    }
    let first = text.chars().next().unwrap();
    if first != '"' && first != '\'' {
        return text.to_string();
    }
    let inner = &text[1..text.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stylesheet(source: &str) -> Stylesheet {
        parse(source).expect("should parse")
    }

    #[test]
    fn parses_nested_rules() {
        let sheet = stylesheet(".a { .b { x: 1; } y: 2; }");
        match &sheet.statements[0] {
            Stmt::RuleSet { selector, body, .. } => {
                assert_eq!(selector.as_plain().map(str::trim), Some(".a"));
                assert_eq!(body.len(), 2);
                assert!(matches!(body[0], Stmt::RuleSet { .. }));
                assert!(matches!(body[1], Stmt::Declaration { .. }));
            }
            other => panic!("expected rule set, got {:?}", other),
        }
    }

    #[test]
    fn parses_variable_declarations() {
        let sheet = stylesheet("$x: 1px !default;");
        match &sheet.statements[0] {
            Stmt::VariableDecl {
                name, default, global, ..
            } => {
                assert_eq!(name, "x");
                assert!(default);
                assert!(!global);
            }
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn parses_extend_with_optional() {
        let sheet = stylesheet(".a { @extend .b !optional; }");
        match &sheet.statements[0] {
            Stmt::RuleSet { body, .. } => match &body[0] {
                Stmt::Extend {
                    selector, optional, ..
                } => {
                    assert_eq!(selector.as_plain().map(str::trim), Some(".b"));
                    assert!(optional);
                }
                other => panic!("expected extend, got {:?}", other),
            },
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn parses_media_with_nested_rules() {
        let sheet = stylesheet("@media screen and (min-width: 100px) { .a { x: 1; } }");
        match &sheet.statements[0] {
            Stmt::Media { query, body, .. } => {
                assert_eq!(
                    query.as_plain().map(str::trim),
                    Some("screen and (min-width: 100px)")
                );
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected media, got {:?}", other),
        }
    }

    #[test]
    fn parses_mixin_and_include() {
        let sheet = stylesheet("@mixin m($a, $b: 2px) { x: $a; } .c { @include m(1px); }");
        match &sheet.statements[0] {
            Stmt::MixinDef { name, params, .. } => {
                assert_eq!(name, "m");
                assert_eq!(params.len(), 2);
                assert!(params[1].default.is_some());
            }
            other => panic!("expected mixin, got {:?}", other),
        }
    }

    #[test]
    fn parses_control_flow() {
        let sheet = stylesheet(
            "@if $x == 1 { a: 1; } @else if $x == 2 { a: 2; } @else { a: 3; }\n\
             @each $i in 1 2 3 { b: $i; }\n\
             @for $i from 1 through 3 { c: $i; }\n\
             @while $i < 3 { d: $i; }",
        );
        assert!(matches!(sheet.statements[0], Stmt::If { .. }));
        assert!(matches!(sheet.statements[1], Stmt::Each { .. }));
        assert!(matches!(sheet.statements[2], Stmt::For { inclusive: true, .. }));
        assert!(matches!(sheet.statements[3], Stmt::While { .. }));
    }

    #[test]
    fn space_vs_comma_lists() {
        let sheet = stylesheet("a { margin: 0 auto; font-family: a, b; }");
        match &sheet.statements[0] {
            Stmt::RuleSet { body, .. } => {
                match &body[0] {
                    Stmt::Declaration { value, .. } => assert!(matches!(
                        value,
                        Expr::List {
                            separator: ListSeparator::Space,
                            ..
                        }
                    )),
                    other => panic!("{:?}", other),
                }
                match &body[1] {
                    Stmt::Declaration { value, .. } => assert!(matches!(
                        value,
                        Expr::List {
                            separator: ListSeparator::Comma,
                            ..
                        }
                    )),
                    other => panic!("{:?}", other),
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn negative_number_in_list_is_not_subtraction() {
        let sheet = stylesheet("a { margin: 10px -5px; }");
        match &sheet.statements[0] {
            Stmt::RuleSet { body, .. } => match &body[0] {
                Stmt::Declaration { value, .. } => match value {
                    Expr::List { items, .. } => assert_eq!(items.len(), 2),
                    other => panic!("expected list, got {:?}", other),
                },
                other => panic!("{:?}", other),
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn literal_slash_is_marked() {
        let sheet = stylesheet("a { font: 16px/1.5; b: (16px/2); }");
        match &sheet.statements[0] {
            Stmt::RuleSet { body, .. } => {
                match &body[0] {
                    Stmt::Declaration { value, .. } => match value {
                        Expr::Binary { slash_literal, .. } => assert!(slash_literal),
                        other => panic!("expected division, got {:?}", other),
                    },
                    other => panic!("{:?}", other),
                }
                match &body[1] {
                    Stmt::Declaration { value, .. } => match value {
                        Expr::Parens { inner, .. } => match inner.as_ref() {
                            Expr::Binary { slash_literal, .. } => assert!(!slash_literal),
                            other => panic!("expected division, got {:?}", other),
                        },
                        other => panic!("expected parens, got {:?}", other),
                    },
                    other => panic!("{:?}", other),
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_maps() {
        let sheet = stylesheet("$m: (a: 1, b: 2);");
        match &sheet.statements[0] {
            Stmt::VariableDecl { value, .. } => match value {
                Expr::Map { entries, .. } => assert_eq!(entries.len(), 2),
                other => panic!("expected map, got {:?}", other),
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_interpolated_selector() {
        let sheet = stylesheet(".a#{$x} { y: 1; }");
        match &sheet.statements[0] {
            Stmt::RuleSet { selector, .. } => {
                assert_eq!(selector.parts.len(), 2);
                assert!(matches!(selector.parts[0], InterpolationPart::Raw(_)));
                assert!(matches!(selector.parts[1], InterpolationPart::Expr(_)));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn calc_bodies_stay_raw() {
        let sheet = stylesheet("a { width: calc(100% - 10px); }");
        match &sheet.statements[0] {
            Stmt::RuleSet { body, .. } => match &body[0] {
                Stmt::Declaration { value, .. } => match value {
                    Expr::Ident { name, .. } => assert_eq!(name, "calc(100% - 10px)"),
                    other => panic!("expected raw calc, got {:?}", other),
                },
                other => panic!("{:?}", other),
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn imports_classify_css_and_sass() {
        let sheet = stylesheet("@import \"base\", \"print.css\", url(x.css);");
        match &sheet.statements[0] {
            Stmt::Import { urls, .. } => {
                assert_eq!(urls.len(), 3);
                assert!(matches!(&urls[0], ImportUrl::Sass(url) if url == "base"));
                assert!(matches!(&urls[1], ImportUrl::Css(_)));
                assert!(matches!(&urls[2], ImportUrl::Css(_)));
            }
            other => panic!("{:?}", other),
        }
    }
}

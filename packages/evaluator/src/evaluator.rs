use crate::builtins::{self, Args};
use crate::css_tree::*;
use crate::environment::Environment;
use crate::error::{EvalError, EvalResult};
use crate::value::{self, named_color, Color, Number, Value};
use cascade_extend::{Extender, ListId, SelectorStore};
use cascade_parser::ast::*;
use cascade_parser::{parse, ListSeparator};
use cascade_selectors::{parse_selector, Component, SelectorList, Span};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// Runaway-recursion guard for rule nesting, mixin expansion, and imports.
const NESTING_LIMIT: usize = 512;

/// A resolved `@import`: the canonical path and the file's contents.
pub struct ResolvedImport {
    pub path: String,
    pub source: String,
}

/// Host-provided importer callback, consulted in registration order before
/// giving up on an `@import` URL.
pub type ImportResolver = Rc<dyn Fn(&str) -> Option<ResolvedImport>>;

/// Host-provided SassScript function.
pub type HostFunction = Rc<dyn Fn(&[Value]) -> Result<Value, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticLevel {
    Warning,
    Debug,
}

/// A non-fatal message collected during evaluation (`@warn`, `@debug`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Span,
}

#[derive(Clone)]
struct MixinDecl {
    params: Vec<Param>,
    body: Vec<Stmt>,
}

#[derive(Clone)]
struct FunctionDecl {
    params: Vec<Param>,
    body: Vec<Stmt>,
}

/// Evaluation context threaded down the statement walk.
#[derive(Clone, Default)]
struct Ctx {
    /// Resolved selector of the enclosing rule, for `&` and implicit
    /// nesting. This is the written selector, not the extended one.
    parent: Option<SelectorList>,
    /// Handle of the enclosing rule; `@extend` reads its current list.
    rule_id: Option<ListId>,
    /// Merged media context (comma-separated queries, split).
    media: Option<Vec<String>>,
    /// Merged media query text.
    media_query: Option<String>,
    in_keyframes: bool,
}

/// Walks the stylesheet AST depth-first, resolving values and selectors,
/// driving the extend engine, and producing the CSS tree.
pub struct Evaluator {
    store: Rc<SelectorStore>,
    extender: Extender,
    env: Environment,
    mixins: HashMap<String, MixinDecl>,
    functions: HashMap<String, FunctionDecl>,
    host_functions: HashMap<String, HostFunction>,
    import_resolvers: Vec<ImportResolver>,
    import_stack: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    precision: usize,
    depth: usize,
    content_stack: Vec<Option<Vec<Stmt>>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_precision(5)
    }

    pub fn with_precision(precision: usize) -> Self {
        let store = Rc::new(SelectorStore::new());
        let extender = Extender::new(store.clone());
        Self {
            store,
            extender,
            env: Environment::new(),
            mixins: HashMap::new(),
            functions: HashMap::new(),
            host_functions: HashMap::new(),
            import_resolvers: Vec::new(),
            import_stack: Vec::new(),
            diagnostics: Vec::new(),
            precision,
            depth: 0,
            content_stack: Vec::new(),
        }
    }

    pub fn store(&self) -> Rc<SelectorStore> {
        self.store.clone()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn register_importer(&mut self, resolver: ImportResolver) {
        self.import_resolvers.push(resolver);
    }

    pub fn register_function(&mut self, name: &str, function: HostFunction) {
        self.host_functions.insert(name.to_string(), function);
    }

    /// Evaluates a stylesheet into the CSS tree, finalizing the extender.
    #[instrument(skip(self, sheet), fields(statements = sheet.statements.len()))]
    pub fn evaluate(&mut self, sheet: &Stylesheet) -> EvalResult<CssRoot> {
        info!("starting evaluation");
        let mut root = Vec::new();
        let ctx = Ctx::default();
        for stmt in &sheet.statements {
            self.visit(stmt, &ctx, &mut root, None)?;
        }

        let failures = self.extender.finalize();
        if let Some(first) = failures.into_iter().next() {
            return Err(first.into());
        }

        let statements = flatten_media(root);
        info!(statements = statements.len(), "evaluation complete");
        Ok(CssRoot { statements })
    }

    fn visit(
        &mut self,
        stmt: &Stmt,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        match stmt {
            Stmt::RuleSet {
                selector,
                body,
                span,
            } => self.visit_rule_set(selector, body, *span, ctx, out),
            Stmt::Declaration {
                name,
                value,
                important,
                span,
            } => self.visit_declaration(name, value, *important, *span, out, rule_index),
            Stmt::VariableDecl {
                name,
                value,
                default,
                global,
                ..
            } => {
                let value = self.eval_expr(value)?;
                self.env.set(name, value, *global, *default);
                Ok(())
            }
            Stmt::Extend {
                selector,
                optional,
                span,
            } => self.visit_extend(selector, *optional, *span, ctx),
            Stmt::Media { query, body, span } => {
                self.visit_media(query, body, *span, ctx, out)
            }
            Stmt::AtRule {
                name,
                prelude,
                body,
                span,
            } => self.visit_at_rule(name, prelude, body.as_deref(), *span, ctx, out),
            Stmt::MixinDef {
                name, params, body, ..
            } => {
                self.mixins.insert(
                    name.clone(),
                    MixinDecl {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
                Ok(())
            }
            Stmt::Include {
                name,
                args,
                body,
                span,
            } => self.visit_include(name, args, body.as_deref(), *span, ctx, out, rule_index),
            Stmt::Content { .. } => {
                let content = self.content_stack.last().cloned().flatten();
                if let Some(stmts) = content {
                    // Content blocks must not see the mixin's own @content.
                    self.content_stack.push(None);
                    for stmt in &stmts {
                        self.visit(stmt, ctx, out, rule_index)?;
                    }
                    self.content_stack.pop();
                }
                Ok(())
            }
            Stmt::FunctionDef {
                name, params, body, ..
            } => {
                self.functions.insert(
                    name.clone(),
                    FunctionDecl {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
                Ok(())
            }
            Stmt::Return { span, .. } => Err(EvalError::UserError {
                message: "@return may only be used within a function".to_string(),
                span: *span,
            }),
            Stmt::If {
                branches,
                else_body,
                ..
            } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition)?.is_truthy() {
                        return self.visit_scoped(body, ctx, out, rule_index);
                    }
                }
                if let Some(body) = else_body {
                    return self.visit_scoped(body, ctx, out, rule_index);
                }
                Ok(())
            }
            Stmt::Each {
                names, list, body, ..
            } => {
                let items = self.eval_expr(list)?.as_items();
                for item in items {
                    self.env.push_scope();
                    bind_each_names(&mut self.env, names, &item);
                    let result = self.visit_all(body, ctx, out, rule_index);
                    self.env.pop_scope();
                    result?;
                }
                Ok(())
            }
            Stmt::For {
                name,
                from,
                to,
                inclusive,
                body,
                ..
            } => {
                let from = self.expect_number(from)?;
                let to = self.expect_number(to)?;
                let mut i = from.value;
                let ascending = from.value <= to.value;
                loop {
                    let done = if *inclusive {
                        if ascending { i > to.value } else { i < to.value }
                    } else if ascending {
                        i >= to.value
                    } else {
                        i <= to.value
                    };
                    if done {
                        break;
                    }
                    self.env.push_scope();
                    self.env.define_local(
                        name,
                        Value::Number(Number {
                            value: i,
                            numerator_units: from.numerator_units.clone(),
                            denominator_units: Vec::new(),
                        }),
                    );
                    let result = self.visit_all(body, ctx, out, rule_index);
                    self.env.pop_scope();
                    result?;
                    i += if ascending { 1.0 } else { -1.0 };
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => {
                let mut guard = 0usize;
                while self.eval_expr(condition)?.is_truthy() {
                    guard += 1;
                    if guard > 100_000 {
                        return Err(EvalError::NestingLimit {
                            span: condition.span(),
                        });
                    }
                    self.visit_scoped(body, ctx, out, rule_index)?;
                }
                Ok(())
            }
            Stmt::Warn { value, span } => {
                let message = self.eval_expr(value)?.inspect(self.precision);
                warn!(%message, "@warn");
                self.diagnostics.push(Diagnostic {
                    level: DiagnosticLevel::Warning,
                    message,
                    span: *span,
                });
                Ok(())
            }
            Stmt::Debug { value, span } => {
                let message = self.eval_expr(value)?.inspect(self.precision);
                debug!(%message, "@debug");
                self.diagnostics.push(Diagnostic {
                    level: DiagnosticLevel::Debug,
                    message,
                    span: *span,
                });
                Ok(())
            }
            Stmt::Error { value, span } => Err(EvalError::UserError {
                message: self.eval_expr(value)?.inspect(self.precision),
                span: *span,
            }),
            Stmt::Import { urls, span } => {
                for url in urls {
                    match url {
                        ImportUrl::Css(text) => out.push(CssStmt::Import {
                            url: text.clone(),
                            span: *span,
                        }),
                        ImportUrl::Sass(target) => {
                            self.import_sass(target, *span, ctx, out, rule_index)?
                        }
                    }
                }
                Ok(())
            }
            Stmt::Comment { text, loud, span } => {
                out.push(CssStmt::Comment(CssComment {
                    text: text.clone(),
                    loud: *loud,
                    span: *span,
                }));
                Ok(())
            }
        }
    }

    fn visit_all(
        &mut self,
        stmts: &[Stmt],
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        for stmt in stmts {
            self.visit(stmt, ctx, out, rule_index)?;
        }
        Ok(())
    }

    fn visit_scoped(
        &mut self,
        stmts: &[Stmt],
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        self.env.push_scope();
        let result = self.visit_all(stmts, ctx, out, rule_index);
        self.env.pop_scope();
        result
    }

    fn visit_rule_set(
        &mut self,
        selector: &Interpolation,
        body: &[Stmt],
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
    ) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > NESTING_LIMIT {
            self.depth -= 1;
            return Err(EvalError::NestingLimit { span });
        }
        let result = self.visit_rule_set_inner(selector, body, span, ctx, out);
        self.depth -= 1;
        result
    }

    fn visit_rule_set_inner(
        &mut self,
        selector: &Interpolation,
        body: &[Stmt],
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
    ) -> EvalResult<()> {
        let text = self.resolve_interpolation(selector)?;
        let text = text.trim();

        if ctx.in_keyframes {
            out.push(CssStmt::Rule(CssRule {
                selector: CssSelector::Raw(text.to_string()),
                declarations: Vec::new(),
                span,
            }));
            let rule_index = out.len() - 1;
            self.env.push_scope();
            let result = self.visit_all(body, ctx, out, Some(rule_index));
            self.env.pop_scope();
            return result;
        }

        let list = parse_selector(text)?;
        let resolved = list.resolve_parent(ctx.parent.as_ref(), true)?;
        let id = self.store.insert(resolved.clone());
        self.extender.add_selector(id, ctx.media.clone());
        debug!(selector = %resolved, "visiting style rule");

        out.push(CssStmt::Rule(CssRule {
            selector: CssSelector::Handle(id),
            declarations: Vec::new(),
            span,
        }));
        let rule_index = out.len() - 1;

        let child_ctx = Ctx {
            parent: Some(resolved),
            rule_id: Some(id),
            ..ctx.clone()
        };
        self.env.push_scope();
        let result = self.visit_all(body, &child_ctx, out, Some(rule_index));
        self.env.pop_scope();
        result
    }

    fn visit_declaration(
        &mut self,
        name: &Interpolation,
        value: &Expr,
        important: bool,
        span: Span,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        let index = rule_index.ok_or_else(|| EvalError::UserError {
            message: "Declarations may only be used within style rules.".to_string(),
            span,
        })?;
        let name_span = name.span;
        let value_span = value.span();
        let name = self.resolve_interpolation(name)?.trim().to_string();
        let value = self.eval_expr(value)?;
        // Emission must never fail, so values are validated here.
        if !value.is_null() {
            value.to_css_string(self.precision, true).map_err(|error| {
                match error {
                    EvalError::InvalidValue { value, .. } => EvalError::InvalidValue {
                        value,
                        span: value_span,
                    },
                    other => other,
                }
            })?;
        }

        // Nulls and empty values produce no CSS at all.
        if value.is_null() {
            return Ok(());
        }
        if let Value::Str(string) = &value {
            if !string.quoted && string.text.is_empty() {
                return Ok(());
            }
        }
        if let Value::List { items, .. } = &value {
            if items.iter().all(Value::is_null) {
                return Ok(());
            }
        }

        if let Some(CssStmt::Rule(rule)) = out.get_mut(index) {
            rule.declarations.push(CssDeclaration {
                name,
                value,
                important,
                name_span,
                value_span,
            });
        }
        Ok(())
    }

    fn visit_extend(
        &mut self,
        selector: &Interpolation,
        optional: bool,
        span: Span,
        ctx: &Ctx,
    ) -> EvalResult<()> {
        let rule_id = ctx.rule_id.ok_or_else(|| EvalError::UserError {
            message: "@extend may only be used within style rules.".to_string(),
            span,
        })?;
        let text = self.resolve_interpolation(selector)?;
        let targets = parse_selector(text.trim())?;

        // The extender is the rule's current selector list, so extensions
        // already applied to it carry through (extend is transitive).
        let extender_list = self.store.get(rule_id);

        for complex in &targets.members {
            let compound = match complex.implicit_components().as_slice() {
                [Component::Compound(compound)] => compound.clone(),
                _ => {
                    return Err(EvalError::UserError {
                        message: format!("complex selectors may not be extended: \"{}\"", complex),
                        span,
                    })
                }
            };
            for simple in &compound.parts {
                self.extender.add_extension(
                    &extender_list,
                    simple,
                    optional,
                    ctx.media.clone(),
                    span,
                );
            }
        }
        Ok(())
    }

    fn visit_media(
        &mut self,
        query: &Interpolation,
        body: &[Stmt],
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
    ) -> EvalResult<()> {
        let query_text = self.resolve_interpolation(query)?;
        let merged = merge_media_queries(ctx.media_query.as_deref(), query_text.trim());
        let context = split_media_queries(&merged);

        let mut media_body = Vec::new();
        let mut child_ctx = Ctx {
            media: Some(context.clone()),
            media_query: Some(merged.clone()),
            ..ctx.clone()
        };

        // Declarations directly under @media inside a rule re-wrap in the
        // enclosing rule's selector.
        let mut rule_index = None;
        if let Some(parent) = &ctx.parent {
            let id = self.store.insert(parent.clone());
            self.extender.add_selector(id, Some(context.clone()));
            media_body.push(CssStmt::Rule(CssRule {
                selector: CssSelector::Handle(id),
                declarations: Vec::new(),
                span,
            }));
            rule_index = Some(0);
            child_ctx.rule_id = Some(id);
        }

        self.env.push_scope();
        let result = self.visit_all(body, &child_ctx, &mut media_body, rule_index);
        self.env.pop_scope();
        result?;

        out.push(CssStmt::Media(CssMediaRule {
            query: merged,
            context,
            body: media_body,
            span,
        }));
        Ok(())
    }

    fn visit_at_rule(
        &mut self,
        name: &str,
        prelude: &Interpolation,
        body: Option<&[Stmt]>,
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
    ) -> EvalResult<()> {
        let prelude = self.resolve_interpolation(prelude)?.trim().to_string();
        let body = match body {
            None => None,
            Some(stmts) => {
                let child_ctx = Ctx {
                    in_keyframes: ctx.in_keyframes || name.contains("keyframes"),
                    parent: if name.contains("keyframes") {
                        None
                    } else {
                        ctx.parent.clone()
                    },
                    ..ctx.clone()
                };
                let mut at_body = Vec::new();
                self.env.push_scope();
                let result = self.visit_all(stmts, &child_ctx, &mut at_body, None);
                self.env.pop_scope();
                result?;
                Some(at_body)
            }
        };
        out.push(CssStmt::AtRule(CssAtRule {
            name: name.to_string(),
            prelude,
            body,
            span,
        }));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_include(
        &mut self,
        name: &str,
        args: &CallArgs,
        body: Option<&[Stmt]>,
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > NESTING_LIMIT {
            self.depth -= 1;
            return Err(EvalError::NestingLimit { span });
        }

        let mixin = match self.mixins.get(name) {
            Some(mixin) => mixin.clone(),
            None => {
                self.depth -= 1;
                return Err(EvalError::UndefinedMixin {
                    name: name.to_string(),
                    span,
                });
            }
        };

        let result = (|| {
            let bound = self.eval_call_args(args, span)?;
            self.env.push_scope();
            let bind_result = self.bind_params(&mixin.params, bound, span);
            let result = bind_result.and_then(|()| {
                self.content_stack.push(body.map(|stmts| stmts.to_vec()));
                let visit_result = self.visit_all(&mixin.body, ctx, out, rule_index);
                self.content_stack.pop();
                visit_result
            });
            self.env.pop_scope();
            result
        })();
        self.depth -= 1;
        result
    }

    fn import_sass(
        &mut self,
        target: &str,
        span: Span,
        ctx: &Ctx,
        out: &mut Vec<CssStmt>,
        rule_index: Option<usize>,
    ) -> EvalResult<()> {
        let resolved = self
            .import_resolvers
            .iter()
            .find_map(|resolver| resolver(target))
            .ok_or_else(|| EvalError::UserError {
                message: format!("File to import not found or unreadable: {}", target),
                span,
            })?;
        if self.import_stack.contains(&resolved.path) {
            return Err(EvalError::UserError {
                message: format!("Circular import of {}", resolved.path),
                span,
            });
        }
        let sheet = parse(&resolved.source).map_err(|error| EvalError::UserError {
            message: format!("Error in {}: {}", resolved.path, error),
            span: error.span(),
        })?;
        self.import_stack.push(resolved.path);
        let result = self.visit_all(&sheet.statements, ctx, out, rule_index);
        self.import_stack.pop();
        result
    }

    // ----- expressions -----

    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number { value, unit, .. } => Ok(Value::number(*value, unit.as_deref())),
            Expr::HexColor { hex, span } => {
                Color::from_hex(hex).map(Value::Color).ok_or_else(|| {
                    EvalError::InvalidValue {
                        value: format!("#{}", hex),
                        span: *span,
                    }
                })
            }
            Expr::Str { value, .. } => Ok(Value::string(value.clone(), true)),
            Expr::Ident { name, .. } => Ok(match name.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => match named_color(name) {
                    Some(color) => Value::Color(color),
                    None => Value::string(name.clone(), false),
                },
            }),
            Expr::Variable { name, span } => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable {
                    name: name.clone(),
                    span: *span,
                }),
            Expr::List { items, separator, .. } => Ok(Value::List {
                items: items
                    .iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<EvalResult<_>>()?,
                separator: *separator,
            }),
            Expr::Map { entries, .. } => {
                let mut map = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    map.push((self.eval_expr(key)?, self.eval_expr(value)?));
                }
                Ok(Value::Map(map))
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                slash_literal,
                span,
            } => self.eval_binary(*op, lhs, rhs, *slash_literal, *span),
            Expr::Unary { op, operand, span } => {
                let operand = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Neg => match operand {
                        Value::Number(mut number) => {
                            number.value = -number.value;
                            Ok(Value::Number(number))
                        }
                        other => Ok(Value::string(
                            format!("-{}", other.to_css_string(self.precision, true)?),
                            false,
                        )),
                    },
                    UnaryOp::Plus => match operand {
                        Value::Number(number) => Ok(Value::Number(number)),
                        other => Err(EvalError::UndefinedOperation {
                            lhs: "+".to_string(),
                            op: "unary".to_string(),
                            rhs: other.inspect(self.precision),
                            span: *span,
                        }),
                    },
                }
            }
            Expr::FunctionCall { name, args, span } => self.eval_call(name, args, *span),
            Expr::Interp(interp) => {
                Ok(Value::string(self.resolve_interpolation(interp)?, false))
            }
            Expr::Parens { inner, .. } => match inner.as_ref() {
                // Parenthesized comma lists stay lists.
                list @ Expr::List { .. } => self.eval_expr(list),
                other => self.eval_expr(other),
            },
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        slash_literal: bool,
        span: Span,
    ) -> EvalResult<Value> {
        if op == BinOp::And {
            let lhs = self.eval_expr(lhs)?;
            return if lhs.is_truthy() {
                self.eval_expr(rhs)
            } else {
                Ok(lhs)
            };
        }
        if op == BinOp::Or {
            let lhs = self.eval_expr(lhs)?;
            return if lhs.is_truthy() {
                Ok(lhs)
            } else {
                self.eval_expr(rhs)
            };
        }

        let left = self.eval_expr(lhs)?;
        let right = self.eval_expr(rhs)?;

        match op {
            BinOp::Add => value::add(&left, &right, span),
            BinOp::Sub => value::subtract(&left, &right, span),
            BinOp::Mul => value::multiply(&left, &right, span),
            BinOp::Div => {
                // A literal slash between plain values is CSS, not division.
                if slash_literal {
                    return Ok(Value::string(
                        format!(
                            "{}/{}",
                            left.to_css_string(self.precision, true)?,
                            right.to_css_string(self.precision, true)?
                        ),
                        false,
                    ));
                }
                value::divide(&left, &right, span)
            }
            BinOp::Mod => value::modulo(&left, &right, span),
            BinOp::Eq => Ok(Value::Bool(value::values_equal(&left, &right))),
            BinOp::Ne => Ok(Value::Bool(!value::values_equal(&left, &right))),
            BinOp::Lt => Ok(Value::Bool(
                value::compare(&left, &right, span)? == std::cmp::Ordering::Less,
            )),
            BinOp::Le => Ok(Value::Bool(
                value::compare(&left, &right, span)? != std::cmp::Ordering::Greater,
            )),
            BinOp::Gt => Ok(Value::Bool(
                value::compare(&left, &right, span)? == std::cmp::Ordering::Greater,
            )),
            BinOp::Ge => Ok(Value::Bool(
                value::compare(&left, &right, span)? != std::cmp::Ordering::Less,
            )),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_call(&mut self, name: &str, args: &CallArgs, span: Span) -> EvalResult<Value> {
        // User-defined functions shadow built-ins.
        if let Some(function) = self.functions.get(name).cloned() {
            let bound = self.eval_call_args(args, span)?;
            self.env.push_scope();
            let result = self
                .bind_params(&function.params, bound, span)
                .and_then(|()| self.exec_function_body(&function.body, span));
            self.env.pop_scope();
            return result;
        }

        if let Some(host) = self.host_functions.get(name).cloned() {
            let (positional, _) = self.eval_call_args(args, span)?;
            return host(&positional).map_err(|message| EvalError::UserError { message, span });
        }

        // Introspection functions need the evaluator's own state.
        match name {
            "variable-exists" => {
                let (positional, _) = self.eval_call_args(args, span)?;
                if let Some(Value::Str(string)) = positional.first() {
                    return Ok(Value::Bool(self.env.has(&string.text)));
                }
            }
            "global-variable-exists" => {
                let (positional, _) = self.eval_call_args(args, span)?;
                if let Some(Value::Str(string)) = positional.first() {
                    return Ok(Value::Bool(self.env.has_global(&string.text)));
                }
            }
            "function-exists" => {
                let (positional, _) = self.eval_call_args(args, span)?;
                if let Some(Value::Str(string)) = positional.first() {
                    let name = string.text.as_str();
                    let exists = self.functions.contains_key(name)
                        || self.host_functions.contains_key(name)
                        || is_builtin(name);
                    return Ok(Value::Bool(exists));
                }
            }
            "mixin-exists" => {
                let (positional, _) = self.eval_call_args(args, span)?;
                if let Some(Value::Str(string)) = positional.first() {
                    return Ok(Value::Bool(self.mixins.contains_key(&string.text)));
                }
            }
            _ => {}
        }

        let (positional, named) = self.eval_call_args(args, span)?;
        let builtin_args = Args {
            positional,
            named,
            span,
            precision: self.precision,
        };
        if let Some(result) = builtins::dispatch(name, &builtin_args) {
            return result;
        }

        // Unknown functions are plain CSS (var(), translate(), ...).
        let rendered: Vec<String> = builtin_args
            .positional
            .iter()
            .map(|value| value.to_css_string(self.precision, true))
            .collect::<EvalResult<_>>()?;
        Ok(Value::string(
            format!("{}({})", name, rendered.join(", ")),
            false,
        ))
    }

    #[allow(clippy::type_complexity)]
    fn eval_call_args(
        &mut self,
        args: &CallArgs,
        _span: Span,
    ) -> EvalResult<(Vec<Value>, Vec<(String, Value)>)> {
        let mut positional = Vec::with_capacity(args.positional.len());
        for arg in &args.positional {
            positional.push(self.eval_expr(arg)?);
        }
        let mut named = Vec::with_capacity(args.named.len());
        for (name, arg) in &args.named {
            named.push((name.clone(), self.eval_expr(arg)?));
        }
        Ok((positional, named))
    }

    fn bind_params(
        &mut self,
        params: &[Param],
        (positional, named): (Vec<Value>, Vec<(String, Value)>),
        span: Span,
    ) -> EvalResult<()> {
        let mut positional = positional.into_iter();
        for param in params {
            if param.rest {
                let rest: Vec<Value> = positional.by_ref().collect();
                self.env.define_local(
                    &param.name,
                    Value::List {
                        items: rest,
                        separator: ListSeparator::Comma,
                    },
                );
                return Ok(());
            }
            let by_name = named
                .iter()
                .find(|(name, _)| *name == param.name)
                .map(|(_, value)| value.clone());
            let value = match by_name.or_else(|| positional.next()) {
                Some(value) => value,
                None => match &param.default {
                    Some(default) => self.eval_expr(default)?,
                    None => {
                        return Err(EvalError::InvalidArguments {
                            message: format!("Missing argument ${}.", param.name),
                            span,
                        })
                    }
                },
            };
            self.env.define_local(&param.name, value);
        }
        if positional.next().is_some() {
            return Err(EvalError::InvalidArguments {
                message: "wrong number of arguments".to_string(),
                span,
            });
        }
        Ok(())
    }

    fn exec_function_body(&mut self, body: &[Stmt], span: Span) -> EvalResult<Value> {
        match self.exec_stmts(body)? {
            Some(value) => Ok(value),
            None => Err(EvalError::UserError {
                message: "Function finished without @return.".to_string(),
                span,
            }),
        }
    }

    /// Statement execution inside function bodies: no CSS may be produced,
    /// and `@return` short-circuits.
    fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<Option<Value>> {
        for stmt in stmts {
            match stmt {
                Stmt::Return { value, .. } => {
                    return Ok(Some(self.eval_expr(value)?));
                }
                Stmt::VariableDecl {
                    name,
                    value,
                    default,
                    global,
                    ..
                } => {
                    let value = self.eval_expr(value)?;
                    self.env.set(name, value, *global, *default);
                }
                Stmt::If {
                    branches,
                    else_body,
                    ..
                } => {
                    let mut taken = false;
                    for (condition, body) in branches {
                        if self.eval_expr(condition)?.is_truthy() {
                            taken = true;
                            self.env.push_scope();
                            let result = self.exec_stmts(body);
                            self.env.pop_scope();
                            if let Some(value) = result? {
                                return Ok(Some(value));
                            }
                            break;
                        }
                    }
                    if !taken {
                        if let Some(body) = else_body {
                            self.env.push_scope();
                            let result = self.exec_stmts(body);
                            self.env.pop_scope();
                            if let Some(value) = result? {
                                return Ok(Some(value));
                            }
                        }
                    }
                }
                Stmt::Each {
                    names, list, body, ..
                } => {
                    for item in self.eval_expr(list)?.as_items() {
                        self.env.push_scope();
                        bind_each_names(&mut self.env, names, &item);
                        let result = self.exec_stmts(body);
                        self.env.pop_scope();
                        if let Some(value) = result? {
                            return Ok(Some(value));
                        }
                    }
                }
                Stmt::For {
                    name,
                    from,
                    to,
                    inclusive,
                    body,
                    ..
                } => {
                    let from = self.expect_number(from)?;
                    let to = self.expect_number(to)?;
                    let mut i = from.value;
                    let ascending = from.value <= to.value;
                    loop {
                        let done = if *inclusive {
                            if ascending { i > to.value } else { i < to.value }
                        } else if ascending {
                            i >= to.value
                        } else {
                            i <= to.value
                        };
                        if done {
                            break;
                        }
                        self.env.push_scope();
                        self.env
                            .define_local(name, Value::Number(Number::unitless(i)));
                        let result = self.exec_stmts(body);
                        self.env.pop_scope();
                        if let Some(value) = result? {
                            return Ok(Some(value));
                        }
                        i += if ascending { 1.0 } else { -1.0 };
                    }
                }
                Stmt::While {
                    condition, body, ..
                } => {
                    while self.eval_expr(condition)?.is_truthy() {
                        self.env.push_scope();
                        let result = self.exec_stmts(body);
                        self.env.pop_scope();
                        if let Some(value) = result? {
                            return Ok(Some(value));
                        }
                    }
                }
                Stmt::Warn { value, span } => {
                    let message = self.eval_expr(value)?.inspect(self.precision);
                    self.diagnostics.push(Diagnostic {
                        level: DiagnosticLevel::Warning,
                        message,
                        span: *span,
                    });
                }
                Stmt::Debug { value, span } => {
                    let message = self.eval_expr(value)?.inspect(self.precision);
                    self.diagnostics.push(Diagnostic {
                        level: DiagnosticLevel::Debug,
                        message,
                        span: *span,
                    });
                }
                Stmt::Error { value, span } => {
                    return Err(EvalError::UserError {
                        message: self.eval_expr(value)?.inspect(self.precision),
                        span: *span,
                    })
                }
                other => {
                    return Err(EvalError::UserError {
                        message: "This at-rule is not allowed here.".to_string(),
                        span: statement_span(other),
                    })
                }
            }
        }
        Ok(None)
    }

    fn expect_number(&mut self, expr: &Expr) -> EvalResult<Number> {
        match self.eval_expr(expr)? {
            Value::Number(number) => Ok(number),
            other => Err(EvalError::InvalidArguments {
                message: format!("{} is not a number.", other.inspect(self.precision)),
                span: expr.span(),
            }),
        }
    }

    fn resolve_interpolation(&mut self, interp: &Interpolation) -> EvalResult<String> {
        let mut out = String::new();
        for part in &interp.parts {
            match part {
                InterpolationPart::Raw(text) => out.push_str(text),
                InterpolationPart::Expr(expr) => {
                    let value = self.eval_expr(expr)?;
                    out.push_str(&value.to_css_string(self.precision, false)?);
                }
            }
        }
        Ok(out)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_each_names(env: &mut Environment, names: &[String], item: &Value) {
    if names.len() == 1 {
        env.define_local(&names[0], item.clone());
        return;
    }
    let items = item.as_items();
    for (i, name) in names.iter().enumerate() {
        env.define_local(name, items.get(i).cloned().unwrap_or(Value::Null));
    }
}

fn statement_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::RuleSet { span, .. }
        | Stmt::Declaration { span, .. }
        | Stmt::VariableDecl { span, .. }
        | Stmt::Extend { span, .. }
        | Stmt::Media { span, .. }
        | Stmt::AtRule { span, .. }
        | Stmt::MixinDef { span, .. }
        | Stmt::Include { span, .. }
        | Stmt::Content { span }
        | Stmt::FunctionDef { span, .. }
        | Stmt::Return { span, .. }
        | Stmt::If { span, .. }
        | Stmt::Each { span, .. }
        | Stmt::For { span, .. }
        | Stmt::While { span, .. }
        | Stmt::Warn { span, .. }
        | Stmt::Debug { span, .. }
        | Stmt::Error { span, .. }
        | Stmt::Import { span, .. }
        | Stmt::Comment { span, .. } => *span,
    }
}

fn is_builtin(name: &str) -> bool {
    let probe = Args {
        positional: Vec::new(),
        named: Vec::new(),
        span: Span::phony(),
        precision: 5,
    };
    builtins::dispatch(name, &probe).is_some()
}

/// Combines a parent media query with a nested one: every parent branch
/// pairs with every child branch via `and`.
fn merge_media_queries(parent: Option<&str>, child: &str) -> String {
    let parent = match parent {
        None => return child.to_string(),
        Some(parent) => parent,
    };
    let mut merged = Vec::new();
    for outer in split_media_queries(parent) {
        for inner in split_media_queries(child) {
            merged.push(format!("{} and {}", outer, inner));
        }
    }
    merged.join(", ")
}

/// Splits a media query list on top-level commas.
fn split_media_queries(query: &str) -> Vec<String> {
    let mut queries = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in query.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                queries.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        queries.push(current.trim().to_string());
    }
    queries
}

/// Hoists media rules nested inside other media rules (their queries were
/// already merged during evaluation) up to the level of their parent.
fn flatten_media(statements: Vec<CssStmt>) -> Vec<CssStmt> {
    let mut result = Vec::new();
    for stmt in statements {
        match stmt {
            CssStmt::Media(mut media) => {
                let mut hoisted = Vec::new();
                media.body = extract_nested_media(media.body, &mut hoisted);
                result.push(CssStmt::Media(media));
                result.extend(flatten_media(hoisted));
            }
            other => result.push(other),
        }
    }
    result
}

fn extract_nested_media(body: Vec<CssStmt>, hoisted: &mut Vec<CssStmt>) -> Vec<CssStmt> {
    let mut kept = Vec::new();
    for stmt in body {
        match stmt {
            CssStmt::Media(media) => hoisted.push(CssStmt::Media(media)),
            other => kept.push(other),
        }
    }
    kept
}

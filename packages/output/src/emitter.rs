use crate::inspect::write_value;
use cascade_evaluator::{
    CssAtRule, CssComment, CssMediaRule, CssRoot, CssRule, CssSelector, CssStmt,
};
use cascade_extend::SelectorStore;
use cascade_selectors::Span;
use cascade_sourcemap::{offset_to_line_number, SourceMapBuilder};
use serde::{Deserialize, Serialize};

/// The four CSS output styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputStyle {
    #[default]
    Nested,
    Expanded,
    Compact,
    Compressed,
}

/// Explicit options for every emitter call; nothing is read from globals.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub style: OutputStyle,
    pub precision: usize,
    pub linefeed: String,
    pub indent: String,
    pub source_comments: bool,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            style: OutputStyle::Nested,
            precision: 5,
            linefeed: "\n".to_string(),
            indent: "  ".to_string(),
            source_comments: false,
        }
    }
}

/// Serializes the evaluated CSS tree. Mappings are recorded around every
/// selector and every declaration's property and value when a source-map
/// builder is supplied. Emission itself cannot fail: values were validated
/// during evaluation.
pub fn emit(
    root: &CssRoot,
    store: &SelectorStore,
    options: &InspectOptions,
    source: Option<&str>,
    source_path: Option<&str>,
    map: Option<&mut SourceMapBuilder>,
) -> String {
    let mut emitter = Emitter {
        options,
        store,
        map,
        source,
        source_path,
        out: String::new(),
    };

    // Plain-CSS imports hoist to the top of the file.
    for stmt in &root.statements {
        if let CssStmt::Import { url, .. } = stmt {
            emitter.emit_import(url);
        }
    }
    let body: Vec<&CssStmt> = root
        .statements
        .iter()
        .filter(|stmt| !matches!(stmt, CssStmt::Import { .. }))
        .collect();
    emitter.emit_children(&body, 0);

    let mut css = emitter.out;
    if !css.is_empty() && !css.ends_with(&options.linefeed) {
        css.push_str(&options.linefeed);
    }

    // Declare the charset when any non-ASCII byte made it into the output.
    if css.bytes().any(|byte| byte >= 0x80) {
        if options.style == OutputStyle::Compressed {
            css.insert(0, '\u{feff}');
        } else {
            css.insert_str(0, &format!("@charset \"UTF-8\";{}", options.linefeed));
        }
    }
    css
}

struct Emitter<'a> {
    options: &'a InspectOptions,
    store: &'a SelectorStore,
    map: Option<&'a mut SourceMapBuilder>,
    source: Option<&'a str>,
    source_path: Option<&'a str>,
    out: String,
}

impl<'a> Emitter<'a> {
    fn write(&mut self, text: &str) {
        if let Some(map) = self.map.as_deref_mut() {
            map.advance(text);
        }
        self.out.push_str(text);
    }

    fn write_linefeed(&mut self) {
        let linefeed = self.options.linefeed.clone();
        self.write(&linefeed);
    }

    fn write_indent(&mut self, level: usize) {
        if self.options.style == OutputStyle::Compressed {
            return;
        }
        let indent = self.options.indent.repeat(level);
        self.write(&indent);
    }

    fn map_open(&mut self, span: Span) {
        if span.is_phony() {
            return;
        }
        if let Some(map) = self.map.as_deref_mut() {
            map.add_mapping(span.start);
        }
    }

    fn map_close(&mut self, span: Span) {
        if span.is_phony() {
            return;
        }
        if let Some(map) = self.map.as_deref_mut() {
            map.add_mapping(span.end);
        }
    }

    fn is_printable(&self, stmt: &CssStmt) -> bool {
        match stmt {
            CssStmt::Rule(rule) => {
                if rule.declarations.is_empty() {
                    return false;
                }
                match &rule.selector {
                    CssSelector::Raw(_) => true,
                    CssSelector::Handle(id) => !self.store.get(*id).is_invisible(),
                }
            }
            CssStmt::Media(media) => media.body.iter().any(|inner| self.is_printable(inner)),
            CssStmt::AtRule(_) => true,
            CssStmt::Comment(comment) => {
                comment.loud || self.options.style != OutputStyle::Compressed
            }
            CssStmt::Import { .. } => true,
        }
    }

    fn emit_children(&mut self, stmts: &[&CssStmt], level: usize) {
        let mut first = true;
        for stmt in stmts {
            if !self.is_printable(stmt) {
                continue;
            }
            if !first && self.options.style == OutputStyle::Expanded {
                self.write_linefeed();
            }
            self.emit_stmt(stmt, level);
            first = false;
        }
    }

    fn emit_stmt(&mut self, stmt: &CssStmt, level: usize) {
        match stmt {
            CssStmt::Rule(rule) => self.emit_rule(rule, level),
            CssStmt::Media(media) => self.emit_media(media, level),
            CssStmt::AtRule(at_rule) => self.emit_at_rule(at_rule, level),
            CssStmt::Comment(comment) => self.emit_comment(comment, level),
            CssStmt::Import { .. } => {}
        }
    }

    fn emit_import(&mut self, url: &str) {
        self.write("@import ");
        self.write(url);
        self.write(";");
        if self.options.style != OutputStyle::Compressed {
            self.write_linefeed();
        }
    }

    fn emit_rule(&mut self, rule: &CssRule, level: usize) {
        if self.options.source_comments {
            if let (Some(source), false) = (self.source, rule.span.is_phony()) {
                let line = offset_to_line_number(source, rule.span.start);
                let path = self.source_path.unwrap_or("stdin");
                self.write_indent(level);
                let annotation = format!("/* line {}, {} */", line, path);
                self.write(&annotation);
                self.write_linefeed();
            }
        }

        self.write_indent(level);
        self.map_open(rule.span);
        self.write_selector(rule, level);
        self.map_close(rule.span);

        let compressed = self.options.style == OutputStyle::Compressed;
        match self.options.style {
            OutputStyle::Compressed => {
                self.write("{");
                for (i, declaration) in rule.declarations.iter().enumerate() {
                    if i > 0 {
                        self.write(";");
                    }
                    self.emit_declaration(declaration, compressed);
                }
                self.write("}");
            }
            OutputStyle::Compact => {
                self.write(" { ");
                for declaration in &rule.declarations {
                    self.emit_declaration(declaration, compressed);
                    self.write("; ");
                }
                self.write("}");
                self.write_linefeed();
            }
            OutputStyle::Nested => {
                self.write(" {");
                self.write_linefeed();
                let last = rule.declarations.len().saturating_sub(1);
                for (i, declaration) in rule.declarations.iter().enumerate() {
                    self.write_indent(level + 1);
                    self.emit_declaration(declaration, compressed);
                    self.write(";");
                    if i == last {
                        self.write(" }");
                        self.write_linefeed();
                    } else {
                        self.write_linefeed();
                    }
                }
            }
            OutputStyle::Expanded => {
                self.write(" {");
                self.write_linefeed();
                for declaration in &rule.declarations {
                    self.write_indent(level + 1);
                    self.emit_declaration(declaration, compressed);
                    self.write(";");
                    self.write_linefeed();
                }
                self.write_indent(level);
                self.write("}");
                self.write_linefeed();
            }
        }
    }

    fn write_selector(&mut self, rule: &CssRule, level: usize) {
        let compressed = self.options.style == OutputStyle::Compressed;
        match &rule.selector {
            CssSelector::Raw(text) => self.write(text),
            CssSelector::Handle(id) => {
                let list = self.store.get(*id);
                // Placeholder-bearing members never reach the output.
                let members: Vec<_> = list
                    .members
                    .iter()
                    .filter(|member| !member.is_invisible())
                    .collect();
                for (i, member) in members.into_iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                        if compressed {
                            // No whitespace at all.
                        } else if member.line_break
                            && self.options.style != OutputStyle::Compact
                        {
                            self.write_linefeed();
                            self.write_indent(level);
                        } else {
                            self.write(" ");
                        }
                    }
                    let mut text = String::new();
                    member.write_css(&mut text, compressed);
                    self.write(&text);
                }
            }
        }
    }

    fn emit_declaration(
        &mut self,
        declaration: &cascade_evaluator::CssDeclaration,
        compressed: bool,
    ) {
        self.map_open(declaration.name_span);
        self.write(&declaration.name);
        self.map_close(declaration.name_span);
        self.write(":");
        if !compressed {
            self.write(" ");
        }
        self.map_open(declaration.value_span);
        let mut value = String::new();
        write_value(
            &mut value,
            &declaration.value,
            self.options.precision,
            self.options.style,
        );
        self.write(&value);
        if declaration.important {
            self.write(if compressed { "!important" } else { " !important" });
        }
        self.map_close(declaration.value_span);
    }

    fn emit_media(&mut self, media: &CssMediaRule, level: usize) {
        self.write_indent(level);
        self.write("@media ");
        self.write(&media.query);
        if self.options.style == OutputStyle::Compressed {
            self.write("{");
        } else {
            self.write(" {");
            self.write_linefeed();
        }
        let body: Vec<&CssStmt> = media.body.iter().collect();
        self.emit_children(&body, level + 1);
        if self.options.style == OutputStyle::Compressed {
            self.write("}");
        } else {
            self.write_indent(level);
            self.write("}");
            self.write_linefeed();
        }
    }

    fn emit_at_rule(&mut self, at_rule: &CssAtRule, level: usize) {
        self.write_indent(level);
        self.write("@");
        self.write(&at_rule.name);
        if !at_rule.prelude.is_empty() {
            self.write(" ");
            self.write(&at_rule.prelude);
        }
        match &at_rule.body {
            None => {
                self.write(";");
                if self.options.style != OutputStyle::Compressed {
                    self.write_linefeed();
                }
            }
            Some(body) if body.is_empty() => {
                self.write(" {}");
                if self.options.style != OutputStyle::Compressed {
                    self.write_linefeed();
                }
            }
            Some(body) => {
                if self.options.style == OutputStyle::Compressed {
                    self.write("{");
                } else {
                    self.write(" {");
                    self.write_linefeed();
                }
                let body: Vec<&CssStmt> = body.iter().collect();
                self.emit_children(&body, level + 1);
                if self.options.style == OutputStyle::Compressed {
                    self.write("}");
                } else {
                    self.write_indent(level);
                    self.write("}");
                    self.write_linefeed();
                }
            }
        }
    }

    fn emit_comment(&mut self, comment: &CssComment, level: usize) {
        self.write_indent(level);
        let text = comment.text.clone();
        self.write(&text);
        if self.options.style != OutputStyle::Compressed {
            self.write_linefeed();
        }
    }
}

//! Embedding surface for the Cascade compiler.
//!
//! ```
//! use cascade_compiler::{compile_string, Options};
//!
//! let result = compile_string(".a { x: 1; } .b { @extend .a; }", &Options::default())
//!     .expect("compiles");
//! assert_eq!(result.css, ".a, .b {\n  x: 1; }\n");
//! ```

pub mod options;

use cascade_evaluator::{Diagnostic, EvalError, Evaluator, HostFunction, ImportResolver};
use cascade_output::{emit, InspectOptions};
use cascade_parser::ParseError;
use cascade_sourcemap::SourceMapBuilder;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::info;

pub use cascade_evaluator::{ResolvedImport, Value};
pub use cascade_output::OutputStyle;
pub use options::{Linefeed, Options};

/// A successful compilation: the CSS, the optional source map JSON, and any
/// non-fatal diagnostics collected on the way.
#[derive(Debug)]
pub struct CompileResult {
    pub css: String,
    pub source_map: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reusable compiler with registered importers and host functions.
#[derive(Default)]
pub struct Compiler {
    importers: Vec<ImportResolver>,
    functions: Vec<(String, HostFunction)>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an importer callback, consulted (in registration order)
    /// before the filesystem for every `@import`.
    pub fn register_importer(&mut self, importer: ImportResolver) {
        self.importers.push(importer);
    }

    /// Exposes a host function to stylesheets under `name`.
    pub fn register_function(&mut self, name: &str, function: HostFunction) {
        self.functions.push((name.to_string(), function));
    }

    pub fn compile_string(
        &self,
        source: &str,
        options: &Options,
    ) -> Result<CompileResult, CompileError> {
        self.compile_source(source, None, options)
    }

    pub fn compile_file(
        &self,
        path: &Path,
        options: &Options,
    ) -> Result<CompileResult, CompileError> {
        let source = std::fs::read_to_string(path).map_err(|error| CompileError::Io {
            path: path.to_path_buf(),
            source: error,
        })?;
        self.compile_source(&source, Some(path), options)
    }

    fn compile_source(
        &self,
        source: &str,
        path: Option<&Path>,
        options: &Options,
    ) -> Result<CompileResult, CompileError> {
        info!(path = ?path, "compiling");
        let sheet = cascade_parser::parse(source)?;

        let mut evaluator = Evaluator::with_precision(options.precision);
        for importer in &self.importers {
            evaluator.register_importer(importer.clone());
        }
        // Filesystem lookup runs after every registered importer declined.
        let mut search_paths: Vec<PathBuf> = Vec::new();
        if let Some(parent) = path.and_then(Path::parent) {
            search_paths.push(parent.to_path_buf());
        }
        search_paths.extend(options.include_paths.iter().cloned());
        evaluator.register_importer(file_importer(search_paths));
        for (name, function) in &self.functions {
            evaluator.register_function(name, function.clone());
        }

        let root = evaluator.evaluate(&sheet)?;

        let source_path = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string());
        let mut map = if options.source_map {
            let file = options
                .source_map_file
                .as_ref()
                .map(|p| p.display().to_string());
            let mut builder = SourceMapBuilder::new(
                file.as_deref(),
                &source_path,
                source,
                options.source_map_contents,
            );
            builder.set_source_root(options.source_map_root.clone());
            Some(builder)
        } else {
            None
        };

        let inspect_options = InspectOptions {
            style: options.output_style,
            precision: options.precision,
            linefeed: options.linefeed.as_str().to_string(),
            indent: options.indent.clone(),
            source_comments: options.source_comments,
        };
        let mut css = emit(
            &root,
            &evaluator.store(),
            &inspect_options,
            Some(source),
            Some(&source_path),
            map.as_mut(),
        );

        let mut source_map = None;
        if let Some(map) = map {
            if options.source_map_embed {
                css.push_str(&format!(
                    "/*# sourceMappingURL={} */{}",
                    map.into_data_uri(),
                    options.linefeed.as_str()
                ));
            } else {
                if let Some(file) = &options.source_map_file {
                    css.push_str(&format!(
                        "/*# sourceMappingURL={} */{}",
                        file.display(),
                        options.linefeed.as_str()
                    ));
                }
                source_map = Some(map.into_json());
            }
        }

        Ok(CompileResult {
            css,
            source_map,
            diagnostics: evaluator.diagnostics().to_vec(),
        })
    }
}

/// Compiles a stylesheet from a string with no custom importers/functions.
pub fn compile_string(source: &str, options: &Options) -> Result<CompileResult, CompileError> {
    Compiler::new().compile_string(source, options)
}

/// Compiles a stylesheet file; its directory joins the include paths.
pub fn compile_file(path: &Path, options: &Options) -> Result<CompileResult, CompileError> {
    Compiler::new().compile_file(path, options)
}

/// Standard `@import` resolution: for `foo/bar` try `foo/bar.scss` and the
/// partial `foo/_bar.scss` under every search path, in order.
fn file_importer(search_paths: Vec<PathBuf>) -> ImportResolver {
    Rc::new(move |target: &str| {
        let target_path = Path::new(target);
        let file_name = target_path.file_name()?.to_str()?;
        let parent = target_path.parent().unwrap_or_else(|| Path::new(""));
        for base in &search_paths {
            for candidate_name in [
                format!("{}.scss", file_name),
                format!("_{}.scss", file_name),
                file_name.to_string(),
            ] {
                let candidate = base.join(parent).join(&candidate_name);
                if let Ok(source) = std::fs::read_to_string(&candidate) {
                    return Some(ResolvedImport {
                        path: candidate.display().to_string(),
                        source,
                    });
                }
            }
        }
        None
    })
}

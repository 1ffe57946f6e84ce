use crate::config::Config;
use anyhow::{anyhow, Result};
use cascade_compiler::{compile_file, Linefeed, Options, OutputStyle};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// File or directory to compile (defaults to the configured srcDir)
    pub path: Option<String>,

    /// Output style (nested, expanded, compact, compressed)
    #[arg(short, long)]
    pub style: Option<String>,

    /// Numeric precision
    #[arg(long, default_value = "5")]
    pub precision: usize,

    /// Generate source maps next to the output files
    #[arg(long)]
    pub source_map: bool,

    /// Embed the source map as a data: URI
    #[arg(long)]
    pub embed_source_map: bool,

    /// Include the original sources in the map
    #[arg(long)]
    pub embed_sources: bool,

    /// Additional import search path (repeatable)
    #[arg(short = 'I', long = "include-path")]
    pub include_paths: Vec<String>,

    /// Line feed style (lf, crlf, cr, lfcr)
    #[arg(long, default_value = "lf")]
    pub line_feed: String,

    /// Indentation used in nested output
    #[arg(long, default_value = "  ")]
    pub indent: String,

    /// Annotate every rule with its source line
    #[arg(long)]
    pub source_comments: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Print CSS to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,
}

pub fn compile(args: CompileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let options = build_options(&args, &config)?;

    let input = args
        .path
        .as_ref()
        .map(|path| Path::new(cwd).join(path))
        .unwrap_or_else(|| config.src_dir(cwd));

    if input.is_file() {
        let out_dir = output_dir(&args, &config, cwd);
        return compile_one(&input, input.parent().unwrap_or(Path::new(cwd)), &out_dir, &args, &options);
    }
    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    }

    println!("{}", "Compiling stylesheets...".bright_blue().bold());
    let files = find_scss_files(&input);
    if files.is_empty() {
        println!("{}", "No .scss files found".yellow());
        return Ok(());
    }

    let out_dir = output_dir(&args, &config, cwd);
    let mut compiled = 0usize;
    let mut failed = 0usize;
    for file in &files {
        match compile_one(file, &input, &out_dir, &args, &options) {
            Ok(()) => compiled += 1,
            Err(error) => {
                failed += 1;
                let shown = file.strip_prefix(&input).unwrap_or(file);
                eprintln!("  {} {} - {}", "✗".red(), shown.display(), error.to_string().red());
            }
        }
    }

    println!();
    if failed == 0 {
        println!("{} Compiled {} files", "✓".green(), compiled);
    } else {
        println!(
            "{} Compiled {} files, {} failed",
            "!".yellow(),
            compiled,
            failed
        );
    }
    Ok(())
}

fn build_options(args: &CompileArgs, config: &Config) -> Result<Options> {
    let style_name = args
        .style
        .clone()
        .or_else(|| config.style.clone())
        .unwrap_or_else(|| "nested".to_string());
    let output_style = match style_name.as_str() {
        "nested" => OutputStyle::Nested,
        "expanded" => OutputStyle::Expanded,
        "compact" => OutputStyle::Compact,
        "compressed" => OutputStyle::Compressed,
        other => return Err(anyhow!("Unknown output style: {}", other)),
    };
    let linefeed = match args.line_feed.as_str() {
        "lf" => Linefeed::Lf,
        "crlf" => Linefeed::CrLf,
        "cr" => Linefeed::Cr,
        "lfcr" => Linefeed::LfCr,
        other => return Err(anyhow!("Unknown line feed style: {}", other)),
    };

    let mut include_paths: Vec<PathBuf> =
        args.include_paths.iter().map(PathBuf::from).collect();
    include_paths.extend(config.include_paths.iter().map(PathBuf::from));

    Ok(Options {
        output_style,
        precision: args.precision,
        source_map: args.source_map || args.embed_source_map,
        source_map_contents: args.embed_sources,
        source_map_embed: args.embed_source_map,
        include_paths,
        linefeed,
        indent: args.indent.clone(),
        source_comments: args.source_comments,
        ..Options::default()
    })
}

fn output_dir(args: &CompileArgs, config: &Config, cwd: &str) -> PathBuf {
    match &args.out_dir {
        Some(dir) => Path::new(cwd).join(dir),
        None => config.out_dir(cwd),
    }
}

fn compile_one(
    file: &Path,
    base: &Path,
    out_dir: &Path,
    args: &CompileArgs,
    options: &Options,
) -> Result<()> {
    let relative = file.strip_prefix(base).unwrap_or(file);
    let out_file = out_dir.join(relative).with_extension("css");

    let mut options = options.clone();
    if options.source_map && !options.source_map_embed {
        options.source_map_file = Some(out_file.with_extension("css.map"));
    }

    let result = compile_file(file, &options)?;

    for diagnostic in &result.diagnostics {
        eprintln!("  {} {}", "warning:".yellow(), diagnostic.message);
    }

    if args.stdout {
        println!("{}", result.css);
        return Ok(());
    }

    if let Some(parent) = out_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&out_file, &result.css)?;
    if let (Some(map), Some(map_file)) = (&result.source_map, &options.source_map_file) {
        std::fs::write(map_file, map)?;
    }
    println!("  {} {} → {}", "✓".green(), relative.display(), out_file.display());
    Ok(())
}

/// Collects compilable stylesheets, skipping `_partial.scss` files.
fn find_scss_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("scss") {
            continue;
        }
        let is_partial = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with('_'));
        if !is_partial {
            files.push(path.to_path_buf());
        }
    }
    files
}

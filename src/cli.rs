//! Batch CLI: schema files → one Rust model module each
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use crate::codegen::{self, rust::RenderOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate relational Rust model types from JSON Schema documents
#[derive(Parser, Debug)]
#[command(name = "json-dbgen", version)]
pub struct CommandLineInterface {
    /// output directory for the generated modules
    #[arg(short, long, default_value = "./model")]
    pub output: PathBuf,

    /// package (module) name of the generated code
    #[arg(short, long, default_value = "model")]
    pub package: String,

    /// One or more schema files. May be literal paths or quoted glob patterns
    #[arg(num_args = 1.., required = true)]
    pub schemas: Vec<String>,
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, in input order (`mod.rs` excluded).
    pub generated: Vec<PathBuf>,
    /// Inputs that failed, with the rendered error.
    pub failures: Vec<(String, String)>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Process every input; a failing input is reported and skipped. Only an
    /// unusable output directory aborts the run.
    pub fn run(&self) -> anyhow::Result<BatchReport> {
        std::fs::create_dir_all(&self.output).with_context(|| {
            format!("failed to create output directory {}", self.output.display())
        })?;

        let mut report = BatchReport::default();
        let mut modules = Vec::<String>::new();
        let mut claimed = HashSet::<String>::new();

        for pattern in &self.schemas {
            let source_paths = match resolve_file_path_pattern(pattern) {
                Ok(paths) => paths,
                Err(error) => {
                    report.fail(pattern, &error);
                    continue;
                }
            };
            for source_path in source_paths {
                let label = source_path.to_string_lossy().to_string();
                match self.generate(&source_path, &claimed) {
                    Ok((module, out)) => {
                        info!(input = %label, output = %out.display(), "generated");
                        claimed.insert(module.clone());
                        modules.push(module);
                        report.generated.push(out);
                    }
                    Err(error) => report.fail(&label, &error),
                }
            }
        }

        let mod_path = self.output.join("mod.rs");
        std::fs::write(&mod_path, mod_file(&self.package, &modules))
            .with_context(|| format!("failed to write {}", mod_path.display()))?;
        Ok(report)
    }

    /// A module name is only taken once its file has been written.
    fn generate(
        &self,
        source_path: &Path,
        claimed: &HashSet<String>,
    ) -> anyhow::Result<(String, PathBuf)> {
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file {}", source_path.display()))?;
        let file_name = source_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let module = module_name(&file_name);
        if claimed.contains(&module) {
            bail!("module `{module}` was already generated from another input");
        }

        let model = crate::compile_str(&source, &file_name)?;
        let declarations = codegen::declarations(&model);
        let options = RenderOptions {
            package: self.package.clone(),
            source: Some(file_name),
        };
        let rust_src = codegen::rust::render(&declarations, &options)?;

        let out = self.output.join(format!("{module}.rs"));
        std::fs::write(&out, rust_src)
            .with_context(|| format!("failed to write {}", out.display()))?;
        Ok((module, out))
    }
}

impl BatchReport {
    fn fail(&mut self, input: &str, error: &anyhow::Error) {
        eprintln!("{} {}: {error:#}", "error".red().bold(), input);
        self.failures.push((input.to_string(), format!("{error:#}")));
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `order.schema.json` → `order`, `Line-Items.json` → `line_items`.
fn module_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let mut module: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if module.is_empty() || module.starts_with(|c: char| c.is_ascii_digit()) {
        module.insert(0, '_');
    }
    if matches!(
        module.as_str(),
        "mod" | "self" | "super" | "crate" | "type" | "struct" | "enum" | "fn" | "use"
    ) {
        module.push('_');
    }
    module
}

fn mod_file(package: &str, modules: &[String]) -> String {
    let mut out = format!("//! {package}\n// Code generated by json-dbgen. DO NOT EDIT.\n\n");
    for module in modules {
        out.push_str(&format!("pub mod {module};\n"));
    }
    out
}

fn resolve_file_path_pattern(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    if !has_glob_chars(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }
    let mut out = Vec::<PathBuf>::new();
    for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
        out.push(entry?);
    }
    if out.is_empty() {
        bail!("glob pattern matched no files: {pattern}");
    }
    Ok(out)
}

//! Minimal CLI: literal → (schema | binding paths)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use schemabind::{Config, SchemaNode};
use serde_json::Value;
use tracing::{debug, info};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile nested schema literals into a flat type graph, or render binding paths into them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// JSON config file (naming suffix, binding style); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and print the schema (type name → definition)
    Compile(CompileOut),
    /// render the plain path, template value and back reference for a field chain
    Bind(BindOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the literal inside each document (e.g. /schema)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct BindOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// dotted chain of authored field names, e.g. orders.lines.sku
    path: String,

    /// pin the wildcard closest to the end of the path (e.g. `orders.lines.sku --index 3` → `orders[*].lines[3].sku`)
    #[arg(long)]
    index: Option<usize>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<(PathBuf, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let json_value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} not found in {}", source_path.display()))?,
            };
            debug!(path = %source_path.display(), "loaded document");
            out.push((source_path, json_value));
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        match &self.cmd {
            Command::Compile(target) => emit(target.out.as_deref(), &target.render(&config)?),
            Command::Bind(target) => emit(None, &target.render(&config)?),
        }
    }

    fn load_config(&self) -> Result<Config> {
        match self.config.as_deref() {
            Some(path) => Config::load(path).map_err(|e| anyhow!(e)),
            None => Ok(Config::default()),
        }
    }
}

impl CompileOut {
    /// Pretty JSON: the schema itself for one input, otherwise schemas keyed by input path.
    fn render(&self, config: &Config) -> Result<String> {
        let documents = self.input_settings.load_documents()?;
        info!(count = documents.len(), "compiling documents");

        // Each compilation owns its state; run them side by side.
        let schemas = documents
            .par_iter()
            .map(|(path, value)| {
                schemabind::compile_value(value, &config.naming)
                    .with_context(|| format!("failed to compile {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = match schemas.as_slice() {
            [single] => single.to_json()?,
            _ => {
                let mut keyed = serde_json::Map::new();
                for ((path, _), schema) in documents.iter().zip(&schemas) {
                    keyed.insert(path.to_string_lossy().to_string(), schema.to_json()?);
                }
                Value::Object(keyed)
            }
        };
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

impl BindOut {
    fn render(&self, config: &Config) -> Result<String> {
        let documents = self.input_settings.load_documents()?;
        let [(path, value)] = documents.as_slice() else {
            bail!("`bind` takes exactly one input, got {}", documents.len());
        };
        let root = SchemaNode::from_value(value)
            .with_context(|| format!("failed to parse schema literal in {}", path.display()))?;
        let mut proxy = schemabind::make_proxy_with(&root, &config.binding).walk(&self.path);
        if let Some(index) = self.index {
            proxy = proxy
                .pin_last_wildcard(index)
                .ok_or_else(|| anyhow!("`--index {index}`: `{}` crosses no array field", proxy.path()))?;
        }
        Ok(format!(
            "path:           {}\ntemplate:       {}\nback reference: {}",
            proxy.path(),
            proxy.template(),
            proxy.back_reference()
        ))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // Explicit glob that matched nothing is almost always a typo.
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.append(&mut matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

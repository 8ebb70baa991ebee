//! Configuration loading.

use crate::cli::Args;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use thiserror::Error;
use ts_transpile::{ImportInterop, ModuleKind, ParseModuleKindError, TranspileOptions};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the tsconfig file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    /// The tsconfig file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    /// `compilerOptions.module` names an unsupported module system.
    #[error("{path}: {source}")]
    Module {
        path: Utf8PathBuf,
        source: ParseModuleKindError,
    },
}

/// TypeScript configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    /// Compiler options.
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

/// The subset of TypeScript compiler options that affects emit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Module system.
    pub module: Option<String>,

    /// Emit source maps.
    pub source_map: Option<bool>,

    /// Output directory, relative to the tsconfig file.
    pub out_dir: Option<String>,

    /// Emit `__esModuleInterop` helpers for default imports.
    pub es_module_interop: Option<bool>,

    /// Compile decorators with the legacy TypeScript semantics.
    pub experimental_decorators: Option<bool>,
}

impl TsConfig {
    /// Loads configuration from a tsconfig.json file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parses tsconfig.json content, which may contain comments and
    /// trailing commas.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_jsonc(content))
    }

    /// Finds and loads tsconfig.json from a project root.
    pub fn find(project_root: &Utf8Path) -> Result<Option<(Utf8PathBuf, Self)>, ConfigError> {
        let path = project_root.join("tsconfig.json");
        if path.exists() {
            let config = Self::load(&path)?;
            Ok(Some((path, config)))
        } else {
            Ok(None)
        }
    }

    /// Returns the configured module kind, if any.
    pub fn module_kind(&self) -> Result<Option<ModuleKind>, ParseModuleKindError> {
        self.compiler_options
            .module
            .as_deref()
            .map(str::parse::<ModuleKind>)
            .transpose()
    }
}

/// Effective settings for a run: command line over tsconfig over defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Options shared by every file.
    pub options: TranspileOptions,

    /// Where output files go; `None` means stdout.
    pub out_dir: Option<Utf8PathBuf>,
}

impl Settings {
    /// Resolves settings from arguments and an optional `(path, tsconfig)`.
    pub fn resolve(
        args: &Args,
        tsconfig: Option<(&Utf8Path, &TsConfig)>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        if let Some((path, config)) = tsconfig {
            let compiler_options = &config.compiler_options;

            if let Some(module) = config.module_kind().map_err(|source| ConfigError::Module {
                path: path.to_owned(),
                source,
            })? {
                settings.options.module = module;
            }
            if let Some(source_map) = compiler_options.source_map {
                settings.options.source_map = source_map;
            }
            if let Some(out_dir) = &compiler_options.out_dir {
                let base = path.parent().unwrap_or(Utf8Path::new(""));
                settings.out_dir = Some(base.join(out_dir));
            }
            if let Some(interop) = compiler_options.es_module_interop {
                settings.options.import_interop = if interop {
                    ImportInterop::Swc
                } else {
                    ImportInterop::None
                };
            }
            if let Some(experimental) = compiler_options.experimental_decorators {
                settings.options.experimental_decorators = experimental;
            }
        }

        if let Some(module) = args.module {
            settings.options.module = module;
        }
        if args.source_map {
            settings.options.source_map = true;
        }
        if let Some(out_dir) = &args.out_dir {
            settings.out_dir = Some(out_dir.clone());
        }

        Ok(settings)
    }

    /// Returns the options for one input file.
    pub fn options_for(&self, path: &Utf8Path) -> TranspileOptions {
        let mut options = self
            .options
            .clone()
            .with_file_name(path.file_name().unwrap_or(path.as_str()));
        // Maps are only written next to files.
        if self.out_dir.is_none() {
            options.source_map = false;
        }
        options
    }
}

/// Turns tsconfig-flavoured JSON into plain JSON by dropping comments and
/// trailing commas. String contents are copied untouched.
fn strip_jsonc(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut result = String::with_capacity(content.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                let end = string_end(&chars, i);
                result.extend(&chars[i..end]);
                i = end;
            }
            '/' if starts_comment(&chars, i) => i = comment_end(&chars, i),
            ',' if closes_container(&chars, i + 1) => i += 1,
            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}

/// Index just past the string literal opening at `start`.
fn string_end(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn starts_comment(chars: &[char], i: usize) -> bool {
    chars[i] == '/' && matches!(chars.get(i + 1), Some('/' | '*'))
}

/// Index just past the comment opening at `start`. A line comment ends
/// before its newline.
fn comment_end(chars: &[char], start: usize) -> usize {
    let body = &chars[start + 2..];
    let len = if chars[start + 1] == '/' {
        body.iter().position(|&c| c == '\n').unwrap_or(body.len())
    } else {
        body.windows(2)
            .position(|pair| pair == ['*', '/'])
            .map_or(body.len(), |p| p + 2)
    };
    start + 2 + len
}

/// Whether the next token from `i`, skipping whitespace and comments,
/// is `}` or `]`.
fn closes_container(chars: &[char], mut i: usize) -> bool {
    while let Some(&c) = chars.get(i) {
        match c {
            '}' | ']' => return true,
            c if c.is_whitespace() => i += 1,
            '/' if starts_comment(chars, i) => i = comment_end(chars, i),
            _ => return false,
        }
    }
    false
}

//! Input discovery, parallel transpilation and output writing.

use crate::cli::{Args, OutputFormat};
use crate::config::{ConfigError, Settings, TsConfig};
use crate::output::{Finding, FormattedDiagnostic, Formatter, TranspileSummary};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_transpile::{output_file_name, transpile_module, TranspileOutput};
use walkdir::WalkDir;

/// Extensions picked up when walking a directory.
const SOURCE_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".mts", ".cts"];

/// Declaration files never produce output.
const DECLARATION_EXTENSIONS: [&str; 3] = [".d.ts", ".d.mts", ".d.cts"];

/// Driver errors that abort the whole run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Input path does not exist.
    #[error("input not found: {0}")]
    InputNotFound(Utf8PathBuf),

    /// Input path is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// Two inputs map to the same output file.
    #[error("{first} and {second} would both be written to {output}")]
    DuplicateOutput {
        output: Utf8PathBuf,
        first: Utf8PathBuf,
        second: Utf8PathBuf,
    },

    /// Failed to read stdin.
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    /// Failed to write stdout.
    #[error("failed to write output: {0}")]
    Stdout(#[source] io::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A source file to transpile.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Input {
    /// Path as found on disk.
    path: Utf8PathBuf,
    /// Path of the output relative to the output directory, before the
    /// extension change.
    relative: Utf8PathBuf,
}

/// What happened to one file.
struct FileOutcome {
    path: Utf8PathBuf,
    /// Emitted code, kept only when printing to stdout.
    code: Option<String>,
    findings: Vec<Finding>,
    diagnostic_count: usize,
    failed: bool,
}

impl FileOutcome {
    fn failed(path: &Utf8Path, finding: Finding) -> Self {
        Self {
            path: path.to_owned(),
            code: None,
            findings: vec![finding],
            diagnostic_count: 0,
            failed: true,
        }
    }
}

/// Runs the transpiler over all inputs.
pub fn run(args: Args) -> Result<TranspileSummary, DriverError> {
    let tsconfig = match &args.project {
        Some(path) => Some((path.clone(), TsConfig::load(path)?)),
        None => TsConfig::find(Utf8Path::new("."))?,
    };
    if let Some((path, _)) = &tsconfig {
        debug!(%path, "using tsconfig");
    }
    let mut settings = Settings::resolve(
        &args,
        tsconfig.as_ref().map(|(path, config)| (path.as_path(), config)),
    )?;

    if args.reads_stdin() {
        return run_stdin(&args, &settings);
    }

    if settings.options.source_map && settings.out_dir.is_none() {
        warn!("source maps need an output directory; skipping them");
        settings.options.source_map = false;
    }

    let ignore_set = build_ignore_set(&args.ignore)?;
    let inputs = collect_inputs(&args.inputs, &ignore_set)?;
    if let Some(out_dir) = &settings.out_dir {
        check_output_collisions(out_dir, &inputs)?;
    }
    debug!(count = inputs.len(), module = %settings.options.module, "collected inputs");

    let outcomes: Vec<FileOutcome> = inputs
        .par_iter()
        .map(|input| process_file(input, &settings))
        .collect();

    let formatter = Formatter::new(args.output);
    let mut json_output: Vec<FormattedDiagnostic> = Vec::new();
    let mut summary = TranspileSummary {
        file_count: outcomes.len(),
        fail_on_diagnostics: args.fail_on_diagnostics,
        ..Default::default()
    };
    let banners = outcomes.len() > 1;
    let mut stdout = io::stdout().lock();

    for outcome in outcomes {
        summary.diagnostic_count += outcome.diagnostic_count;
        if outcome.failed {
            summary.failed_count += 1;
        }

        if let Some(code) = &outcome.code {
            if banners {
                writeln!(stdout, "// {}", outcome.path).map_err(DriverError::Stdout)?;
            }
            write!(stdout, "{}", code).map_err(DriverError::Stdout)?;
        }

        let findings: Vec<Finding> = outcome
            .findings
            .into_iter()
            .filter(|finding| args.diagnostics || finding.is_error())
            .collect();
        if findings.is_empty() {
            continue;
        }
        if args.output == OutputFormat::Json {
            json_output.extend(Formatter::format_json_findings(&findings, &outcome.path));
        } else {
            eprint!("{}", formatter.format(&findings, &outcome.path));
        }
    }
    stdout.flush().map_err(DriverError::Stdout)?;

    if args.output == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| "[]".to_string());
        eprintln!("{}", json);
    } else {
        eprintln!("{}", summary.format());
    }

    Ok(summary)
}

/// Transpiles stdin to stdout.
fn run_stdin(args: &Args, settings: &Settings) -> Result<TranspileSummary, DriverError> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .map_err(DriverError::Stdin)?;

    let mut options = settings.options.clone();
    options.source_map = false;

    let path = Utf8Path::new("<stdin>");
    let mut summary = TranspileSummary {
        file_count: 1,
        fail_on_diagnostics: args.fail_on_diagnostics,
        ..Default::default()
    };

    let findings = match transpile_module(&source, &options) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.code.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(DriverError::Stdout)?;

            summary.diagnostic_count = output.diagnostics.len();
            if args.diagnostics {
                output
                    .diagnostics
                    .iter()
                    .map(Finding::from_diagnostic)
                    .collect()
            } else {
                Vec::new()
            }
        }
        Err(err) => {
            summary.failed_count = 1;
            vec![Finding::from_error(&err)]
        }
    };

    if !findings.is_empty() {
        eprint!("{}", Formatter::new(args.output).format(&findings, path));
    }

    Ok(summary)
}

/// Builds the ignore set from user patterns plus the defaults.
fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, DriverError> {
    let mut ignore_builder = GlobSetBuilder::new();
    for pattern in patterns
        .iter()
        .map(String::as_str)
        .chain(["**/node_modules/**"])
    {
        let glob = Glob::new(pattern).map_err(|e| DriverError::InvalidGlob(e.to_string()))?;
        ignore_builder.add(glob);
    }

    ignore_builder
        .build()
        .map_err(|e| DriverError::InvalidGlob(e.to_string()))
}

/// Returns whether a file name is a transpilable source file.
fn is_source_file(file_name: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
        && !DECLARATION_EXTENSIONS
            .iter()
            .any(|ext| file_name.ends_with(ext))
}

/// Expands the command-line inputs into source files.
///
/// Files are taken as given. Directories are walked in file name order and
/// filtered by extension and the ignore set.
fn collect_inputs(paths: &[Utf8PathBuf], ignore_set: &GlobSet) -> Result<Vec<Input>, DriverError> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_file() {
            let file_name = path.file_name().unwrap_or(path.as_str());
            inputs.push(Input {
                path: path.clone(),
                relative: Utf8PathBuf::from(file_name),
            });
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_path = Utf8PathBuf::try_from(entry.into_path())
                    .map_err(|e| DriverError::NonUtf8Path(e.into_path_buf().display().to_string()))?;
                if !is_source_file(file_path.file_name().unwrap_or("")) {
                    continue;
                }
                let relative = file_path.strip_prefix(path).unwrap_or(&file_path).to_owned();
                if ignore_set.is_match(relative.as_str()) {
                    debug!(path = %file_path, "ignored");
                    continue;
                }
                inputs.push(Input {
                    path: file_path,
                    relative,
                });
            }
        } else {
            return Err(DriverError::InputNotFound(path.clone()));
        }
    }

    Ok(inputs)
}

/// Fails when two inputs would be written to the same file under `out_dir`,
/// for example `a/index.ts` and `b/index.ts` passed directly.
fn check_output_collisions(out_dir: &Utf8Path, inputs: &[Input]) -> Result<(), DriverError> {
    let mut seen: HashMap<Utf8PathBuf, &Utf8Path> = HashMap::with_capacity(inputs.len());

    for input in inputs {
        let output = out_dir.join(output_file_name(input.relative.as_str()));
        if let Some(first) = seen.get(&output) {
            return Err(DriverError::DuplicateOutput {
                output,
                first: first.to_path_buf(),
                second: input.path.clone(),
            });
        }
        seen.insert(output, &input.path);
    }

    Ok(())
}

/// Reads, transpiles and writes one file.
fn process_file(input: &Input, settings: &Settings) -> FileOutcome {
    debug!(path = %input.path, "transpiling");

    let source = match fs::read_to_string(&input.path) {
        Ok(source) => source,
        Err(e) => {
            debug!(path = %input.path, "failed to read: {}", e);
            return FileOutcome::failed(&input.path, Finding::message(format!("failed to read file: {e}")));
        }
    };

    let output = match transpile_module(&source, &settings.options_for(&input.path)) {
        Ok(output) => output,
        Err(err) => {
            debug!(path = %input.path, "transpile failed: {}", err);
            return FileOutcome::failed(&input.path, Finding::from_error(&err));
        }
    };

    if !output.diagnostics.is_empty() {
        debug!(
            path = %input.path,
            count = output.diagnostics.len(),
            "recovered from syntax errors"
        );
    }
    let findings: Vec<Finding> = output
        .diagnostics
        .iter()
        .map(Finding::from_diagnostic)
        .collect();
    let diagnostic_count = findings.len();

    let code = match &settings.out_dir {
        Some(out_dir) => match write_output(out_dir, input, output) {
            Ok(dest) => {
                info!(path = %input.path, %dest, "wrote output");
                None
            }
            Err(e) => {
                debug!(path = %input.path, "failed to write: {}", e);
                let mut outcome = FileOutcome::failed(&input.path, Finding::message(e.to_string()));
                outcome.findings.extend(findings);
                outcome.diagnostic_count = diagnostic_count;
                return outcome;
            }
        },
        None => Some(output.code),
    };

    FileOutcome {
        path: input.path.clone(),
        code,
        findings,
        diagnostic_count,
        failed: false,
    }
}

/// Writes the code (and source map, if any) under `out_dir`, returning the
/// path of the code file.
fn write_output(
    out_dir: &Utf8Path,
    input: &Input,
    output: TranspileOutput,
) -> io::Result<Utf8PathBuf> {
    let dest = out_dir.join(output_file_name(input.relative.as_str()));
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut code = output.code;
    if let Some(map) = output.source_map {
        let map_path = Utf8PathBuf::from(format!("{}.map", dest));
        if !code.is_empty() && !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&format!(
            "//# sourceMappingURL={}\n",
            map_path.file_name().unwrap_or(map_path.as_str())
        ));
        fs::write(&map_path, map)?;
    }

    fs::write(&dest, code)?;
    Ok(dest)
}

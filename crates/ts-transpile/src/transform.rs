//! The single-file transpilation pipeline.
//!
//! Source text goes through swc in a fixed order:
//!
//! 1. parse as a TypeScript program (module if it has `import`/`export`)
//! 2. `resolver` to assign hygiene marks
//! 3. decorators, then type erasure
//! 4. import analysis and helper injection (require-style targets only)
//! 5. the module pass selected by [`ModuleKind`]
//! 6. `hygiene` and `fixer`
//! 7. code generation, plus an optional source map
//!
//! Every call owns its `Globals`, source map, comment store and helper
//! registry, so calls share no state.

use crate::diagnostic::{offset_to_line_column, relative_range, Diagnostic};
use crate::error::TranspileError;
use crate::options::{ImportInterop, ModuleKind, TranspileOptions};
use crate::top_level_await;
use std::path::PathBuf;
use swc_common::comments::SingleThreadedComments;
use swc_common::source_map::DefaultSourceMapGenConfig;
use swc_common::{
    sync::Lrc, BytePos, FileName, Globals, LineCol, Mark, SourceMap, Spanned, GLOBALS,
};
use swc_ecma_ast::{EsVersion, Program};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_transforms_base::fixer::fixer;
use swc_ecma_transforms_base::helpers::{inject_helpers, Helpers, HELPERS};
use swc_ecma_transforms_base::hygiene::hygiene;
use swc_ecma_transforms_base::resolver;
use swc_ecma_transforms_module::import_analysis::import_analyzer;
use swc_ecma_transforms_module::path::Resolver;
use swc_ecma_transforms_module::{amd, common_js, system_js, umd, util};
use swc_ecma_transforms_proposal::decorator_2022_03::decorator_2022_03;
use swc_ecma_transforms_proposal::decorators::{self, decorators};
use swc_ecma_transforms_typescript::{typescript, TsImportExportAssignConfig};

/// Result of transpiling one source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOutput {
    /// The emitted JavaScript.
    pub code: String,
    /// The JSON source map, when [`TranspileOptions::source_map`] is set.
    pub source_map: Option<String>,
    /// Syntax problems the compiler recovered from, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Transpiles TypeScript source to CommonJS JavaScript.
///
/// This is the minimal entry point: the configuration is fixed to
/// [`TranspileOptions::default`] and recoverable diagnostics are discarded.
/// Use [`transpile_module`] to pick another module kind or to see the
/// diagnostics.
///
/// # Errors
///
/// Returns [`TranspileError::Parse`] when the source cannot be parsed at all.
///
/// # Example
///
/// ```
/// let js = ts_transpile::transpile("export const answer: number = 42;").unwrap();
/// assert!(js.contains("exports"));
/// assert!(!js.contains(": number"));
/// ```
pub fn transpile(source: &str) -> Result<String, TranspileError> {
    transpile_module(source, &TranspileOptions::default()).map(|output| output.code)
}

/// Transpiles TypeScript source with explicit options.
///
/// # Errors
///
/// Returns [`TranspileError::Parse`] when the source cannot be parsed at all,
/// and the other [`TranspileError`] variants if printing fails.
pub fn transpile_module(
    source: &str,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TranspileError> {
    GLOBALS.set(&Globals::new(), || run(source, options))
}

fn run(source: &str, options: &TranspileOptions) -> Result<TranspileOutput, TranspileError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(source_file_name(options)), source.to_string());
    let comments = SingleThreadedComments::default();

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: options.jsx,
        decorators: true,
        ..Default::default()
    });

    let lexer = Lexer::new(
        syntax,
        EsVersion::latest(),
        StringInput::from(&*fm),
        Some(&comments),
    );
    let mut parser = Parser::new_from(lexer);

    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(error) => {
            let (start, _) = relative_range(error.span(), fm.start_pos, source.len());
            let (line, column) = offset_to_line_column(source, start);
            return Err(TranspileError::Parse {
                message: error.kind().msg().into_owned(),
                line,
                column,
            });
        }
    };

    // Strict-mode violations are only reported once the program turned out
    // to be a module.
    let mut diagnostics: Vec<Diagnostic> = parser
        .take_errors()
        .iter()
        .map(|error| Diagnostic::from_swc(error, source, fm.start_pos))
        .collect();
    match &program {
        Program::Module(module) if options.module.uses_require_interop() => {
            diagnostics.extend(top_level_await::find(module).into_iter().map(|span| {
                Diagnostic::at_span(top_level_await::MESSAGE, span, source, fm.start_pos)
            }));
        }
        _ => {}
    }
    diagnostics.sort_by_key(|diagnostic| (diagnostic.start, diagnostic.end));
    diagnostics.dedup();

    let program = HELPERS.set(&Helpers::new(false), || {
        apply_passes(program, options, &cm, &comments)
    });

    let (code, mappings) = emit(&program, &cm, &comments, options.source_map)?;

    let source_map = match mappings {
        Some(mappings) => Some(build_source_map(&cm, &mappings, options)?),
        None => None,
    };

    Ok(TranspileOutput {
        code,
        source_map,
        diagnostics,
    })
}

/// The name the source is registered under.
///
/// UMD output names its browser global after the file stem, so UMD always
/// gets a named file.
fn source_file_name(options: &TranspileOptions) -> FileName {
    match &options.file_name {
        Some(name) => FileName::Real(PathBuf::from(name)),
        None if options.module == ModuleKind::Umd => FileName::Custom("anonymous".into()),
        None => FileName::Anon,
    }
}

/// Runs the transform passes. Must be called inside `GLOBALS` and `HELPERS`.
fn apply_passes(
    mut program: Program,
    options: &TranspileOptions,
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
) -> Program {
    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();

    program.mutate(resolver(unresolved_mark, top_level_mark, true));

    if options.experimental_decorators {
        program.mutate(decorators(decorators::Config {
            legacy: true,
            emit_metadata: false,
            use_define_for_class_fields: false,
        }));
    } else {
        program.mutate(decorator_2022_03());
    }

    let ts_config = swc_ecma_transforms_typescript::Config {
        import_export_assign_config: match options.module {
            ModuleKind::EsModule => TsImportExportAssignConfig::EsNext,
            ModuleKind::System => TsImportExportAssignConfig::Classic,
            ModuleKind::CommonJs | ModuleKind::Amd | ModuleKind::Umd => {
                TsImportExportAssignConfig::Preserve
            }
        },
        ..Default::default()
    };
    program.mutate(typescript(ts_config, unresolved_mark, top_level_mark));

    let module_config = util::Config {
        import_interop: Some(match options.import_interop {
            ImportInterop::Swc => util::ImportInterop::Swc,
            ImportInterop::Node => util::ImportInterop::Node,
            ImportInterop::None => util::ImportInterop::None,
        }),
        ..Default::default()
    };

    if options.module.uses_require_interop() {
        program.mutate(import_analyzer(module_config.import_interop(), false));
    }
    program.mutate(inject_helpers(unresolved_mark));

    match options.module {
        ModuleKind::CommonJs => program.mutate(common_js(
            Resolver::Default,
            unresolved_mark,
            module_config,
            common_js::FeatureFlag {
                support_block_scoping: true,
                support_arrow: true,
            },
        )),
        ModuleKind::Amd => program.mutate(amd(
            Resolver::Default,
            unresolved_mark,
            amd::Config {
                module_id: None,
                config: module_config,
            },
            amd::FeatureFlag {
                support_block_scoping: true,
                support_arrow: true,
            },
            Some(comments),
        )),
        ModuleKind::Umd => program.mutate(umd(
            cm.clone(),
            Resolver::Default,
            unresolved_mark,
            umd::Config {
                globals: Default::default(),
                config: module_config,
            },
            umd::FeatureFlag {
                support_block_scoping: true,
            },
        )),
        ModuleKind::System => program.mutate(system_js(
            Resolver::Default,
            unresolved_mark,
            system_js::Config {
                allow_top_level_this: false,
                config: module_config,
            },
        )),
        ModuleKind::EsModule => {}
    }

    program.mutate(hygiene());
    program.mutate(fixer(Some(comments)));

    program
}

/// Prints the program, collecting source positions when `with_mappings` is set.
fn emit(
    program: &Program,
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    with_mappings: bool,
) -> Result<(String, Option<Vec<(BytePos, LineCol)>>), TranspileError> {
    let mut buf = Vec::new();
    let mut mappings = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: Default::default(),
            cm: cm.clone(),
            comments: Some(comments),
            wr: JsWriter::new(
                cm.clone(),
                "\n",
                &mut buf,
                with_mappings.then_some(&mut mappings),
            ),
        };
        emitter.emit_program(program)?;
    }

    let code = String::from_utf8(buf)?;
    Ok((code, with_mappings.then_some(mappings)))
}

/// Serializes a version 3 source map for the emitted code.
fn build_source_map(
    cm: &Lrc<SourceMap>,
    mappings: &[(BytePos, LineCol)],
    options: &TranspileOptions,
) -> Result<String, TranspileError> {
    let mut map = cm.build_source_map(mappings, None, DefaultSourceMapGenConfig);
    if let Some(file_name) = &options.file_name {
        map.set_file(Some(output_file_name(file_name)));
    }

    let mut json = Vec::new();
    map.to_writer(&mut json)
        .map_err(|e| TranspileError::SourceMap(e.to_string()))?;
    Ok(String::from_utf8(json)?)
}

/// Maps a TypeScript file name to the name of its emitted JavaScript file.
///
/// `.mts` becomes `.mjs`, `.cts` becomes `.cjs`, every other extension
/// becomes `.js`.
pub fn output_file_name(file_name: &str) -> String {
    let (stem, ext) = match file_name.rfind('.') {
        Some(dot) if !file_name[dot..].contains(['/', '\\']) => {
            (&file_name[..dot], &file_name[dot + 1..])
        }
        _ => (file_name, ""),
    };
    let js_ext = match ext {
        "mts" => "mjs",
        "cts" => "cjs",
        _ => "js",
    };
    format!("{stem}.{js_ext}")
}

//! Single-file TypeScript to JavaScript transpilation.
//!
//! This crate turns one unit of TypeScript source into JavaScript that runs
//! under a chosen module convention, CommonJS by default. It is a thin
//! façade over swc: parsing, type erasure and module rewriting are all done
//! by the compiler, this crate only fixes the configuration and shapes the
//! result. It handles:
//! - Erasing type annotations, interfaces, type aliases and type-only imports
//! - Rewriting `import`/`export` into `require`/`exports` (or AMD, UMD,
//!   SystemJS wrappers)
//! - Compiling decorators, standard or `experimentalDecorators` style
//! - Reporting recoverable syntax problems on request
//! - Building source maps
//!
//! No state is kept between calls, and calls from different threads do not
//! interact.
//!
//! # Example
//!
//! ```
//! use ts_transpile::{transpile, transpile_module, ModuleKind, TranspileOptions};
//!
//! let source = r#"
//! export function greet(name: string): string {
//!     return `Hello, ${name}!`;
//! }
//! "#;
//!
//! let js = transpile(source).unwrap();
//! assert!(js.contains("function greet(name)"));
//!
//! let esm = transpile_module(source, &TranspileOptions::new(ModuleKind::EsModule)).unwrap();
//! assert!(esm.code.contains("export function greet(name)"));
//! assert!(esm.diagnostics.is_empty());
//! ```

mod diagnostic;
mod error;
mod options;
mod top_level_await;
mod transform;

pub use diagnostic::Diagnostic;
pub use error::{ParseModuleKindError, TranspileError};
pub use options::{ImportInterop, ModuleKind, TranspileOptions};
pub use transform::{output_file_name, transpile, transpile_module, TranspileOutput};

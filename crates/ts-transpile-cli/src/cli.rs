//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use ts_transpile::ModuleKind;

/// Transpile TypeScript files to JavaScript.
#[derive(Debug, Parser)]
#[command(name = "ts-transpile")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Files or directories to transpile (reads stdin when none are given)
    pub inputs: Vec<Utf8PathBuf>,

    /// Directory to write output files to (prints to stdout otherwise)
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Module system of the output (commonjs, amd, umd, system, esnext, ...)
    #[arg(long)]
    pub module: Option<ModuleKind>,

    /// Path to tsconfig.json
    #[arg(short = 'p', long)]
    pub project: Option<Utf8PathBuf>,

    /// Write .js.map files next to the output (requires --out-dir)
    #[arg(long = "source-map")]
    pub source_map: bool,

    /// Print recoverable syntax diagnostics
    #[arg(long)]
    pub diagnostics: bool,

    /// Diagnostics output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Exit with error when any diagnostic was reported
    #[arg(long = "fail-on-diagnostics")]
    pub fail_on_diagnostics: bool,

    /// Glob patterns to ignore when walking directories
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}

impl Args {
    /// Returns whether input is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["ts-transpile"]);
        assert!(args.reads_stdin());
        assert!(args.out_dir.is_none());
        assert!(args.module.is_none());
        assert!(matches!(args.output, OutputFormat::Human));
        assert!(!args.source_map);
        assert!(!args.verbose);
    }

    #[test]
    fn test_inputs_and_out_dir() {
        let args = Args::parse_from(["ts-transpile", "src", "main.ts", "--out-dir", "dist"]);
        let inputs: Vec<&str> = args.inputs.iter().map(|p| p.as_str()).collect();
        assert_eq!(inputs, vec!["src", "main.ts"]);
        assert_eq!(args.out_dir.as_deref().map(|p| p.as_str()), Some("dist"));
        assert!(!args.reads_stdin());
    }

    #[test]
    fn test_module_uses_tsconfig_names() {
        let args = Args::parse_from(["ts-transpile", "--module", "ESNext"]);
        assert_eq!(args.module, Some(ModuleKind::EsModule));

        let args = Args::parse_from(["ts-transpile", "--module", "amd"]);
        assert_eq!(args.module, Some(ModuleKind::Amd));

        assert!(Args::try_parse_from(["ts-transpile", "--module", "jsonp"]).is_err());
    }

    #[test]
    fn test_output_formats() {
        let args = Args::parse_from(["ts-transpile", "--output", "json"]);
        assert!(matches!(args.output, OutputFormat::Json));

        let args = Args::parse_from(["ts-transpile", "--output", "machine"]);
        assert!(matches!(args.output, OutputFormat::Machine));
    }

    #[test]
    fn test_project_and_ignore() {
        let args = Args::parse_from([
            "ts-transpile",
            "-p",
            "config/tsconfig.build.json",
            "--ignore",
            "**/*.test.ts",
            "--ignore",
            "fixtures/**",
            "-v",
        ]);
        assert_eq!(
            args.project.as_deref().map(|p| p.as_str()),
            Some("config/tsconfig.build.json")
        );
        assert_eq!(args.ignore, vec!["**/*.test.ts", "fixtures/**"]);
        assert!(args.verbose);
    }
}

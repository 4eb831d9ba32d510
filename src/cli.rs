//! Command-line surface: subcommands and their argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Turn a sales spreadsheet into revenue metrics and insights",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect column roles, compute revenue aggregates and print insights
    Analyze(AnalyzeArgs),
    /// Show which column was detected for each sales role
    Classify(InputArgs),
    /// Print descriptive statistics, monthly trend, correlation and elasticity
    Stats(InputArgs),
    /// Write the derived rows (with revenue) as delimited text
    Export(ExportArgs),
    /// Check that a file's headers match an exact layout
    Verify(VerifyArgs),
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Spreadsheet (.xlsx, .xls, .ods) or delimited text file to read
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet to read (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Delimiter for text input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct LayoutArgs {
    /// YAML file listing the exact headers the input must have
    #[arg(long, conflicts_with = "legacy_layout")]
    pub layout: Option<PathBuf>,
    /// Require the legacy order-export headers before analyzing
    #[arg(long = "legacy-layout")]
    pub legacy_layout: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Output format for the report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Include descriptive statistics, growth, correlation and elasticity
    #[arg(long = "show-stats")]
    pub show_stats: bool,
    /// Number of derived rows to list in the report
    #[arg(long = "show-rows", default_value_t = 0)]
    pub show_rows: usize,
    /// Also export derived rows to this file
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Delimiter for the export file (defaults from its extension)
    #[arg(long = "export-delimiter", value_parser = parse_delimiter)]
    pub export_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file ('-' or omitted for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML layout file (defaults to the legacy order-export layout)
    #[arg(long)]
    pub layout: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_symbols() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn analyze_args_parse_flattened_groups() {
        let cli = Cli::try_parse_from([
            "sales-insights",
            "analyze",
            "-i",
            "sales.xlsx",
            "--legacy-layout",
            "--format",
            "json",
        ])
        .expect("parse args");
        match cli.command {
            Commands::Analyze(args) => {
                assert!(args.layout.legacy_layout);
                assert_eq!(args.format, OutputFormat::Json);
                assert_eq!(args.input.input, PathBuf::from("sales.xlsx"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn layout_flags_conflict() {
        let result = Cli::try_parse_from([
            "sales-insights",
            "analyze",
            "-i",
            "sales.csv",
            "--layout",
            "layout.yml",
            "--legacy-layout",
        ]);
        assert!(result.is_err());
    }
}

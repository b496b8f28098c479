use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use taskbank_lib::Dialect;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    MarkerScan,
    Grouped,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::MarkerScan => Dialect::MarkerScan,
            DialectArg::Grouped => Dialect::Grouped,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskbank", version, about = "Compile question spreadsheets into task JSON")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./taskbank.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log per-block details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a workbook into task JSON
    Compile(CompileArgs),
    /// List the sheets of a workbook
    Sheets(SheetsArgs),
    /// Write a starter workbook for a dialect
    Template(TemplateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CompileArgs {
    /// Input workbook (.xlsx, .xls, .xlsb, .ods)
    pub input: PathBuf,

    /// Output file; JSON goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sheet layout to expect
    #[arg(long, value_enum, group = "layout")]
    pub dialect: Option<DialectArg>,

    /// Pick the layout from a subject name (ml => marker-scan, else grouped)
    #[arg(long, group = "layout")]
    pub subject: Option<String>,

    /// Sheet name (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Skip broken records instead of aborting the run
    #[arg(long)]
    pub best_effort: bool,
}

impl CompileArgs {
    pub fn dialect(&self) -> Dialect {
        match (&self.dialect, &self.subject) {
            (Some(d), _) => (*d).into(),
            (None, Some(subject)) => Dialect::for_subject(subject),
            (None, None) => Dialect::Grouped,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SheetsArgs {
    pub input: PathBuf,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateArgs {
    /// Where to write the .xlsx template
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = DialectArg::Grouped)]
    pub dialect: DialectArg,
}

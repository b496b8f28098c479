//! Compiles question-bank spreadsheets into canonical task JSON.
//!
//! Two sheet layouts are understood: marker-scan sheets made of repeated
//! "Project ID" / "Part ID" blocks, and grouped sheets with a header row and
//! one row per (task, part). Both compile to the same [`compiler::Task`] tree.

pub mod compiler;
pub mod config;
pub mod error;
pub mod excel;

pub use compiler::{
    compile, compile_grid, write_tasks, write_tasks_to_path, AssemblyPolicy, Compilation,
    CompileOptions, CompileReport, Dialect, Part, PartType, Task,
};
pub use config::CompilerConfig;
pub use error::CompileError;
pub use excel::{Grid, Source};

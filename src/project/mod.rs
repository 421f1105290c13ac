//! Driving a compilation: input files, loading and the staged pipeline.

mod files;
mod loader;
mod pipeline;

pub use files::FileSet;
pub use loader::{EXTENSION, LoadError, expand_inputs, load, normalize};
pub use pipeline::{
    Compilation, CompilerConfig, Pipeline, Program, Stage, Timings, merge, parse_file,
};

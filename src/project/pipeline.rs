//! The compilation pipeline.
//!
//! A run goes through fixed stages:
//!
//! 1. **Load** every input file (parallel)
//! 2. **Lex** every loaded text (parallel)
//! 3. **Parse** every token stream into its own tree (parallel)
//! 4. **Merge** the file trees into one program tree, in input order
//! 5. **Resolve** the program tree
//!
//! Stages 1-3 run on a dedicated worker pool; each one is a full barrier.
//! If any file fails a stage, the run stops after that stage with every
//! diagnostic the stage produced. Resolution never stops early.

use std::fmt;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use super::files::FileSet;
use super::loader;
use crate::base::{FileId, Span};
use crate::hir::{Diagnostic, DiagnosticCollector, ErrorSink, ResolveError, Resolver, codes};
use crate::parser::{Parser, PatternSet, ParseResult, Token, tokenize};
use crate::syntax::{ContextId, MergeConflict, NodeId, NodeKind, SyntaxTree, VariableCategory};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings of one compiler run.
#[derive(Clone, Debug, Default)]
pub struct CompilerConfig {
    /// Worker threads; hardware parallelism when `None`.
    pub threads: Option<usize>,
    /// Print stage durations after the run.
    pub report_timings: bool,
    /// Print the resolved program tree.
    pub print_tree: bool,
}

/// A pipeline stage that can fail a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Lex,
    Parse,
    Resolve,
}

impl Stage {
    /// Process exit status of a run that failed in this stage.
    pub fn exit_code(self) -> u8 {
        match self {
            Stage::Load => 1,
            Stage::Lex => 2,
            Stage::Parse => 3,
            Stage::Resolve => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Lex => "lex",
            Stage::Parse => "parse",
            Stage::Resolve => "resolve",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wall time spent in each stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timings {
    pub load: Duration,
    pub lex: Duration,
    pub parse: Duration,
    pub merge: Duration,
    pub resolve: Duration,
}

impl fmt::Display for Timings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "load {:?}, lex {:?}, parse {:?}, merge {:?}, resolve {:?}",
            self.load, self.lex, self.parse, self.merge, self.resolve
        )
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// A tree together with its top-level scope and root block.
#[derive(Debug)]
pub struct Program {
    pub tree: SyntaxTree,
    pub context: ContextId,
    pub root: NodeId,
}

impl Program {
    /// Indented outline of the whole tree.
    pub fn dump(&self) -> String {
        self.tree.dump(self.root)
    }
}

/// Outcome of a run.
#[derive(Debug)]
pub struct Compilation {
    pub files: FileSet,
    /// The merged program, present once parsing succeeded. After a resolve
    /// failure it still holds the partially resolved tree.
    pub program: Option<Program>,
    /// Diagnostics of the stage that failed, in file and position order.
    pub diagnostics: DiagnosticCollector,
    pub failed: Option<Stage>,
    pub timings: Timings,
}

impl Compilation {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    /// Zero on success, otherwise the code of the failed stage.
    pub fn exit_code(&self) -> u8 {
        self.failed.map_or(0, Stage::exit_code)
    }

    fn stopped(files: FileSet, stage: Stage, sink: ErrorSink, timings: Timings) -> Self {
        let diagnostics = sink.into_sorted();
        warn!(stage = %stage, errors = diagnostics.len(), "compilation stopped");
        Self {
            files,
            program: None,
            diagnostics,
            failed: Some(stage),
            timings,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Runs compilations on its own worker pool.
pub struct Pipeline {
    config: CompilerConfig,
    pool: ThreadPool,
}

impl Pipeline {
    pub fn new(config: CompilerConfig) -> Result<Self, ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("weave-worker-{}", i));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }

        Ok(Self {
            config,
            pool: builder.build()?,
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compile every file of `files`, in id order.
    pub fn compile(&self, files: FileSet) -> Compilation {
        let ids = files.files();
        let sink = ErrorSink::new();
        let mut timings = Timings::default();

        let started = Instant::now();
        self.load(&files, &ids, &sink);
        timings.load = finished(Stage::Load, ids.len(), started);
        if sink.has_errors() {
            return Compilation::stopped(files, Stage::Load, sink, timings);
        }

        let started = Instant::now();
        let tokens = self.lex(&files, &ids, &sink);
        timings.lex = finished(Stage::Lex, ids.len(), started);
        if sink.has_errors() {
            return Compilation::stopped(files, Stage::Lex, sink, timings);
        }

        let started = Instant::now();
        let parsed = self.parse(tokens, &sink);
        timings.parse = finished(Stage::Parse, ids.len(), started);
        if sink.has_errors() {
            return Compilation::stopped(files, Stage::Parse, sink, timings);
        }

        let started = Instant::now();
        let (mut program, conflicts) = merge(parsed);
        timings.merge = started.elapsed();

        let started = Instant::now();
        let mut errors: Vec<ResolveError> = conflicts.into_iter().map(ResolveError::from).collect();
        for error in &errors {
            warn!(code = error.code(), "{}", error);
        }
        errors.extend(Resolver::new(&mut program.tree).resolve(program.root));
        timings.resolve = finished(Stage::Resolve, ids.len(), started);

        let mut diagnostics = DiagnosticCollector::new();
        diagnostics.extend(errors.iter().map(Diagnostic::from_resolve));
        diagnostics.sort();

        Compilation {
            files,
            program: Some(program),
            failed: diagnostics.has_errors().then_some(Stage::Resolve),
            diagnostics,
            timings,
        }
    }

    fn load(&self, files: &FileSet, ids: &[FileId], sink: &ErrorSink) {
        self.pool.install(|| {
            ids.par_iter().for_each(|&file| {
                let Some(path) = files.path(file) else {
                    return;
                };
                match loader::load(&path) {
                    Ok(text) => files.set_contents(file, text),
                    Err(error) => sink.add(
                        Diagnostic::error(file, Span::default(), error.to_string())
                            .with_code(codes::LOAD),
                    ),
                }
            })
        });
    }

    fn lex(&self, files: &FileSet, ids: &[FileId], sink: &ErrorSink) -> Vec<(FileId, Vec<Token>)> {
        self.pool.install(|| {
            ids.par_iter()
                .filter_map(|&file| {
                    let text = files.contents(file)?;
                    match tokenize(&text) {
                        Ok(tokens) => Some((file, tokens)),
                        Err(error) => {
                            sink.add(Diagnostic::from_lex(file, &error));
                            None
                        }
                    }
                })
                .collect()
        })
    }

    fn parse(&self, tokens: Vec<(FileId, Vec<Token>)>, sink: &ErrorSink) -> Vec<Program> {
        self.pool.install(|| {
            tokens
                .into_par_iter()
                .filter_map(|(file, tokens)| match parse_file(file, tokens) {
                    Ok(program) => Some(program),
                    Err(error) => {
                        sink.add(Diagnostic::from_parse(file, &error));
                        None
                    }
                })
                .collect()
        })
    }
}

fn finished(stage: Stage, files: usize, started: Instant) -> Duration {
    let elapsed = started.elapsed();
    info!(stage = %stage, files, ?elapsed, "stage finished");
    elapsed
}

/// Parse one file's tokens into a fresh tree with its own top-level scope.
pub fn parse_file(file: FileId, tokens: Vec<Token>) -> ParseResult<Program> {
    let mut tree = SyntaxTree::new(file);
    let context = tree.new_context();
    let root = Parser::new(PatternSet::standard(), &mut tree, VariableCategory::Global)
        .parse(context, tokens)?;
    debug!(file = file.index(), nodes = tree.len(), "parsed file");
    Ok(Program { tree, context, root })
}

/// Merge file programs into one, in the order given.
///
/// The first declaration of a name wins; later ones are returned as
/// conflicts.
pub fn merge(files: Vec<Program>) -> (Program, Vec<MergeConflict>) {
    let mut tree = SyntaxTree::new(FileId::default());
    let context = tree.new_context();
    let root = tree.alloc(NodeKind::Block, Span::default());
    tree.set_context(root, context);

    let mut conflicts = Vec::new();
    for file in files {
        conflicts.extend(tree.merge_tree(root, context, file.tree, file.root, file.context));
    }

    (Program { tree, context, root }, conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn program(file: u32, text: &str) -> Program {
        parse_file(FileId::new(file), tokenize(text).unwrap()).unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(CompilerConfig {
            threads: Some(2),
            ..CompilerConfig::default()
        })
        .unwrap()
    }

    fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_stage_exit_codes() {
        assert_eq!(Stage::Load.exit_code(), 1);
        assert_eq!(Stage::Lex.exit_code(), 2);
        assert_eq!(Stage::Parse.exit_code(), 3);
        assert_eq!(Stage::Resolve.exit_code(), 4);
    }

    #[test]
    fn test_merge_first_declaration_wins() {
        let a = program(0, "func main() {\n}");
        let b = program(1, "func main() {\n}\ntype T {\n}");

        let (merged, conflicts) = merge(vec![a, b]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].file, FileId::new(1));
        let main = merged.tree.lookup_function(merged.context, "main").unwrap();
        assert_eq!(merged.tree.node(main).file, FileId::new(0));
        assert!(merged.tree.lookup_type(merged.context, "T").is_some());
        assert_eq!(merged.tree.child_count(merged.root), 3);
    }

    #[test]
    fn test_compile_success() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.wv", "type Point {\n x: i32\n}");
        let b = write(&dir, "b.wv", "func main(): i32 {\n p = Point()\n return p.x\n}");

        let compilation = pipeline().compile(FileSet::from_paths([a, b]));

        assert!(compilation.is_success(), "{:?}", compilation.diagnostics);
        assert_eq!(compilation.exit_code(), 0);
        assert!(compilation.diagnostics.is_empty());
        assert!(compilation.program.is_some());
    }

    #[test]
    fn test_load_failure_stops_run() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.wv", "func main() {\n}");
        let missing = dir.path().join("missing.wv");

        let compilation = pipeline().compile(FileSet::from_paths([good, missing]));

        assert_eq!(compilation.failed, Some(Stage::Load));
        assert_eq!(compilation.exit_code(), 1);
        assert_eq!(compilation.diagnostics.len(), 1);
        assert_eq!(compilation.diagnostics.diagnostics()[0].file, FileId::new(1));
        assert!(compilation.program.is_none());
    }

    #[test]
    fn test_lex_failure_stops_before_parse() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.wv", "x = (1, 2");
        let b = write(&dir, "b.wv", "y = 3(x)");

        let compilation = pipeline().compile(FileSet::from_paths([a, b]));

        assert_eq!(compilation.failed, Some(Stage::Lex));
        assert_eq!(compilation.diagnostics.len(), 2);
        assert!(
            compilation
                .diagnostics
                .diagnostics()
                .iter()
                .all(|d| d.code == Some(codes::LEX))
        );
    }

    #[test]
    fn test_parse_errors_from_every_file() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.wv", "while () {\n}");
        let b = write(&dir, "b.wv", "func main() {\n}");
        let c = write(&dir, "c.wv", "+ +");

        let compilation = pipeline().compile(FileSet::from_paths([a, b, c]));

        assert_eq!(compilation.failed, Some(Stage::Parse));
        let files: Vec<_> = compilation.diagnostics.diagnostics().iter().map(|d| d.file).collect();
        assert_eq!(files, vec![FileId::new(0), FileId::new(2)]);
    }

    #[test]
    fn test_resolve_failure_keeps_program() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.wv", "func main() {\n return missing\n}");
        let b = write(&dir, "b.wv", "func main() {\n}");

        let compilation = pipeline().compile(FileSet::from_paths([a, b]));

        assert_eq!(compilation.failed, Some(Stage::Resolve));
        assert_eq!(compilation.exit_code(), 4);
        let found: Vec<_> = compilation
            .diagnostics
            .diagnostics()
            .iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(found, vec![Some(codes::UNRESOLVED_NAME), Some(codes::DUPLICATE_DECLARATION)]);
        assert!(compilation.program.is_some());
    }

    #[test]
    fn test_unbound_name_fails_resolution() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.wv", "func f() {\n}\ny = missing");

        let compilation = pipeline().compile(FileSet::from_paths([a]));

        assert_eq!(compilation.failed, Some(Stage::Resolve));
        assert_eq!(compilation.exit_code(), 4);
        let diagnostics = compilation.diagnostics.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, Some(codes::UNRESOLVED_NAME));
        assert_eq!(diagnostics[0].start.line, 2);
    }

    #[test]
    fn test_call_into_a_later_file() {
        let dir = TempDir::new().unwrap();
        let b = write(&dir, "b.wv", "z = g()");
        let c = write(&dir, "c.wv", "func g() {\n}");

        let compilation = pipeline().compile(FileSet::from_paths([b, c]));

        assert!(compilation.is_success(), "{:?}", compilation.diagnostics);
        let program = compilation.program.unwrap();
        assert!(program.dump().contains("  Operator =\n    Variable z\n    Call\n"));
    }
}

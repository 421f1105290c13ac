//! End-to-end behavior of the front end through its public API.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;
use weave::hir::{ResolveError, Resolver, codes};
use weave::parser::{ParseError, ParseResult, Parser, Pattern, PatternSet, TokenType, Window, tokenize};
use weave::project::{CompilerConfig, FileSet, Pipeline, Program, Stage, merge, parse_file};
use weave::syntax::{ContextId, NodeId, NodeKind, Status, SyntaxTree, VariableCategory};
use weave::FileId;

// ============================================================================
// HELPERS
// ============================================================================

fn parse(file: u32, text: &str) -> Program {
    parse_file(FileId::new(file), tokenize(text).unwrap()).unwrap()
}

fn write_files(dir: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        })
        .collect()
}

fn compile(paths: &[PathBuf]) -> weave::Compilation {
    Pipeline::new(CompilerConfig {
        threads: Some(4),
        ..CompilerConfig::default()
    })
    .unwrap()
    .compile(FileSet::from_paths(paths))
}

/// Labels of the steps in the header of the first `while` loop.
fn header_steps(program: &Program) -> Vec<String> {
    let tree = &program.tree;
    let node = tree
        .children(program.root)
        .find(|&n| matches!(tree.kind(n), NodeKind::While))
        .unwrap();
    let header = tree.first(node).unwrap();
    tree.children(header).map(|step| tree.kind(step).label()).collect()
}

// ============================================================================
// WHILE HEADER
// ============================================================================

#[rstest]
#[case("i: i32\nwhile (i < 10) {\n}", &["Empty", "Operator <", "Empty"])]
#[case("while (i = 0, i < 10, i = i + 1) {\n}", &["Operator =", "Operator <", "Operator ="])]
#[case("i: i32\nwhile (i < 10, i += 1) {\n}", &["Empty", "Operator <", "Operator +="])]
fn test_while_header_normalization(#[case] text: &str, #[case] expected: &[&str]) {
    assert_eq!(header_steps(&parse(0, text)), expected);
}

#[test]
fn test_empty_while_header_is_build_error() {
    let error = parse_file(FileId::new(0), tokenize("while () {\n}").unwrap()).unwrap_err();
    assert!(matches!(error, ParseError::EmptyWhileHeader { .. }));
    assert!(error.to_string().ends_with("while parenthesis cannot be empty"));
}

// ============================================================================
// PATTERN PRIORITY
// ============================================================================

/// Competes for `identifier operator number` windows.
struct Competing {
    name: &'static str,
    priority: u32,
}

impl Pattern for Competing {
    fn name(&self) -> &'static str {
        self.name
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[TokenType::IDENTIFIER, TokenType::OPERATOR, TokenType::NUMBER];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        self.priority
    }

    fn build(&self, parser: &mut Parser<'_>, _context: ContextId, window: Window) -> ParseResult<NodeId> {
        let kind = if self.priority > 1 { NodeKind::Return } else { NodeKind::Empty };
        Ok(parser.tree_mut().alloc(kind, window.span()))
    }
}

fn winner(patterns: &PatternSet) -> String {
    let mut tree = SyntaxTree::new(FileId::new(0));
    let context = tree.new_context();
    let root = Parser::new(patterns, &mut tree, VariableCategory::Local)
        .parse(context, tokenize("a + 1").unwrap())
        .unwrap();
    tree.dump(root)
}

#[test]
fn test_higher_priority_wins_regardless_of_registration() {
    let low_first = PatternSet::new()
        .with(Competing { name: "low", priority: 1 })
        .with(Competing { name: "high", priority: 2 });
    let high_first = PatternSet::new()
        .with(Competing { name: "high", priority: 2 })
        .with(Competing { name: "low", priority: 1 });

    for _ in 0..8 {
        assert_eq!(winner(&low_first), "Block\n  Return\n");
        assert_eq!(winner(&high_first), "Block\n  Return\n");
    }
}

#[rstest]
#[case("Point()\ntype Point {\n}", "Block\n  Construction\n  Type Point [Unparsed]\n")]
#[case("f(1)\nfunc f(a) {\n}", "Block\n  Call\n    Number 1\n  Function f [Unparsed]\n")]
fn test_use_before_declaration_in_file(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(parse(0, text).dump(), expected);
}

#[test]
fn test_declaration_after_lower_priority_statement() {
    // The declaration on the second line outranks the assignment above it
    let program = parse(0, "y = origin\norigin: i32");
    let tree = &program.tree;

    assert_eq!(
        program.dump(),
        "Block\n  Operator =\n    Variable y\n    Variable origin\n  Declaration origin\n"
    );
    let assignment = tree.first(program.root).unwrap();
    let declaration = tree.last(program.root).unwrap();
    assert!(declaration < assignment);
}

// ============================================================================
// RESOLVER
// ============================================================================

#[test]
fn test_resolver_accumulates_one_error() {
    let mut program = parse(
        0,
        "type Good {\n value: i32\n func get(): i32 {\n return value\n }\n}\n\
         type Fine {\n good: Good\n func get(): i32 {\n return good.value\n }\n}\n\
         type Bad {\n broken: Missing\n func get(): i32 {\n return 0\n }\n}",
    );

    let errors = Resolver::new(&mut program.tree).resolve(program.root);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ResolveError::UnresolvedType { name, .. } if name == "Missing"));

    let tree = &program.tree;
    let statuses: Vec<_> = ["Good", "Fine", "Bad"]
        .iter()
        .map(|name| {
            let ty = tree.lookup_type(program.context, name).unwrap();
            let scope = tree.context_of(ty).unwrap();
            let get = tree.context(scope).local_function("get").unwrap();
            let type_status = match tree.kind(ty) {
                NodeKind::Type(ty) => ty.status,
                _ => unreachable!(),
            };
            let function_status = match tree.kind(get) {
                NodeKind::Function(function) => function.status,
                _ => unreachable!(),
            };
            (type_status, function_status)
        })
        .collect();

    assert_eq!(
        statuses,
        vec![
            (Status::Resolved, Status::Resolved),
            (Status::Resolved, Status::Resolved),
            (Status::Failed, Status::Resolved),
        ]
    );
}

// ============================================================================
// MERGE ORDER
// ============================================================================

fn owner_of_main(order: &[(u32, &str)]) -> (FileId, Vec<FileId>) {
    let files = order.iter().map(|&(file, text)| parse(file, text)).collect();
    let (program, conflicts) = merge(files);
    let main = program.tree.lookup_function(program.context, "main").unwrap();
    (
        program.tree.node(main).file,
        conflicts.iter().map(|c| c.file).collect(),
    )
}

#[test]
fn test_merge_order_decides_duplicates() {
    let a = (0, "func main() {\n}");
    let b = (1, "func main() {\n}");

    for _ in 0..8 {
        assert_eq!(owner_of_main(&[a, b]), (FileId::new(0), vec![FileId::new(1)]));
        assert_eq!(owner_of_main(&[b, a]), (FileId::new(1), vec![FileId::new(0)]));
    }
}

#[test]
fn test_pipeline_diagnostics_are_stable() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("a.wv", "func main() {\n return nope\n}"),
            ("b.wv", "func main() {\n}\nfunc other() {\n return gone\n}"),
            ("c.wv", "type T {\n x: Unknown\n}"),
        ],
    );

    let first: Vec<String> = compile(&paths)
        .diagnostics
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();

    assert_eq!(first.len(), 4);
    for _ in 0..8 {
        let again: Vec<String> = compile(&paths)
            .diagnostics
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(again, first);
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

#[test]
fn test_declarations_visible_across_files() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("main.wv", "func main(): i64 {\n v = Vector()\n return norm(v)\n}"),
            (
                "vector.wv",
                "type Vector {\n x: i64\n y: i64\n}\n\
                 func norm(v: Vector): i64 {\n return v.x * v.x + v.y * v.y\n}",
            ),
        ],
    );

    let compilation = compile(&paths);
    assert!(compilation.is_success(), "{:?}", compilation.diagnostics);

    let program = compilation.program.unwrap();
    let outline = program.dump();
    assert!(outline.contains("Function main [Resolved]"));
    assert!(outline.contains("Type Vector [Resolved]"));
    assert!(outline.contains("Function norm [Resolved]"));
}

#[test]
fn test_crlf_and_tabs_are_normalized() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("win.wv", "func main() {\r\n\tx = 1\r\n\treturn x\r\n}\r\n")]);

    let compilation = compile(&paths);
    assert!(compilation.is_success(), "{:?}", compilation.diagnostics);
}

#[rstest]
#[case("x = (1", Stage::Lex)]
#[case("x = 1 +", Stage::Parse)]
#[case("func f() {\n return y\n}", Stage::Resolve)]
fn test_failing_stage(#[case] text: &str, #[case] stage: Stage) {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("bad.wv", text)]);

    let compilation = compile(&paths);
    assert_eq!(compilation.failed, Some(stage));
    assert_eq!(compilation.exit_code(), stage.exit_code());
    assert!(!compilation.diagnostics.is_empty());
}

#[test]
fn test_unbound_name_is_a_resolve_failure() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.wv", "func f() {\n}\ny = missing")]);

    let compilation = compile(&paths);
    assert_eq!(compilation.failed, Some(Stage::Resolve));
    assert_eq!(compilation.exit_code(), 4);

    let rendered: Vec<_> = compilation
        .diagnostics
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(rendered, vec![format!("ERROR[{}]: 3:5 | unresolved name 'missing'", codes::UNRESOLVED_NAME)]);
}

#[test]
fn test_file_level_call_into_another_file() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("b.wv", "z = g()"), ("c.wv", "func g() {\n}")]);

    let compilation = compile(&paths);
    assert!(compilation.is_success(), "{:?}", compilation.diagnostics);
    assert_eq!(compilation.exit_code(), 0);
}

#[test]
fn test_diagnostic_positions() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("loop.wv", "x = 1\nwhile () {\n}")]);

    let compilation = compile(&paths);
    let rendered: Vec<_> = compilation
        .diagnostics
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(rendered, vec!["ERROR[E0300]: 2:7 | while parenthesis cannot be empty"]);
}

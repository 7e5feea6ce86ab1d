//! Per-language capability abstraction: extensions, grammar handle, and the three
//! extraction operations a language contributes to the parsing/imports/calls phases.
//! Grounded on `mycelium/languages/*.py`'s `LanguageAnalyser` protocol.

pub mod c;
pub mod cpp;
pub mod csharp;
pub mod go;
pub mod java;
pub mod python;
pub mod rust_lang;
pub mod typescript;
pub mod vbnet;

use std::cell::RefCell;

use tree_sitter::{Language, Parser, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall};

/// A language analyser: a stateless capability bundle over one or more file
/// extensions. Implementations hold no state — the parser itself is cached
/// thread-locally by [`parser_for`], not on the analyser.
pub trait LanguageAnalyser: Sync {
    fn language_name(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    fn ts_language(&self) -> Language;
    /// `false` only for VB.NET, for which no usable grammar crate exists.
    fn is_available(&self) -> bool {
        true
    }
    fn extract_symbols(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<DraftSymbol>;
    fn extract_imports(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement>;
    fn extract_calls(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<RawCall>;
    fn builtin_exclusions(&self) -> &'static [&'static str];
}

/// Return the registered analyser for a file extension (without the leading dot),
/// or `None` if the extension is not recognised, or the analyser exists but has no
/// working grammar (VB.NET).
pub fn analyser_for_extension(ext: &str) -> Option<&'static dyn LanguageAnalyser> {
    static CSHARP: csharp::CSharpAnalyser = csharp::CSharpAnalyser;
    static VBNET: vbnet::VbNetAnalyser = vbnet::VbNetAnalyser;
    static TS: typescript::TypeScriptAnalyser = typescript::TypeScriptAnalyser;
    static PYTHON: python::PythonAnalyser = python::PythonAnalyser;
    static JAVA: java::JavaAnalyser = java::JavaAnalyser;
    static GO: go::GoAnalyser = go::GoAnalyser;
    static RUST: rust_lang::RustAnalyser = rust_lang::RustAnalyser;
    static C: c::CAnalyser = c::CAnalyser;
    static CPP: cpp::CppAnalyser = cpp::CppAnalyser;

    let analyser: &'static dyn LanguageAnalyser = match ext {
        "cs" => &CSHARP,
        "vb" => &VBNET,
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => &TS,
        "py" | "pyi" => &PYTHON,
        "java" => &JAVA,
        "go" => &GO,
        "rs" => &RUST,
        "c" | "h" => &C,
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => &CPP,
        _ => return None,
    };
    if analyser.is_available() { Some(analyser) } else { None }
}

thread_local! {
    static PARSER_CSHARP: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_c_sharp::LANGUAGE.into()));
    static PARSER_TS: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()));
    static PARSER_TSX: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_typescript::LANGUAGE_TSX.into()));
    static PARSER_JS: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_javascript::LANGUAGE.into()));
    static PARSER_PYTHON: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_python::LANGUAGE.into()));
    static PARSER_JAVA: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_java::LANGUAGE.into()));
    static PARSER_GO: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_go::LANGUAGE.into()));
    static PARSER_RUST: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_rust::LANGUAGE.into()));
    static PARSER_C: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_c::LANGUAGE.into()));
    static PARSER_CPP: RefCell<Parser> = RefCell::new(new_parser(tree_sitter_cpp::LANGUAGE.into()));
}

fn new_parser(language: Language) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(&language).expect("bundled grammar is always compatible with its crate's tree-sitter version");
    parser
}

/// Parse `source` using the thread-local parser selected for `ext`. One parser
/// instance per grammar per worker thread — avoids both lock contention under
/// `rayon::par_iter` and the cost of re-initialising a grammar per file.
pub fn parse_with_thread_local(ext: &str, source: &[u8]) -> Option<Tree> {
    match ext {
        "cs" => PARSER_CSHARP.with(|p| p.borrow_mut().parse(source, None)),
        "ts" => PARSER_TS.with(|p| p.borrow_mut().parse(source, None)),
        "tsx" => PARSER_TSX.with(|p| p.borrow_mut().parse(source, None)),
        "js" | "jsx" | "mjs" | "cjs" => PARSER_JS.with(|p| p.borrow_mut().parse(source, None)),
        "py" | "pyi" => PARSER_PYTHON.with(|p| p.borrow_mut().parse(source, None)),
        "java" => PARSER_JAVA.with(|p| p.borrow_mut().parse(source, None)),
        "go" => PARSER_GO.with(|p| p.borrow_mut().parse(source, None)),
        "rs" => PARSER_RUST.with(|p| p.borrow_mut().parse(source, None)),
        "c" | "h" => PARSER_C.with(|p| p.borrow_mut().parse(source, None)),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => PARSER_CPP.with(|p| p.borrow_mut().parse(source, None)),
        _ => None,
    }
}

/// Depth-first walk helper shared by every analyser: visit every descendant of
/// `node`, calling `visit` on each. Analysers that need parent-tracking (class
/// bodies, namespaces) walk manually instead of using this.
pub(crate) fn walk_all<'a>(node: tree_sitter::Node<'a>, visit: &mut impl FnMut(tree_sitter::Node<'a>)) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_all(child, visit);
    }
}

pub(crate) fn node_text<'a>(node: tree_sitter::Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

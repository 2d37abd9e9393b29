//! Generic configuration parsing from disk and from memory

use pbxlint::pipeline::source::MemoryOpener;
use pbxlint::testing::{assert_kinds, parse_config};
use pbxlint::{DiagnosticKind, Loader};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn keys(context: &pbxlint::ast::Context) -> Vec<&str> {
    context.varsets.iter().map(|v| v.key.as_str()).collect()
}

#[test]
fn test_include_is_spliced_in_place() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.conf"),
        "[a]\nx=1\n#include \"sub.conf\"\ny=2\n",
    )
    .unwrap();
    fs::write(dir.path().join("sub.conf"), "z=3\n").unwrap();

    let loader = Loader::new();
    let contexts = loader.load_config(dir.path().join("main.conf")).unwrap();

    assert_eq!(contexts.len(), 1);
    assert_eq!(keys(&contexts[0]), vec!["x", "z", "y"]);
    let z = contexts[0].get("z").unwrap();
    assert!(z.location.filename.ends_with("sub.conf"));
    assert_eq!(z.location.line, 1);
    assert_kinds(loader.diagnostics(), &[]);
}

#[test]
fn test_nested_include_resolves_against_its_own_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("inc")).unwrap();
    fs::write(
        dir.path().join("main.conf"),
        "[a]\nx=1\n#include inc/outer.conf\ny=2\n\n[b]\nw=4\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("inc/outer.conf"),
        "p=1\n#include inner.conf\nq=2\n",
    )
    .unwrap();
    fs::write(dir.path().join("inc/inner.conf"), "\nr=3\n").unwrap();

    let loader = Loader::new();
    let contexts = loader.load_config(dir.path().join("main.conf")).unwrap();

    assert_eq!(contexts.len(), 2);
    assert_eq!(keys(&contexts[0]), vec!["x", "p", "r", "q", "y"]);
    assert_eq!(keys(&contexts[1]), vec!["w"]);
    let r = contexts[0].get("r").unwrap();
    assert!(r.location.filename.ends_with("inc/inner.conf"));
    assert_eq!(r.location.line, 2);

    let diagnostics = loader.diagnostics().events();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::WshBof);
    assert!(diagnostics[0].location.filename.ends_with("inner.conf"));
}

#[test]
fn test_missing_includes() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.conf"),
        "#tryinclude optional.conf\n#include required.conf\n",
    )
    .unwrap();

    let loader = Loader::new();
    let contexts = loader.load_config(dir.path().join("main.conf")).unwrap();
    assert!(contexts.is_empty());
    assert_kinds(loader.diagnostics(), &[DiagnosticKind::PpIncludeMissing]);
}

#[test]
fn test_missing_top_level_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = Loader::new()
        .load_config(dir.path().join("absent.conf"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_in_memory_includes_resolve_relative_to_parent() {
    let opener = MemoryOpener::new()
        .with_file("conf/main.conf", "[a]\n#include extra/b.conf\n")
        .with_file("conf/extra/b.conf", "k=v\n");
    let loader = Loader::new().with_opener(opener);
    let contexts = loader.load_config("conf/main.conf").unwrap();
    assert_eq!(keys(&contexts[0]), vec!["k"]);
}

#[test]
fn test_reopened_context_is_yielded_twice() {
    let (contexts, sink) = parse_config("[a]\nx=1\n\n[b]\ny=2\n\n[a]\nz=3\n");
    let names: Vec<_> = contexts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "a"]);
    assert_kinds(&sink, &[]);
}

#[test]
fn test_varset_before_any_context() {
    let (contexts, sink) = parse_config("x=1\n\n[a]\ny=2\n");
    assert_eq!(contexts.len(), 1);
    assert_kinds(&sink, &[DiagnosticKind::ConfCtxMissing]);
}

#[test]
fn test_leading_comment_is_recorded() {
    let (contexts, sink) = parse_config("[a]\nx=1\n\n; about b\n[b]\ny=2\n");
    assert!(!contexts[0].had_leading_comment);
    assert!(contexts[1].had_leading_comment);
    assert_kinds(&sink, &[]);
}

#[rstest]
#[case("[a]\r\nx=1\r\ny=2\n", DiagnosticKind::FileDosBareLf, 3)]
#[case("[a]\nx=1\r\n", DiagnosticKind::FileUnixCrlf, 2)]
#[case("[a]\nx=1", DiagnosticKind::FileUnixNoLf, 2)]
#[case("[a]\nx=1 \n", DiagnosticKind::WshEol, 2)]
#[case("[a]\nx=\x07\n", DiagnosticKind::FileCtrlChar, 2)]
#[case("\n[a]\n", DiagnosticKind::WshBof, 1)]
#[case("[a]\nx=1\n\n\n[b]\n", DiagnosticKind::WshVsplitExcess, 4)]
#[case("[a]\nx=1\n[b]\n", DiagnosticKind::WshVsplitMissing, 3)]
fn test_whitespace_and_line_diagnostics(
    #[case] content: &str,
    #[case] kind: DiagnosticKind,
    #[case] line: usize,
) {
    let (_, sink) = parse_config(content);
    let events = sink.events();
    assert_eq!(events.len(), 1, "{:?}", sink.kinds());
    assert_eq!(events[0].kind, kind);
    assert_eq!(events[0].location.line, line);
}

#[test]
fn test_latin1_fallback() {
    let loader = Loader::new().with_opener(
        MemoryOpener::new().with_file("a.conf", b"[a]\nname=caf\xe9\n".to_vec()),
    );
    let contexts = loader.load_config("a.conf").unwrap();
    assert_eq!(contexts[0].get("name").unwrap().value, "café");
    assert_kinds(loader.diagnostics(), &[DiagnosticKind::EncNotUtf8]);
}

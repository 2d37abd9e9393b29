//! Dialplan aggregation over complete files

use pbxlint::ast::ExtensionKey;
use pbxlint::pattern::Pattern;
use pbxlint::settings::{DuplicatePriorityPolicy, Settings, SingletonPolicy};
use pbxlint::testing::{assert_kinds, parse_dialplan, parse_dialplan_with};
use pbxlint::DiagnosticKind;

const SAMPLE: &str = "\
[general]
static=yes

[globals]
TRUNK=SIP/provider

[internal]
include => outbound
exten => 100,1,Answer()
same => n,Playback(hello)
exten => _1XX,1,Dial(SIP/${EXTEN},30)
exten => 100,n(done),Hangup()

[outbound]
exten => _9NXXXXXX,1,Dial(${TRUNK}/${EXTEN:1})
";

#[test]
fn test_sample_is_clean() {
    let (build, sink) = parse_dialplan(SAMPLE);
    assert_kinds(&sink, &[]);
    assert!(build.errors.is_empty());

    let names: Vec<_> = build
        .dialplan
        .contexts()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["internal", "outbound"]);
    assert!(build.dialplan.general.is_some());
    assert_eq!(
        build
            .dialplan
            .globals
            .as_ref()
            .and_then(|g| g.get("TRUNK"))
            .map(|v| v.value.as_str()),
        Some("SIP/provider")
    );
}

#[test]
fn test_sample_rendering() {
    let (build, _) = parse_dialplan(SAMPLE);
    insta::assert_snapshot!(build.dialplan.format(), @r"
    [general]
      static = yes

    [globals]
      TRUNK = SIP/provider

    [internal]
      include => outbound
      100  => 1: Answer()
              2: Playback(hello)
              3(done): Hangup()
      _1XX => 1: Dial(SIP/${EXTEN},30)

    [outbound]
      _9NXXXXXX => 1: Dial(${TRUNK}/${EXTEN:1})
    ");
}

#[test]
fn test_equivalent_spellings_share_priorities() {
    let (build, sink) =
        parse_dialplan("[c]\nexten => 100,1,A()\nexten => _100,n,B()\nexten => 1-0-0,n,C()\n");
    let priorities: Vec<_> = build
        .dialplan
        .context("c")
        .unwrap()
        .extensions_for_pattern("100")
        .map(|e| e.priority.to_string())
        .collect();
    assert_eq!(priorities, vec!["1", "2", "3"]);
    assert_kinds(
        &sink,
        &[DiagnosticKind::PatNonCanonical, DiagnosticKind::PatNonCanonical],
    );
}

#[test]
fn test_caller_id_keys_are_separate() {
    let (build, sink) = parse_dialplan("[c]\nexten => s/100,1,A()\nexten => s,1,B()\n");
    assert_kinds(&sink, &[]);
    let keys = build.dialplan.context("c").unwrap().keys().to_vec();
    assert_eq!(
        keys,
        vec![
            ExtensionKey {
                pattern: Pattern::parse("s"),
                caller_id: Some("100".to_string()),
            },
            ExtensionKey {
                pattern: Pattern::parse("s"),
                caller_id: None,
            },
        ]
    );
}

#[test]
fn test_keep_last_policy_replaces_duplicate() {
    let mut settings = Settings::default();
    settings.dialplan.duplicate_priority = DuplicatePriorityPolicy::KeepLast;
    let (build, sink) =
        parse_dialplan_with("[c]\nexten => p,1,A()\nexten => p,1,B()\n", settings);
    let apps: Vec<_> = build
        .dialplan
        .context("c")
        .unwrap()
        .extensions()
        .iter()
        .map(|e| e.app.as_str())
        .collect();
    assert_eq!(apps, vec!["B()"]);
    assert_kinds(&sink, &[DiagnosticKind::DpPrioDupe]);
}

#[test]
fn test_duplicate_general_merges_by_default() {
    let (build, sink) = parse_dialplan("[general]\na=1\n\n[general]\nb=2\n");
    let keys: Vec<_> = build
        .dialplan
        .general
        .as_ref()
        .unwrap()
        .varsets
        .iter()
        .map(|v| v.key.as_str())
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_kinds(&sink, &[DiagnosticKind::DpGeneralDupe]);
}

#[test]
fn test_duplicate_globals_discarded_on_request() {
    let mut settings = Settings::default();
    settings.dialplan.singleton_duplicates = SingletonPolicy::Discard;
    let (build, sink) = parse_dialplan_with("[globals]\na=1\n\n[globals]\nb=2\n", settings);
    assert_eq!(build.dialplan.globals.as_ref().unwrap().varsets.len(), 1);
    assert_kinds(&sink, &[DiagnosticKind::DpGlobalsDupe]);
}

#[test]
fn test_equals_separator_is_still_processed() {
    let (build, sink) = parse_dialplan("[c]\nexten = s,1,A()\n");
    assert_eq!(build.dialplan.context("c").unwrap().extensions().len(), 1);
    assert_kinds(&sink, &[DiagnosticKind::DpExtenEquals]);
}

#[test]
fn test_hint_does_not_start_numbering() {
    let (build, sink) = parse_dialplan("[c]\nexten => 100,hint,SIP/100\nexten => 100,n,A()\n");
    assert_kinds(&sink, &[]);
    assert_eq!(build.errors.len(), 1);
    assert_eq!(build.dialplan.context("c").unwrap().extensions().len(), 1);
}

#[test]
fn test_contexts_by_name_resolves_includes() {
    let (build, _) = parse_dialplan(SAMPLE);
    let by_name = build.dialplan.contexts_by_name();
    assert_eq!(by_name.len(), 2);
    assert!(!by_name.contains_key("general"));
    assert!(!by_name.contains_key("globals"));

    let internal = by_name["internal"];
    let targets: Vec<_> = internal
        .includes()
        .iter()
        .map(|include| by_name.get(include.context.as_str()).map(|c| c.name.as_str()))
        .collect();
    assert_eq!(targets, vec![Some("outbound")]);
    assert_eq!(by_name["outbound"].extensions().len(), 1);
}

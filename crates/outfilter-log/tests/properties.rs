use std::sync::Arc;

use outfilter_log::{Document, LineKind, OutlineNode, Severity, Span};

const LOGS: [(&str, &str); 2] = [
    ("synth.vds", include_str!("fixtures/synth.vds")),
    ("impl.vdi", include_str!("fixtures/impl.vdi")),
];

fn documents() -> Vec<(&'static str, Document)> {
    LOGS.iter()
        .map(|(name, text)| (*name, Document::parse(text).unwrap()))
        .collect()
}

fn kinds(document: &Document) -> Vec<LineKind> {
    document.lines().iter().map(|line| line.kind()).collect()
}

fn check_nesting(name: &str, node: &OutlineNode) {
    let span = node.span.unwrap();
    let mut spans: Vec<Span> = node.children.iter().map(|child| child.span.unwrap()).collect();
    spans.sort_by_key(|span| span.first);

    for child in &spans {
        assert!(span.contains(child), "{name}: {} {span:?} does not contain {child:?}", node.name);
    }
    for pair in spans.windows(2) {
        assert!(!pair[0].overlaps(&pair[1]), "{name}: siblings under {} overlap", node.name);
    }
    let children: usize = node.children.iter().map(|child| child.message_count).sum();
    assert!(node.message_count >= children, "{name}: {} lost messages", node.name);

    for child in &node.children {
        check_nesting(name, child);
    }
}

#[test]
fn test_classification_is_deterministic() {
    for (name, text) in LOGS {
        let first = Document::parse(text).unwrap();
        let second = Document::parse(text).unwrap();
        assert_eq!(kinds(&first), kinds(&second), "{name}");
        assert_eq!(first.messages().counts(), second.messages().counts(), "{name}");
        assert_eq!(first.diagnostics(), second.diagnostics(), "{name}");
    }
}

#[test]
fn test_reclassify_is_idempotent() {
    for (name, mut document) in documents() {
        let before = kinds(&document);
        let counts = document.messages().counts();
        document.reclassify().unwrap();
        assert_eq!(kinds(&document), before, "{name}");
        assert_eq!(document.messages().counts(), counts, "{name}");
        assert!(document.diagnostics().is_empty(), "{name}");
    }
}

#[test]
fn test_every_line_is_classified() {
    for (name, document) in documents() {
        for line in document.lines() {
            assert!(line.kind().is_well_formed(), "{name}:{}: {:?}", line.number(), line.kind());
            assert!(!line.kind().is_unprocessed(), "{name}:{}: {:?}", line.number(), line.text());
        }
    }
}

#[test]
fn test_scopes_nest() {
    for (name, document) in documents() {
        let outlines: Vec<_> = document.commands().iter().map(|command| command.outline()).collect();
        for outline in &outlines {
            check_nesting(name, outline);
        }
        for pair in outlines.windows(2) {
            assert!(!pair[0].span.unwrap().overlaps(&pair[1].span.unwrap()), "{name}: commands overlap");
        }
    }
}

#[test]
fn test_severities_partition_messages() {
    for (name, document) in documents() {
        let decoded: Vec<_> = document.lines().iter().filter_map(|line| line.message()).collect();
        let counts = document.messages().counts();
        assert_eq!(counts.total(), decoded.len(), "{name}");

        for message in decoded {
            let kind = document.line(message.line_number()).unwrap().kind();
            assert!(kind.contains(LineKind::MESSAGE | message.severity().line_kind()), "{name}");
        }
    }
}

#[test]
fn test_index_round_trip() {
    for (name, document) in documents() {
        let messages = document.messages();
        for (tool_id, kind_id, indexed) in messages.indexed() {
            for message in indexed {
                assert!(message.is(tool_id, kind_id));
                for severity in Severity::ALL {
                    let hits = messages
                        .of_severity(severity)
                        .iter()
                        .filter(|other| Arc::ptr_eq(other, message))
                        .count();
                    let expected = usize::from(severity == message.severity());
                    assert_eq!(hits, expected, "{name}: {message}");
                }
            }
        }
    }
}

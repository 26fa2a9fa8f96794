// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests for live frames: edits, failures, and the store.

use proptest::prelude::*;
use sandpit_frame::{
    BoundaryView, ErrorBoundary, FrameCommand, FrameEvent, FrameSet, FrameStatus, FrameStore,
    FrameUpdate, InsertError, RenderFrame, StatusMessage, StatusMessages, Tone, insert_snippet,
};
use sandpit_jsx::{EvalError, Function, Scope, SourceDocument, Value, compile};

fn library() -> Scope {
    let foo = Function::native("Foo", |args| {
        let Some(Value::Object(props)) = args.first() else {
            return Err(EvalError::thrown("Foo needs props"));
        };
        let children = props.get("children").cloned().unwrap_or_default();
        Ok(Value::from(format!("[{children}]")))
    });
    Scope::new().with("Foo", foo)
}

fn shown(frame: &RenderFrame, boundary: &mut ErrorBoundary, scope: &Scope) -> Option<String> {
    boundary
        .render(frame.artifact(), scope)
        .node()
        .map(ToString::to_string)
}

#[test]
fn typo_recovery_keeps_the_last_render() {
    let scope = library();
    let mut frame = RenderFrame::new();
    let mut boundary = ErrorBoundary::new();

    assert_eq!(frame.on_source_change("<Foo>Foo</Foo>"), FrameUpdate::Compiled);
    let original = shown(&frame, &mut boundary, &scope);
    assert_eq!(original.as_deref(), Some("[Foo]"));
    let first = frame.artifact().cloned().unwrap();

    // Mid-edit: closing tag is broken.
    assert_eq!(frame.on_source_change("<Foo>Foo</Fo"), FrameUpdate::Retained);
    assert_eq!(frame.status(), FrameStatus::Stale);
    assert!(frame.artifact().unwrap().ptr_eq(&first));
    assert_eq!(shown(&frame, &mut boundary, &scope), original);
    assert!(boundary.caught().is_none());

    // Fixed again: recompiled, same output.
    assert_eq!(frame.on_source_change("<Foo>Foo</Foo>"), FrameUpdate::Compiled);
    assert_eq!(frame.status(), FrameStatus::Valid);
    assert_eq!(frame.artifact(), Some(&first));
    assert_eq!(shown(&frame, &mut boundary, &scope), original);
}

#[test]
fn runtime_errors_fall_back_until_the_code_is_fixed() {
    let scope = library();
    let mut frame = RenderFrame::with_source("<Foo>ok</Foo>");
    let mut boundary = ErrorBoundary::new();
    assert_eq!(shown(&frame, &mut boundary, &scope).as_deref(), Some("[ok]"));

    // Compiles, but `Bar` is not in scope.
    frame.on_source_change("<Bar>ok</Bar>");
    let view = boundary.render(frame.artifact(), &scope);
    let BoundaryView::Fallback { last_good, error } = view else {
        panic!("expected a fallback, got {view:?}");
    };
    assert_eq!(last_good.unwrap().to_string(), "[ok]");
    assert_eq!(error.to_string(), "Bar is not defined");

    frame.on_source_change("<Foo>fixed</Foo>");
    assert_eq!(shown(&frame, &mut boundary, &scope).as_deref(), Some("[fixed]"));
    assert!(boundary.caught().is_none());
}

#[test]
fn compile_is_deterministic_per_frame() {
    let a = RenderFrame::with_source("<p>{1 + 2}</p>");
    let b = RenderFrame::with_source("<p>{1 + 2}</p>");
    assert_eq!(a.artifact(), b.artifact());
    assert!(!a.artifact().unwrap().ptr_eq(b.artifact().unwrap()));
    assert_eq!(a.artifact(), compile("<p>{1 + 2}</p>").ok().as_ref());
}

#[test]
fn snippet_insertion_reports_bad_locations() {
    let mut status = StatusMessages::default();

    let doc = SourceDocument::new("<div><h1>Title</h1></div>", 9);
    let out = insert_snippet(&doc, "<span>added</span>").unwrap();
    assert_eq!(
        out.code,
        "<div>\n  <h1>\n    <span>added</span>Title\n  </h1>\n</div>\n"
    );
    status.show(StatusMessage::positive("Snippet inserted"), 0);

    let doc = SourceDocument::new("<div className=\"x\"><h1>Title</h1></div>", 5);
    let err = insert_snippet(&doc, "<span />").unwrap_err();
    assert_eq!(err, InsertError::InvalidLocation { cursor: 5 });
    status.show(err.into(), 1_000);

    let current = status.current().unwrap();
    assert_eq!(current.message, "Can't insert snippet at cursor");
    assert_eq!(current.tone, Tone::Critical);
    assert_eq!(status.poll(3_999), None);
    assert!(status.poll(4_000).is_some());
    assert!(status.current().is_none());
}

#[test]
fn store_drives_the_frame_set() {
    let scope = library();
    let mut store = FrameStore::new();
    let mut set = FrameSet::new();

    let events = store.apply(FrameCommand::Add {
        code: "<Foo>one</Foo>".into(),
        x: 10.0,
        y: 20.0,
        width: 300.0,
        height: 200.0,
    });
    let [FrameEvent::Added(id)] = events.as_slice() else {
        panic!("unexpected events {events:?}");
    };
    let id = *id;
    set.sync(&store);
    assert_eq!(
        set.render(id, &scope).and_then(|v| v.node()).map(ToString::to_string),
        Some("[one]".to_string())
    );

    // A typo through the store keeps the old render.
    store.apply(FrameCommand::UpdateCode {
        id,
        code: "<Foo>one</".into(),
    });
    set.sync(&store);
    assert_eq!(set.frame(id).unwrap().status(), FrameStatus::Stale);
    assert_eq!(
        set.render(id, &scope).and_then(|v| v.node()).map(ToString::to_string),
        Some("[one]".to_string())
    );

    store.apply(FrameCommand::Delete(id));
    set.sync(&store);
    assert!(set.is_empty());
}

proptest! {
    // However a source is mangled, a frame that once compiled keeps an artifact.
    #[test]
    fn last_valid_is_never_lost(edits in prop::collection::vec("[<>/a-c{} ]{0,12}", 0..16)) {
        let mut frame = RenderFrame::with_source("<a>ok</a>");
        for edit in &edits {
            frame.on_source_change(edit);
            prop_assert!(frame.artifact().is_some());
            prop_assert_ne!(frame.status(), FrameStatus::Empty);
        }
    }

    #[test]
    fn selection_always_names_a_stored_frame(
        ops in prop::collection::vec((0_u8..4, 0_u64..6), 0..40)
    ) {
        let mut store = FrameStore::new();
        for (op, id) in ops {
            let id = sandpit_frame::FrameId(id);
            let command = match op {
                0 => FrameCommand::Add {
                    code: String::new(),
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                },
                1 => FrameCommand::Select(Some(id)),
                2 => FrameCommand::Delete(id),
                _ => FrameCommand::Select(None),
            };
            store.apply(command);
            if let Some(selected) = store.selected() {
                prop_assert!(store.get(selected).is_some());
            }
        }
    }
}

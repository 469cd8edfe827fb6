mod common;
use common::*;

use core_actions::{Choice, DocumentError, Phase, Step};
use core_admission::Rejection;
use core_events::{DocumentEvent, DocumentEventKind};
use core_text::TextSurface;
use pretty_assertions::assert_eq;

#[test]
fn type_then_save_as_adopts_path() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a.txt");
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);

    type_line(&mut lc, "hello");
    assert!(lc.document().is_modified());

    assert!(matches!(lc.save_as().unwrap(), Step::ChooseSave));
    assert_eq!(lc.phase(), Phase::AwaitingFilePicker);
    let ev = expect_updated(lc.resolve_save(Some(target.clone())).unwrap());

    assert_eq!(ev, DocumentEvent::saved(&target));
    assert_eq!(lc.document().path(), Some(target.as_path()));
    assert!(!lc.document().is_modified());
    assert_eq!(*events.borrow(), vec![DocumentEvent::saved(&target)]);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello\n");
    assert_eq!(lc.phase(), Phase::Idle);
}

#[test]
fn save_without_path_goes_through_save_as() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("b.txt");
    let mut lc = disk_lifecycle();
    type_line(&mut lc, "draft");

    assert!(matches!(lc.save().unwrap(), Step::ChooseSave));
    expect_updated(lc.resolve_save(Some(target.clone())).unwrap());

    // Subsequent saves reuse the adopted path without a chooser.
    type_line(&mut lc, "more");
    let ev = expect_updated(lc.save().unwrap());
    assert_eq!(ev.path(), Some(target.as_path()));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "draft\nmore\n");
}

#[test]
fn repeated_save_writes_and_notifies_each_time() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("c.txt");
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);
    type_line(&mut lc, "x");
    expect_updated(lc.save_to(&target).unwrap());

    std::fs::write(&target, "tampered").unwrap();
    expect_updated(lc.save().unwrap());

    assert_eq!(events.borrow().len(), 2);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "x\n");
}

#[test]
fn save_as_cancel_changes_nothing() {
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);
    type_line(&mut lc, "x");
    lc.save_as().unwrap();
    expect_unchanged(lc.resolve_save(None).unwrap());
    assert!(lc.document().is_modified());
    assert!(lc.document().is_untitled());
    assert!(events.borrow().is_empty());
    assert_eq!(lc.phase(), Phase::Idle);
}

#[test]
fn save_as_failure_keeps_previous_path() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("keep.txt");
    let mut lc = disk_lifecycle();
    type_line(&mut lc, "x");
    expect_updated(lc.save_to(&original).unwrap());
    type_line(&mut lc, "y");

    lc.save_as().unwrap();
    // A directory is never writable as a file.
    let err = expect_failed(lc.resolve_save(Some(dir.path().to_path_buf())).unwrap());
    assert!(matches!(err, DocumentError::Write { .. }));
    assert_eq!(lc.document().path(), Some(original.as_path()));
    assert!(lc.document().is_modified());
}

#[test]
fn close_unmodified_needs_no_prompt() {
    let mut lc = disk_lifecycle();
    expect_close(lc.request_close().unwrap());
    assert_eq!(lc.phase(), Phase::Idle);
}

#[test]
fn open_edit_close_discard_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "original\n").unwrap();
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);

    assert!(matches!(lc.open().unwrap(), Step::ChooseOpen));
    let ev = expect_updated(lc.resolve_open(Some(path.clone())).unwrap());
    assert_eq!(ev.kind, DocumentEventKind::Opened);
    assert_eq!(lc.surface().text(), "original\n");

    type_line(&mut lc, "edited");
    assert!(matches!(lc.request_close().unwrap(), Step::Confirm(_)));
    expect_close(lc.resolve_confirmation(Some(Choice::Discard)).unwrap());

    assert!(!lc.document().is_modified());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original\n");
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn close_save_failure_keeps_document_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut lc = disk_lifecycle();
    type_line(&mut lc, "precious");
    lc.request_close().unwrap();
    assert!(matches!(
        lc.resolve_confirmation(Some(Choice::Save)).unwrap(),
        Step::ChooseSave
    ));
    let err = expect_failed(lc.resolve_save(Some(dir.path().to_path_buf())).unwrap());
    assert!(matches!(err, DocumentError::Write { .. }));
    assert!(lc.document().is_modified());
    assert_eq!(lc.surface().text(), "precious\n");
    assert_eq!(lc.phase(), Phase::Idle);
}

#[test]
fn open_png_rejected_naming_type() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "notes\n").unwrap();
    let png = dir.path().join("pic.png");
    std::fs::write(&png, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);
    expect_updated(lc.open_path(&text).unwrap());

    let err = expect_failed(lc.open_path(&png).unwrap());
    assert!(matches!(
        err,
        DocumentError::Rejected(Rejection::DeniedContentType { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Cannot open binary/media file (type: image/png)"
    );
    assert_eq!(lc.document().path(), Some(text.as_path()));
    assert_eq!(lc.surface().text(), "notes\n");
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn rejected_open_after_discard_keeps_edits() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("pic.png");
    std::fs::write(&png, b"\x89PNG\r\n\x1a\n").unwrap();
    let mut lc = disk_lifecycle();
    type_line(&mut lc, "keep me");

    assert!(matches!(lc.open_path(&png).unwrap(), Step::Confirm(_)));
    expect_failed(lc.resolve_confirmation(Some(Choice::Discard)).unwrap());
    assert!(lc.document().is_modified());
    assert_eq!(lc.surface().text(), "keep me\n");
}

#[test]
fn open_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut lc = disk_lifecycle();
    lc.open().unwrap();
    let err = expect_failed(lc.resolve_open(Some(dir.path().to_path_buf())).unwrap());
    assert_eq!(err.to_string(), "Cannot open directories");
    assert!(lc.document().is_untitled());
}

#[test]
fn open_missing_file_is_a_validation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut lc = disk_lifecycle();
    let err = expect_failed(lc.open_path(dir.path().join("gone.txt")).unwrap());
    assert!(matches!(err, DocumentError::Rejected(Rejection::Metadata { .. })));
    assert!(err.to_string().starts_with("Failed to validate file"));
}

#[test]
fn open_invalid_utf8_is_a_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    std::fs::write(&path, b"caf\xE9 au lait\n").unwrap();
    let mut lc = disk_lifecycle();
    let err = expect_failed(lc.open_path(&path).unwrap());
    assert!(matches!(err, DocumentError::Read { .. }));
    assert!(lc.document().is_untitled());
    assert!(!lc.document().is_modified());
    assert_eq!(lc.surface().text(), "");
}

#[test]
fn open_cancel_is_silent() {
    let mut lc = disk_lifecycle();
    let events = record_events(&mut lc);
    lc.open().unwrap();
    expect_unchanged(lc.resolve_open(None).unwrap());
    assert!(events.borrow().is_empty());
    assert_eq!(lc.phase(), Phase::Idle);
}

#[test]
fn modified_tracks_edits_between_saves() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("m.txt");
    let mut lc = disk_lifecycle();
    assert!(!lc.document().is_modified());
    for n in 0..3 {
        type_line(&mut lc, &format!("line {n}"));
        assert!(lc.document().is_modified());
    }
    expect_updated(lc.save_to(&target).unwrap());
    assert!(!lc.document().is_modified());
    type_line(&mut lc, "again");
    assert!(lc.document().is_modified());

    // Reloading from disk (after discarding) clears the flag again.
    assert!(matches!(lc.open_path(&target).unwrap(), Step::Confirm(_)));
    let ev = expect_updated(lc.resolve_confirmation(Some(Choice::Discard)).unwrap());
    assert_eq!(ev.kind, DocumentEventKind::Opened);
    assert!(!lc.document().is_modified());
    assert_eq!(lc.surface().text(), "line 0\nline 1\nline 2\n");
}

use blocknote_engine::editing::{AfterSave, Document, EditError, EditEvent, EditSession, Mode};
use blocknote_engine::io::{FileGateway, GatewayError, MemoryGateway, NoteId, PersistenceGateway};
use pretty_assertions::assert_eq;

fn note(raw: &str) -> NoteId {
    NoteId::parse(raw).unwrap()
}

#[test]
fn dirty_only_clears_on_successful_save() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("journal"), Document::new());
    session.enter_edit().unwrap();
    let id = session.focused().cloned().unwrap();
    session.set_content(&id, "Day one").unwrap();
    assert!(session.has_unsaved_changes());

    gateway.fail_next_saves(2);
    assert!(session.save(&mut gateway, AfterSave::Editing).is_err());
    assert!(session.has_unsaved_changes());
    assert!(session.save(&mut gateway, AfterSave::Editing).is_err());
    assert!(session.has_unsaved_changes());
    assert_eq!(session.mode(), Mode::Editing);

    // the same snapshot resent after transient failures lands once
    session.save(&mut gateway, AfterSave::Editing).unwrap();
    assert!(!session.has_unsaved_changes());
    assert_eq!(gateway.save_count(), 1);

    session.set_content(&id, "Day one, later").unwrap();
    assert!(session.has_unsaved_changes());
}

#[test]
fn saved_document_carries_plain_text() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("n"), Document::new());
    session.enter_edit().unwrap();
    let id = session.focused().cloned().unwrap();
    session.set_content(&id, "searchable words").unwrap();

    session.save(&mut gateway, AfterSave::Viewing).unwrap();

    let raw = gateway.raw(&note("n")).unwrap();
    let json: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(json["plainText"], "searchable words");
    assert_eq!(json["version"], "1");
    assert_eq!(json["blocks"][0]["type"], "text");
    assert_eq!(json["blocks"][0]["content"], "searchable words");
    assert_eq!(session.mode(), Mode::Viewing);
}

#[test]
fn edits_during_in_flight_save_survive() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("n"), Document::new());
    session.enter_edit().unwrap();
    let first = session.focused().cloned().unwrap();
    session.set_content(&first, "saved part").unwrap();

    let ticket = session.begin_save().unwrap();
    assert_eq!(session.mode(), Mode::Saving);

    // editing continues while the gateway works
    let second = session
        .insert_after(&first, blocknote_engine::editing::BlockType::Text)
        .unwrap()
        .unwrap();
    session.set_content(&second, "typed during save").unwrap();
    assert!(matches!(
        session.begin_save(),
        Err(EditError::InvalidTransition {
            mode: Mode::Saving,
            ..
        })
    ));

    let result = gateway.save(ticket.note_id(), ticket.document());
    session
        .finish_save(ticket, result, AfterSave::Editing)
        .unwrap();

    assert!(session.has_unsaved_changes());
    assert_eq!(session.document().len(), 2);
    assert_eq!(gateway.load(&note("n")).unwrap().len(), 1);

    // the next save picks the later edit up
    session.save(&mut gateway, AfterSave::Editing).unwrap();
    assert!(!session.has_unsaved_changes());
    assert_eq!(gateway.load(&note("n")).unwrap().len(), 2);
}

#[test]
fn failed_save_surfaces_gateway_error_and_keeps_document() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("n"), Document::new());
    session.enter_edit().unwrap();
    let id = session.focused().cloned().unwrap();
    session.set_content(&id, "keep me").unwrap();
    gateway.fail_next_saves(1);

    let err = session.save(&mut gateway, AfterSave::Viewing).unwrap_err();

    assert!(matches!(
        err,
        EditError::Persistence(GatewayError::Unavailable(_))
    ));
    assert_eq!(session.mode(), Mode::Editing);
    assert_eq!(session.document().block(&id).unwrap().content(), "keep me");
    let events = session.drain_events();
    assert!(events.contains(&EditEvent::ModeChanged {
        from: Mode::Saving,
        to: Mode::Editing
    }));
}

#[test]
fn save_from_viewing_is_rejected() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("n"), Document::with_default_block());
    let result = session.save(&mut gateway, AfterSave::Editing);
    assert!(matches!(result, Err(EditError::InvalidTransition { .. })));
    assert_eq!(gateway.save_count(), 0);
}

#[test]
fn open_edit_save_reopen_on_disk() {
    let notes_dir = tempfile::tempdir().unwrap();
    let mut gateway = FileGateway::new(notes_dir.path()).unwrap();
    gateway.save(&note("diary"), &Document::new()).unwrap();

    let mut session = EditSession::open(&gateway, note("diary")).unwrap();
    session.enter_edit().unwrap();
    let id = session.focused().cloned().unwrap();
    session.set_content(&id, "Dear diary").unwrap();
    session.save(&mut gateway, AfterSave::Viewing).unwrap();

    let reopened = EditSession::open(&gateway, note("diary")).unwrap();
    assert_eq!(reopened.document().blocks(), session.document().blocks());
    assert_eq!(reopened.document().plain_text(), "Dear diary");
    assert!(reopened.recovery_warning().is_none());
}

#[test]
fn corrupt_note_on_disk_opens_as_fresh_document() {
    let notes_dir = tempfile::tempdir().unwrap();
    std::fs::write(notes_dir.path().join("mangled.json"), "{\"version\": 1,").unwrap();
    let mut gateway = FileGateway::new(notes_dir.path()).unwrap();

    let mut session = EditSession::open(&gateway, note("mangled")).unwrap();

    assert!(session.recovery_warning().is_some());
    assert_eq!(session.document().len(), 1);

    // the user can keep writing and overwrite the bad content
    session.enter_edit().unwrap();
    let id = session.document().get(0).unwrap().id().clone();
    session.set_content(&id, "recovered").unwrap();
    session.save(&mut gateway, AfterSave::Editing).unwrap();
    assert_eq!(
        gateway.load(&note("mangled")).unwrap().plain_text(),
        "recovered"
    );
}

#[test]
fn unknown_block_type_in_storage_is_corruption() {
    let mut gateway = MemoryGateway::new();
    gateway.insert_raw(
        note("n"),
        r#"{"version":"1","blocks":[{"id":"a","type":"video","metadata":{},"content":""}],"plainText":""}"#,
    );
    assert!(matches!(
        gateway.load(&note("n")),
        Err(GatewayError::Corrupt { .. })
    ));
}

#[test]
fn reinserting_a_copied_block_still_reloads() {
    let mut gateway = MemoryGateway::new();
    let mut session = EditSession::new(note("n"), Document::new());
    session.enter_edit().unwrap();
    let id = session.focused().cloned().unwrap();
    session.set_content(&id, "precious").unwrap();

    let mut doc = session.document().clone();
    let copy = doc.block(&id).unwrap().clone();
    doc.insert(copy.clone(), 1);
    doc.insert(copy, 2);
    assert!(doc.validate().is_ok());
    assert_eq!(doc.ids().filter(|b| *b == &id).count(), 1);

    session.switch_document(note("n"), doc).unwrap();
    session.enter_edit().unwrap();
    session.save(&mut gateway, AfterSave::Viewing).unwrap();

    let reopened = EditSession::open(&gateway, note("n")).unwrap();
    assert!(reopened.recovery_warning().is_none());
    assert_eq!(reopened.document().len(), 3);
    assert!(
        reopened
            .document()
            .blocks()
            .iter()
            .all(|b| b.content() == "precious")
    );
}

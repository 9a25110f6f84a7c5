use runix_chat::models::{Agent, Author};
use runix_chat::session::{
    create_new_session, FilesystemSessionStore, MemorySessionStore, SessionManager, SessionStore,
    DEFAULT_TITLE,
};
use std::fs;
use tempfile::TempDir;

fn manager_with(store: &MemorySessionStore) -> SessionManager {
    SessionManager::load(Box::new(store.clone())).unwrap()
}

#[test]
fn test_filesystem_save_and_load_whole_list() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemSessionStore::new(temp_dir.path());

    let mut first = create_new_session(Agent::Owl);
    first.title = "Protein folding".to_string();
    let second = create_new_session(Agent::Crow);

    store.save(&[first.clone(), second.clone()]).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, vec![first, second.clone()]);

    // A later save replaces the list rather than merging into it.
    store.save(&[second.clone()]).unwrap();
    assert_eq!(store.load().unwrap(), vec![second]);
}

#[test]
fn test_filesystem_missing_file_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemSessionStore::new(temp_dir.path().join("nested"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_filesystem_serializes_camel_case_fields() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemSessionStore::new(temp_dir.path());
    let mut manager = SessionManager::load(Box::new(FilesystemSessionStore::new(temp_dir.path()))).unwrap();
    let id = manager.active_id().unwrap().to_string();
    manager.append_message(&id, Author::User, "Hello").unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    let session = &raw[0];
    assert_eq!(session["title"], DEFAULT_TITLE);
    assert_eq!(session["agent"], "crow");
    assert!(session["createdAt"].is_string());
    assert_eq!(session["messages"][0]["author"], "User");
    assert_eq!(session["messages"][0]["id"], 1);
    assert!(session["messages"][0]["createdAt"].is_string());
}

#[test]
fn test_filesystem_corrupt_file_is_set_aside() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemSessionStore::new(temp_dir.path());
    fs::write(store.path(), "[{ not json").unwrap();

    assert!(store.load().unwrap().is_empty());
    assert!(temp_dir.path().join("sessions.json.bak").exists());
    assert!(!store.path().exists());
}

#[test]
fn test_empty_store_creates_single_default_session() {
    let store = MemorySessionStore::new();
    let manager = manager_with(&store);

    assert_eq!(manager.sessions().len(), 1);
    let active = manager.active().unwrap();
    assert_eq!(active.title, "New Chat");
    assert!(active.messages.is_empty());
    assert_eq!(store.snapshot().len(), 1);
}

#[test]
fn test_load_selects_first_persisted_session() {
    let first = create_new_session(Agent::Falcon);
    let second = create_new_session(Agent::Owl);
    let store = MemorySessionStore::with_sessions(vec![first.clone(), second]);

    let manager = manager_with(&store);
    assert_eq!(manager.sessions().len(), 2);
    assert_eq!(manager.active_id(), Some(first.id.as_str()));
    assert_eq!(store.save_count(), 0);
}

#[test]
fn test_every_mutation_persists() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let after_load = store.save_count();

    let id = manager.create_session(Agent::Phoenix).unwrap();
    manager.rename(&id, "Assay planning").unwrap();
    manager.append_message(&id, Author::User, "Plan an assay").unwrap();
    manager.delete(&id).unwrap();

    assert_eq!(store.save_count(), after_load + 4);
    assert_eq!(store.snapshot().len(), manager.sessions().len());
}

#[test]
fn test_deleting_active_selects_first_remaining() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let original = manager.active_id().unwrap().to_string();
    let newer = manager.create_session(Agent::Crow).unwrap();
    assert_eq!(manager.active_id(), Some(newer.as_str()));

    manager.delete(&newer).unwrap();
    assert_eq!(manager.active_id(), Some(original.as_str()));

    manager.delete(&original).unwrap();
    assert_eq!(manager.active_id(), None);
    assert!(manager.sessions().is_empty());
}

#[test]
fn test_ensure_active_creates_session_when_none() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let only = manager.active_id().unwrap().to_string();
    manager.delete(&only).unwrap();

    let id = manager.ensure_active(Agent::Owl).unwrap();
    assert_eq!(manager.active_id(), Some(id.as_str()));
    assert_eq!(manager.active().unwrap().agent, Agent::Owl);
    assert_eq!(manager.ensure_active(Agent::Crow).unwrap(), id);
}

#[test]
fn test_unknown_session_is_an_error() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    assert!(manager.select("missing").is_err());
    assert!(manager.delete("missing").is_err());
    assert!(manager.rename("missing", "x").is_err());
}

#[test]
fn test_auto_title_runs_once() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let id = manager.active_id().unwrap().to_string();

    assert!(manager.auto_title(&id, "Hi there").unwrap());
    assert!(!manager.auto_title(&id, "A second reply").unwrap());
    assert_eq!(manager.get(&id).unwrap().title, "Hi there");
}

#[test]
fn test_manual_title_blocks_auto_title() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let id = manager.active_id().unwrap().to_string();

    manager.rename(&id, "My trial").unwrap();
    assert!(!manager.auto_title(&id, "Anything").unwrap());
    assert_eq!(manager.get(&id).unwrap().title, "My trial");
}

#[test]
fn test_truncate_for_regenerate_keeps_last_user_message() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let id = manager.active_id().unwrap().to_string();

    manager.append_message(&id, Author::User, "first").unwrap();
    manager.append_message(&id, Author::Ai, "reply one").unwrap();
    manager.append_message(&id, Author::User, "second").unwrap();
    manager.append_message(&id, Author::Ai, "reply two").unwrap();

    let last = manager.truncate_for_regenerate(&id).unwrap().unwrap();
    assert_eq!(last.content, "second");

    let messages = &manager.get(&id).unwrap().messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages.last().unwrap().author, Author::User);
}

#[test]
fn test_truncate_for_regenerate_without_user_message() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let id = manager.active_id().unwrap().to_string();
    assert!(manager.truncate_for_regenerate(&id).unwrap().is_none());
}

#[test]
fn test_finalize_keeps_message_id() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    let id = manager.active_id().unwrap().to_string();
    let placeholder = manager.append_message(&id, Author::Ai, "").unwrap();

    manager.append_to_message(&id, placeholder.id, "Hi").unwrap();
    let saves = store.save_count();
    manager.append_to_message(&id, placeholder.id, " there").unwrap();
    assert_eq!(store.save_count(), saves);

    let finalized = manager.finalize_message(&id, placeholder.id, "Hi there").unwrap();
    assert_eq!(finalized.id, placeholder.id);
    assert!(finalized.created_at >= placeholder.created_at);
    assert_eq!(store.snapshot()[0].messages[0].content, "Hi there");
}

#[test]
fn test_clear_leaves_one_default_session() {
    let store = MemorySessionStore::new();
    let mut manager = manager_with(&store);
    manager.create_session(Agent::Owl).unwrap();
    manager.create_session(Agent::Falcon).unwrap();

    manager.clear().unwrap();
    assert_eq!(manager.sessions().len(), 1);
    assert_eq!(manager.active().unwrap().title, DEFAULT_TITLE);
}

//! Credential store behavior against a real filesystem

use bjornwatch_core::store::{CredentialStore, FileCredentialStore};
use bjornwatch_core::types::StoredLogin;
use tempfile::TempDir;

fn sample_login() -> StoredLogin {
    StoredLogin {
        session_code: "ABC123".to_string(),
        parent_password: "1234".to_string(),
        child_name: "Sam".to_string(),
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::at_path(dir.path().join("login.json"));

    let login = sample_login();
    store.save(Some(&login)).unwrap();
    assert_eq!(store.load(), Some(login));
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::at_path(dir.path().join("nested/deeper/login.json"));

    store.save(Some(&sample_login())).unwrap();
    assert!(store.path().exists());
    assert!(store.load().is_some());
}

#[test]
fn save_none_deletes_the_record() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::at_path(dir.path().join("login.json"));

    store.save(Some(&sample_login())).unwrap();
    store.save(None).unwrap();
    assert!(!store.path().exists());
    assert_eq!(store.load(), None);

    // Deleting an already-absent record is not an error.
    store.save(None).unwrap();
}

#[test]
fn missing_file_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::at_path(dir.path().join("login.json"));
    assert_eq!(store.load(), None);
}

#[test]
fn corrupt_file_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("login.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = FileCredentialStore::at_path(path);
    assert_eq!(store.load(), None);
}

#[test]
fn wrong_shape_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("login.json");
    std::fs::write(&path, r#"{"sessionCode": "ABC123"}"#).unwrap();

    let store = FileCredentialStore::at_path(path);
    assert_eq!(store.load(), None);
}

#[test]
fn persisted_file_uses_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::at_path(dir.path().join("login.json"));

    store.save(Some(&sample_login())).unwrap();
    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"sessionCode\""));
    assert!(raw.contains("\"parentPassword\""));
    assert!(raw.contains("\"childName\""));
}

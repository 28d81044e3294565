use std::fs;
use std::path::PathBuf;

use betpool_terminal::models::parse_login_json;
use betpool_terminal::session::{Role, Session, SessionStore};

fn scratch_path(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("betpool_session_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir.join("session.json")
}

fn sample() -> Session {
    Session {
        token: "7|secret".to_string(),
        user_id: 7,
        message: "Bienvenido, Ana!".to_string(),
        role: Role::Bettor,
    }
}

#[test]
fn save_then_load_restores_session() {
    let path = scratch_path("roundtrip");
    let store = SessionStore::new(Some(path.clone()));
    store.save(&sample()).expect("save should succeed");
    assert!(path.exists());
    assert_eq!(store.load(), Some(sample()));
}

#[test]
fn clear_removes_file_and_is_idempotent() {
    let path = scratch_path("clear");
    let store = SessionStore::new(Some(path.clone()));
    store.save(&sample()).expect("save should succeed");
    store.clear().expect("clear should succeed");
    assert!(!path.exists());
    assert_eq!(store.load(), None);
    store.clear().expect("second clear should succeed");
}

#[test]
fn corrupt_or_blank_sessions_load_as_logged_out() {
    let path = scratch_path("corrupt");
    let store = SessionStore::new(Some(path.clone()));
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    fs::write(&path, "{not json").unwrap();
    assert_eq!(store.load(), None);

    let mut blank = sample();
    blank.token = "  ".to_string();
    store.save(&blank).unwrap();
    assert_eq!(store.load(), None);
}

#[test]
fn store_without_path_is_a_no_op() {
    let store = SessionStore::new(None);
    assert!(store.path().is_none());
    store.save(&sample()).expect("save without path should succeed");
    assert_eq!(store.load(), None);
    store.clear().expect("clear without path should succeed");
}

#[test]
fn explicit_role_login_without_greeting_survives_restart() {
    let resp = parse_login_json(
        r#"{"message":"","token":"3|abc","user":{"id":3,"name":"Root","role":"admin"}}"#,
    )
    .expect("payload should parse");
    let session = Session::from_login(resp, "Bienvenido, Admin User!").expect("session should build");
    assert!(session.is_admin());

    let path = scratch_path("blank-message");
    let store = SessionStore::new(Some(path));
    store.save(&session).expect("save should succeed");
    assert_eq!(store.load(), Some(session));
}

use bjornwatch_core::types::StoredLogin;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    out_dir: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let out_dir = base.join("out");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&out_dir).expect("failed to create export dir");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            out_dir,
        }
    }
}

fn seed_stored_login(env: &CliTestEnv, login: &StoredLogin) {
    let dir = env.xdg_data.join("bjornwatch");
    fs::create_dir_all(&dir).expect("failed to create login dir");
    let json = serde_json::to_string_pretty(login).expect("failed to serialize login");
    fs::write(dir.join("login.json"), json).expect("failed to write login.json");
}

/// Run `bjornwatch-export` against `api_base` with the test env's
/// filesystem, using the export dir as the working directory.
fn run_export(env: &CliTestEnv, api_base: &str, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("bjornwatch-export"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("BJORNWATCH_API_BASE", api_base)
        .current_dir(&env.out_dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute bjornwatch-export: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "bjornwatch-export {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

fn transcript_body() -> serde_json::Value {
    json!({
        "child_name": "Sam",
        "messages": [
            { "role": "user", "content": "Björn, är du vaken?", "ts": 1700000000, "lang": "sv" },
            { "role": "assistant", "content": "Klarvaken! Ska vi räkna stjärnor?", "ts": 1700000040, "lang": "sv" }
        ]
    })
}

#[test]
fn export_writes_transcript_file() {
    let env = CliTestEnv::new();
    let rt = Runtime::new().expect("failed to build runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/session/ABC123"))
            .and(query_param("pin", "1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(transcript_body()))
            .mount(&server),
    );

    let args = ["ABC123", "--pin", "1234"];
    let output = run_export(&env, &server.uri(), &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Exported 2 message(s) for Sam"),
        "unexpected stdout:\n{stdout}"
    );

    let export_path = env.out_dir.join("session_ABC123.json");
    assert!(
        export_path.exists(),
        "expected export at {}",
        export_path.display()
    );

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export_path).expect("failed to read export"))
            .expect("export is not valid JSON");
    let items = exported.as_array().expect("export is not a JSON array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["role"], "user");
    assert_eq!(items[1]["role"], "assistant");
}

#[test]
fn export_normalizes_code_and_reuses_the_stored_pin() {
    let env = CliTestEnv::new();
    seed_stored_login(
        &env,
        &StoredLogin {
            session_code: "ABC123".to_string(),
            parent_password: "1234".to_string(),
            child_name: "Sam".to_string(),
        },
    );

    let rt = Runtime::new().expect("failed to build runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/session/ABC123"))
            .and(query_param("pin", "1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(transcript_body()))
            .mount(&server),
    );

    // Lowercase on the command line, no --pin: the stored login covers it.
    let args = ["abc123"];
    let output = run_export(&env, &server.uri(), &args);
    assert_success(&args, &output);

    assert!(env.out_dir.join("session_ABC123.json").exists());
}

#[test]
fn export_honors_the_out_flag() {
    let env = CliTestEnv::new();
    fs::create_dir_all(env.out_dir.join("archive")).expect("failed to create archive dir");

    let rt = Runtime::new().expect("failed to build runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/session/ABC123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(transcript_body()))
            .mount(&server),
    );

    let args = ["ABC123", "--pin", "1234", "--out", "archive"];
    let output = run_export(&env, &server.uri(), &args);
    assert_success(&args, &output);

    assert!(env.out_dir.join("archive/session_ABC123.json").exists());
}

#[test]
fn export_fails_with_the_backend_error_copy() {
    let env = CliTestEnv::new();
    let rt = Runtime::new().expect("failed to build runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/api/session/ABC123"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_password"})),
            )
            .mount(&server),
    );

    let args = ["ABC123", "--pin", "9999"];
    let output = run_export(&env, &server.uri(), &args);
    assert!(!output.status.success(), "expected a non-zero exit");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Incorrect parent password."),
        "unexpected stderr:\n{stderr}"
    );
    assert!(!env.out_dir.join("session_ABC123.json").exists());
}

#[test]
fn export_without_pin_or_stored_login_fails() {
    let env = CliTestEnv::new();

    // The backend is never reached; the PIN lookup fails first.
    let args = ["ABC123"];
    let output = run_export(&env, "http://127.0.0.1:1", &args);
    assert!(!output.status.success(), "expected a non-zero exit");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no PIN given and no stored login for session ABC123"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn export_ignores_the_stored_pin_for_other_sessions() {
    let env = CliTestEnv::new();
    seed_stored_login(
        &env,
        &StoredLogin {
            session_code: "XYZ789".to_string(),
            parent_password: "4321".to_string(),
            child_name: "Noor".to_string(),
        },
    );

    let args = ["ABC123"];
    let output = run_export(&env, "http://127.0.0.1:1", &args);
    assert!(!output.status.success(), "expected a non-zero exit");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no PIN given and no stored login for session ABC123"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn export_rejects_a_short_session_code() {
    let env = CliTestEnv::new();

    let args = ["AB", "--pin", "1234"];
    let output = run_export(&env, "http://127.0.0.1:1", &args);
    assert!(!output.status.success(), "expected a non-zero exit");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Session code must be 6 characters."),
        "unexpected stderr:\n{stderr}"
    );
}

//! CLI integration tests for schoolhub admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

use schoolhub::auth::TokenGenerator;
use schoolhub::store::{SqliteStore, TenantStore};
use schoolhub::types::UserRole;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("schoolhub").expect("failed to find binary");
        cmd.env("NO_COLOR", "1").env_remove("SCHOOLHUB_DATA_DIR");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "init",
                "--data-dir",
                &self.data_dir_str(),
                "--admin-email",
                "Ops@Example.com",
                "--non-interactive",
            ])
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("schoolhub.db")).expect("open store")
    }
}

#[test]
fn test_init_creates_platform_admin_and_token() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Admin token"))
        .stdout(predicate::str::contains("ops@example.com"));

    let token_file = ctx.data_dir().join(".admin_token");
    let raw_token = std::fs::read_to_string(&token_file).expect("read token");
    assert!(raw_token.starts_with("schoolhub_"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&token_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    let store = ctx.store();
    assert!(store.has_platform_admin().unwrap());
    let admin = store
        .get_user_by_email("ops@example.com")
        .unwrap()
        .expect("admin user");
    assert_eq!(admin.role, UserRole::SuperAdmin);
    assert!(admin.school_id.is_none());

    let (lookup, secret) = schoolhub::auth::parse_token(raw_token.trim()).unwrap();
    let token = store
        .get_token_by_lookup(&lookup)
        .unwrap()
        .expect("stored token");
    assert_eq!(token.user_id, admin.id);
    assert!(token.expires_at.is_none());
    let generator = TokenGenerator::new();
    assert!(generator.verify(raw_token.trim(), &token.token_hash).unwrap());
    assert!(!secret.is_empty());
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_serve_requires_init() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin init"));
}

#[test]
fn test_serve_rejects_bad_config_file() {
    let ctx = TestContext::new();
    ctx.init().success();

    let config = ctx.data_dir().join("schoolhub.toml");
    std::fs::write(&config, "port = \"eighty\"").unwrap();

    ctx.cmd()
        .args(["serve", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

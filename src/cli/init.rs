use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{TokenGenerator, issue_token};
use crate::store::{SqliteStore, Store, TenantStore};
use crate::types::{User, UserRole};

const MIN_PASSWORD_LEN: usize = 8;

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

fn prompt_password() -> anyhow::Result<Option<String>> {
    let set_password = inquire::Confirm::new("Set a password for the platform admin?")
        .with_default(false)
        .prompt()?;

    if !set_password {
        return Ok(None);
    }

    let password = inquire::Password::new("Password:")
        .with_validator(|input: &str| {
            if input.chars().count() < MIN_PASSWORD_LEN {
                Err(format!("Password must be at least {MIN_PASSWORD_LEN} characters").into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    Ok(Some(password))
}

/// Creates the database, a SUPER_ADMIN user, and a token saved to
/// `<data_dir>/.admin_token`.
pub fn run_init(data_dir: PathBuf, admin_email: String, non_interactive: bool) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;

    let store = SqliteStore::new(data_dir.join("schoolhub.db"))?;
    store.initialize()?;

    let token_file = data_dir.join(".admin_token");

    if store.has_platform_admin()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let generator = TokenGenerator::new();
    let password = if non_interactive {
        None
    } else {
        prompt_password()?
    };
    // Without a password the account is only reachable through its token.
    let password = match password {
        Some(password) => password,
        None => generator.generate()?.0,
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: admin_email.trim().to_lowercase(),
        password_hash: generator.hash(&password)?,
        name: "Platform Admin".to_string(),
        role: UserRole::SuperAdmin,
        school_id: None,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&user)?;

    let (raw_token, _) = issue_token(&store, &user.id, None)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Platform admin: {}", user.email);
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    Ok(())
}

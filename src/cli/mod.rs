mod commands;
mod init;
mod serve;

pub use commands::{AdminCommands, Cli, Commands, ServeArgs};
pub use init::run_init;
pub use serve::{resolve_config, run_serve};

use std::path::Path;

use crate::store::SqliteStore;

/// Opens the database in `data_dir`, checking that it exists.
pub fn init_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let db_path = data_dir.join("schoolhub.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'schoolhub admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

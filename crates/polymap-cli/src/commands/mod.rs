pub mod repro;
pub mod schema;
pub mod seed;
pub mod show;

use polymap_store::Session;
use std::path::Path;

/// Open the session database, creating its directory if needed
pub fn open_session(db: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Session::open(db)?)
}

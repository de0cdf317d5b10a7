//! Repro command
//!
//! Usage: polymap repro
//!
//! Persists the reference scenario (unless already stored), reloads the
//! exclusion and checks that its base-typed reference came back as the
//! concrete pending entity with its fulfiller.

use polymap_store::fixture::{self, EXCLUSION_ID, PENDING_ID, POSTED_ID};
use std::path::Path;

use super::open_session;

/// Execute repro command
pub fn execute(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(db)?;

    match fixture::run_scenario(&mut session) {
        Ok(loaded) => {
            println!("✓ Loaded {} ({} entities)", EXCLUSION_ID, loaded.len());
            println!("✓ Compensating entity {} is a PendingEntity", PENDING_ID);
            println!("✓ Fulfilled by {}", POSTED_ID);
            println!("PASS");
            Ok(())
        }
        Err(e) => {
            println!("FAIL: {}", e);
            Err(e.into())
        }
    }
}

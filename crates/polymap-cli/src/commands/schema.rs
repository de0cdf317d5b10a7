//! Schema command
//!
//! Usage: polymap schema

use polymap_core::mapping::standard_layout;

/// Print every CREATE statement of the mapped layout
pub fn execute() -> Result<(), Box<dyn std::error::Error>> {
    let layout = standard_layout()?;
    for statement in layout.create_statements() {
        println!("{};\n", statement);
    }
    Ok(())
}

//! Schema mapper
//!
//! Turns a declared single-table hierarchy (one shared primary table plus
//! optional per-variant secondary tables) into a physical [`TableLayout`].

pub mod decl;
pub mod layout;
pub mod mapper;

pub use decl::{
    standard_hierarchy, ColumnDecl, HierarchyDecl, RefTarget, ReferenceDecl, SecondaryTableDecl,
    SqlType, VariantDecl,
};
pub use layout::{quote_ident, Column, ForeignKey, PrimaryTable, SecondaryTable, Table, TableLayout, VariantLayout};
pub use mapper::map_hierarchy;

use crate::errors::Result;
use crate::model::Discriminator;

/// Layout of the standard hierarchy, checked against the closed model
///
/// Fails if the declaration and [`Discriminator`] ever drift apart.
pub fn standard_layout() -> Result<TableLayout> {
    let layout = map_hierarchy(&standard_hierarchy())?;
    layout.ensure_covers(Discriminator::ALL.iter().map(|d| d.as_str()))?;
    Ok(layout)
}

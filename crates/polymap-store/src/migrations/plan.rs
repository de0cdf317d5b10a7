//! Migrations derived from a mapped layout

use polymap_core::mapping::TableLayout;

/// One table's DDL plus its indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: String,
    pub sql: String,
}

/// One migration per table, primary table first
///
/// Ids are `NNN_<table>` so the apply order matches foreign key dependency
/// order.
pub fn plan_migrations(layout: &TableLayout) -> Vec<Migration> {
    let tables = std::iter::once(&layout.primary().table)
        .chain(layout.secondaries().iter().map(|s| &s.table));

    tables
        .enumerate()
        .map(|(i, table)| {
            let statements: Vec<String> = std::iter::once(table.create_sql())
                .chain(table.index_sql())
                .collect();
            Migration {
                id: format!("{:03}_{}", i + 1, table.name.to_lowercase()),
                sql: format!("{};\n", statements.join(";\n")),
            }
        })
        .collect()
}

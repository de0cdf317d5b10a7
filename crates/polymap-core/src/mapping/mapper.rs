//! Schema mapper: hierarchy declaration to physical layout
//!
//! Every structural problem is reported here, at mapping time, so that no
//! statement is ever prepared against an inconsistent schema.

use std::collections::HashMap;

use super::decl::{ColumnDecl, HierarchyDecl, RefTarget, SqlType, VariantDecl};
use super::layout::{
    Column, ForeignKey, PrimaryTable, SecondaryTable, Table, TableLayout, VariantLayout,
};
use crate::errors::{MapError, Result};

/// Map a hierarchy declaration onto tables
///
/// # Errors
///
/// - `InvalidDeclaration` for empty names or a secondary table whose key and
///   reference columns coincide
/// - `DuplicateDiscriminator` when two variants share a discriminator value
/// - `ColumnConflict` when inline columns collide with each other or with
///   the identifier/discriminator columns
/// - `DuplicateTable` when a table name is reused
/// - `UnknownTarget` when a reference names an undeclared discriminator
pub fn map_hierarchy(decl: &HierarchyDecl) -> Result<TableLayout> {
    require_name("primary table", &decl.table)?;
    require_name("identifier column", &decl.id_column)?;
    require_name("discriminator column", &decl.discriminator_column)?;
    if same_ident(&decl.id_column, &decl.discriminator_column) {
        return Err(MapError::ColumnConflict {
            table: decl.table.clone(),
            column: decl.discriminator_column.clone(),
            reason: "discriminator column reuses the identifier column".to_string(),
        });
    }

    check_discriminators(&decl.variants)?;

    let mut primary_columns = vec![
        Column {
            name: decl.id_column.clone(),
            sql_type: SqlType::Text,
            primary_key: true,
            nullable: false,
            unique: false,
            references: None,
        },
        Column {
            name: decl.discriminator_column.clone(),
            sql_type: SqlType::Text,
            primary_key: false,
            nullable: false,
            unique: false,
            references: None,
        },
    ];
    // upper-cased column name -> (declaring variant, declaration)
    let mut inline: HashMap<String, (String, ColumnDecl)> = HashMap::new();
    let mut variants = Vec::with_capacity(decl.variants.len());
    let mut secondaries: Vec<SecondaryTable> = Vec::new();

    for variant in &decl.variants {
        let mut inline_names = Vec::new();
        for column in &variant.inline_columns {
            if merge_inline_column(decl, variant, column, &mut inline)? {
                primary_columns.push(Column {
                    name: column.name.clone(),
                    sql_type: column.sql_type,
                    primary_key: false,
                    // other variants never set it
                    nullable: true,
                    unique: column.unique,
                    references: None,
                });
            }
            inline_names.push(column.name.clone());
        }

        let secondary = match &variant.secondary_table {
            None => None,
            Some(st) => {
                require_name("secondary table", &st.name)?;
                require_name("secondary key column", &st.key_column)?;
                require_name("reference column", &st.reference.column)?;
                if same_ident(&st.key_column, &st.reference.column) {
                    return Err(MapError::InvalidDeclaration {
                        reason: format!(
                            "secondary table {} uses {} as both key and reference column",
                            st.name, st.key_column
                        ),
                    });
                }
                if same_ident(&st.name, &decl.table)
                    || secondaries.iter().any(|s| same_ident(s.name(), &st.name))
                {
                    return Err(MapError::DuplicateTable {
                        table: st.name.clone(),
                    });
                }
                if let RefTarget::Variant(target) = &st.reference.target {
                    if !decl.variants.iter().any(|v| &v.discriminator == target) {
                        return Err(MapError::UnknownTarget {
                            column: st.reference.column.clone(),
                            discriminator: target.clone(),
                        });
                    }
                }

                let to_primary = ForeignKey {
                    table: decl.table.clone(),
                    column: decl.id_column.clone(),
                };
                secondaries.push(SecondaryTable {
                    table: Table {
                        name: st.name.clone(),
                        columns: vec![
                            Column {
                                name: st.key_column.clone(),
                                sql_type: SqlType::Text,
                                primary_key: true,
                                nullable: false,
                                unique: false,
                                references: Some(to_primary.clone()),
                            },
                            Column {
                                name: st.reference.column.clone(),
                                sql_type: SqlType::Text,
                                primary_key: false,
                                // the row only exists while the reference is set
                                nullable: false,
                                unique: st.reference.unique,
                                references: Some(to_primary),
                            },
                        ],
                    },
                    owner: variant.discriminator.clone(),
                    key_column: st.key_column.clone(),
                    reference_column: st.reference.column.clone(),
                    target: st.reference.target.clone(),
                    one_to_one: st.reference.unique,
                });
                Some(secondaries.len() - 1)
            }
        };

        variants.push(VariantLayout {
            name: variant.name.clone(),
            discriminator: variant.discriminator.clone(),
            inline_columns: inline_names,
            secondary,
        });
    }

    tracing::debug!(
        table = %decl.table,
        variants = variants.len(),
        secondary_tables = secondaries.len(),
        "Mapped hierarchy"
    );

    Ok(TableLayout {
        primary: PrimaryTable {
            table: Table {
                name: decl.table.clone(),
                columns: primary_columns,
            },
            id_column: decl.id_column.clone(),
            discriminator_column: decl.discriminator_column.clone(),
        },
        secondaries,
        variants,
    })
}

fn check_discriminators(variants: &[VariantDecl]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for variant in variants {
        require_name("variant", &variant.name)?;
        require_name("discriminator value", &variant.discriminator)?;
        if let Some(first) = seen.insert(&variant.discriminator, &variant.name) {
            return Err(MapError::DuplicateDiscriminator {
                discriminator: variant.discriminator.clone(),
                first: first.to_string(),
                second: variant.name.clone(),
            });
        }
    }
    Ok(())
}

/// Record an inline column; returns true when it is new to the shared table
fn merge_inline_column(
    decl: &HierarchyDecl,
    variant: &VariantDecl,
    column: &ColumnDecl,
    inline: &mut HashMap<String, (String, ColumnDecl)>,
) -> Result<bool> {
    require_name("inline column", &column.name)?;

    let conflict = |reason: String| MapError::ColumnConflict {
        table: decl.table.clone(),
        column: column.name.clone(),
        reason,
    };

    if same_ident(&column.name, &decl.id_column) {
        return Err(conflict(format!(
            "{} reuses the identifier column",
            variant.name
        )));
    }
    if same_ident(&column.name, &decl.discriminator_column) {
        return Err(conflict(format!(
            "{} reuses the discriminator column",
            variant.name
        )));
    }

    let key = column.name.to_ascii_uppercase();
    if let Some((owner, existing)) = inline.get(&key) {
        if owner == &variant.name {
            return Err(conflict(format!("{} declares it twice", variant.name)));
        }
        if existing.sql_type != column.sql_type || existing.unique != column.unique {
            return Err(conflict(format!(
                "{} declares {}{}, {} declares {}{}",
                owner,
                existing.sql_type.as_sql(),
                if existing.unique { " UNIQUE" } else { "" },
                variant.name,
                column.sql_type.as_sql(),
                if column.unique { " UNIQUE" } else { "" },
            )));
        }
        tracing::trace!(column = %column.name, first = %owner, second = %variant.name, "Sharing inline column");
        return Ok(false);
    }

    inline.insert(key, (variant.name.clone(), column.clone()));
    Ok(true)
}

fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(MapError::InvalidDeclaration {
            reason: format!("{} name must not be empty", what),
        });
    }
    Ok(())
}

// SQLite identifiers are case-insensitive
fn same_ident(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

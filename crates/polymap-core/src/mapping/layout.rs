//! Physical table layout produced by the schema mapper

use super::decl::{RefTarget, SqlType};
use crate::errors::{MapError, Result};

/// Foreign key target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl Column {
    fn render(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.sql_type.as_sql());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {}({})",
                quote_ident(&fk.table),
                quote_ident(&fk.column)
            ));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// `CREATE TABLE` statement for this table
    pub fn create_sql(&self) -> String {
        let body = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render()))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE {} (\n{}\n)", quote_ident(&self.name), body)
    }

    /// `CREATE INDEX` statements for non-unique foreign key columns
    pub fn index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.references.is_some() && !c.primary_key && !c.unique)
            .map(|c| {
                format!(
                    "CREATE INDEX {} ON {}({})",
                    quote_ident(&format!(
                        "idx_{}_{}",
                        self.name.to_lowercase(),
                        c.name.to_lowercase()
                    )),
                    quote_ident(&self.name),
                    quote_ident(&c.name)
                )
            })
            .collect()
    }
}

/// The shared table every variant is stored in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryTable {
    pub table: Table,
    pub id_column: String,
    pub discriminator_column: String,
}

/// A per-variant table keyed by the primary identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTable {
    pub table: Table,
    /// Discriminator of the variant owning this table
    pub owner: String,
    pub key_column: String,
    pub reference_column: String,
    pub target: RefTarget,
    pub one_to_one: bool,
}

impl SecondaryTable {
    pub fn name(&self) -> &str {
        &self.table.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLayout {
    pub name: String,
    pub discriminator: String,
    /// Inline columns on the primary table this variant declared
    pub inline_columns: Vec<String>,
    /// Index into [`TableLayout::secondaries`]
    pub secondary: Option<usize>,
}

/// Mapped physical layout for one hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub(crate) primary: PrimaryTable,
    pub(crate) secondaries: Vec<SecondaryTable>,
    pub(crate) variants: Vec<VariantLayout>,
}

impl TableLayout {
    pub fn primary(&self) -> &PrimaryTable {
        &self.primary
    }

    pub fn secondaries(&self) -> &[SecondaryTable] {
        &self.secondaries
    }

    pub fn variants(&self) -> &[VariantLayout] {
        &self.variants
    }

    pub fn variant(&self, discriminator: &str) -> Option<&VariantLayout> {
        self.variants
            .iter()
            .find(|v| v.discriminator == discriminator)
    }

    /// Secondary table owned by the variant with this discriminator
    pub fn secondary_for(&self, discriminator: &str) -> Option<&SecondaryTable> {
        self.variant(discriminator)
            .and_then(|v| v.secondary)
            .and_then(|idx| self.secondaries.get(idx))
    }

    /// One-to-one secondary tables whose reference targets this variant
    ///
    /// These back the inverse side of a one-to-one; base-typed many-to-one
    /// references have no inverse and are not returned.
    pub fn one_to_one_inverse_of(&self, discriminator: &str) -> Vec<&SecondaryTable> {
        self.secondaries
            .iter()
            .filter(|s| s.one_to_one && s.target == RefTarget::Variant(discriminator.to_string()))
            .collect()
    }

    /// Fail unless every listed discriminator has a variant
    pub fn ensure_covers<'a, I>(&self, discriminators: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for discriminator in discriminators {
            if self.variant(discriminator).is_none() {
                return Err(MapError::MissingVariant {
                    discriminator: discriminator.to_string(),
                });
            }
        }
        Ok(())
    }

    /// All table names, primary first
    pub fn table_names(&self) -> Vec<&str> {
        std::iter::once(self.primary.table.name.as_str())
            .chain(self.secondaries.iter().map(|s| s.name()))
            .collect()
    }

    /// DDL for every table in foreign-key dependency order
    pub fn create_statements(&self) -> Vec<String> {
        std::iter::once(&self.primary.table)
            .chain(self.secondaries.iter().map(|s| &s.table))
            .flat_map(|t| std::iter::once(t.create_sql()).chain(t.index_sql()))
            .collect()
    }
}

/// Double-quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

//! Declarative description of a single-table inheritance hierarchy
//!
//! Declarations are plain data. Nothing is validated until
//! [`map_hierarchy`](super::map_hierarchy) turns them into a layout.

use crate::model::Discriminator;

/// Storage class of a mapped column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

/// A variant field stored inline on the shared table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDecl {
    pub name: String,
    pub sql_type: SqlType,
    pub unique: bool,
}

impl ColumnDecl {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// What a reference column may point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// Any row of the hierarchy; concrete type comes from the target row
    Base,
    /// Only rows carrying this discriminator value
    Variant(String),
}

impl RefTarget {
    /// Whether a row with `discriminator` is an acceptable target
    pub fn accepts(&self, discriminator: &str) -> bool {
        match self {
            RefTarget::Base => true,
            RefTarget::Variant(d) => d == discriminator,
        }
    }
}

impl std::fmt::Display for RefTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefTarget::Base => f.write_str("any entity"),
            RefTarget::Variant(d) => f.write_str(d),
        }
    }
}

/// Owning foreign key stored in a secondary table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDecl {
    pub column: String,
    pub target: RefTarget,
    /// One-to-one when true, many-to-one otherwise
    pub unique: bool,
}

/// Secondary table joined to the primary table on its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTableDecl {
    pub name: String,
    /// Primary-key join column; holds the owning row's identifier
    pub key_column: String,
    pub reference: ReferenceDecl,
}

/// One concrete variant of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    pub name: String,
    pub discriminator: String,
    pub inline_columns: Vec<ColumnDecl>,
    pub secondary_table: Option<SecondaryTableDecl>,
}

impl VariantDecl {
    pub fn new(name: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discriminator: discriminator.into(),
            inline_columns: Vec::new(),
            secondary_table: None,
        }
    }

    pub fn with_column(mut self, column: ColumnDecl) -> Self {
        self.inline_columns.push(column);
        self
    }

    pub fn with_secondary_table(mut self, table: SecondaryTableDecl) -> Self {
        self.secondary_table = Some(table);
        self
    }
}

/// Abstract base plus its concrete variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyDecl {
    pub table: String,
    pub id_column: String,
    pub discriminator_column: String,
    pub variants: Vec<VariantDecl>,
}

impl HierarchyDecl {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        discriminator_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            id_column: id_column.into(),
            discriminator_column: discriminator_column.into(),
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: VariantDecl) -> Self {
        self.variants.push(variant);
        self
    }
}

/// Declaration of the pending/posted/exclusion hierarchy
///
/// - `PENDING_ENTITY` has no secondary table.
/// - `ENTITY` (posted) owns a unique link to a pending row in
///   `ENTITY_FULFILLMENT`.
/// - `EXCLUSION` owns a link to any row in `COMPENSATING_ENTITY`.
pub fn standard_hierarchy() -> HierarchyDecl {
    HierarchyDecl::new("ENTITY", "ID", "TYPE")
        .with_variant(VariantDecl::new(
            Discriminator::Pending.type_name(),
            Discriminator::Pending.as_str(),
        ))
        .with_variant(
            VariantDecl::new(
                Discriminator::Posted.type_name(),
                Discriminator::Posted.as_str(),
            )
            .with_secondary_table(SecondaryTableDecl {
                name: "ENTITY_FULFILLMENT".to_string(),
                key_column: "FULFILLED_ENTITY_ID".to_string(),
                reference: ReferenceDecl {
                    column: "PENDING_ENTITY_ID".to_string(),
                    target: RefTarget::Variant(Discriminator::Pending.as_str().to_string()),
                    unique: true,
                },
            }),
        )
        .with_variant(
            VariantDecl::new(
                Discriminator::Exclusion.type_name(),
                Discriminator::Exclusion.as_str(),
            )
            .with_secondary_table(SecondaryTableDecl {
                name: "COMPENSATING_ENTITY".to_string(),
                key_column: "ENTITY_ID".to_string(),
                reference: ReferenceDecl {
                    column: "COMPENSATING_ENTITY_ID".to_string(),
                    target: RefTarget::Base,
                    unique: false,
                },
            }),
        )
}

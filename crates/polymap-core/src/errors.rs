use thiserror::Error;

/// Result type alias using MapError
pub type Result<T> = std::result::Result<T, MapError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Mapping (raised at mapping time, before any SQL runs)
    InvalidInput,
    ColumnConflict,
    DuplicateMapping,
    MissingMapping,
    UnknownTarget,

    // Graph
    NotFound,
    AlreadyExists,
    CycleDetected,
    DanglingReference,
    UnknownDiscriminator,
    InvalidTargetKind,
    ConstraintViolation,

    // Fixture verification
    ScenarioMismatch,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ColumnConflict => "ERR_COLUMN_CONFLICT",
            ExErrorKind::DuplicateMapping => "ERR_DUPLICATE_MAPPING",
            ExErrorKind::MissingMapping => "ERR_MISSING_MAPPING",
            ExErrorKind::UnknownTarget => "ERR_UNKNOWN_TARGET",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::DanglingReference => "ERR_DANGLING_REFERENCE",
            ExErrorKind::UnknownDiscriminator => "ERR_UNKNOWN_DISCRIMINATOR",
            ExErrorKind::InvalidTargetKind => "ERR_INVALID_TARGET_KIND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::ScenarioMismatch => "ERR_SCENARIO_MISMATCH",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus the
/// entity/table/discriminator context that was in play when it was raised.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    table: Option<String>,
    discriminator: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            table: None,
            discriminator: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add discriminator context
    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(discriminator) = &self.discriminator {
            write!(f, " (discriminator: {})", discriminator)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for mapping, persisting and loading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    // ===== Mapping Errors =====
    /// Two declarations disagree about one column on a shared table
    #[error("Column {column} on table {table} conflicts: {reason}")]
    ColumnConflict {
        table: String,
        column: String,
        reason: String,
    },

    /// Two variants declare the same discriminator value
    #[error("Discriminator {discriminator} is declared by both {first} and {second}")]
    DuplicateDiscriminator {
        discriminator: String,
        first: String,
        second: String,
    },

    /// A table name is used twice in one hierarchy
    #[error("Table {table} is declared more than once")]
    DuplicateTable { table: String },

    /// A reference targets a discriminator no variant declares
    #[error("Reference column {column} targets unknown discriminator {discriminator}")]
    UnknownTarget {
        column: String,
        discriminator: String,
    },

    /// Structurally invalid declaration (empty names and the like)
    #[error("Invalid declaration: {reason}")]
    InvalidDeclaration { reason: String },

    /// The layout lacks a variant the closed model requires
    #[error("No mapping for discriminator {discriminator}")]
    MissingVariant { discriminator: String },

    // ===== Graph Errors =====
    /// A stored row carries a discriminator outside the closed set
    #[error("Unknown discriminator {discriminator} on entity {entity_id}")]
    UnknownDiscriminator {
        entity_id: String,
        discriminator: String,
    },

    /// A typed reference points at a row of the wrong variant
    #[error("Entity {entity_id} references {target_id} which is {actual}, expected {expected}")]
    InvalidTargetKind {
        entity_id: String,
        target_id: String,
        expected: String,
        actual: String,
    },

    /// Owning references form a cycle, so no insertion order exists
    #[error("Cycle detected among owning references involving entity {entity_id}")]
    CycleDetected { entity_id: String },

    /// The same identifier was added to one graph twice
    #[error("Entity {entity_id} is already part of this graph")]
    DuplicateEntity { entity_id: String },

    /// Entity not found
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    /// A stored reference names a row that does not exist
    #[error("Entity {entity_id} references missing entity {target_id} via {table}")]
    DanglingReference {
        entity_id: String,
        target_id: String,
        table: String,
    },

    // ===== Fixture Errors =====
    /// A reloaded graph does not match what was persisted
    #[error("Scenario mismatch: {reason}")]
    ScenarioMismatch { reason: String },
}

impl From<MapError> for ExError {
    fn from(err: MapError) -> Self {
        let message = err.to_string();
        match err {
            MapError::ColumnConflict { table, .. } => ExError::new(ExErrorKind::ColumnConflict)
                .with_op("map_hierarchy")
                .with_table(table)
                .with_message(message),

            MapError::DuplicateDiscriminator { discriminator, .. } => {
                ExError::new(ExErrorKind::DuplicateMapping)
                    .with_op("map_hierarchy")
                    .with_discriminator(discriminator)
                    .with_message(message)
            }

            MapError::DuplicateTable { table } => ExError::new(ExErrorKind::DuplicateMapping)
                .with_op("map_hierarchy")
                .with_table(table)
                .with_message(message),

            MapError::UnknownTarget { discriminator, .. } => {
                ExError::new(ExErrorKind::UnknownTarget)
                    .with_op("map_hierarchy")
                    .with_discriminator(discriminator)
                    .with_message(message)
            }

            MapError::InvalidDeclaration { .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("map_hierarchy")
                .with_message(message),

            MapError::MissingVariant { discriminator } => {
                ExError::new(ExErrorKind::MissingMapping)
                    .with_discriminator(discriminator)
                    .with_message(message)
            }

            MapError::UnknownDiscriminator {
                entity_id,
                discriminator,
            } => ExError::new(ExErrorKind::UnknownDiscriminator)
                .with_entity_id(entity_id)
                .with_discriminator(discriminator)
                .with_message(message),

            MapError::InvalidTargetKind {
                entity_id, actual, ..
            } => ExError::new(ExErrorKind::InvalidTargetKind)
                .with_entity_id(entity_id)
                .with_discriminator(actual)
                .with_message(message),

            MapError::CycleDetected { entity_id } => ExError::new(ExErrorKind::CycleDetected)
                .with_op("insertion_order")
                .with_entity_id(entity_id)
                .with_message(message),

            MapError::DuplicateEntity { entity_id } => ExError::new(ExErrorKind::AlreadyExists)
                .with_entity_id(entity_id)
                .with_message(message),

            MapError::EntityNotFound { entity_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(entity_id)
                .with_message(message),

            MapError::DanglingReference {
                entity_id, table, ..
            } => ExError::new(ExErrorKind::DanglingReference)
                .with_entity_id(entity_id)
                .with_table(table)
                .with_message(message),

            MapError::ScenarioMismatch { .. } => ExError::new(ExErrorKind::ScenarioMismatch)
                .with_op("verify_scenario")
                .with_message(message),
        }
    }
}

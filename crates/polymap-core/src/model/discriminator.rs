use serde::{Deserialize, Serialize};

/// Closed set of concrete variants stored in the shared entity table
///
/// The stored string values are fixed at mapping time; rows carrying any
/// other value are rejected by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discriminator {
    Pending,
    Posted,
    Exclusion,
}

impl Discriminator {
    /// Every variant, in declaration order
    pub const ALL: [Discriminator; 3] = [
        Discriminator::Pending,
        Discriminator::Posted,
        Discriminator::Exclusion,
    ];

    /// Value written to the discriminator column
    pub fn as_str(&self) -> &'static str {
        match self {
            Discriminator::Pending => "PENDING_ENTITY",
            Discriminator::Posted => "ENTITY",
            Discriminator::Exclusion => "EXCLUSION",
        }
    }

    /// Name of the concrete type this value materializes as
    pub fn type_name(&self) -> &'static str {
        match self {
            Discriminator::Pending => "PendingEntity",
            Discriminator::Posted => "PostedEntity",
            Discriminator::Exclusion => "ExclusionEntity",
        }
    }

    /// Parse a stored column value
    pub fn from_column(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl std::fmt::Display for Discriminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

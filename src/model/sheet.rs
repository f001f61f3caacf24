//! Sheet descriptor.

use serde::{Deserialize, Serialize};

/// A worksheet entry of the workbook index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetDescriptor {
    /// 1-based position in the workbook's sheet list
    #[serde(rename = "nr")]
    pub number: usize,
    /// Display name
    pub name: String,
    /// Relationship id linking the entry to its worksheet part
    #[serde(rename = "rid")]
    pub relationship_id: String,
    /// Resolved archive path of the worksheet part
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub part: String,
}

impl SheetDescriptor {
    /// Create a descriptor.
    pub fn new(
        number: usize,
        name: impl Into<String>,
        relationship_id: impl Into<String>,
        part: impl Into<String>,
    ) -> Self {
        Self {
            number,
            name: name.into(),
            relationship_id: relationship_id.into(),
            part: part.into(),
        }
    }
}

impl std::fmt::Display for SheetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {:?} ({})", self.number, self.name, self.relationship_id)
    }
}

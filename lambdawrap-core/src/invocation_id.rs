//! Invocation ID generation

use std::fmt;
use uuid::Uuid;

/// Identifier attached to the tracing span of a single invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationId(String);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create an invocation ID with a specific value (for testing)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_id_generation() {
        let id1 = InvocationId::new();
        let id2 = InvocationId::new();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 32);
        assert!(id1.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_invocation_id_with_id() {
        let id = InvocationId::with_id("test-id-123");
        assert_eq!(id.to_string(), "test-id-123");
    }
}

//! Error taxonomy for descriptor construction and accessor calls.
//!
//! Every failure here is a deterministic function of a type's shape, so
//! nothing is retried and nothing degrades to a fallback. Schema builders
//! are expected to surface these as startup-time configuration errors.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ShapeError>;

#[derive(Debug, Clone, Error)]
pub enum ShapeError {
    /// A caller asked for something the member's shape forbids: a setter on a
    /// constant or init-only field, or an instance accessor for a static member.
    #[error("structural violation on {declaring_type}::{member}: {reason}")]
    StructuralViolation {
        member: String,
        declaring_type: String,
        reason: String,
    },

    /// A kind that has no mapping on the requested path (pointer or by-ref
    /// parameters, delegates or interfaces where a value is expected).
    #[error("unsupported shape `{kind}` for {declaring_type}::{member}")]
    UnsupportedShape {
        kind: String,
        member: String,
        declaring_type: String,
    },

    #[error("type `{type_name}` has not been registered with the metadata cache")]
    UnknownType { type_name: String },

    #[error("type `{declaring_type}` has no {member_kind} named `{member}`")]
    MemberNotFound {
        member_kind: &'static str,
        member: String,
        declaring_type: String,
    },

    #[error("{declaring_type}::{member} expects {expected} argument(s), got {found}")]
    ArgumentCount {
        member: String,
        declaring_type: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} (`{parameter}`) of {declaring_type}::{member} cannot be converted to `{expected}`")]
    ArgumentType {
        member: String,
        declaring_type: String,
        parameter: String,
        position: usize,
        expected: String,
    },

    #[error("instance passed to {declaring_type}::{member} is not a `{declaring_type}`")]
    ReceiverType {
        member: String,
        declaring_type: String,
    },

    /// A property setter returned an error for the value it was given
    #[error("{declaring_type}::{member} rejected the value: {reason}")]
    ValueRejected {
        member: String,
        declaring_type: String,
        reason: String,
    },

    /// Another thread held a nested type's build for longer than the
    /// configured wait. Usually two types whose first requests arrived on
    /// different threads and that refer to each other.
    #[error("timed out after {waited_ms}ms waiting for `{type_name}` to be built")]
    BuildTimedOut { type_name: String, waited_ms: u64 },

    /// Construction of a nested descriptor failed, so the enclosing type
    /// fails as a whole.
    #[error("failed to describe `{type_name}`: {source}")]
    NestedBuild {
        type_name: String,
        #[source]
        source: Box<ShapeError>,
    },
}

impl ShapeError {
    pub fn structural(
        member: impl Into<String>,
        declaring_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StructuralViolation {
            member: member.into(),
            declaring_type: declaring_type.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(
        kind: impl Into<String>,
        member: impl Into<String>,
        declaring_type: impl Into<String>,
    ) -> Self {
        Self::UnsupportedShape {
            kind: kind.into(),
            member: member.into(),
            declaring_type: declaring_type.into(),
        }
    }

    /// Follow [NestedBuild](ShapeError::NestedBuild) wrappers down to the failure
    /// that started the cascade.
    pub fn root_cause(&self) -> &ShapeError {
        match self {
            ShapeError::NestedBuild { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_builds() {
        let inner = ShapeError::unsupported("Pointer", "offset", "Cursor");
        let outer = ShapeError::NestedBuild {
            type_name: "Page".to_string(),
            source: Box::new(ShapeError::NestedBuild {
                type_name: "Cursor".to_string(),
                source: Box::new(inner),
            }),
        };

        assert!(matches!(
            outer.root_cause(),
            ShapeError::UnsupportedShape { kind, .. } if kind == "Pointer"
        ));
    }

    #[test]
    fn test_messages_name_member_and_type() {
        let err = ShapeError::structural("MAX_ITEMS", "Library", "constant field has no setter");
        assert_eq!(
            err.to_string(),
            "structural violation on Library::MAX_ITEMS: constant field has no setter"
        );
    }
}

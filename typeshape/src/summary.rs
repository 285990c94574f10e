//! Serializable summaries of descriptors, for display and diagnostics.

use serde::Serialize;

use crate::members::{Descriptor, Member, TypeMember};
use crate::system_type::{Kind, SystemType, Visibility};
use crate::tags::Tags;

#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub definition: &'static str,
    pub kind: Kind,
    pub system_type: SystemType,
    pub visibility: Visibility,
    pub is_collection: bool,
    pub is_dictionary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosed: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generic_args: Vec<String>,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub kind: crate::handle::MemberKind,
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    /// Field or property type, method or constructor signature, event
    /// handler type
    pub shape: String,
    pub is_static: bool,
    /// Whether a compiled accessor exists for the member's primary use:
    /// read for fields and properties, call for methods and constructors
    pub is_accessible: bool,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl MemberSummary {
    fn of(member: &Member) -> Self {
        let (shape, is_static, is_accessible) = match member {
            Member::Field(f) => (f.field_type().name().to_string(), f.is_static(), true),
            Member::Property(p) => (p.property_type().name().to_string(), p.is_static(), p.can_read()),
            Member::Method(m) => (m.signature(), m.is_static(), m.is_invokable()),
            Member::Constructor(c) => (c.signature(), true, c.is_invokable()),
            Member::Event(e) => (e.handler_type().name().to_string(), false, true),
        };
        Self {
            kind: member.kind(),
            name: member.name(),
            ordinal: member.handle().ordinal,
            visibility: member.visibility(),
            shape,
            is_static,
            is_accessible,
            tags: member.tags().clone(),
        }
    }
}

impl TypeMember {
    pub fn summary(&self) -> TypeSummary {
        TypeSummary {
            name: self.name().to_string(),
            definition: self.definition(),
            kind: self.kind(),
            system_type: self.system_type(),
            visibility: self.visibility(),
            is_collection: self.system_type().is_collection(),
            is_dictionary: self.system_type().is_dictionary(),
            base: self.base().map(|b| b.name().to_string()),
            enclosed: self.enclosed_type().map(|e| e.name().to_string()),
            generic_args: self
                .generic_args()
                .iter()
                .map(|a| a.name().to_string())
                .collect(),
            tags: self.tags().clone(),
            members: self.members().map(|m| MemberSummary::of(&m)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::MetadataCache;
    use crate::enclosed::KeyValuePair;
    use crate::handle::MemberKind;
    use crate::system_type::SystemType;

    #[test]
    fn test_summary_lists_members_in_order() {
        let cache = MetadataCache::default();
        let pair = cache.get::<KeyValuePair<String, u32>>().unwrap();
        let summary = pair.summary();

        assert_eq!(summary.system_type, SystemType::KeyValuePair);
        assert_eq!(summary.generic_args, vec!["String", "u32"]);
        let names: Vec<_> = summary.members.iter().map(|m| (m.kind, m.name)).collect();
        assert_eq!(
            names,
            vec![(MemberKind::Field, "key"), (MemberKind::Field, "value")]
        );
        assert_eq!(summary.members[1].shape, "u32");
    }

    #[test]
    fn test_summary_serializes() {
        let cache = MetadataCache::default();
        let summary = cache.get::<Vec<i64>>().unwrap().summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["system_type"], "List");
        assert_eq!(json["enclosed"], "i64");
        assert!(json.get("base").is_none());
    }
}

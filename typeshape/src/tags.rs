//! Opaque, order-preserving tag lists.
//!
//! Tags are attribute-equivalent facts attached to types, members and
//! parameters with `#[tag(..)]`. This crate stores and returns them as-is;
//! interpreting a tag (naming, ignore flags, nullability overrides) is the
//! schema builder's job.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Str(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<TagValue>,
}

impl Tag {
    pub const fn marker(key: &'static str) -> Self {
        Self { key, value: None }
    }

    pub const fn new(key: &'static str, value: TagValue) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    pub fn is_marker(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_vec(tags: Vec<Tag>) -> Self {
        Self(tags)
    }

    /// First tag with the given key
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.iter().find(|t| t.key == key)
    }

    /// Every tag with the given key, in declaration order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.0.iter().filter(move |t| t.key == key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_preserve_order_and_duplicates() {
        let tags = Tags::from_vec(vec![
            Tag::new("alias", TagValue::Str("Title")),
            Tag::marker("ignore"),
            Tag::new("alias", TagValue::Str("Name")),
        ]);

        assert_eq!(tags.len(), 3);
        assert!(tags.has("ignore"));
        assert!(tags.get("ignore").unwrap().is_marker());
        assert_eq!(
            tags.get("alias").unwrap().value,
            Some(TagValue::Str("Title"))
        );
        let keys: Vec<_> = tags.iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["alias", "ignore", "alias"]);
        assert_eq!(tags.get_all("alias").count(), 2);
    }
}

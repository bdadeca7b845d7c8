//! Reshape a flat issue list into a tree mirroring the value it describes.
//!
//! Every node holds the formatted issues that point exactly at it plus, when some
//! issue points deeper, one container of children. The container's kind is fixed by
//! the first path step that creates it: array/tuple/set steps make a sequence,
//! map/object/record steps a keyed mapping. Issues without a path land on the root.
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::validate::{Issue, PathItem, PathKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Children<T> {
    Sequence(BTreeMap<usize, IssueTree<T>>),
    Keyed(IndexMap<String, IssueTree<T>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueTree<T> {
    errors: Vec<T>,
    children: Option<Children<T>>,
}

impl<T> Default for IssueTree<T> {
    fn default() -> Self {
        Self { errors: Vec::new(), children: None }
    }
}

impl<T> IssueTree<T> {
    pub fn new() -> Self { Self::default() }

    /// Formatted issues located exactly at this node.
    pub fn errors(&self) -> &[T] { &self.errors }

    pub fn children(&self) -> Option<&Children<T>> { self.children.as_ref() }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&IssueTree<T>> {
        match self.children.as_ref()? {
            Children::Keyed(map) => map.get(name),
            Children::Sequence(seq) => seq.get(&name.parse::<usize>().ok()?),
        }
    }

    pub fn item(&self, index: usize) -> Option<&IssueTree<T>> {
        match self.children.as_ref()? {
            Children::Sequence(seq) => seq.get(&index),
            Children::Keyed(map) => map.get(&index.to_string()),
        }
    }

    /// Follow a whole path, e.g. `tree.at(issue.path())`.
    pub fn at(&self, path: &[PathItem]) -> Option<&IssueTree<T>> {
        path.iter().try_fold(self, |node, step| match &step.key {
            PathKey::Index(i) => node.item(*i),
            PathKey::Name(name) => node.field(name),
        })
    }

    /// Tree with `item` appended at `path`, creating containers along the way.
    pub fn with_issue(mut self, path: &[PathItem], item: T) -> Self {
        let node = path.iter().fold(&mut self, |node, step| node.child_mut(step));
        node.errors.push(item);
        self
    }

    fn child_mut(&mut self, step: &PathItem) -> &mut IssueTree<T> {
        let children = self.children.get_or_insert_with(|| {
            if step.schema.is_sequence() {
                Children::Sequence(BTreeMap::new())
            } else {
                Children::Keyed(IndexMap::new())
            }
        });
        let index = match &step.key {
            PathKey::Index(i) => Some(*i),
            PathKey::Name(name) => name.parse::<usize>().ok(),
        };
        if index.is_none() {
            children.make_keyed();
        }
        match children {
            Children::Sequence(seq) => seq.entry(index.unwrap_or_default()).or_default(),
            Children::Keyed(map) => map.entry(step.key.to_string()).or_default(),
        }
    }
}

impl<T> Children<T> {
    /// A non-numeric key stepping into a sequence turns it into a keyed mapping.
    fn make_keyed(&mut self) {
        if let Self::Sequence(seq) = self {
            let keyed = std::mem::take(seq)
                .into_iter()
                .map(|(i, node)| (i.to_string(), node))
                .collect();
            *self = Self::Keyed(keyed);
        }
    }
}

/// Fold `issues` into a tree, formatting each with `format`.
pub fn format_issues<T, F>(issues: &[Issue], mut format: F) -> IssueTree<T>
where
    F: FnMut(&Issue) -> T,
{
    issues.iter().fold(IssueTree::new(), |tree, issue| {
        tree.with_issue(issue.path(), format(issue))
    })
}

impl<T: Serialize> Serialize for IssueTree<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        match &self.children {
            Some(Children::Sequence(seq)) => {
                let len = seq.keys().next_back().map_or(0, |last| last + 1);
                let items: Vec<Option<&IssueTree<T>>> = (0..len).map(|i| seq.get(&i)).collect();
                map.serialize_entry("items", &items)?;
            }
            Some(Children::Keyed(fields)) => map.serialize_entry("fields", fields)?,
            None => {}
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::PathSchema;
    use crate::value::FormValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn issue(path: Option<Vec<PathItem>>, message: &str) -> Issue {
        Issue {
            reason: "type",
            validation: "string",
            message: message.into(),
            input: FormValue::Undefined,
            path,
        }
    }

    fn obj(key: &str) -> PathItem { PathItem::new(PathSchema::Object, key) }

    #[test]
    fn shared_prefix_shares_one_container() {
        let issues = vec![
            issue(Some(vec![obj("user"), obj("name")]), "name"),
            issue(Some(vec![obj("user"), obj("age")]), "age"),
            issue(None, "root"),
        ];
        let tree = format_issues(&issues, |i| i.message.clone());
        assert_eq!(tree.errors(), &["root".to_string()]);
        let user = tree.field("user").unwrap();
        assert!(user.errors().is_empty());
        assert_eq!(user.field("name").unwrap().errors(), &["name".to_string()]);
        assert_eq!(user.field("age").unwrap().errors(), &["age".to_string()]);
        match user.children().unwrap() {
            Children::Keyed(map) => assert_eq!(map.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn same_terminal_accumulates_in_order() {
        let path = vec![obj("tags"), PathItem::new(PathSchema::Array, 1)];
        let issues = vec![issue(Some(path.clone()), "first"), issue(Some(path.clone()), "second")];
        let tree = format_issues(&issues, |i| i.message.clone());
        assert_eq!(tree.at(&path).unwrap().errors(), &["first".to_string(), "second".to_string()]);
        assert!(matches!(tree.field("tags").unwrap().children(), Some(Children::Sequence(_))));
    }

    #[test]
    fn serialized_shape_mirrors_the_value() {
        let issues = vec![
            issue(Some(vec![obj("tags"), PathItem::new(PathSchema::Array, 2)]), "bad tag"),
            issue(Some(vec![obj("tags")]), "too few"),
            issue(Some(vec![obj("email")]), "bad email"),
        ];
        let tree = format_issues(&issues, |i| i.message.clone());
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "fields": {
                    "tags": { "errors": ["too few"], "items": [null, null, { "errors": ["bad tag"] }] },
                    "email": { "errors": ["bad email"] }
                }
            })
        );
    }

    #[test]
    fn formatter_sees_each_issue_once() {
        let issues = vec![issue(None, "a"), issue(Some(vec![obj("x")]), "b")];
        let mut seen = 0;
        let tree = format_issues(&issues, |i| {
            seen += 1;
            (i.validation, i.message.len())
        });
        assert_eq!(seen, 2);
        assert_eq!(tree.errors(), &[("string", 1)]);
        assert!(IssueTree::<()>::new().is_empty());
    }
}

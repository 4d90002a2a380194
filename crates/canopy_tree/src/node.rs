//! Closed node kind enum.
//!
//! A path walk may cross three kinds of values: live tree nodes, plain
//! tables, and scalars. [`Node`] names all three so resolvers dispatch on
//! [`NodeKind`] instead of inspecting types at runtime.

use core::fmt;

use crate::scene::SceneNode;
use crate::table::Table;
use crate::tree::{TreeRef, same_node};

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A live tree node with change notifications.
    Tree,
    /// A plain key/value container without notifications.
    Table,
    /// A terminal scalar value.
    Value,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Tree => write!(f, "tree node"),
            NodeKind::Table => write!(f, "table"),
            NodeKind::Value => write!(f, "value"),
        }
    }
}

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    /// Absence of a value.
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Text(String),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Any value a path may reach.
#[derive(Clone)]
pub enum Node {
    /// A live tree node.
    Tree(TreeRef),
    /// A plain table.
    Table(Table),
    /// A scalar.
    Value(Scalar),
}

impl Node {
    /// Returns the node's kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Tree(_) => NodeKind::Tree,
            Node::Table(_) => NodeKind::Table,
            Node::Value(_) => NodeKind::Value,
        }
    }

    /// Returns the tree node, if this is one.
    #[must_use]
    pub fn as_tree(&self) -> Option<&TreeRef> {
        match self {
            Node::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Converts into the tree node, if this is one.
    #[must_use]
    pub fn into_tree(self) -> Option<TreeRef> {
        match self {
            Node::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns the table, if this is one.
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns the scalar, if this is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Scalar> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a short human-readable label, used in errors and logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Node::Tree(tree) => format!("{} ({})", tree.name(), tree.class_name()),
            Node::Table(table) => format!("table[{}]", table.len()),
            Node::Value(value) => format!("{value:?}"),
        }
    }

    /// Returns `true` if both values are the same tree node, the same table,
    /// or equal scalars.
    #[must_use]
    pub fn same(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Tree(a), Node::Tree(b)) => same_node(a, b),
            (Node::Table(a), Node::Table(b)) => a.same_table(b),
            (Node::Value(a), Node::Value(b)) => a == b,
            _ => false,
        }
    }

    /// Builds a node from JSON: objects and arrays become tables (array
    /// elements keyed by their index), everything else a scalar.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Node {
        use serde_json::Value;

        match value {
            Value::Null => Node::Value(Scalar::Nil),
            Value::Bool(b) => Node::Value(Scalar::Bool(*b)),
            Value::Number(n) => Node::Value(Scalar::Number(n.as_f64().unwrap_or(f64::NAN))),
            Value::String(s) => Node::Value(Scalar::Text(s.clone())),
            Value::Array(items) => {
                let table = Table::new();
                for (index, item) in items.iter().enumerate() {
                    table.insert(index.to_string(), Node::from_json(item));
                }
                Node::Table(table)
            }
            Value::Object(map) => {
                let table = Table::new();
                for (key, item) in map {
                    table.insert(key.clone(), Node::from_json(item));
                }
                Node::Table(table)
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Tree(_) => write!(f, "Tree({})", self.label()),
            Node::Table(table) => f.debug_tuple("Table").field(table).finish(),
            Node::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<TreeRef> for Node {
    fn from(tree: TreeRef) -> Self {
        Node::Tree(tree)
    }
}

impl From<&SceneNode> for Node {
    fn from(node: &SceneNode) -> Self {
        Node::Tree(node.tree())
    }
}

impl From<SceneNode> for Node {
    fn from(node: SceneNode) -> Self {
        Node::Tree(node.tree())
    }
}

impl From<Table> for Node {
    fn from(table: Table) -> Self {
        Node::Table(table)
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Node::from(Scalar::Nil).kind(), NodeKind::Value);
        assert_eq!(Node::from(Table::new()).kind(), NodeKind::Table);
        assert_eq!(
            Node::from(SceneNode::new("Part", "Handle")).kind(),
            NodeKind::Tree
        );
    }

    #[test]
    fn from_json_builds_nested_tables() {
        let json = serde_json::json!({
            "settings": { "volume": 0.5, "muted": false },
            "tags": ["a", "b"],
        });
        let node = Node::from_json(&json);
        let table = node.as_table().unwrap();

        let settings = table.get("settings").unwrap();
        let volume = settings.as_table().unwrap().get("volume").unwrap();
        assert_eq!(volume.as_value(), Some(&Scalar::Number(0.5)));

        let tags = table.get("tags").unwrap();
        let second = tags.as_table().unwrap().get("1").unwrap();
        assert_eq!(second.as_value(), Some(&Scalar::Text("b".into())));
    }

    #[test]
    fn same_compares_identity_for_trees() {
        let part = SceneNode::new("Part", "Handle");
        let twin = SceneNode::new("Part", "Handle");
        assert!(Node::from(&part).same(&Node::from(&part)));
        assert!(!Node::from(&part).same(&Node::from(&twin)));
    }
}

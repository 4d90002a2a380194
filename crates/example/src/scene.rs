//! Scene descriptions loaded from JSON.

use std::collections::BTreeMap;

use canopy_tree::SceneNode;
use serde::Deserialize;

/// Errors raised while building a scene from its description.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The description is not valid JSON for a [`SceneSpec`].
    #[error("invalid scene description: {0}")]
    Parse(#[from] serde_json::Error),

    /// A reference names a node that does not exist below its owner.
    #[error("'{owner}' references '{path}' through '{attribute}', which does not exist")]
    DanglingReference {
        /// Name of the node carrying the attribute.
        owner: String,
        /// The attribute being assigned.
        attribute: String,
        /// The dotted path that failed to resolve.
        path: String,
    },
}

/// Declarative description of a scene subtree.
///
/// `references` maps attribute names to dotted paths relative to the node
/// itself, e.g. `{ "PrimaryPart": "Chassis" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSpec {
    /// Class of the node.
    pub class: String,
    /// Name of the node.
    pub name: String,
    /// Child descriptions, in order.
    #[serde(default)]
    pub children: Vec<SceneSpec>,
    /// Reference-valued attributes.
    #[serde(default)]
    pub references: BTreeMap<String, String>,
}

impl SceneSpec {
    /// Parses a description from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] if `json` does not describe a scene.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a detached scene tree and returns its root.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DanglingReference`] if a reference path does not
    /// lead to a node in the built tree.
    pub fn build(&self) -> Result<SceneNode, SceneError> {
        let root = SceneNode::new(&self.class, &self.name);
        self.build_children(&root);
        self.assign_references(&root)?;
        Ok(root)
    }

    fn build_children(&self, node: &SceneNode) {
        for spec in &self.children {
            let child = SceneNode::new_child(node, &spec.class, &spec.name);
            spec.build_children(&child);
        }
    }

    fn assign_references(&self, node: &SceneNode) -> Result<(), SceneError> {
        for (attribute, path) in &self.references {
            let target = path
                .split('.')
                .try_fold(node.clone(), |current, segment| current.find_first_child(segment))
                .ok_or_else(|| SceneError::DanglingReference {
                    owner: self.name.clone(),
                    attribute: attribute.clone(),
                    path: path.clone(),
                })?;
            node.set_reference(attribute, Some(&target));
        }

        for (spec, child) in self.children.iter().zip(node.children()) {
            spec.assign_references(&child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_scene_with_references() {
        let spec = SceneSpec::from_json(
            r#"{
                "class": "Model", "name": "Kart",
                "children": [{ "class": "Part", "name": "Chassis" }],
                "references": { "PrimaryPart": "Chassis" }
            }"#,
        )
        .unwrap();

        let kart = spec.build().unwrap();
        let chassis = kart.find_first_child("Chassis").unwrap();
        assert_eq!(kart.reference("PrimaryPart").unwrap().name(), chassis.name());
    }

    #[test]
    fn dangling_reference_is_reported() {
        let spec = SceneSpec::from_json(
            r#"{ "class": "Model", "name": "Kart", "references": { "PrimaryPart": "Wheel" } }"#,
        )
        .unwrap();

        assert!(matches!(
            spec.build(),
            Err(SceneError::DanglingReference { ref path, .. }) if path == "Wheel"
        ));
    }

    #[test]
    fn bundled_scene_parses() {
        let spec = SceneSpec::from_json(include_str!("../scene.json")).unwrap();
        let workspace = spec.build().unwrap();
        assert_eq!(workspace.name(), "Workspace");
        assert_eq!(workspace.children().len(), 2);
    }
}

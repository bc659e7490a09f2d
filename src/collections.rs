use crate::error::SupplyError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ROOT_ID: &str = "root";
pub const PERSONAL_ID: &str = "personal";

const ROOT_NAME: &str = "Our analytics";
const PERSONAL_NAME: &str = "All personal collections";

/// Opaque key for a collection or question.
///
/// Exports carry ids either as JSON numbers or strings; both collapse into the
/// same string form so `1` and `"1"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawIdentifier")]
pub struct Identifier(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Number(i64),
    Text(String),
}

impl From<RawIdentifier> for Identifier {
    fn from(raw: RawIdentifier) -> Self {
        match raw {
            RawIdentifier::Number(n) => Identifier(n.to_string()),
            RawIdentifier::Text(s) => Identifier(s),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Only canonical integers go out as numbers, so "007" stays a string.
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl Identifier {
    pub fn root() -> Self {
        Identifier(ROOT_ID.to_string())
    }

    pub fn personal() -> Self {
        Identifier(PERSONAL_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn is_personal(&self) -> bool {
        self.0 == PERSONAL_ID
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier(s.to_string())
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier(n.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A navigable collection in the expanded tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Identifier,
    pub name: String,
    /// Ancestors ordered root first, parent last.
    pub parent_path: Vec<Identifier>,
    pub children: Vec<Identifier>,
    pub icon: String,
}

impl Node {
    fn new(id: Identifier, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Node {
            id,
            name: name.into(),
            parent_path: Vec::new(),
            children: Vec::new(),
            icon: icon.into(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// One row of a collections export.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRecord {
    pub id: Option<Identifier>,
    pub name: String,
    /// Slash path of ancestor ids, e.g. `"/"` or `"/1/4/"`.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub personal_owner_id: Option<Identifier>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl CollectionRecord {
    fn ancestors(&self) -> Vec<Identifier> {
        self.location
            .as_deref()
            .unwrap_or("/")
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(Identifier::from)
            .collect()
    }
}

/// Read-only map from id to node, always containing the synthetic root.
#[derive(Debug, Clone)]
pub struct CollectionTree {
    nodes: HashMap<Identifier, Node>,
    /// Root-identified collections keyed by the parent they are listed under.
    nested_roots: HashMap<Identifier, Vec<Node>>,
}

/// Link `id` to the last entry of `parent_path`, falling back to the root when
/// that parent is unknown. Returns the parent actually used.
fn attach_child(
    nodes: &mut HashMap<Identifier, Node>,
    id: &Identifier,
    parent_path: &mut Vec<Identifier>,
) -> Identifier {
    let parent = parent_path.last().cloned().unwrap_or_else(Identifier::root);
    if let Some(parent_node) = nodes.get_mut(&parent) {
        parent_node.children.push(id.clone());
        return parent;
    }
    warn!(collection = %id, parent = %parent, "parent collection missing, attaching to root");
    *parent_path = vec![Identifier::root()];
    if let Some(root) = nodes.get_mut(&Identifier::root()) {
        root.children.push(id.clone());
    }
    Identifier::root()
}

impl CollectionTree {
    /// Expand flat export records into a tree with children and parent paths.
    ///
    /// Top-level personal collections not owned by `current_user` are moved
    /// under a synthetic `personal` node.
    pub fn from_records(records: &[CollectionRecord], current_user: Option<&Identifier>) -> Self {
        let mut nodes: HashMap<Identifier, Node> = HashMap::new();
        let mut root = Node::new(Identifier::root(), ROOT_NAME, "folder");

        let others_personal: HashSet<Identifier> = records
            .iter()
            .filter(|record| record.ancestors().is_empty())
            .filter(|record| match &record.personal_owner_id {
                Some(owner) => Some(owner) != current_user,
                None => false,
            })
            .filter_map(|record| record.id.clone())
            .collect();

        let mut order: Vec<Identifier> = Vec::with_capacity(records.len());
        // Root-identified records that sit below another collection, in export order.
        let mut pending_nested: Vec<Node> = Vec::new();
        for record in records {
            let ancestors = record.ancestors();
            let id = match record.id.clone() {
                Some(id) if !(id.is_root() && ancestors.is_empty()) => id,
                // A null id, or a top-level "root" id, describes the root itself.
                _ => {
                    root.name = record.name.clone();
                    continue;
                }
            };

            let mut parent_path = vec![Identifier::root()];
            let reparented = match ancestors.first() {
                Some(top) => others_personal.contains(top),
                None => others_personal.contains(&id),
            };
            if reparented {
                parent_path.push(Identifier::personal());
            }
            parent_path.extend(ancestors);

            let icon = record.icon.clone().unwrap_or_else(|| {
                if record.personal_owner_id.is_some() {
                    "person".to_string()
                } else {
                    "folder".to_string()
                }
            });
            let mut node = Node::new(id.clone(), record.name.clone(), icon);
            node.parent_path = parent_path;
            order.push(id.clone());
            if id.is_root() {
                pending_nested.push(node);
            } else {
                nodes.insert(id, node);
            }
        }

        if !others_personal.is_empty() {
            let mut personal = Node::new(Identifier::personal(), PERSONAL_NAME, "group");
            personal.parent_path = vec![Identifier::root()];
            nodes.insert(Identifier::personal(), personal);
        }
        nodes.insert(Identifier::root(), root);

        let mut nested_roots: HashMap<Identifier, Vec<Node>> = HashMap::new();
        let mut pending_nested = pending_nested.into_iter();
        for id in &order {
            if id.is_root() {
                let Some(mut node) = pending_nested.next() else {
                    continue;
                };
                let parent = attach_child(&mut nodes, id, &mut node.parent_path);
                nested_roots.entry(parent).or_default().push(node);
                continue;
            }
            let mut parent_path = nodes[id].parent_path.clone();
            attach_child(&mut nodes, id, &mut parent_path);
            if let Some(node) = nodes.get_mut(id) {
                node.parent_path = parent_path;
            }
        }

        if !others_personal.is_empty() {
            if let Some(root) = nodes.get_mut(&Identifier::root()) {
                root.children.push(Identifier::personal());
            }
        }

        debug!(nodes = nodes.len(), "expanded collection tree");
        CollectionTree {
            nodes,
            nested_roots,
        }
    }

    pub fn get(&self, id: &Identifier) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root(&self) -> &Node {
        // Every constructor inserts the root.
        &self.nodes[&Identifier::root()]
    }

    /// Children of `id` in export order; unknown ids have none.
    ///
    /// A child entry equal to the root id stands for the next root-identified
    /// collection listed under `id`, never for the tree's own root.
    pub fn children_of<'a>(&'a self, id: &Identifier) -> impl Iterator<Item = &'a Node> + 'a {
        let children = self
            .nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[]);
        let mut nested = self
            .nested_roots
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter();
        children.iter().filter_map(move |child| {
            if child.is_root() {
                nested.next()
            } else {
                self.nodes.get(child)
            }
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.nested_roots.values().map(Vec::len).sum::<usize>()
    }
}

/// Source of the collection tree.
pub trait TreeSupplier {
    fn load_tree(&self) -> Result<CollectionTree, SupplyError>;
}

/// Loads the tree from a JSON array of [`CollectionRecord`]s.
pub struct JsonTreeSupplier {
    path: PathBuf,
    current_user: Option<Identifier>,
}

impl JsonTreeSupplier {
    pub fn new(path: impl Into<PathBuf>, current_user: Option<Identifier>) -> Self {
        JsonTreeSupplier {
            path: path.into(),
            current_user,
        }
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, SupplyError> {
    let text = fs::read_to_string(path).map_err(|source| SupplyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SupplyError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl TreeSupplier for JsonTreeSupplier {
    fn load_tree(&self) -> Result<CollectionTree, SupplyError> {
        let records: Vec<CollectionRecord> = read_json(&self.path)?;
        let tree = CollectionTree::from_records(&records, self.current_user.as_ref());
        info!(
            path = %self.path.display(),
            collections = records.len(),
            nodes = tree.len(),
            "loaded collections"
        );
        Ok(tree)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn record(id: i64, name: &str, location: &str) -> CollectionRecord {
        CollectionRecord {
            id: Some(Identifier::from(id)),
            name: name.to_string(),
            location: Some(location.to_string()),
            personal_owner_id: None,
            icon: None,
        }
    }

    fn personal(id: i64, name: &str, owner: i64) -> CollectionRecord {
        CollectionRecord {
            personal_owner_id: Some(Identifier::from(owner)),
            ..record(id, name, "/")
        }
    }

    fn ids<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<String> {
        nodes.map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn numeric_and_string_ids_are_equal() {
        let a: Identifier = serde_json::from_str("7").unwrap();
        let b: Identifier = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Identifier::root()).unwrap(), "\"root\"");
    }

    #[test]
    fn non_canonical_numeric_ids_stay_strings() {
        for raw in ["007", "+5", "-0"] {
            let id = Identifier::from(raw);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{raw}\""));
        }
        assert_eq!(serde_json::to_string(&Identifier::from(-12)).unwrap(), "-12");
    }

    #[test]
    fn root_id_below_another_collection_stays_a_child() {
        let nested = CollectionRecord {
            id: Some(Identifier::root()),
            name: "Nested root".to_string(),
            location: Some("/1/".to_string()),
            personal_owner_id: None,
            icon: None,
        };
        let records = vec![record(1, "Sales", "/"), nested, record(3, "EMEA", "/1/")];
        let tree = CollectionTree::from_records(&records, None);

        assert_eq!(tree.root().name, "Our analytics");
        assert!(tree.root().parent_path.is_empty());
        let names: Vec<&str> = tree
            .children_of(&Identifier::from(1))
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, ["Nested root", "EMEA"]);
        let nested = tree.children_of(&Identifier::from(1)).next().unwrap();
        assert_eq!(nested.parent_path, vec![Identifier::root(), Identifier::from(1)]);
        assert!(!nested.has_children());
        assert_eq!(ids(tree.children_of(&Identifier::root())), ["1"]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn builds_children_and_parent_paths() {
        let records = vec![
            record(1, "Sales", "/"),
            record(2, "Marketing", "/"),
            record(3, "EMEA", "/1/"),
            record(4, "Germany", "/1/3/"),
        ];
        let tree = CollectionTree::from_records(&records, None);

        assert_eq!(ids(tree.children_of(&Identifier::root())), ["1", "2"]);
        assert_eq!(ids(tree.children_of(&Identifier::from(1))), ["3"]);
        let germany = tree.get(&Identifier::from(4)).unwrap();
        assert_eq!(
            germany.parent_path,
            vec![Identifier::root(), Identifier::from(1), Identifier::from(3)]
        );
        assert!(tree.root().parent_path.is_empty());
        assert!(!tree.contains(&Identifier::personal()));
    }

    #[test]
    fn other_users_personal_collections_move_under_personal() {
        let records = vec![
            record(1, "Sales", "/"),
            personal(10, "Alice's Personal Collection", 100),
            personal(11, "Bob's Personal Collection", 200),
            record(12, "Bob's drafts", "/11/"),
        ];
        let me = Identifier::from(100);
        let tree = CollectionTree::from_records(&records, Some(&me));

        assert_eq!(ids(tree.children_of(&Identifier::root())), ["1", "10", "personal"]);
        assert_eq!(ids(tree.children_of(&Identifier::personal())), ["11"]);
        let drafts = tree.get(&Identifier::from(12)).unwrap();
        assert_eq!(
            drafts.parent_path,
            vec![Identifier::root(), Identifier::personal(), Identifier::from(11)]
        );
        assert_eq!(tree.get(&Identifier::from(10)).unwrap().icon, "person");
        assert_eq!(tree.get(&Identifier::personal()).unwrap().icon, "group");
    }

    #[test]
    fn orphans_attach_to_root() {
        let records = vec![record(5, "Lost", "/99/")];
        let tree = CollectionTree::from_records(&records, None);
        assert_eq!(ids(tree.children_of(&Identifier::root())), ["5"]);
        assert_eq!(
            tree.get(&Identifier::from(5)).unwrap().parent_path,
            vec![Identifier::root()]
        );
    }

    #[test]
    fn json_supplier_reads_export() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": null, "name": "Everything"}}, {{"id": 1, "name": "Sales", "location": "/"}}]"#
        )
        .unwrap();
        let tree = JsonTreeSupplier::new(file.path(), None).load_tree().unwrap();
        assert_eq!(tree.root().name, "Everything");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn json_supplier_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonTreeSupplier::new(file.path(), None).load_tree().unwrap_err();
        assert!(matches!(err, SupplyError::Parse { .. }));
    }
}

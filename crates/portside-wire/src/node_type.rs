use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Tag on a [`Node`](crate::Node) describing what kind of tree item it is.
/// The wire form is `str|int`; there is no documented legacy integer
/// mapping for node types, so an integer is preserved opaquely as its
/// decimal string rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Database,
    Schema,
    Table,
    Collection,
    View,
    Column,
    Key,
    Action,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Database => "database",
            NodeType::Schema => "schema",
            NodeType::Table => "table",
            NodeType::Collection => "collection",
            NodeType::View => "view",
            NodeType::Column => "column",
            NodeType::Key => "key",
            NodeType::Action => "action",
            NodeType::Other(s) => s,
        }
    }

    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "database" => NodeType::Database,
            "schema" => NodeType::Schema,
            "table" => NodeType::Table,
            "collection" => NodeType::Collection,
            "view" => NodeType::View,
            "column" => NodeType::Column,
            "key" => NodeType::Key,
            "action" => NodeType::Action,
            _ => NodeType::Other(name.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Name(String),
        }

        match Repr::deserialize(deserializer) {
            Ok(Repr::Int(n)) => Ok(NodeType::Other(n.to_string())),
            Ok(Repr::Name(s)) => Ok(NodeType::from_name(&s)),
            Err(e) => Err(de::Error::custom(format!("invalid node_type: {e}"))),
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Tag on a [`NodeAction`](crate::NodeAction). At minimum `select`,
/// `describe`, `create-database`, `create-table`, `drop-database`, and
/// `drop-table` are recognized; anything else round-trips opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeActionType {
    Select,
    Describe,
    CreateDatabase,
    CreateTable,
    DropDatabase,
    DropTable,
    Other(String),
}

impl NodeActionType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeActionType::Select => "select",
            NodeActionType::Describe => "describe",
            NodeActionType::CreateDatabase => "create-database",
            NodeActionType::CreateTable => "create-table",
            NodeActionType::DropDatabase => "drop-database",
            NodeActionType::DropTable => "drop-table",
            NodeActionType::Other(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for NodeActionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "select" => NodeActionType::Select,
            "describe" => NodeActionType::Describe,
            "create-database" => NodeActionType::CreateDatabase,
            "create-table" => NodeActionType::CreateTable,
            "drop-database" => NodeActionType::DropDatabase,
            "drop-table" => NodeActionType::DropTable,
            other => NodeActionType::Other(other.to_string()),
        })
    }
}

impl Serialize for NodeActionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

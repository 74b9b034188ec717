use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Plugin type tag from [`InfoResponse`](crate::InfoResponse). Accepted on
/// the wire as either the legacy integer form or the string enumeration
/// name; always serialized back out as the string form.
///
/// Only `DRIVER` is guaranteed to exist; anything else round-trips through
/// [`PluginKind::Other`] so an unrecognized tag never fails the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginKind {
    Driver,
    Other(String),
}

impl PluginKind {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("driver") {
            PluginKind::Driver
        } else {
            PluginKind::Other(name.to_string())
        }
    }

    /// Legacy integer encoding: `0` is the only value documented by any
    /// plugin in the wild, and it means `DRIVER`.
    fn from_legacy_int(n: i64) -> Self {
        match n {
            0 => PluginKind::Driver,
            other => PluginKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PluginKind::Driver => "DRIVER",
            PluginKind::Other(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for PluginKind {
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
            Ok(Repr::Int(n)) => Ok(PluginKind::from_legacy_int(n)),
            Ok(Repr::Name(s)) => Ok(PluginKind::from_name(&s)),
            Err(e) => Err(de::Error::custom(format!("invalid plugin type: {e}"))),
        }
    }
}

impl Serialize for PluginKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

use streaming::DataUnavailable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A data file could not be fetched or decoded.
    DataUnavailable(DataUnavailable),
    /// A clicked country's topology id has no country code.
    UnresolvedIdentifier { id: Option<String>, name: String },
    /// A clicked region has no travel notes.
    NotVisited { code: String, region: String },
    InvalidConfig(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::DataUnavailable(e) => write!(f, "{e}"),
            MapError::UnresolvedIdentifier { id, name } => match id {
                Some(id) => write!(f, "no country code for {name} (id {id})"),
                None => write!(f, "no country code for {name} (no id)"),
            },
            MapError::NotVisited { region, .. } => write!(f, "You haven't visited {region} yet"),
            MapError::InvalidConfig(msg) => write!(f, "invalid map config: {msg}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::DataUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataUnavailable> for MapError {
    fn from(e: DataUnavailable) -> Self {
        MapError::DataUnavailable(e)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::InvalidConfig(e.to_string())
    }
}

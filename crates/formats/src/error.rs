#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    Json(String),
    NotAFeatureCollection,
    NotATopology,
    MissingObject(String),
    InvalidFeature { index: usize, reason: String },
    InvalidArc { index: usize, reason: String },
    InvalidIndex(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            FormatError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FormatError::NotATopology => write!(f, "expected TopoJSON Topology"),
            FormatError::MissingObject(name) => {
                write!(f, "topology has no object named {name:?}")
            }
            FormatError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            FormatError::InvalidArc { index, reason } => {
                write!(f, "invalid arc at index {index}: {reason}")
            }
            FormatError::InvalidIndex(msg) => write!(f, "invalid index file: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}

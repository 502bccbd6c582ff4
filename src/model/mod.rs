pub mod app_state;
pub mod layer;
pub mod map;
pub mod topic;

/// Reasons a model mutation can be refused. Mutators check their arguments
/// up front and leave the model untouched when returning one of these.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelError {
    LayerNotFound(String),
    UnknownProperty(String),
    InvalidValue { key: String, value: serde_json::Value },
    UnrecognizedLayerType(String),
    InvalidArrangement(String),
    NoTopicToRemove,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerNotFound(id) => write!(f, "no layer with id '{id}'"),
            Self::UnknownProperty(key) => write!(f, "unknown property '{key}'"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for '{key}': {value}")
            }
            Self::UnrecognizedLayerType(t) => write!(f, "unrecognized layer type '{t}'"),
            Self::InvalidArrangement(why) => write!(f, "invalid arrangement: {why}"),
            Self::NoTopicToRemove => write!(f, "there is no topic to remove"),
        }
    }
}

impl std::error::Error for ModelError {}

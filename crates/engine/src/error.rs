use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("source {0:?} already exists")]
    DuplicateSource(String),
    #[error("source {0:?} does not exist")]
    UnknownSource(String),
    #[error("layer {0:?} already exists")]
    DuplicateLayer(String),
    #[error("layer {0:?} does not exist")]
    UnknownLayer(String),
    #[error("source {0:?} is not a GeoJSON source")]
    NotGeoJson(String),
    #[error("map engine has been removed")]
    Removed,
    #[error("engine call failed: {0}")]
    Backend(String),
}

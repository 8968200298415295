/// Convenience result type used across pixelscatter.
pub type ScatterResult<T> = Result<T, ScatterError>;

/// Top-level error taxonomy used by sampler and engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScatterError {
    /// Invalid user-provided parameters, configuration, or event scripts.
    #[error("validation error: {0}")]
    Validation(String),

    /// The image source could not be resolved or read.
    #[error("load error: {0}")]
    Load(String),

    /// The source bytes are not a decodable raster image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Drawing surface limits (for example dimensions the rasterizer cannot hold).
    #[error("surface error: {0}")]
    Surface(String),

    /// Particle state became non-finite during a tick.
    #[error("motion error: {0}")]
    Motion(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScatterError {
    /// Build a [`ScatterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScatterError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`ScatterError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ScatterError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`ScatterError::Motion`] value.
    pub fn motion(msg: impl Into<String>) -> Self {
        Self::Motion(msg.into())
    }

    /// Build a [`ScatterError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

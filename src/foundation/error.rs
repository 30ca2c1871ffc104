pub type RecolorResult<T> = Result<T, RecolorError>;

#[derive(thiserror::Error, Debug)]
pub enum RecolorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("gpu error: {0}")]
    Gpu(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecolorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<image::ImageError> for RecolorError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

impl From<serde_json::Error> for RecolorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

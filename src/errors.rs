use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObscuraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Invalid screen transition: {0}")]
    InvalidTransition(String),

    #[error("An upload is already in flight")]
    Busy,

    #[error("No image picked")]
    NoImage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl serde::Serialize for ObscuraError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type ObscuraResult<T> = Result<T, ObscuraError>;

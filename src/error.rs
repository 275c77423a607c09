pub type JoyplotResult<T> = Result<T, JoyplotError>;

#[derive(thiserror::Error, Debug)]
pub enum JoyplotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JoyplotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }
}

impl From<serde_json::Error> for JoyplotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown {vocabulary} category: {value}")]
    UnknownCategory {
        vocabulary: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;

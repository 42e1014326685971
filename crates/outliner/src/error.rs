#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("No PDF files found in {0}")]
    NoInputs(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

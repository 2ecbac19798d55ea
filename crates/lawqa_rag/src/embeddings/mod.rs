use lawqa_core::error::AppError;

/// Maps texts to fixed-dimension vectors.
///
/// Implementations return exactly one vector per input, in input order, with the same
/// dimensionality on every call, and identical vectors for identical text.
pub trait Embedder {
    fn model(&self) -> &str;
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        (**self).embed(inputs)
    }
}

pub mod ollama_embed;

pub use ollama_embed::OllamaEmbedder;

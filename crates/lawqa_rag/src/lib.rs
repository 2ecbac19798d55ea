pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod index;
pub mod llm;
pub mod ollama;
pub mod store;

pub use answer::{answer_question, Answer};
pub use chunking::{Chunk, ChunkKind, Chunker};
pub use embeddings::Embedder;
pub use index::{FlatIndex, Neighbor};
pub use llm::Llm;
pub use store::{BuildReport, RetrievalStore, RetrievedChunk, StoreStatus};

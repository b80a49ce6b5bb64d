pub mod chunker;
mod model;
mod summarizer;
mod tokenizer;

pub use model::RemoteModel;
pub use summarizer::{GenerationParams, Summarizer, SummaryModel, TextSummarizer, Tokenizer};
pub use tokenizer::HfTokenizer;

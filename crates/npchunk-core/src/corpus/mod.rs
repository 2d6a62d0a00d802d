pub mod reader;
pub mod token;

pub use reader::{Corpus, InputFormat, Segment};
pub use token::{Sentence, Token};

//! Text utilities: tokenization, hyphenation and character alignment.

pub mod alignment;
pub mod hyphenation;
pub mod tokenizer;

pub use alignment::{edit_script, map_new_to_old, EditOp};
pub use hyphenation::{HyphenDecision, HyphenationHandler};
pub use tokenizer::{
    default_tokenizer, register_tokenizer, tokenizer_by_name, DefaultTokenizer, Tokenizer, WhitespaceTokenizer,
};

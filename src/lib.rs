pub mod ast;
pub mod config;
pub mod environment;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod tokenizer;

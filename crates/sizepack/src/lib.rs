pub mod assembler;
pub mod candidates;
pub mod config;
pub mod dev_blocks;
pub mod dirs;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod packer;
pub mod pipeline;
pub mod placeholders;
pub mod regions;
pub mod scanner;
pub mod shader;
pub mod shrink;
pub mod tokens;
pub mod tools;
pub mod types;

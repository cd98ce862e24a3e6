pub mod collate;
pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod roster;
pub mod score;
pub mod source;

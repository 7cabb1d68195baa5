pub mod artifact;
pub mod prompt;

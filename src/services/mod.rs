pub mod captions;
pub mod expander;
pub mod image;
pub mod muxer;
pub mod narrator;
pub mod pipeline;

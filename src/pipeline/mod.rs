pub mod annotate;
pub mod detect;
pub mod mood;
pub mod upload;

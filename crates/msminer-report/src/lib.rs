pub mod dataset;
pub mod json;
pub mod text;

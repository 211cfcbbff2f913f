//! Validation rules for request payloads that the derive attributes cannot express.

pub mod rules;

pub use validator::Validate;

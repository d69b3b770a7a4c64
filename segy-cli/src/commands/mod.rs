//! Command handlers for the segytool CLI

pub mod ebcdic;
pub mod edit;
pub mod info;
pub mod validate;

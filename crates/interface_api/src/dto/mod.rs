//! Request and response bodies

pub mod groups;

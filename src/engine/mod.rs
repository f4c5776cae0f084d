pub mod ids;
pub mod relationships;

pub mod envelope;
pub mod ids;
pub mod lenient;

pub mod prediction;
pub mod system;

pub mod assemble;
pub mod filter;
pub mod pipeline;
pub mod score;

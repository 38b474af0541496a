pub mod bash;
pub mod write_atomically;

pub mod pool;
pub mod retry;

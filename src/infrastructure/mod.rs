pub mod mongo;
pub mod repositories;

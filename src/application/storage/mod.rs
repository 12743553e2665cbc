pub mod codec;
pub mod document_store;
pub mod repository;
pub mod update;

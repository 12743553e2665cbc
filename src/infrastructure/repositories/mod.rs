pub mod application_repository;
pub mod dynamic_class_repository;
pub mod operation_repository;

pub use application_repository::{ApplicationRepository, UNKNOWN_APP_NAME};
pub use dynamic_class_repository::DynamicClassRepository;
pub use operation_repository::OperationRepository;

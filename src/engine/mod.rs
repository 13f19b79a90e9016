pub mod domain;
pub mod ids;
pub mod medium;
pub mod repository;
pub mod session;

pub use domain::{Collections, DanglingItem, DomainStore};
pub use ids::IdGenerator;
pub use medium::{FileMedium, MemoryMedium};
pub use repository::{Collection, Repository, SESSION_KEY};
pub use session::{SessionState, SessionStore};

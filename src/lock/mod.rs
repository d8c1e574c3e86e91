mod cancel;
mod error;
mod exclusive;
mod guard;
mod in_memory;
#[allow(clippy::module_inception)]
mod lock;
mod lock_manager;
mod owner;
pub(crate) mod wait;

pub(crate) use cancel::WakeWaiters;
pub use cancel::CancelToken;
pub use error::LockError;
pub use exclusive::ExclusiveLock;
pub use guard::{LockGuard, MultiLockGuard};
pub use in_memory::InMemoryLockManager;
pub use lock::Lock;
pub use lock_manager::LockManager;
pub use owner::OwnerId;

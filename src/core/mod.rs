//! Runtime plumbing: HTTP server, job workers, scheduling, throttling and locks

pub mod bootstrap;
pub mod http;
pub mod lock;
pub mod runtime;
pub mod scheduler;
pub mod throttle;

pub use bootstrap::{build_engine, BootstrapOptions};
pub use http::*;
pub use lock::{LocalRunLock, LockToken, RedisRunLock, RunLock};
pub use runtime::*;
pub use scheduler::*;
pub use throttle::{CallError, Throttle, ThrottlePermit};

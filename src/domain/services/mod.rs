pub mod actions;
pub mod clipboard;
mod credentials;
mod downloads;
pub mod events;
mod history;
mod notifications;
mod router;
mod selection;
mod storage;
mod studio;

pub use credentials::*;
pub use downloads::*;
pub use history::*;
pub use notifications::*;
pub use router::*;
pub use selection::*;
pub use storage::*;
pub use studio::*;

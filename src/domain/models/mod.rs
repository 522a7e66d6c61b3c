mod action;
mod catalog;
mod event;
mod generation;
mod generator;
mod loading;
mod notification;
mod page;
mod studio_event;
mod textarea;

pub use action::*;
pub use catalog::*;
pub use event::*;
pub use generation::*;
pub use generator::*;
pub use loading::*;
pub use notification::*;
pub use page::*;
pub use studio_event::*;
pub use textarea::*;

pub mod api;
pub mod config;
pub mod content;
pub mod dispatcher;
pub mod dom;
pub mod error;
pub mod forms;
pub mod models;
pub mod page;
pub mod recording;
pub mod replay;

pub use config::Config;
pub use dispatcher::MessageDispatcher;
pub use error::{ActuationError, AppError, DomError};
pub use page::Page;
pub use recording::Recorder;

pub mod app;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;

pub use error::{AppError, BackendError, StreamError};

pub use app::ConsoleApp;
pub use backend::{HttpMediaBackend, MediaBackend};
pub use controller::InputController;

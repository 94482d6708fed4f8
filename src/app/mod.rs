pub mod console_app;
pub mod views;

pub use console_app::ConsoleApp;
pub use views::control_panel::ControlAction;

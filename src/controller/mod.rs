pub mod input_controller;
pub mod state;

pub use input_controller::{Alert, FileSelection, InputController, UPLOAD_FAILED_MESSAGE};
pub use state::{
    ConsoleState, RenderTarget, SourceMode, StatusColor, StatusIndicator, StreamKey,
    UploadOutcome, UploadResult,
};

pub mod data_uri;
pub mod mjpeg;
pub mod stream_reader;

pub use data_uri::decode_data_uri;
pub use mjpeg::{MjpegDecoder, boundary_from_content_type};
pub use stream_reader::{StreamReader, VideoFrame};

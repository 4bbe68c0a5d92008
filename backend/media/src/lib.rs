//! Label image intake: format sniffing, upload validation, storage, serving.

pub mod media_server;
pub mod mime_detect;
pub mod upload;

pub use media_server::upload_router;
pub use mime_detect::{ImageFormat, is_acceptable_content_type};
pub use upload::{StoredUpload, UploadStore, validate_upload};

//! Transfer of incoming files to object storage.

pub mod error;
pub mod s3;
pub mod store;
pub mod uploader;

pub use error::UploadError;
pub use s3::S3Store;
pub use store::{object_key, ObjectStore};
pub use uploader::{upload_directory, FailedUpload, UploadReport, UploadTarget};

// Client library: configuration, registry access and the upload / download workflows
pub mod config;
pub mod download;
pub mod files;
pub mod logging;
pub mod registry;
pub mod upload;

pub use config::{Config, ConfigError};
pub use download::{DownloadError, Downloader};
pub use registry::{DrsClient, DrsMetadata, MetadataRegistry, RegistryError, ServiceInfo};
pub use upload::{upload_and_register, UploadError, UploadRequest};

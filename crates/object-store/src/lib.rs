//! Object storage for DRS uploads
//!
//! A thin wrapper over [`object_store`] that moves whole files between the local
//! filesystem and a bucket, and hands back the URL a DRS record should point at.
//!
//! # Backends
//!
//! - S3-compatible storage (AWS S3, MinIO); uploads return a presigned GET URL
//! - Local filesystem, for running against a directory instead of a bucket
//! - In-memory, for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use drs_object_store::{ObjectStore, ObjectStoreConfig};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), drs_object_store::BlobStoreError> {
//! let store = ObjectStore::new(ObjectStoreConfig::Local {
//!     path: "/tmp/bucket".into(),
//! })
//! .await?;
//!
//! let url = store.upload_file(Path::new("reads.bam.crypt4gh"), "reads.bam.crypt4gh").await?;
//! println!("uploaded to {url}");
//! # Ok(())
//! # }
//! ```

mod error;
mod storage;

pub use error::{BlobStoreError, Result};
pub use storage::{ObjectStore, ObjectStoreConfig, PRESIGNED_URL_EXPIRY};

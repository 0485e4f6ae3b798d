pub mod configure;
pub mod decrypt;
pub mod download;
pub mod encrypt;
pub mod fetch;
pub mod keygen;
pub mod reencrypt;
pub mod upload;
pub mod version;

pub use configure::Configure;
pub use decrypt::Decrypt;
pub use download::Download;
pub use encrypt::Encrypt;
pub use fetch::Fetch;
pub use keygen::Keygen;
pub use reencrypt::Reencrypt;
pub use upload::Upload;
pub use version::Version;

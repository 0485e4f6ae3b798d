pub mod args;
pub mod op;
pub mod ops;

pub use ops::{
    Configure, Decrypt, Download, Encrypt, Fetch, Keygen, Reencrypt, Upload, Version,
};

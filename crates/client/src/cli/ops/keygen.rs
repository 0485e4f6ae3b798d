use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;

use common::crypto::KeyPair;

#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Where to write the secret key
    #[arg(long)]
    pub sk: PathBuf,

    /// Where to write the public key
    #[arg(long)]
    pub pk: PathBuf,

    /// Overwrite existing key files
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("{} already exists, pass --force to overwrite it", .0.display())]
    Exists(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
}

fn write_key(path: &Path, contents: &str, force: bool, private: bool) -> Result<(), KeygenError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => KeygenError::Exists(path.to_path_buf()),
        _ => KeygenError::Io(e),
    })?;
    // mode() only applies to newly created files
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let pair = KeyPair::generate()
            .map_err(|e| anyhow::anyhow!("failed to generate key pair: {}", e))?;

        write_key(&self.sk, &pair.secret.to_key_file(), self.force, true)?;
        write_key(&self.pk, &pair.public.to_key_file(), self.force, false)?;

        tracing::info!(fingerprint = %pair.public.fingerprint(), "generated key pair");
        Ok(format!(
            "Secret key written to {}\nPublic key written to {}",
            self.sk.display(),
            self.pk.display()
        ))
    }
}

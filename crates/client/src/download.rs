//! Download through the external GA4GH `drs` command line client.
//!
//! The server re-encrypts objects for whoever asks, so the recipient public key is
//! handed to the child process as `CRYPT4GH_PUBKEY`. It is set on the child only and
//! never touches this process's environment.

use std::ffi::OsString;
use std::process::ExitStatus;

use common::crypto::PublicKey;
use tokio::process::Command;
use url::Url;

/// Program invoked for downloads unless overridden
pub const DRS_PROGRAM: &str = "drs";
/// Environment variable carrying the recipient key to the child
pub const PUBKEY_ENV: &str = "CRYPT4GH_PUBKEY";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

#[derive(Debug, Clone)]
pub struct Downloader {
    program: OsString,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(DRS_PROGRAM)
    }
}

impl Downloader {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `drs get -d <drs_url> <drs_id>` with the recipient key in the child environment
    pub fn command(&self, drs_url: &Url, drs_id: &str, recipient: &PublicKey) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("get")
            .arg("-d")
            .arg(drs_url.as_str().trim_end_matches('/'))
            .arg(drs_id)
            .env(PUBKEY_ENV, recipient.to_base64())
            .kill_on_drop(true);
        command
    }

    /// Run the download and wait for it. A non-zero exit status is an error.
    pub async fn download(
        &self,
        drs_url: &Url,
        drs_id: &str,
        recipient: &PublicKey,
    ) -> Result<(), DownloadError> {
        let program = self.program.to_string_lossy().into_owned();
        tracing::info!(
            drs_id,
            recipient = %recipient.fingerprint(),
            "downloading through {}",
            program
        );

        let status = self
            .command(drs_url, drs_id, recipient)
            .status()
            .await
            .map_err(|source| DownloadError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(DownloadError::Failed { program, status });
        }
        Ok(())
    }
}

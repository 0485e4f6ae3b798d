// CLI modules
mod cli;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cli::{
    args::Args, op::Op, Configure, Decrypt, Download, Encrypt, Fetch, Keygen, Reencrypt, Upload,
    Version,
};

command_enum! {
    (Configure, Configure),
    (Keygen, Keygen),
    (Upload, Upload),
    (Download, Download),
    (Fetch, Fetch),
    (Encrypt, Encrypt),
    (Decrypt, Decrypt),
    (Reencrypt, Reencrypt),
    (Version, Version),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = drs_client::logging::init_logging(args.log_level());

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

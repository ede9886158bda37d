#![allow(clippy::cargo_common_metadata)]
use anyhow::Context;
use csmin::{
    cli,
    config::{FAILURE_STATUS, RunContext},
    setup_logging,
};
use std::io::{self, BufWriter, Write};

fn main() {
    let context = match setup_logging() {
        Ok(log) => RunContext::with_log_handle(log),
        Err(e) => {
            eprintln!("{:#}", e);
            RunContext::new()
        }
    };

    let mut out = BufWriter::new(io::stdout().lock());

    let result = cli::utf8_args(std::env::args_os().skip(1))
        .map_err(anyhow::Error::from)
        .and_then(|args| cli::run(&context, &args, &mut out))
        .and_then(|status| out.flush().map(|()| status).context("Failed to write output"));

    let status = match result {
        Ok(status) => status,
        Err(e) => {
            // keep whatever was written before the failure
            let _ = out.flush();
            eprintln!("{}", context.describe_failure(&e));
            FAILURE_STATUS
        }
    };

    drop(out);
    std::process::exit(status);
}

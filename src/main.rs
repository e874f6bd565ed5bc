//! Stdio entry point: wires the
//! `Content-Length`-framed stdio transport to a [`Server`] running with
//! no-op collaborators, so the crate ships a runnable (if feature-stubbed)
//! binary. `RUST_LOG` controls verbosity via `env_logger`, matching the
//! ambient logging stack every handler and the dispatcher itself log
//! through.

use std::io::{self, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use lsp_dispatch::collaborators::NullCollaborators;
use lsp_dispatch::server::{Server, ServerOptions};
use lsp_dispatch::transport;
use lsp_dispatch::Status;

fn main() -> ExitCode {
    env_logger::init();

    let options = ServerOptions::default();
    let mut server = Server::with_collaborators(
        options,
        Arc::new(NullCollaborators),
        Arc::new(NullCollaborators),
        Arc::new(NullCollaborators),
    );

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();

    loop {
        let body = match transport::read_message(&mut reader) {
            Ok(Some(body)) => body,
            Ok(None) => {
                log::info!("client closed stdin; exiting");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                log::error!("transport read error: {e}");
                return ExitCode::FAILURE;
            }
        };

        server.handle_message(&body);

        let mut out = stdout.lock();
        while let Some(frame) = server.pop_outbound() {
            if let Err(e) = transport::write_message(&mut out, &frame) {
                log::error!("transport write error: {e}");
                return ExitCode::FAILURE;
            }
        }

        match server.status() {
            Status::ExitingSuccess => return ExitCode::SUCCESS,
            Status::ExitingFailure => return ExitCode::FAILURE,
            _ => {}
        }
    }
}

//! Server integration tests
//!
//! Runs the server against real named pipes in a temporary directory and
//! talks to it the way the client does.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use px_core::config::ChannelConfig;
use px_core::error::TransportError;
use px_core::{
    ChannelReceiver, ChannelSender, CredentialStore, PasswordHasher, PxError, Sha512Crypt,
    TracingLogger,
};
use px_server::{CommandSpawner, Dispatcher, Server};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Server running in the background plus the client ends of its pipes
struct Harness {
    dir: TempDir,
    channels: ChannelConfig,
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), PxError>>,
    requests: ChannelSender,
    responses: ChannelReceiver,
}

impl Harness {
    async fn start() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let channels = ChannelConfig {
            request: dir.path().join("my_c_fifo"),
            response: dir.path().join("my_s_fifo"),
            mode: 0o666,
        };

        let hasher = Sha512Crypt::default();
        let hash = hasher.hash("secret").expect("Failed to hash");
        let store = CredentialStore::parse(&format!("alice {}\n", hash));

        let dispatcher = Dispatcher::new(
            store,
            Box::new(hasher),
            Box::new(CommandSpawner::new().with_working_dir(dir.path())),
            Arc::new(TracingLogger::new("test-server")),
        );
        let server = Server::new(
            channels.clone(),
            dispatcher,
            Arc::new(TracingLogger::new("test-server")),
        );

        // Create the pipes up front so the client ends can open them
        channels.ensure().expect("Failed to create pipes");

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { server.run(token).await });

        let requests = ChannelSender::open(&channels.request).expect("Failed to open request pipe");
        let responses = ChannelReceiver::open(&channels.response, channels.mode)
            .expect("Failed to open response pipe");

        Self {
            dir,
            channels,
            cancel,
            handle,
            requests,
            responses,
        }
    }

    async fn request(&mut self, line: &str) -> String {
        self.requests
            .send_line(line)
            .await
            .expect("Failed to send request");
        timeout(TIMEOUT, self.responses.receive_line())
            .await
            .expect("Timed out waiting for response")
            .expect("Failed to read response")
            .expect("Response pipe reported end of input")
    }

    async fn finish(self) -> (TempDir, ChannelConfig, Result<(), PxError>) {
        let result = timeout(TIMEOUT, self.handle)
            .await
            .expect("Server did not stop")
            .expect("Server task panicked");
        (self.dir, self.channels, result)
    }
}

fn assert_removed(channels: &ChannelConfig) {
    assert!(!channels.request.exists(), "request pipe left behind");
    assert!(!channels.response.exists(), "response pipe left behind");
}

#[tokio::test]
async fn test_authenticated_exec_round_trip() {
    let mut harness = Harness::start().await;

    assert_eq!(harness.request("USER alice secret").await, "+Account valid");

    let response = harness.request("EXEC /bin/true true").await;
    let pid: u32 = response
        .strip_prefix("+EXEC SUCCESSFUL PID ")
        .unwrap_or_else(|| panic!("Unexpected response {:?}", response))
        .parse()
        .expect("PID is not a number");
    assert!(pid > 0);

    assert_eq!(harness.request("GOODBYE").await, "+Goodbye");

    let (_dir, channels, result) = harness.finish().await;
    result.expect("Server failed");
    assert_removed(&channels);
}

#[tokio::test]
async fn test_exec_argv_contract() {
    let mut harness = Harness::start().await;
    assert_eq!(harness.request("USER alice secret").await, "+Account valid");

    let program = env!("CARGO_BIN_EXE_px-argdump");
    let response = harness
        .request(&format!("EXEC {} renamed first second", program))
        .await;
    assert!(response.starts_with("+EXEC SUCCESSFUL PID "), "{}", response);

    let output = std::fs::read_to_string(harness.dir.path().join("process_output.txt"))
        .expect("Child did not write its report");
    assert_eq!(
        output,
        "argc: 3\nargv[0]: renamed\nargv[1]: first\nargv[2]: second\n"
    );

    assert_eq!(harness.request("GOODBYE").await, "+Goodbye");
    let (_dir, _channels, result) = harness.finish().await;
    result.expect("Server failed");
}

#[tokio::test]
async fn test_exec_before_user_ends_session() {
    let mut harness = Harness::start().await;

    assert_eq!(
        harness.request("EXEC /bin/true true").await,
        "-Unauthorized. +Goodbye"
    );

    let (_dir, channels, result) = harness.finish().await;
    result.expect("Server failed");
    assert_removed(&channels);
}

#[tokio::test]
async fn test_rejections_keep_session_open() {
    let mut harness = Harness::start().await;

    assert_eq!(harness.request("USER alice wrong").await, "-Invalid account");
    assert_eq!(harness.request("USER alice").await, "-Invalid command");
    assert_eq!(harness.request("LIST").await, "-Unknown command");
    assert_eq!(harness.request("").await, "-Unknown command");

    // Bypass the sender's length check to put an over-long line on the wire
    {
        use std::io::Write;
        let mut raw = std::fs::OpenOptions::new()
            .write(true)
            .open(&harness.channels.request)
            .expect("Failed to open request pipe");
        let mut line = vec![b'x'; 4000];
        line.push(b'\n');
        raw.write_all(&line).expect("Failed to write");
    }
    let response = timeout(TIMEOUT, harness.responses.receive_line())
        .await
        .expect("Timed out")
        .expect("Failed to read response");
    assert_eq!(response.as_deref(), Some("-Invalid command"));

    assert_eq!(harness.request("USER alice secret").await, "+Account valid");
    assert_eq!(
        harness.request("EXEC /no/such/program prog").await,
        "-EXEC failed. Goodbye"
    );
    // Still open and still authenticated
    assert!(harness
        .request("EXEC /bin/true true")
        .await
        .starts_with("+EXEC SUCCESSFUL PID "));

    assert_eq!(harness.request("goodbye").await, "+Goodbye");
    let (_dir, channels, result) = harness.finish().await;
    result.expect("Server failed");
    assert_removed(&channels);
}

#[tokio::test]
async fn test_cancellation_stops_server_and_cleans_up() {
    let harness = Harness::start().await;
    harness.cancel.cancel();

    let (_dir, channels, result) = harness.finish().await;
    result.expect("Server failed");
    assert_removed(&channels);
}

#[tokio::test]
async fn test_non_fifo_at_pipe_path_is_fatal() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let channels = ChannelConfig {
        request: dir.path().join("my_c_fifo"),
        response: dir.path().join("my_s_fifo"),
        mode: 0o666,
    };
    std::fs::write(&channels.request, "not a pipe").expect("Failed to write");

    let dispatcher = Dispatcher::new(
        CredentialStore::default(),
        Box::new(Sha512Crypt::default()),
        Box::new(CommandSpawner::new()),
        Arc::new(TracingLogger::new("test-server")),
    );
    let server = Server::new(
        channels.clone(),
        dispatcher,
        Arc::new(TracingLogger::new("test-server")),
    );

    let err = server
        .run(CancellationToken::new())
        .await
        .expect_err("Server should refuse a regular file");
    assert!(matches!(
        err,
        PxError::Transport(TransportError::NotAFifo(ref path)) if *path == channels.request
    ));

    // The regular file is left alone
    assert!(channels.request.is_file());
}

#[tokio::test]
async fn test_refused_response_path_leaves_no_request_pipe() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let channels = ChannelConfig {
        request: dir.path().join("my_c_fifo"),
        response: dir.path().join("my_s_fifo"),
        mode: 0o666,
    };
    std::fs::write(&channels.response, "not a pipe").expect("Failed to write");

    let dispatcher = Dispatcher::new(
        CredentialStore::default(),
        Box::new(Sha512Crypt::default()),
        Box::new(CommandSpawner::new()),
        Arc::new(TracingLogger::new("test-server")),
    );
    let server = Server::new(
        channels.clone(),
        dispatcher,
        Arc::new(TracingLogger::new("test-server")),
    );

    let err = server
        .run(CancellationToken::new())
        .await
        .expect_err("Server should refuse a regular file");
    assert!(matches!(
        err,
        PxError::Transport(TransportError::NotAFifo(ref path)) if *path == channels.response
    ));

    assert!(!channels.request.exists());
    assert!(channels.response.is_file());
}

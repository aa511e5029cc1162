//! Shared mock engine for integration tests
//!
//! The engine side of the protocol is scripted: a background task reads
//! one command per round-trip, logs it, and answers with whatever the
//! responder closure returns. The transcript doubles as the call-count
//! spy for skip-tick assertions.

use std::sync::{Arc, Mutex};

use memscan::engine::{EngineConn, EngineTransport};
use memscan::session::{Session, SessionOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub type Transcript = Arc<Mutex<Vec<String>>>;

/// Spawns a scripted engine and returns a connection to it plus the
/// request transcript.
pub fn mock_engine<F>(mut respond: F) -> (EngineConn, Transcript)
where
    F: FnMut(&str) -> String + Send + 'static,
{
    let (client, mut server) = tokio::io::duplex(64 * 1024);
    let transcript: Transcript = Arc::new(Mutex::new(Vec::new()));
    let log = transcript.clone();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = match server.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();
            log.lock().unwrap().push(request.clone());
            let reply = respond(&request);
            if server.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    (EngineConn::new(EngineTransport::new(client)), transcript)
}

/// A session wired to a scripted engine
pub fn mock_session<F>(respond: F) -> (Arc<Session>, Transcript)
where
    F: FnMut(&str) -> String + Send + 'static,
{
    let (conn, transcript) = mock_engine(respond);
    let session = Arc::new(Session::new(conn, SessionOptions::default()));
    (session, transcript)
}

/// Reasonable replies for everything a healthy idle engine would see.
/// Tests override the cases they care about and fall through to this.
pub fn default_respond(request: &str) -> String {
    let verb = request.split_whitespace().next().unwrap_or("");
    match verb {
        "reset" => r#"[{"regions_count":58,"exelink":"/usr/bin/game"}]"#.to_string(),
        "info" => r#"[{"found":0,"scan_progress":1.0,"is_process_dead":0}]"#.to_string(),
        "list" | "next" => "[]".to_string(),
        _ => "[]".to_string(),
    }
}

pub fn requests(transcript: &Transcript) -> Vec<String> {
    transcript.lock().unwrap().clone()
}

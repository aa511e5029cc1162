//! Typed request/reply surface over the transport
//!
//! All engine traffic funnels through [`EngineConn::roundtrip`]; the typed
//! helpers pair each command with its expected reply shape.

use tracing::trace;

use super::command::Command;
use super::response::{AttachInfo, DumpReply, InfoReply, RawMatch, ReplyFrame};
use super::transport::EngineTransport;
use crate::core::types::{Address, ProcessId, ScanResult, TypeTag};

pub struct EngineConn {
    transport: EngineTransport,
}

impl EngineConn {
    pub fn new(transport: EngineTransport) -> Self {
        EngineConn { transport }
    }

    /// Round-trips issued so far; skipped ticks must not advance this
    pub fn round_trips(&self) -> u64 {
        self.transport.round_trips()
    }

    /// Sends one command and parses its reply frame
    pub async fn roundtrip(&mut self, cmd: &Command) -> ScanResult<ReplyFrame> {
        let request = cmd.to_string();
        trace!(request = %request, "engine request");
        let frame = self.transport.round_trip(&request).await?;
        ReplyFrame::parse(&frame)
    }

    /// `reset` / `reset <pid>`: full engine reset, attach when pid given
    pub async fn reset(&mut self, pid: Option<ProcessId>) -> ScanResult<AttachInfo> {
        self.roundtrip(&Command::Reset { pid }).await?.into_attach_info()
    }

    /// `pid <pid>`: re-target without a full reset
    pub async fn set_pid(&mut self, pid: ProcessId) -> ScanResult<()> {
        self.roundtrip(&Command::Pid(pid)).await?.into_ack()
    }

    pub async fn set_option(&mut self, key: &str, value: &str) -> ScanResult<()> {
        self.roundtrip(&Command::option(key, value)).await?.into_ack()
    }

    pub async fn find(&mut self, predicate: &str) -> ScanResult<()> {
        self.roundtrip(&Command::Find(predicate.to_string())).await?.into_ack()
    }

    pub async fn stop(&mut self) -> ScanResult<()> {
        self.roundtrip(&Command::Stop).await?.into_ack()
    }

    pub async fn info(&mut self, pid: ProcessId) -> ScanResult<InfoReply> {
        self.roundtrip(&Command::Info(pid)).await?.into_info()
    }

    pub async fn list(&mut self, page_size: usize) -> ScanResult<Vec<RawMatch>> {
        self.roundtrip(&Command::List(page_size)).await?.into_matches()
    }

    pub async fn next(&mut self, page_size: usize) -> ScanResult<Vec<RawMatch>> {
        self.roundtrip(&Command::Next(page_size)).await?.into_matches()
    }

    pub async fn dump(&mut self, addr: Address, len: usize) -> ScanResult<DumpReply> {
        self.roundtrip(&Command::Dump { addr, len }).await?.into_dump()
    }

    pub async fn write(
        &mut self,
        tag: TypeTag,
        addr: Address,
        value: &str,
    ) -> ScanResult<()> {
        self.roundtrip(&Command::Write {
            tag,
            addr,
            value: value.to_string(),
        })
        .await?
        .into_ack()
    }

    /// `exit` releases all engine resources; the reply is best-effort since
    /// the engine may tear the connection down right after
    pub async fn exit(&mut self) -> ScanResult<()> {
        match self.roundtrip(&Command::Exit).await {
            Ok(frame) => frame.into_ack(),
            Err(err) if err.is_fatal() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

//! The simple (version 3, non-digest) RTMP handshake from the client's side.
//!
//! The client sends C0 and C1, waits for S0 and S1, echoes S1 back as C2 and finally reads and
//! discards S2.  Nothing in S1 or S2 is validated beyond the version byte.

mod errors;

pub use self::errors::HandshakeError;

use crate::transport::{self, IoPolicy, Transport};
use byteorder::{BigEndian, ByteOrder};
use std::time::{SystemTime, UNIX_EPOCH};

pub const RTMP_VERSION: u8 = 3;
pub const HANDSHAKE_PACKET_SIZE: usize = 1536;

/// How far a handshake has progressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeStage {
    Idle,
    C0C1Sent,
    S0S1Received,
    C2Sent,
    Established,
    Failed,
}

pub struct Handshake {
    stage: HandshakeStage,
}

impl Handshake {
    pub fn new() -> Handshake {
        Handshake {
            stage: HandshakeStage::Idle,
        }
    }

    pub fn stage(&self) -> HandshakeStage {
        self.stage
    }

    /// Runs the whole exchange over the transport, blocking until it is established or failed.
    ///
    /// A failed handshake leaves the transport in an unknown state, so it must not be reused.
    pub fn perform<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        policy: &IoPolicy,
    ) -> Result<(), HandshakeError> {
        let result = self.exchange(transport, policy);
        if result.is_err() {
            self.stage = HandshakeStage::Failed;
        }

        result
    }

    fn exchange<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        policy: &IoPolicy,
    ) -> Result<(), HandshakeError> {
        let c0_c1 = create_c0_c1(current_epoch());
        transport::write_all(transport, &c0_c1, policy).map_err(|source| self.incomplete(source))?;
        self.stage = HandshakeStage::C0C1Sent;

        let mut s0_s1 = vec![0_u8; HANDSHAKE_PACKET_SIZE + 1];
        transport::read_exact(transport, &mut s0_s1, policy).map_err(|source| self.incomplete(source))?;
        if s0_s1[0] != RTMP_VERSION {
            return Err(HandshakeError::VersionMismatch { received: s0_s1[0] });
        }

        self.stage = HandshakeStage::S0S1Received;

        transport::write_all(transport, &s0_s1[1..], policy).map_err(|source| self.incomplete(source))?;
        self.stage = HandshakeStage::C2Sent;

        let mut s2 = vec![0_u8; HANDSHAKE_PACKET_SIZE];
        transport::read_exact(transport, &mut s2, policy).map_err(|source| self.incomplete(source))?;
        self.stage = HandshakeStage::Established;

        Ok(())
    }

    fn incomplete(&self, source: std::io::Error) -> HandshakeError {
        HandshakeError::HandshakeIncomplete {
            stage: self.stage,
            source,
        }
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Handshake::new()
    }
}

/// C0 (the version byte) followed by C1: our epoch, four zero bytes and zeroed filler
fn create_c0_c1(epoch: u32) -> Vec<u8> {
    let mut bytes = vec![0_u8; HANDSHAKE_PACKET_SIZE + 1];
    bytes[0] = RTMP_VERSION;
    BigEndian::write_u32(&mut bytes[1..5], epoch);
    bytes
}

/// Low 32 bits of the wall clock in milliseconds
fn current_epoch() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u32)
        .unwrap_or(0)
}

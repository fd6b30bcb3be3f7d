// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::StageId;
use crate::store::TxnHandle;

/// Wire size of one envelope: a u32 destination followed by a u64 handle,
/// both little-endian. Sent and received as one atomic record with no
/// length prefix and no checksum; TCP's own reliability is trusted.
pub const ENVELOPE_LEN: usize = 12;

/// The only datum that crosses a transport connection.
///
/// Carries a destination stage id and a transaction handle. The handle is
/// opaque and must arrive bit-for-bit identical; the transaction itself
/// never moves, only this reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub destination: StageId,
    pub handle: TxnHandle,
}

impl Envelope {
    pub fn new(destination: StageId, handle: TxnHandle) -> Self {
        Self {
            destination,
            handle,
        }
    }

    /// Pack into the fixed wire record.
    pub fn encode(&self) -> [u8; ENVELOPE_LEN] {
        let mut buf = [0u8; ENVELOPE_LEN];
        buf[..4].copy_from_slice(&self.destination.to_le_bytes());
        buf[4..].copy_from_slice(&self.handle.into_raw().to_le_bytes());
        buf
    }

    /// Unpack from the fixed wire record. Every bit pattern is a valid
    /// envelope; handle validity is the store's concern, not the wire's.
    pub fn decode(buf: &[u8; ENVELOPE_LEN]) -> Self {
        let mut destination = [0u8; 4];
        destination.copy_from_slice(&buf[..4]);
        let mut handle = [0u8; 8];
        handle.copy_from_slice(&buf[4..]);
        Self {
            destination: StageId::from_le_bytes(destination),
            handle: TxnHandle::from_raw(u64::from_le_bytes(handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let envelope = Envelope::new(3, TxnHandle::from_raw(0x0123_4567_89ab_cdef));
        let decoded = Envelope::decode(&envelope.encode());
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn wire_layout_is_stable() {
        let envelope = Envelope::new(0x0102_0304, TxnHandle::from_raw(0x1122_3344_5566_7788));
        let buf = envelope.encode();
        assert_eq!(buf.len(), ENVELOPE_LEN);
        assert_eq!(&buf[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[4..], &[0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn extreme_handle_values_survive() {
        for raw in [0u64, 1, u64::MAX, u64::MAX - 1] {
            let envelope = Envelope::new(0, TxnHandle::from_raw(raw));
            assert_eq!(Envelope::decode(&envelope.encode()).handle.into_raw(), raw);
        }
    }
}

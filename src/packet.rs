//! Application packet format
//!
//! Every packet sent over the link starts with a four byte header:
//!
//! | Offset | Field                              |
//! |--------|------------------------------------|
//! | 0      | Destination address                |
//! | 1      | Source address                     |
//! | 2      | Sender's line counter (wraps)      |
//! | 3      | Payload length                     |
//! | 4..    | Payload, at most 251 bytes         |
//!
//! On receive the two address bytes are read the other way round: offset 0 is taken as
//! the source and offset 1 as the destination. Peers running this driver therefore see
//! the sender's destination in [`LoraPacket::src`].
//!
//! Address 0xFF is the broadcast address. Nothing filters on the addresses; that is
//! left to the application.

use heapless::Vec;

use crate::radio::SignalQuality;
use crate::registers::MAX_PACKET_LENGTH;

/// Size of the packet header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload that fits behind the header in one LoRa packet.
pub const MAX_PAYLOAD: usize = MAX_PACKET_LENGTH - HEADER_LEN;

/// Broadcast destination address, the default for [`LoraLink::send_string`](crate::LoraLink::send_string).
pub const BROADCAST_ADDRESS: u8 = 0xFF;

/// The four header bytes at the start of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketHeader {
    /// Destination address
    pub dst: u8,
    /// Source address
    pub src: u8,
    /// Sender's line counter
    pub line: u8,
    /// Payload length announced by the sender
    pub len: u8,
}

impl PacketHeader {
    /// Header bytes in wire order.
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        [self.dst, self.src, self.line, self.len]
    }
}

/// A received packet, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoraPacket {
    /// Destination address
    pub dst: u8,
    /// Source address
    pub src: u8,
    /// Sender's line counter
    pub line_count: u8,
    /// Payload length announced in the header
    pub payload_length: u8,
    /// Payload bytes actually received, at most `payload_length`
    pub payload: Vec<u8, MAX_PAYLOAD>,
    /// Corrected packet RSSI in dBm
    pub rssi: i16,
    /// Packet SNR in dB
    pub snr: f32,
}

impl LoraPacket {
    /// Decodes a received packet.
    ///
    /// Returns `None` for packets shorter than the header. A header announcing more
    /// payload than arrived keeps what arrived.
    pub fn decode(bytes: &[u8], quality: SignalQuality) -> Option<Self> {
        let [src, dst, line_count, payload_length, ref body @ ..] = *bytes else {
            return None;
        };
        let length = body.len().min(usize::from(payload_length)).min(MAX_PAYLOAD);

        let mut payload = Vec::new();
        // Cannot fail, length is bounded by the capacity.
        let _ = payload.extend_from_slice(&body[..length]);

        Some(Self {
            dst,
            src,
            line_count,
            payload_length,
            payload,
            rssi: quality.rssi,
            snr: quality.snr,
        })
    }

    /// The payload as text, up to the first NUL.
    ///
    /// Returns `None` if that part is not valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        let end = self
            .payload
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(self.payload.len());
        core::str::from_utf8(&self.payload[..end]).ok()
    }
}

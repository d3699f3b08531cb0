//! "UBD3" memory streamer: sends a memory region as a train of UDP
//! datagrams, each a 16-byte header followed by raw bytes.
//!
//! Fire and forget: nothing is acknowledged and nothing is retransmitted.

use core::fmt::Write;

use smoltcp::wire::Ipv4Address;

use crate::bus::Bus;
use crate::error::{Error, Result};

pub const UBD3_MAGIC: u32 = 0x5542_4433;
pub const HEADER_SIZE: usize = 16;
/// Packets whose data part would be smaller than this are refused.
pub const MIN_DATA: usize = 64;
/// A progress line is printed each time this many packets have gone out.
const PROGRESS_PACKETS: u32 = 1024;

/// The seam to whatever network stack carries the datagrams.
pub trait UdpLink {
    /// Lets the stack process traffic and flush queued packets.
    fn service(&mut self);

    /// `true` once the hardware address of `dst` is known.
    fn arp_resolve(&mut self, dst: Ipv4Address) -> bool;

    /// Queues one datagram of `len` bytes, filled in place by `fill`.
    fn send(
        &mut self,
        src_port: u16,
        dst: Ipv4Address,
        dst_port: u16,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]),
    ) -> Result<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Header {
    pub seq: u32,
    pub offset: u32,
    pub total: u32,
}

impl Header {
    /// Little-endian `{magic, seq, offset, total}`.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&UBD3_MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&self.seq.to_le_bytes());
        buf[8..12].copy_from_slice(&self.offset.to_le_bytes());
        buf[12..16].copy_from_slice(&self.total.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        let word = |i: usize| -> Option<u32> {
            let bytes = buf.get(i..i + 4)?;
            Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        };
        if word(0)? != UBD3_MAGIC {
            return None;
        }
        Some(Self {
            seq: word(4)?,
            offset: word(8)?,
            total: word(12)?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StreamRequest {
    pub addr: usize,
    pub total: u32,
    pub dst: Ipv4Address,
    pub dst_port: u16,
    pub src_port: u16,
    /// Largest datagram payload, header included
    pub payload_max: usize,
    pub arp_retries: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StreamReport {
    pub bytes: u32,
    pub packets: u32,
}

/// Resolves the destination, then streams `req.total` bytes from
/// `req.addr` in chunks of at most `payload_max - 16` bytes.
pub fn stream_region<W: Write>(
    link: &mut dyn UdpLink,
    bus: &dyn Bus,
    req: &StreamRequest,
    out: &mut W,
) -> Result<StreamReport> {
    if req.total == 0 {
        return Err(Error::Zero("bytes"));
    }
    let max_data = req.payload_max.saturating_sub(HEADER_SIZE);
    if max_data < MIN_DATA {
        return Err(Error::PayloadTooSmall);
    }

    write!(out, "ARP resolve {} ... ", req.dst).ok();
    let mut resolved = false;
    for _ in 0..req.arp_retries {
        link.service();
        if link.arp_resolve(req.dst) {
            resolved = true;
            break;
        }
    }
    if !resolved {
        writeln!(out, "FAILED").ok();
        writeln!(out, "No ARP reply. Check link, IPs, subnet, and PC firewall.").ok();
        log::warn!("arp for {} gave up after {} tries", req.dst, req.arp_retries);
        return Err(Error::ArpTimeout);
    }
    writeln!(out, "ok").ok();

    log::info!(
        "streaming {} bytes from {:#010x} to {}:{}",
        req.total,
        req.addr,
        req.dst,
        req.dst_port
    );

    let total = req.total as usize;
    let mut sent = 0usize;
    let mut seq = 0u32;
    while sent < total {
        link.service();

        let chunk = (total - sent).min(max_data);
        let header = Header {
            seq,
            offset: sent as u32,
            total: req.total,
        };
        let src = req.addr + sent;
        link.send(
            req.src_port,
            req.dst,
            req.dst_port,
            HEADER_SIZE + chunk,
            &mut |buf: &mut [u8]| {
                buf[..HEADER_SIZE].copy_from_slice(&header.encode());
                for (i, b) in buf[HEADER_SIZE..HEADER_SIZE + chunk].iter_mut().enumerate() {
                    *b = bus.read8(src + i);
                }
            },
        )?;

        sent += chunk;
        seq += 1;
        if seq % PROGRESS_PACKETS == 0 {
            writeln!(out, "  sent {} / {} bytes", sent, total).ok();
        }
    }

    writeln!(out, "ub_send done: {} bytes in {} packets", req.total, seq).ok();
    log::info!("stream done, {} packets", seq);
    Ok(StreamReport {
        bytes: req.total,
        packets: seq,
    })
}

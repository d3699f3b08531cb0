// From  https://github.com/DerFetzer/colorlight-litex/blob/48f1d38a3fcdf51d0bced21897e245570c38a175/rust/eth_demo/src/ethernet.rs,
// Apache 2.0/MIT by DerFetzer

//! LiteEth MAC as a smoltcp device.
//!
//! The MAC exposes its packet buffers as SRAM slots on the bus: received
//! frames are copied out of the slot the writer reports, outgoing frames are
//! copied into alternating TX slots before the reader is started.

use smoltcp::phy::{self, DeviceCapabilities};
use smoltcp::time::Instant;
use smoltcp::wire::{ArpOperation, ArpPacket, ArpRepr, EthernetFrame, EthernetProtocol, Ipv4Address};
use smoltcp::{Error as NetError, Result as NetResult};

use crate::bus::Bus;
use crate::soc::ethmac;

type Frame = [u8; ethmac::SLOT_SIZE];

pub struct Eth {
    bus: &'static dyn Bus,
    rx: Frame,
    tx: Frame,
    tx_slot: usize,
    arp: ArpWatch,
}

/// ARP replies from one address, noted as frames pass to the stack.
#[derive(Default, Clone, Copy)]
struct ArpWatch {
    target: Option<Ipv4Address>,
    seen: bool,
}

impl ArpWatch {
    fn note(&mut self, frame: &[u8]) {
        let target = match self.target {
            Some(t) => t,
            None => return,
        };
        let frame = match EthernetFrame::new_checked(frame) {
            Ok(f) if f.ethertype() == EthernetProtocol::Arp => f,
            _ => return,
        };
        let repr = ArpPacket::new_checked(frame.payload()).and_then(|p| ArpRepr::parse(&p));
        if let Ok(ArpRepr::EthernetIpv4 {
            operation: ArpOperation::Reply,
            source_protocol_addr,
            ..
        }) = repr
        {
            if source_protocol_addr == target {
                self.seen = true;
            }
        }
    }
}

impl Eth {
    pub fn new(bus: &'static dyn Bus) -> Self {
        bus.write32(ethmac::SRAM_WRITER_EV_PENDING, 1);
        bus.write32(ethmac::SRAM_READER_EV_PENDING, 1);
        bus.write32(ethmac::SRAM_READER_SLOT, 0);
        Eth {
            bus,
            rx: [0; ethmac::SLOT_SIZE],
            tx: [0; ethmac::SLOT_SIZE],
            tx_slot: 0,
            arp: ArpWatch::default(),
        }
    }

    /// Starts watching for ARP replies from `ip`, forgetting earlier ones.
    pub fn watch_arp(&mut self, ip: Ipv4Address) {
        self.arp = ArpWatch { target: Some(ip), seen: false };
    }

    pub fn arp_target(&self) -> Option<Ipv4Address> {
        self.arp.target
    }

    /// Whether the watched address has answered since `watch_arp`.
    pub fn arp_seen(&self) -> bool {
        self.arp.seen
    }

    fn rx_pending(&self) -> bool {
        self.bus.read32(ethmac::SRAM_WRITER_EV_PENDING) != 0
    }
}

impl<'a> phy::Device<'a> for Eth {
    type RxToken = EthRxToken<'a>;
    type TxToken = EthTxToken<'a>;

    fn receive(&'a mut self) -> Option<(Self::RxToken, Self::TxToken)> {
        if !self.rx_pending() {
            return None;
        }
        let Eth { bus, rx, tx, tx_slot, arp } = self;
        Some((
            EthRxToken { bus: *bus, buf: rx, arp },
            EthTxToken { bus: *bus, buf: tx, slot: tx_slot },
        ))
    }

    fn transmit(&'a mut self) -> Option<Self::TxToken> {
        Some(EthTxToken {
            bus: self.bus,
            buf: &mut self.tx,
            slot: &mut self.tx_slot,
        })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = ethmac::SLOT_SIZE;
        caps.max_burst_size = Some(1);
        caps
    }
}

pub struct EthRxToken<'a> {
    bus: &'static dyn Bus,
    buf: &'a mut Frame,
    arp: &'a mut ArpWatch,
}

impl<'a> phy::RxToken for EthRxToken<'a> {
    fn consume<R, F>(self, _timestamp: Instant, f: F) -> NetResult<R>
    where
        F: FnOnce(&mut [u8]) -> NetResult<R>,
    {
        if self.bus.read32(ethmac::SRAM_WRITER_EV_PENDING) == 0 {
            return Err(NetError::Exhausted);
        }
        let slot = self.bus.read32(ethmac::SRAM_WRITER_SLOT) as usize;
        let length = self.bus.read32(ethmac::SRAM_WRITER_LENGTH) as usize;
        if slot >= ethmac::RX_SLOTS || length > ethmac::SLOT_SIZE {
            self.bus.write32(ethmac::SRAM_WRITER_EV_PENDING, 1);
            return Err(NetError::Exhausted);
        }
        let base = ethmac::rx_slot(slot);
        for (i, b) in self.buf[..length].iter_mut().enumerate() {
            *b = self.bus.read8(base + i);
        }
        // Slot is free again once it has been copied out
        self.bus.write32(ethmac::SRAM_WRITER_EV_PENDING, 1);
        self.arp.note(&self.buf[..length]);
        f(&mut self.buf[..length])
    }
}

pub struct EthTxToken<'a> {
    bus: &'static dyn Bus,
    buf: &'a mut Frame,
    slot: &'a mut usize,
}

impl<'a> phy::TxToken for EthTxToken<'a> {
    fn consume<R, F>(self, _timestamp: Instant, len: usize, f: F) -> NetResult<R>
    where
        F: FnOnce(&mut [u8]) -> NetResult<R>,
    {
        if len > ethmac::SLOT_SIZE {
            return Err(NetError::Truncated);
        }
        while self.bus.read32(ethmac::SRAM_READER_READY) == 0 {}

        let result = f(&mut self.buf[..len])?;

        let current = *self.slot;
        let base = ethmac::tx_slot(current);
        for (i, b) in self.buf[..len].iter().enumerate() {
            self.bus.write8(base + i, *b);
        }
        self.bus.write32(ethmac::SRAM_READER_SLOT, current as u32);
        self.bus.write32(ethmac::SRAM_READER_LENGTH, len as u32);
        self.bus.write32(ethmac::SRAM_READER_START, 1);
        *self.slot = (current + 1) % ethmac::TX_SLOTS;
        Ok(result)
    }
}

//! [`UdpLink`] on top of smoltcp and the LiteEth MAC.

use smoltcp::iface::{
    Interface, InterfaceBuilder, Neighbor, NeighborCache, Route, Routes, SocketHandle,
    SocketStorage,
};
use smoltcp::phy::{Device, TxToken};
use smoltcp::socket::{UdpPacketMetadata, UdpSocket, UdpSocketBuffer};
use smoltcp::time::Instant;
use smoltcp::wire::{
    ArpOperation, ArpPacket, ArpRepr, EthernetAddress, EthernetFrame, EthernetProtocol,
    EthernetRepr, IpAddress, IpCidr, IpEndpoint, Ipv4Address,
};

use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::ethernet::Eth;
use crate::stream::UdpLink;

/// `arp_resolve` calls between two ARP requests for the same address.
const ARP_RESEND: u32 = 1000;
/// Polls spent waiting for room in the UDP transmit buffer.
const TX_RETRIES: u32 = 10_000;

/// Backing memory of the interface. Lives in a `StaticCell` for the whole
/// run of the firmware.
pub struct NetStorage {
    neighbors: [Option<(IpAddress, Neighbor)>; 8],
    routes: [Option<(IpCidr, Route)>; 1],
    ip_addrs: [IpCidr; 1],
    sockets: [SocketStorage<'static>; 1],
    udp_rx_meta: [UdpPacketMetadata; 4],
    udp_rx_data: [u8; 2048],
    udp_tx_meta: [UdpPacketMetadata; 8],
    udp_tx_data: [u8; 8192],
}

impl NetStorage {
    pub fn new() -> Self {
        Self {
            neighbors: [None; 8],
            routes: [None; 1],
            ip_addrs: [IpCidr::new(IpAddress::Ipv4(Ipv4Address::UNSPECIFIED), 0)],
            sockets: [SocketStorage::EMPTY; 1],
            udp_rx_meta: [UdpPacketMetadata::EMPTY; 4],
            udp_rx_data: [0; 2048],
            udp_tx_meta: [UdpPacketMetadata::EMPTY; 8],
            udp_tx_data: [0; 8192],
        }
    }
}

impl Default for NetStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Static-IP interface with one UDP socket for streaming.
///
/// smoltcp keeps its ARP cache private, so resolution is done next to it:
/// requests go straight to the device and the device notes the matching
/// reply, which the stack also uses to fill its own cache. Nothing is left
/// queued for an address that never answers.
pub struct SmolLink {
    iface: Interface<'static, Eth>,
    udp: SocketHandle,
    mac: EthernetAddress,
    ip: Ipv4Address,
    now_ms: i64,
    arp_calls: u32,
    resolved: Option<Ipv4Address>,
}

impl SmolLink {
    pub fn new(device: Eth, config: &BoardConfig, storage: &'static mut NetStorage) -> Self {
        let NetStorage {
            neighbors,
            routes,
            ip_addrs,
            sockets,
            udp_rx_meta,
            udp_rx_data,
            udp_tx_meta,
            udp_tx_data,
        } = storage;

        ip_addrs[0] = IpCidr::new(IpAddress::Ipv4(config.ip), config.prefix_len);

        let mac = EthernetAddress::from_bytes(&config.mac);
        let mut iface = InterfaceBuilder::new(device, &mut sockets[..])
            .hardware_addr(mac.into())
            .neighbor_cache(NeighborCache::new(&mut neighbors[..]))
            .ip_addrs(&mut ip_addrs[..])
            .routes(Routes::new(&mut routes[..]))
            .finalize();

        let udp = UdpSocket::new(
            UdpSocketBuffer::new(&mut udp_rx_meta[..], &mut udp_rx_data[..]),
            UdpSocketBuffer::new(&mut udp_tx_meta[..], &mut udp_tx_data[..]),
        );
        let udp = iface.add_socket(udp);

        log::info!("net up: {}/{} mac {}", config.ip, config.prefix_len, mac);

        Self {
            iface,
            udp,
            mac,
            ip: config.ip,
            now_ms: 0,
            arp_calls: 0,
            resolved: None,
        }
    }

    fn bind_udp(&mut self, port: u16) -> Result<()> {
        let socket = self.iface.get_socket::<UdpSocket>(self.udp);
        if socket.is_open() && socket.endpoint().port == port {
            return Ok(());
        }
        socket.close();
        socket.bind(port).map_err(|e| {
            log::warn!("udp bind {} failed: {}", port, e);
            Error::Bind(port)
        })
    }

    /// Broadcasts one ARP request for `dst`.
    fn send_arp_request(&mut self, dst: Ipv4Address) {
        let arp = ArpRepr::EthernetIpv4 {
            operation: ArpOperation::Request,
            source_hardware_addr: self.mac,
            source_protocol_addr: self.ip,
            target_hardware_addr: EthernetAddress([0; 6]),
            target_protocol_addr: dst,
        };
        let eth = EthernetRepr {
            src_addr: self.mac,
            dst_addr: EthernetAddress::BROADCAST,
            ethertype: EthernetProtocol::Arp,
        };
        let now = Instant::from_millis(self.now_ms);
        let sent = match self.iface.device_mut().transmit() {
            Some(token) => token.consume(now, eth.buffer_len() + arp.buffer_len(), |buf| {
                let mut frame = EthernetFrame::new_unchecked(buf);
                eth.emit(&mut frame);
                arp.emit(&mut ArpPacket::new_unchecked(frame.payload_mut()));
                Ok(())
            }),
            None => Err(smoltcp::Error::Exhausted),
        };
        if let Err(e) = sent {
            log::debug!("arp request for {} not sent: {}", dst, e);
        }
    }
}

impl UdpLink for SmolLink {
    fn service(&mut self) {
        self.now_ms += 1;
        if let Err(e) = self.iface.poll(Instant::from_millis(self.now_ms)) {
            log::trace!("poll: {}", e);
        }
    }

    fn arp_resolve(&mut self, dst: Ipv4Address) -> bool {
        if self.resolved == Some(dst) {
            return true;
        }
        if self.iface.device().arp_target() != Some(dst) {
            self.iface.device_mut().watch_arp(dst);
            self.arp_calls = 0;
        }
        if self.iface.device().arp_seen() {
            log::debug!("{} resolved", dst);
            self.resolved = Some(dst);
            return true;
        }
        if self.arp_calls % ARP_RESEND == 0 {
            self.send_arp_request(dst);
        }
        self.arp_calls = self.arp_calls.wrapping_add(1);
        false
    }

    fn send(
        &mut self,
        src_port: u16,
        dst: Ipv4Address,
        dst_port: u16,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]),
    ) -> Result<()> {
        self.bind_udp(src_port)?;
        let endpoint = IpEndpoint::new(IpAddress::Ipv4(dst), dst_port);
        for _ in 0..TX_RETRIES {
            let socket = self.iface.get_socket::<UdpSocket>(self.udp);
            let queued = match socket.send(len, endpoint) {
                Ok(buf) => {
                    fill(buf);
                    true
                }
                Err(smoltcp::Error::Exhausted) => false,
                Err(e) => {
                    log::warn!("udp send of {} bytes failed: {}", len, e);
                    return Err(Error::NoTxBuffer);
                }
            };
            if queued {
                return Ok(());
            }
            // Let the stack drain the queue
            self.service();
        }
        Err(Error::NoTxBuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::fake::FakeBus;
    use crate::bus::Bus;
    use crate::soc::ethmac;
    use smoltcp::wire::{
        ArpOperation, ArpPacket, ArpRepr, EthernetFrame, EthernetProtocol, UdpPacket,
        Ipv4Packet,
    };

    const PEER_IP: Ipv4Address = Ipv4Address([192, 168, 0, 2]);
    const PEER_MAC: EthernetAddress = EthernetAddress([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);

    fn link(bus: &'static FakeBus) -> SmolLink {
        bus.write_one_to_clear(ethmac::SRAM_WRITER_EV_PENDING);
        bus.preset32(ethmac::SRAM_READER_READY, 1);
        let storage = std::boxed::Box::leak(std::boxed::Box::new(NetStorage::new()));
        SmolLink::new(Eth::new(bus), &BoardConfig::uberclock(), storage)
    }

    /// Last frame handed to the MAC.
    fn last_tx(bus: &FakeBus) -> Vec<u8> {
        let slot = *bus.writes_to(ethmac::SRAM_READER_SLOT).last().unwrap() as usize;
        let len = *bus.writes_to(ethmac::SRAM_READER_LENGTH).last().unwrap() as usize;
        (0..len).map(|i| bus.read8(ethmac::tx_slot(slot) + i)).collect()
    }

    fn inject_arp_reply(bus: &FakeBus) {
        let config = BoardConfig::uberclock();
        let repr = ArpRepr::EthernetIpv4 {
            operation: ArpOperation::Reply,
            source_hardware_addr: PEER_MAC,
            source_protocol_addr: PEER_IP,
            target_hardware_addr: EthernetAddress(config.mac),
            target_protocol_addr: config.ip,
        };
        let mut buf = vec![0u8; 14 + repr.buffer_len()];
        let mut frame = EthernetFrame::new_unchecked(&mut buf[..]);
        frame.set_dst_addr(EthernetAddress(config.mac));
        frame.set_src_addr(PEER_MAC);
        frame.set_ethertype(EthernetProtocol::Arp);
        repr.emit(&mut ArpPacket::new_unchecked(frame.payload_mut()));

        for (i, b) in buf.iter().enumerate() {
            bus.write8(ethmac::rx_slot(0) + i, *b);
        }
        bus.preset32(ethmac::SRAM_WRITER_SLOT, 0);
        bus.preset32(ethmac::SRAM_WRITER_LENGTH, buf.len() as u32);
        bus.preset32(ethmac::SRAM_WRITER_EV_PENDING, 1);
    }

    /// Target protocol address of an ARP request frame.
    fn arp_target(frame: &[u8]) -> Ipv4Address {
        assert_eq!(&frame[12..14], &[0x08, 0x06]);
        assert_eq!(&frame[20..22], &[0x00, 0x01]);
        Ipv4Address::from_bytes(&frame[38..42])
    }

    #[test]
    fn resolves_after_arp_reply() {
        let bus = FakeBus::leak();
        let mut link = link(bus);

        link.service();
        assert!(!link.arp_resolve(PEER_IP));
        let request = last_tx(bus);
        assert_eq!(&request[0..6], EthernetAddress::BROADCAST.as_bytes());
        assert_eq!(arp_target(&request), PEER_IP);
        link.service();
        assert!(!link.arp_resolve(PEER_IP));

        inject_arp_reply(bus);
        link.service();
        assert!(link.arp_resolve(PEER_IP));
        assert!(link.arp_resolve(PEER_IP));
    }

    #[test]
    fn unresolved_neighbour_stays_unresolved() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        for _ in 0..50 {
            link.service();
            assert!(!link.arp_resolve(PEER_IP));
        }
    }

    #[test]
    fn requests_repeat_while_unanswered() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        bus.clear_writes();
        for _ in 0..2 * ARP_RESEND + 1 {
            assert!(!link.arp_resolve(PEER_IP));
        }
        assert_eq!(bus.writes_to(ethmac::SRAM_READER_START).len(), 3);
    }

    #[test]
    fn silent_destination_does_not_block_the_next_one() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        let absent = Ipv4Address([192, 168, 0, 99]);
        for _ in 0..200 {
            link.service();
            assert!(!link.arp_resolve(absent));
        }

        assert!(!link.arp_resolve(PEER_IP));
        assert_eq!(arp_target(&last_tx(bus)), PEER_IP);
        inject_arp_reply(bus);
        link.service();
        assert!(link.arp_resolve(PEER_IP));

        // The stack learnt the peer from the same reply
        link.send(5000, PEER_IP, 5000, 2, &mut |buf| buf.copy_from_slice(b"ok"))
            .unwrap();
        link.service();
        let frame = last_tx(bus);
        assert_eq!(&frame[0..6], PEER_MAC.as_bytes());
        assert_eq!(&frame[12..14], &[0x08, 0x00]);
    }

    #[test]
    fn reply_for_an_earlier_destination_is_ignored() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        assert!(!link.arp_resolve(Ipv4Address([192, 168, 0, 99])));
        inject_arp_reply(bus);
        link.service();
        assert!(!link.arp_resolve(Ipv4Address([192, 168, 0, 99])));
        assert!(!link.arp_resolve(PEER_IP));
    }

    #[test]
    fn port_zero_cannot_be_bound() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        assert_eq!(
            link.send(0, PEER_IP, 5000, 4, &mut |_: &mut [u8]| {}),
            Err(Error::Bind(0))
        );
    }

    #[test]
    fn udp_datagrams_reach_the_mac() {
        let bus = FakeBus::leak();
        let mut link = link(bus);
        link.service();
        link.arp_resolve(PEER_IP);
        inject_arp_reply(bus);
        link.service();
        assert!(link.arp_resolve(PEER_IP));

        link.send(5000, PEER_IP, 5001, 4, &mut |buf| buf.copy_from_slice(b"ping"))
            .unwrap();
        link.service();

        let frame = last_tx(bus);
        let ip = Ipv4Packet::new_checked(&frame[14..]).unwrap();
        assert_eq!(ip.dst_addr(), PEER_IP);
        let udp = UdpPacket::new_checked(ip.payload()).unwrap();
        assert_eq!(udp.src_port(), 5000);
        assert_eq!(udp.dst_port(), 5001);
        assert_eq!(udp.payload(), b"ping");
    }
}

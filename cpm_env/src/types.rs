//! Common types for the V2X transport boundary.
//!
//! These mirror the facilities-layer vocabulary of an ETSI ITS-G5 stack:
//! an application identifier (AID) selects the service, a BTP port selects
//! the facilities message, and the GeoNetworking transport type selects the
//! dissemination pattern.

use serde::{Deserialize, Serialize};

/// ITS station identifier carried in every PDU header.
///
/// A plain 32-bit integer on the wire, constant for the vehicle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(pub u32);

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "station-{}", self.0)
    }
}

/// ITS application identifier (ITS-AID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItsAid(pub u32);

impl ItsAid {
    /// Collective Perception service.
    pub const CP: ItsAid = ItsAid(639);
}

/// BTP destination port selecting the facilities-layer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BtpPort(pub u16);

impl BtpPort {
    /// Well-known port for Collective Perception Messages.
    pub const CPM: BtpPort = BtpPort(2009);
}

/// GeoNetworking dissemination pattern for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    /// Single-hop broadcast: delivered to every station in direct radio
    /// range, never relayed.
    SingleHopBroadcast,
}

/// Access-layer profile the message is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationProfile {
    /// ITS-G5 (802.11p) radio.
    ItsG5,
}

/// Parameters accompanying an outbound payload into the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub its_aid: ItsAid,
    pub transport_type: TransportType,
    pub communication_profile: CommunicationProfile,
    pub destination_port: BtpPort,
}

impl DataRequest {
    /// Request profile for a broadcast Collective Perception Message.
    pub fn cpm_broadcast() -> Self {
        Self {
            its_aid: ItsAid::CP,
            transport_type: TransportType::SingleHopBroadcast,
            communication_profile: CommunicationProfile::ItsG5,
            destination_port: BtpPort::CPM,
        }
    }
}

/// Transport verdict for an outbound request.
///
/// A rejection is final for that message; there is no retry at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfirm {
    pub accepted: bool,
}

impl DataConfirm {
    pub fn accepted() -> Self {
        Self { accepted: true }
    }

    pub fn rejected() -> Self {
        Self { accepted: false }
    }
}

/// Link metadata delivered alongside an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxMetadata {
    /// Sending station, as reported by the lower layer (unauthenticated).
    pub source: StationId,

    /// BTP port the packet arrived on.
    pub destination_port: BtpPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpm_broadcast_request() {
        let req = DataRequest::cpm_broadcast();
        assert_eq!(req.its_aid, ItsAid::CP);
        assert_eq!(req.destination_port, BtpPort::CPM);
        assert_eq!(req.transport_type, TransportType::SingleHopBroadcast);
    }

    #[test]
    fn test_station_id_display() {
        assert_eq!(StationId(7).to_string(), "station-7");
    }
}

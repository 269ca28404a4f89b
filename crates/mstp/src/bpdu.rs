//! BPDU wire format: Configuration, TCN, RST and MST BPDUs.
//!
//! The decoded [`Bpdu`] keeps timer fields in their raw 1/256 second units
//! and flags as received, so decoding then encoding reproduces the octets.

use byteorder::{BigEndian, ByteOrder};
use mstp_types::{BridgeId, MacAddress, PortId};

use crate::digest::{MstConfigId, MST_CONFIG_ID_LEN};
use crate::error::{MstpError, MstpResult};
use crate::priority_vector::Times;

pub const TCN_BPDU_LEN: usize = 4;
pub const CONFIG_BPDU_LEN: usize = 35;
pub const RST_BPDU_LEN: usize = 36;
pub const MST_BPDU_BASE_LEN: usize = 102;
pub const MSTI_MESSAGE_LEN: usize = 16;

/// Version 3 Length of an MST BPDU with no MSTI messages.
const MST_V3_BASE_LEN: usize = 64;
const MAX_MSTI_MESSAGES: usize = 64;

const TYPE_CONFIG: u8 = 0x00;
const TYPE_RST: u8 = 0x02;
const TYPE_TCN: u8 = 0x80;

/// 802.3 header (destination, source, length) plus the LLC header.
pub const FRAME_HEADER_LEN: usize = 17;
pub const LLC_HEADER: [u8; 3] = [0x42, 0x42, 0x03];
const MIN_FRAME_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BpduKind {
    Config,
    Tcn,
    Rst,
    Mst,
}

/// The role encoded in bits 2-3 of the flags octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodedRole {
    /// Master port in MSTI messages, unknown in the CIST message.
    Master,
    AlternateOrBackup,
    Root,
    Designated,
}

/// A BPDU or MSTI message flags octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BpduFlags(u8);

impl BpduFlags {
    pub const TOPOLOGY_CHANGE: u8 = 0x01;
    pub const PROPOSAL: u8 = 0x02;
    pub const LEARNING: u8 = 0x10;
    pub const FORWARDING: u8 = 0x20;
    pub const AGREEMENT: u8 = 0x40;
    /// Topology Change Acknowledgment in the CIST flags, Master in MSTI flags.
    pub const ACK_OR_MASTER: u8 = 0x80;

    const ROLE_SHIFT: u8 = 2;
    const ROLE_MASK: u8 = 0x0c;

    pub const fn from_bits(bits: u8) -> Self {
        BpduFlags(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    pub fn role(&self) -> EncodedRole {
        match (self.0 & Self::ROLE_MASK) >> Self::ROLE_SHIFT {
            0 => EncodedRole::Master,
            1 => EncodedRole::AlternateOrBackup,
            2 => EncodedRole::Root,
            _ => EncodedRole::Designated,
        }
    }

    pub fn set_role(&mut self, role: EncodedRole) {
        let bits = match role {
            EncodedRole::Master => 0,
            EncodedRole::AlternateOrBackup => 1,
            EncodedRole::Root => 2,
            EncodedRole::Designated => 3,
        };
        self.0 = (self.0 & !Self::ROLE_MASK) | (bits << Self::ROLE_SHIFT);
    }
}

/// Timer fields as carried on the wire, in 1/256 second units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageTimes {
    pub message_age: u16,
    pub max_age: u16,
    pub hello_time: u16,
    pub forward_delay: u16,
}

impl MessageTimes {
    pub fn from_times(times: &Times) -> Self {
        MessageTimes {
            message_age: times.message_age << 8,
            max_age: times.max_age << 8,
            hello_time: times.hello_time << 8,
            forward_delay: times.forward_delay << 8,
        }
    }

    /// Whole-second view, with the hop count supplied by the caller.
    pub fn to_times(&self, remaining_hops: u8) -> Times {
        Times {
            forward_delay: self.forward_delay >> 8,
            hello_time: self.hello_time >> 8,
            max_age: self.max_age >> 8,
            message_age: self.message_age >> 8,
            remaining_hops,
        }
    }
}

/// Fields common to every Configuration, RST and MST BPDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CistMessage {
    pub flags: BpduFlags,
    pub root_id: BridgeId,
    pub external_root_path_cost: u32,
    /// The Bridge Identifier field: designated bridge in Configuration and
    /// RST BPDUs, CIST regional root in MST BPDUs.
    pub regional_root_id: BridgeId,
    pub port_id: PortId,
    pub times: MessageTimes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MstiMessage {
    pub flags: BpduFlags,
    pub regional_root_id: BridgeId,
    pub internal_root_path_cost: u32,
    /// Top four bits of the designated bridge priority.
    pub bridge_priority: u8,
    /// Top four bits of the designated port priority.
    pub port_priority: u8,
    pub remaining_hops: u8,
}

impl MstiMessage {
    /// The MSTID, carried in the regional root's system ID extension.
    pub fn mstid(&self) -> u16 {
        self.regional_root_id.system_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MstExtension {
    pub config_id: MstConfigId,
    pub internal_root_path_cost: u32,
    pub bridge_id: BridgeId,
    pub remaining_hops: u8,
    pub mstis: Vec<MstiMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bpdu {
    pub kind: BpduKind,
    pub version: u8,
    pub cist: CistMessage,
    pub mst: Option<MstExtension>,
}

impl Bpdu {
    pub fn tcn() -> Self {
        Bpdu {
            kind: BpduKind::Tcn,
            version: 0,
            cist: CistMessage::default(),
            mst: None,
        }
    }

    pub fn config(cist: CistMessage) -> Self {
        Bpdu {
            kind: BpduKind::Config,
            version: 0,
            cist,
            mst: None,
        }
    }

    pub fn rst(cist: CistMessage) -> Self {
        Bpdu {
            kind: BpduKind::Rst,
            version: 2,
            cist,
            mst: None,
        }
    }

    pub fn mst(cist: CistMessage, mst: MstExtension) -> Self {
        Bpdu {
            kind: BpduKind::Mst,
            version: 3,
            cist,
            mst: Some(mst),
        }
    }

    /// True for BPDUs that tell the receiver its peer speaks RSTP or MSTP.
    pub fn is_rapid(&self) -> bool {
        matches!(self.kind, BpduKind::Rst | BpduKind::Mst)
    }

    /// The CIST designated bridge of the sender.
    pub fn designated_bridge_id(&self) -> BridgeId {
        match &self.mst {
            Some(mst) => mst.bridge_id,
            None => self.cist.regional_root_id,
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self.kind {
            BpduKind::Tcn => TCN_BPDU_LEN,
            BpduKind::Config => CONFIG_BPDU_LEN,
            BpduKind::Rst => RST_BPDU_LEN,
            BpduKind::Mst => {
                let count = self.mst.as_ref().map_or(0, |m| m.mstis.len());
                MST_BPDU_BASE_LEN + count * MSTI_MESSAGE_LEN
            }
        }
    }

    /// Parses and validates a BPDU (the octets following the LLC header).
    pub fn decode(bytes: &[u8]) -> MstpResult<Self> {
        if bytes.len() < TCN_BPDU_LEN {
            return Err(MstpError::malformed(format!("truncated: {} bytes", bytes.len())));
        }
        let protocol = BigEndian::read_u16(&bytes[0..2]);
        if protocol != 0 {
            return Err(MstpError::malformed(format!(
                "protocol identifier {protocol:#06x}"
            )));
        }
        let version = bytes[2];

        match bytes[3] {
            TYPE_TCN => Ok(Bpdu {
                version,
                ..Bpdu::tcn()
            }),
            TYPE_CONFIG => {
                require_len(bytes, CONFIG_BPDU_LEN, "Configuration BPDU")?;
                let cist = decode_cist(bytes);
                if cist.times.message_age >= cist.times.max_age {
                    return Err(MstpError::malformed(format!(
                        "message age {} not below max age {}",
                        cist.times.message_age, cist.times.max_age
                    )));
                }
                Ok(Bpdu {
                    version,
                    ..Bpdu::config(cist)
                })
            }
            TYPE_RST => {
                if version < 2 {
                    return Err(MstpError::malformed(format!(
                        "RST BPDU type with protocol version {version}"
                    )));
                }
                require_len(bytes, RST_BPDU_LEN, "RST BPDU")?;
                let cist = decode_cist(bytes);
                if version < 3 || bytes.len() < MST_BPDU_BASE_LEN || bytes[35] != 0 {
                    return Ok(Bpdu {
                        version,
                        ..Bpdu::rst(cist)
                    });
                }
                let mst = decode_mst(bytes)?;
                Ok(Bpdu {
                    version,
                    ..Bpdu::mst(cist, mst)
                })
            }
            other => Err(MstpError::malformed(format!("unknown BPDU type {other:#04x}"))),
        }
    }

    /// Writes the BPDU into `out`, which must hold [`Bpdu::encoded_len`] octets.
    pub fn encode(&self, out: &mut [u8]) -> MstpResult<usize> {
        let len = self.encoded_len();
        if out.len() < len {
            return Err(MstpError::BufferTooSmall {
                needed: len,
                available: out.len(),
            });
        }
        BigEndian::write_u16(&mut out[0..2], 0);
        out[2] = self.version;
        out[3] = match self.kind {
            BpduKind::Tcn => TYPE_TCN,
            BpduKind::Config => TYPE_CONFIG,
            BpduKind::Rst | BpduKind::Mst => TYPE_RST,
        };
        if self.kind == BpduKind::Tcn {
            return Ok(len);
        }

        encode_cist(&self.cist, out);
        match (self.kind, &self.mst) {
            (BpduKind::Rst, _) => out[35] = 0,
            (BpduKind::Mst, Some(mst)) => encode_mst(mst, out),
            (BpduKind::Mst, None) => {
                return Err(MstpError::malformed("MST BPDU without MST fields"));
            }
            _ => {}
        }
        Ok(len)
    }

    pub fn to_vec(&self) -> MstpResult<Vec<u8>> {
        let mut out = vec![0u8; self.encoded_len()];
        self.encode(&mut out)?;
        Ok(out)
    }
}

fn require_len(bytes: &[u8], needed: usize, what: &str) -> MstpResult<()> {
    if bytes.len() < needed {
        return Err(MstpError::malformed(format!(
            "truncated {what}: {} of {needed} bytes",
            bytes.len()
        )));
    }
    Ok(())
}

fn read_bridge_id(bytes: &[u8]) -> BridgeId {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    BridgeId::from_bytes(raw)
}

fn decode_cist(bytes: &[u8]) -> CistMessage {
    CistMessage {
        flags: BpduFlags::from_bits(bytes[4]),
        root_id: read_bridge_id(&bytes[5..13]),
        external_root_path_cost: BigEndian::read_u32(&bytes[13..17]),
        regional_root_id: read_bridge_id(&bytes[17..25]),
        port_id: PortId::from_raw(BigEndian::read_u16(&bytes[25..27])),
        times: MessageTimes {
            message_age: BigEndian::read_u16(&bytes[27..29]),
            max_age: BigEndian::read_u16(&bytes[29..31]),
            hello_time: BigEndian::read_u16(&bytes[31..33]),
            forward_delay: BigEndian::read_u16(&bytes[33..35]),
        },
    }
}

fn encode_cist(cist: &CistMessage, out: &mut [u8]) {
    out[4] = cist.flags.bits();
    out[5..13].copy_from_slice(&cist.root_id.to_bytes());
    BigEndian::write_u32(&mut out[13..17], cist.external_root_path_cost);
    out[17..25].copy_from_slice(&cist.regional_root_id.to_bytes());
    BigEndian::write_u16(&mut out[25..27], cist.port_id.raw());
    BigEndian::write_u16(&mut out[27..29], cist.times.message_age);
    BigEndian::write_u16(&mut out[29..31], cist.times.max_age);
    BigEndian::write_u16(&mut out[31..33], cist.times.hello_time);
    BigEndian::write_u16(&mut out[33..35], cist.times.forward_delay);
}

fn decode_mst(bytes: &[u8]) -> MstpResult<MstExtension> {
    let v3_len = usize::from(BigEndian::read_u16(&bytes[36..38]));
    if v3_len < MST_V3_BASE_LEN || (v3_len - MST_V3_BASE_LEN) % MSTI_MESSAGE_LEN != 0 {
        return Err(MstpError::malformed(format!("Version 3 Length {v3_len}")));
    }
    if 38 + v3_len > bytes.len() {
        return Err(MstpError::malformed(format!(
            "Version 3 Length {v3_len} exceeds the {} bytes received",
            bytes.len()
        )));
    }
    let count = (v3_len - MST_V3_BASE_LEN) / MSTI_MESSAGE_LEN;
    if count > MAX_MSTI_MESSAGES {
        return Err(MstpError::malformed(format!("{count} MSTI messages")));
    }

    let mstis = bytes[MST_BPDU_BASE_LEN..MST_BPDU_BASE_LEN + count * MSTI_MESSAGE_LEN]
        .chunks_exact(MSTI_MESSAGE_LEN)
        .map(|m| MstiMessage {
            flags: BpduFlags::from_bits(m[0]),
            regional_root_id: read_bridge_id(&m[1..9]),
            internal_root_path_cost: BigEndian::read_u32(&m[9..13]),
            bridge_priority: m[13],
            port_priority: m[14],
            remaining_hops: m[15],
        })
        .collect();

    Ok(MstExtension {
        config_id: MstConfigId::decode(&bytes[38..38 + MST_CONFIG_ID_LEN]),
        internal_root_path_cost: BigEndian::read_u32(&bytes[89..93]),
        bridge_id: read_bridge_id(&bytes[93..101]),
        remaining_hops: bytes[101],
        mstis,
    })
}

fn encode_mst(mst: &MstExtension, out: &mut [u8]) {
    out[35] = 0;
    let v3_len = MST_V3_BASE_LEN + mst.mstis.len() * MSTI_MESSAGE_LEN;
    BigEndian::write_u16(&mut out[36..38], v3_len as u16);
    mst.config_id.encode(&mut out[38..38 + MST_CONFIG_ID_LEN]);
    BigEndian::write_u32(&mut out[89..93], mst.internal_root_path_cost);
    out[93..101].copy_from_slice(&mst.bridge_id.to_bytes());
    out[101] = mst.remaining_hops;

    for (msti, m) in mst
        .mstis
        .iter()
        .zip(out[MST_BPDU_BASE_LEN..].chunks_exact_mut(MSTI_MESSAGE_LEN))
    {
        m[0] = msti.flags.bits();
        m[1..9].copy_from_slice(&msti.regional_root_id.to_bytes());
        BigEndian::write_u32(&mut m[9..13], msti.internal_root_path_cost);
        m[13] = msti.bridge_priority;
        m[14] = msti.port_priority;
        m[15] = msti.remaining_hops;
    }
}

/// Wraps a BPDU in an 802.3/LLC frame addressed to the bridge group address.
pub fn encode_frame(source: MacAddress, bpdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity((FRAME_HEADER_LEN + bpdu.len()).max(MIN_FRAME_LEN));
    frame.extend_from_slice(MacAddress::BRIDGE_GROUP.as_bytes());
    frame.extend_from_slice(source.as_bytes());
    let length = (LLC_HEADER.len() + bpdu.len()) as u16;
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&LLC_HEADER);
    frame.extend_from_slice(bpdu);
    if frame.len() < MIN_FRAME_LEN {
        frame.resize(MIN_FRAME_LEN, 0);
    }
    frame
}

/// Validates the frame envelope and returns the BPDU octets it carries.
pub fn bpdu_from_frame(frame: &[u8]) -> MstpResult<&[u8]> {
    if frame.len() < FRAME_HEADER_LEN {
        return Err(MstpError::malformed(format!("frame of {} bytes", frame.len())));
    }
    if frame[0..6] != MacAddress::BRIDGE_GROUP.as_bytes()[..] {
        return Err(MstpError::malformed("destination is not the bridge group address"));
    }
    if frame[14..17] != LLC_HEADER {
        return Err(MstpError::malformed("not an STP LLC frame"));
    }
    let length = usize::from(BigEndian::read_u16(&frame[12..14]));
    if length < LLC_HEADER.len() || 14 + length > frame.len() {
        return Err(MstpError::malformed(format!("802.3 length {length}")));
    }
    Ok(&frame[FRAME_HEADER_LEN..14 + length])
}

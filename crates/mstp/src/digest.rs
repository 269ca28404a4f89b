//! MST configuration identifier and its configuration digest.
//!
//! The digest is HMAC-MD5, keyed with the 802.1Q signature key, over the
//! VLAN-to-MSTID table: 4096 entries, two octets each, big-endian, VLAN 0
//! and 4095 always zero.

use md5::{Digest, Md5};
use mstp_types::VlanId;

use crate::error::{MstpError, MstpResult};
use crate::TreeIndex;

pub const CONFIG_NAME_LEN: usize = 32;
pub const CONFIG_DIGEST_LEN: usize = 16;

/// Encoded size of [`MstConfigId`] inside an MST BPDU.
pub const MST_CONFIG_ID_LEN: usize = 1 + CONFIG_NAME_LEN + 2 + CONFIG_DIGEST_LEN;

const VLAN_TABLE_LEN: usize = 4096;
const HMAC_BLOCK_LEN: usize = 64;

const DIGEST_SIGNATURE_KEY: [u8; 16] = [
    0x13, 0xac, 0x06, 0xa6, 0x2e, 0x47, 0xfd, 0x51, 0xf9, 0x5d, 0x2b, 0xa2, 0x43, 0xcd, 0x03, 0x46,
];

/// VLAN to tree assignment. Tree 0 is the CIST; unassigned VLANs map there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanTable {
    entries: Vec<u16>,
}

impl Default for VlanTable {
    fn default() -> Self {
        VlanTable {
            entries: vec![0; VLAN_TABLE_LEN],
        }
    }
}

impl VlanTable {
    pub fn tree_of(&self, vlan: VlanId) -> TreeIndex {
        usize::from(self.entries[usize::from(vlan.as_u16())])
    }

    pub fn assign(&mut self, vlan: VlanId, tree: TreeIndex) -> MstpResult<()> {
        let mstid = u16::try_from(tree)
            .ok()
            .filter(|id| *id <= 0x0fff)
            .ok_or_else(|| MstpError::invalid_config("vlan_table", format!("MSTID {tree} out of range")))?;
        self.entries[usize::from(vlan.as_u16())] = mstid;
        Ok(())
    }

    /// Assigned (VLAN, tree) pairs, skipping VLANs on the CIST.
    pub fn assignments(&self) -> impl Iterator<Item = (VlanId, TreeIndex)> + '_ {
        VlanId::all().filter_map(move |vlan| match self.tree_of(vlan) {
            0 => None,
            tree => Some((vlan, tree)),
        })
    }

    pub fn highest_tree(&self) -> TreeIndex {
        self.entries.iter().copied().max().map_or(0, usize::from)
    }

    fn encode(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| e.to_be_bytes()).collect()
    }

    /// The 16-octet configuration digest of this table.
    pub fn digest(&self) -> [u8; CONFIG_DIGEST_LEN] {
        hmac_md5(&DIGEST_SIGNATURE_KEY, &self.encode())
    }
}

fn hmac_md5(key: &[u8; 16], message: &[u8]) -> [u8; CONFIG_DIGEST_LEN] {
    let mut inner_pad = [0x36u8; HMAC_BLOCK_LEN];
    let mut outer_pad = [0x5cu8; HMAC_BLOCK_LEN];
    for (i, k) in key.iter().enumerate() {
        inner_pad[i] ^= k;
        outer_pad[i] ^= k;
    }

    let mut inner = Md5::new();
    inner.update(inner_pad);
    inner.update(message);
    let inner_hash = inner.finalize();

    let mut outer = Md5::new();
    outer.update(outer_pad);
    outer.update(inner_hash);

    let mut digest = [0u8; CONFIG_DIGEST_LEN];
    digest.copy_from_slice(&outer.finalize());
    digest
}

/// MST Configuration Identifier carried in every MST BPDU.
///
/// Two bridges are in the same region when all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MstConfigId {
    pub format_selector: u8,
    pub name: [u8; CONFIG_NAME_LEN],
    pub revision: u16,
    pub digest: [u8; CONFIG_DIGEST_LEN],
}

impl MstConfigId {
    pub fn new(name: &str, revision: u16, table: &VlanTable) -> MstpResult<Self> {
        Ok(MstConfigId {
            format_selector: 0,
            name: encode_name(name)?,
            revision,
            digest: table.digest(),
        })
    }

    /// The configuration name with trailing NUL padding removed.
    pub fn name_str(&self) -> String {
        let end = self.name.iter().position(|b| *b == 0).unwrap_or(CONFIG_NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0] = self.format_selector;
        out[1..33].copy_from_slice(&self.name);
        out[33..35].copy_from_slice(&self.revision.to_be_bytes());
        out[35..51].copy_from_slice(&self.digest);
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let mut name = [0u8; CONFIG_NAME_LEN];
        name.copy_from_slice(&bytes[1..33]);
        let mut digest = [0u8; CONFIG_DIGEST_LEN];
        digest.copy_from_slice(&bytes[35..51]);
        MstConfigId {
            format_selector: bytes[0],
            name,
            revision: u16::from_be_bytes([bytes[33], bytes[34]]),
            digest,
        }
    }
}

pub(crate) fn encode_name(name: &str) -> MstpResult<[u8; CONFIG_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.len() > CONFIG_NAME_LEN {
        return Err(MstpError::invalid_config(
            "mst_config_name",
            format!("{} bytes exceeds {CONFIG_NAME_LEN}", bytes.len()),
        ));
    }
    let mut out = [0u8; CONFIG_NAME_LEN];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    #[test]
    fn test_all_vlans_on_cist_digest() {
        let expected = [
            0xac, 0x36, 0x17, 0x7f, 0x50, 0x28, 0x3c, 0xd4, 0xb8, 0x38, 0x21, 0xd8, 0xab, 0x26,
            0xde, 0x62,
        ];
        assert_eq!(VlanTable::default().digest(), expected);
    }

    #[test]
    fn test_identical_tables_identical_digest() {
        let mut a = VlanTable::default();
        let mut b = VlanTable::default();
        for id in 10..20 {
            a.assign(vlan(id), 1).unwrap();
            b.assign(vlan(id), 1).unwrap();
        }
        assert_eq!(a.digest(), b.digest());

        b.assign(vlan(15), 2).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_tree_lookup_and_assignments() {
        let mut table = VlanTable::default();
        table.assign(vlan(100), 3).unwrap();
        assert_eq!(table.tree_of(vlan(100)), 3);
        assert_eq!(table.tree_of(vlan(101)), 0);
        assert_eq!(table.assignments().collect::<Vec<_>>(), vec![(vlan(100), 3)]);
        assert_eq!(table.highest_tree(), 3);
        assert!(table.assign(vlan(1), 5000).is_err());
    }

    #[test]
    fn test_config_id_encoding() {
        let table = VlanTable::default();
        let id = MstConfigId::new("region-a", 7, &table).unwrap();
        let mut buf = [0u8; MST_CONFIG_ID_LEN];
        id.encode(&mut buf);
        assert_eq!(&buf[1..9], b"region-a");
        assert_eq!(&buf[33..35], &[0, 7]);
        assert_eq!(MstConfigId::decode(&buf), id);
        assert_eq!(id.name_str(), "region-a");
    }

    #[test]
    fn test_config_name_too_long() {
        let name = "x".repeat(33);
        assert!(MstConfigId::new(&name, 0, &VlanTable::default()).is_err());
    }
}

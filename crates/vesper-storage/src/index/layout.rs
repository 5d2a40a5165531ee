//! On-disk layout of index files: page roles, node capacities, and the
//! header-page codec.

use crate::rid::Rid;
use vesper_common::page::PAGE_SIZE;
use vesper_common::types::KeyType;
use vesper_common::{Result, VesperError};

/// Page number meaning "no page" (null sibling/child pointer).
pub const NO_PAGE: u32 = 0;

/// Page number of the header page within an index file. Page 0 is burned
/// at creation so that 0 can serve as the null page number.
pub const HEADER_PAGE_NUM: u32 = 1;

/// Fixed width of the relation name field in the header page.
pub const RELATION_NAME_LEN: usize = 32;

/// Maximum number of (key, rid) entries in a leaf node.
///
/// Leaf layout: count (2) + keys (cap * key) + rids (cap * 8) +
/// right sibling page number (4).
pub const fn leaf_capacity(key_size: usize) -> usize {
    (PAGE_SIZE - 2 - 4) / (key_size + Rid::DISK_SIZE)
}

/// Maximum number of separator keys in a branch node.
///
/// Branch layout: count (2) + level (2) + keys (cap * key) +
/// children ((cap + 1) * 4).
pub const fn branch_capacity(key_size: usize) -> usize {
    (PAGE_SIZE - 2 - 2 - 4) / (key_size + 4)
}

/// Leaf capacity for INT keys.
pub const LEAF_CAP_INT: usize = leaf_capacity(4);
/// Leaf capacity for DOUBLE keys.
pub const LEAF_CAP_DOUBLE: usize = leaf_capacity(8);
/// Leaf capacity for STRING keys.
pub const LEAF_CAP_STR: usize = leaf_capacity(10);

/// Branch capacity for INT keys.
pub const BRANCH_CAP_INT: usize = branch_capacity(4);
/// Branch capacity for DOUBLE keys.
pub const BRANCH_CAP_DOUBLE: usize = branch_capacity(8);
/// Branch capacity for STRING keys.
pub const BRANCH_CAP_STR: usize = branch_capacity(10);

/// Persisted index metadata, stored in the header page.
///
/// Layout (42 bytes):
/// - relation_name: 32 bytes (NUL-padded ASCII)
/// - attr_offset: 4 bytes
/// - key_type: 1 byte
/// - root_page_num: 4 bytes
/// - root_is_leaf: 1 byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    /// Name of the indexed relation.
    pub relation_name: String,
    /// Byte offset of the indexed attribute within a record.
    pub attr_offset: u32,
    /// Domain of the indexed attribute.
    pub key_type: KeyType,
    /// Page number of the current root node.
    pub root_page_num: u32,
    /// True while the root is still the initial leaf.
    pub root_is_leaf: bool,
}

impl IndexHeader {
    /// Size of the encoded header in bytes.
    pub const SIZE: usize = RELATION_NAME_LEN + 4 + 1 + 4 + 1;

    /// Creates a header for a fresh index.
    pub fn new(relation_name: &str, attr_offset: u32, key_type: KeyType) -> Result<Self> {
        if relation_name.len() > RELATION_NAME_LEN {
            return Err(VesperError::BadIndexInfo {
                reason: format!(
                    "relation name longer than {} bytes: {}",
                    RELATION_NAME_LEN, relation_name
                ),
            });
        }
        Ok(Self {
            relation_name: relation_name.to_string(),
            attr_offset,
            key_type,
            root_page_num: NO_PAGE,
            root_is_leaf: true,
        })
    }

    /// Serializes the header into the start of a page buffer.
    pub fn write_to(&self, page: &mut [u8]) {
        page[..RELATION_NAME_LEN].fill(0);
        page[..self.relation_name.len()].copy_from_slice(self.relation_name.as_bytes());

        let mut offset = RELATION_NAME_LEN;
        page[offset..offset + 4].copy_from_slice(&self.attr_offset.to_le_bytes());
        offset += 4;
        page[offset] = self.key_type as u8;
        offset += 1;
        page[offset..offset + 4].copy_from_slice(&self.root_page_num.to_le_bytes());
        offset += 4;
        page[offset] = self.root_is_leaf as u8;
    }

    /// Deserializes the header from the start of a page buffer.
    pub fn read_from(page: &[u8]) -> Result<Self> {
        let name_end = page[..RELATION_NAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RELATION_NAME_LEN);
        let relation_name = String::from_utf8_lossy(&page[..name_end]).into_owned();

        let mut offset = RELATION_NAME_LEN;
        let attr_offset = u32::from_le_bytes([
            page[offset],
            page[offset + 1],
            page[offset + 2],
            page[offset + 3],
        ]);
        offset += 4;
        let key_type = KeyType::from_tag(page[offset]).ok_or(VesperError::BadIndexInfo {
            reason: format!("unknown key type tag {}", page[offset]),
        })?;
        offset += 1;
        let root_page_num = u32::from_le_bytes([
            page[offset],
            page[offset + 1],
            page[offset + 2],
            page[offset + 3],
        ]);
        offset += 4;
        let root_is_leaf = page[offset] != 0;

        Ok(Self {
            relation_name,
            attr_offset,
            key_type,
            root_page_num,
            root_is_leaf,
        })
    }

    /// Verifies that this header describes the requested index.
    pub fn verify(&self, relation_name: &str, attr_offset: u32, key_type: KeyType) -> Result<()> {
        if self.relation_name != relation_name {
            return Err(VesperError::BadIndexInfo {
                reason: format!(
                    "relation {:?} != requested {:?}",
                    self.relation_name, relation_name
                ),
            });
        }
        if self.attr_offset != attr_offset {
            return Err(VesperError::BadIndexInfo {
                reason: format!(
                    "attribute offset {} != requested {}",
                    self.attr_offset, attr_offset
                ),
            });
        }
        if self.key_type != key_type {
            return Err(VesperError::BadIndexInfo {
                reason: format!("key type {} != requested {}", self.key_type, key_type),
            });
        }
        Ok(())
    }
}

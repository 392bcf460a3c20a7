use crate::common::Rid;

/// Bytes of one encoded node: parent (4), leaf flag (1), left RID (8),
/// value1 (4), mid RID (8), value2 (4), right RID (8).
pub(crate) const NODE_BYTES: usize = 37;

/// Byte offset of the encoded node within its page. Byte 0 holds the
/// full flag; bytes 1..38 stay zero.
pub(crate) const NODE_OFFSET: usize = 1 + NODE_BYTES;

/// One index node. Keys are `i32`; `-1` marks an empty key slot and
/// `(-1, -1)` an empty RID. A node holds at most two keys: the RID of
/// `value1` lives in `left`, the RID of `value2` in `mid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) parent: i32,
    pub(crate) is_leaf: bool,
    pub(crate) left: Rid,
    pub(crate) value1: i32,
    pub(crate) mid: Rid,
    pub(crate) value2: i32,
    pub(crate) right: Rid,
}

impl Node {
    /// A fresh leaf carrying a single entry in the first key slot.
    pub(crate) fn leaf(rid: Rid, key: i32) -> Node {
        Node {
            parent: -1,
            is_leaf: true,
            left: rid,
            value1: key,
            mid: Rid::INVALID,
            value2: -1,
            right: Rid::INVALID,
        }
    }

    pub(crate) fn read(page: &[u8]) -> Node {
        let buf = &page[NODE_OFFSET..NODE_OFFSET + NODE_BYTES];
        Node {
            parent: read_i32(buf, 0),
            is_leaf: buf[4] != 0,
            left: read_rid(buf, 5),
            value1: read_i32(buf, 13),
            mid: read_rid(buf, 17),
            value2: read_i32(buf, 25),
            right: read_rid(buf, 29),
        }
    }

    pub(crate) fn write(&self, page: &mut [u8]) {
        let buf = &mut page[NODE_OFFSET..NODE_OFFSET + NODE_BYTES];
        write_i32(buf, 0, self.parent);
        buf[4] = self.is_leaf as u8;
        write_rid(buf, 5, self.left);
        write_i32(buf, 13, self.value1);
        write_rid(buf, 17, self.mid);
        write_i32(buf, 25, self.value2);
        write_rid(buf, 29, self.right);
    }
}

/// Full flag of a node page.
pub(crate) fn is_full(page: &[u8]) -> bool {
    page[0] != 0
}

pub(crate) fn set_full(page: &mut [u8], full: bool) {
    page[0] = full as u8;
}

fn read_i32(buf: &[u8], off: usize) -> i32 {
    i32::from_ne_bytes(buf[off..off + 4].try_into().unwrap())
}

fn write_i32(buf: &mut [u8], off: usize, v: i32) {
    buf[off..off + 4].copy_from_slice(&v.to_ne_bytes());
}

fn read_rid(buf: &[u8], off: usize) -> Rid {
    Rid::new(read_i32(buf, off), read_i32(buf, off + 4))
}

fn write_rid(buf: &mut [u8], off: usize, rid: Rid) {
    write_i32(buf, off, rid.page);
    write_i32(buf, off + 4, rid.slot);
}

use super::{read_u32, write_u32};
use crate::key::Datatype;
use crate::page_id::PageId;

const RELATION_NAME_LEN: usize = 200;

/// Typed view of the meta page: the first page
/// of the file, holding enough to reopen the index without the caller
/// re-supplying `attrType`/`attrByteOffset`.
pub struct MetaPage<'a> {
    buf: &'a mut [u8],
}

impl<'a> MetaPage<'a> {
    fn attr_byte_offset_off() -> usize {
        RELATION_NAME_LEN
    }
    fn attr_type_off() -> usize {
        RELATION_NAME_LEN + 4
    }
    fn root_page_no_off() -> usize {
        RELATION_NAME_LEN + 4 + 1
    }

    pub fn from_page(buf: &'a mut [u8]) -> Self {
        MetaPage { buf }
    }

    pub fn init(
        buf: &'a mut [u8],
        relation_name: &str,
        attr_byte_offset: u32,
        attr_type: Datatype,
        root_page_no: PageId,
    ) -> Self {
        for b in buf.iter_mut() {
            *b = 0;
        }
        let mut meta = MetaPage { buf };
        meta.set_relation_name(relation_name);
        meta.set_attr_byte_offset(attr_byte_offset);
        meta.set_attr_type(attr_type);
        meta.set_root_page_no(root_page_no);
        meta
    }

    pub fn relation_name(&self) -> String {
        let name_bytes = &self.buf[..RELATION_NAME_LEN];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        String::from_utf8_lossy(&name_bytes[..end]).into_owned()
    }

    pub fn set_relation_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let n = bytes.len().min(RELATION_NAME_LEN - 1);
        self.buf[..n].copy_from_slice(&bytes[..n]);
        self.buf[n] = 0;
    }

    pub fn attr_byte_offset(&self) -> u32 {
        read_u32(self.buf, Self::attr_byte_offset_off())
    }

    pub fn set_attr_byte_offset(&mut self, v: u32) {
        write_u32(self.buf, Self::attr_byte_offset_off(), v);
    }

    pub fn attr_type(&self) -> Option<Datatype> {
        Datatype::from_byte(self.buf[Self::attr_type_off()])
    }

    pub fn set_attr_type(&mut self, t: Datatype) {
        self.buf[Self::attr_type_off()] = t.to_byte();
    }

    pub fn root_page_no(&self) -> PageId {
        read_u32(self.buf, Self::root_page_no_off())
    }

    pub fn set_root_page_no(&mut self, pid: PageId) {
        write_u32(self.buf, Self::root_page_no_off(), pid);
    }
}

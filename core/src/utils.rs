use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;
use num_enum::TryFromPrimitive;

/// `0x5F01` style rendering of a tag for logs and errors.
pub fn hex_tag(tag: u32) -> String {
    format!("{tag:#X}")
}

/// `0x011E` style rendering of a file identifier.
pub fn hex_fid(fid: u16) -> String {
    format!("{fid:#06X}")
}

/// Lower-case hex dump, used in trace output.
pub fn hexify(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Reads up to `len` bytes, stopping early only at EOF.
pub fn read_exact_or_eof<R: Read + ?Sized>(r: &mut R, len: usize) -> io::Result<Bytes> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

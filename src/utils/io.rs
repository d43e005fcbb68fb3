// I/O helpers for the frame reader

use std::io::Read;

/// Read a big-endian 16-bit integer
pub fn read_be_u16<R: Read>(reader: &mut R) -> std::io::Result<u16> {
    let mut buffer = [0u8; 2];
    reader.read_exact(&mut buffer)?;
    Ok(u16::from_be_bytes(buffer))
}

/// Read a big-endian 32-bit integer
pub fn read_be_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_be_bytes(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn big_endian_reads() {
        let mut cursor = Cursor::new(vec![0x12, 0x34, 0x56, 0x78, 0xAB, 0xCD]);
        assert_eq!(read_be_u32(&mut cursor).unwrap(), 0x1234_5678);
        assert_eq!(read_be_u16(&mut cursor).unwrap(), 0xABCD);
        assert!(read_be_u16(&mut cursor).is_err());
    }
}

// Synchsafe size encoding (7 bits per byte)
//
// The tag header stores its size as four bytes carrying 7 data bits each,
// so no byte of the size field can ever look like an MPEG frame-sync
// marker. Only 28 bits are representable.

/// Largest value a synchsafe size field can hold
pub const MAX_SIZE: u32 = (1 << 28) - 1;

/// Encode a 28-bit size into four 7-bit bytes, most significant group first
pub fn encode_size(size: u32) -> [u8; 4] {
    [
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]
}

/// Decode four 7-bit bytes back into a 28-bit size
pub fn decode_size(bytes: [u8; 4]) -> u32 {
    ((bytes[0] as u32 & 0x7F) << 21)
        | ((bytes[1] as u32 & 0x7F) << 14)
        | ((bytes[2] as u32 & 0x7F) << 7)
        | (bytes[3] as u32 & 0x7F)
}

// Binary waveform layout, as consumed by the firmware after an upload:
// every DAC code is 2 bytes, most significant byte first, channels in order
// within a row and rows concatenated. There is no header and no row length,
// so the firmware has to agree on the channel count on its own.

/// Number of DAC channels on the board
pub const MAX_CHANNELS: usize = 40;

/// Size in bytes of a single encoded DAC code
pub const CODE_WIDTH: usize = 2;

/// Upload payloads are sent in pieces of at most this many bytes
pub const UPLOAD_CHUNK_SIZE: usize = 256;

#[inline]
pub fn encode_code(code: u16) -> [u8; CODE_WIDTH] {
    code.to_be_bytes()
}

/// Iterates the codes stored in a binary waveform. A trailing odd byte is ignored.
pub fn decode_codes(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(CODE_WIDTH)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
}

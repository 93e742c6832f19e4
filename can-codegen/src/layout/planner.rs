//! Bit-chunk planner
//!
//! Turns a signal's start bit, length and byte order into the ordered list of
//! byte-level shift/mask operations that move it in and out of a frame.

use crate::signals::database::{ByteOrder, SignalDefinition};
use serde::{Deserialize, Serialize};

/// One byte's worth of a signal.
///
/// Packing takes `bits` bits of the raw value starting at `value_shift`,
/// shifts them left by `shift` and ORs them into `data[byte_index]`.
/// Unpacking is the inverse: `(data[byte_index] & mask) >> shift`, placed at
/// `value_shift` in the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitChunk {
    /// Byte inside the message buffer
    pub byte_index: usize,
    /// Left shift inside the byte (position of the chunk's LSB, 0..=7)
    pub shift: u8,
    /// Bits of the byte occupied by the signal
    pub mask: u8,
    /// Position of the chunk's LSB inside the raw value
    pub value_shift: u8,
    /// Number of signal bits carried by this chunk (1..=8)
    pub bits: u8,
}

impl BitChunk {
    fn new(byte_index: usize, shift: u8, bits: u8, value_shift: u8) -> Self {
        let mask = (((1u16 << bits) - 1) as u8) << shift;
        Self {
            byte_index,
            shift,
            mask,
            value_shift,
            bits,
        }
    }

    /// Mask applied to the raw value before it is shifted into the byte
    pub fn value_mask(&self) -> u8 {
        ((1u16 << self.bits) - 1) as u8
    }

    /// Byte contribution of `raw` for this chunk
    #[inline]
    pub fn pack_bits(&self, raw: u64) -> u8 {
        (((raw >> self.value_shift) as u8) & self.value_mask()) << self.shift
    }

    /// Raw-value contribution of `byte` for this chunk
    #[inline]
    pub fn unpack_bits(&self, byte: u8) -> u64 {
        u64::from((byte & self.mask) >> self.shift) << self.value_shift
    }
}

/// Plan the chunks of a signal
pub fn plan_signal(signal: &SignalDefinition) -> Vec<BitChunk> {
    plan(signal.start_bit, signal.length, signal.byte_order)
}

/// Compute the ordered chunks covering `bit_length` bits starting at
/// `start_bit`.
///
/// Little-endian signals start at their LSB and grow towards higher bits and
/// bytes. Big-endian signals use MSB-first numbering (bit 0 is the MSB of
/// byte 0): they start at their MSB and grow towards lower-order bits, then
/// continue at the MSB of the next byte.
///
/// Lengths above 64 are clamped; callers validate lengths beforehand.
pub fn plan(start_bit: u16, bit_length: u16, byte_order: ByteOrder) -> Vec<BitChunk> {
    let mut remaining = bit_length.min(64) as u8;
    let mut byte_index = (start_bit / 8) as usize;
    let mut chunks = Vec::with_capacity(usize::from(remaining / 8) + 2);

    match byte_order {
        ByteOrder::LittleEndian => {
            let mut bit_offset = (start_bit % 8) as u8;
            let mut consumed = 0u8;
            while remaining > 0 {
                let bits = remaining.min(8 - bit_offset);
                chunks.push(BitChunk::new(byte_index, bit_offset, bits, consumed));
                consumed += bits;
                remaining -= bits;
                byte_index += 1;
                bit_offset = 0;
            }
        }
        ByteOrder::BigEndian => {
            // Offset counted from the MSB of the byte
            let mut msb_offset = (start_bit % 8) as u8;
            while remaining > 0 {
                let bits = remaining.min(8 - msb_offset);
                remaining -= bits;
                let shift = 8 - msb_offset - bits;
                chunks.push(BitChunk::new(byte_index, shift, bits, remaining));
                byte_index += 1;
                msb_offset = 0;
            }
        }
    }

    log::trace!(
        "Planned {} chunk(s) for start_bit={} length={} {:?}",
        chunks.len(),
        start_bit,
        bit_length,
        byte_order
    );

    chunks
}

/// Number of bytes a plan needs (highest byte index + 1)
pub fn required_bytes(chunks: &[BitChunk]) -> usize {
    chunks.iter().map(|c| c.byte_index + 1).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bit() {
        let chunks = plan(3, 1, ByteOrder::LittleEndian);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].byte_index, 0);
        assert_eq!(chunks[0].mask, 0x08);
        assert_eq!(chunks[0].shift, 3);
    }

    #[test]
    fn test_full_byte_aligned() {
        let chunks = plan(8, 8, ByteOrder::LittleEndian);
        assert_eq!(
            chunks,
            vec![BitChunk {
                byte_index: 1,
                shift: 0,
                mask: 0xFF,
                value_shift: 0,
                bits: 8
            }]
        );
    }

    #[test]
    fn test_little_endian_18_bits_over_three_bytes() {
        let chunks = plan(4, 18, ByteOrder::LittleEndian);
        assert_eq!(chunks.len(), 3);

        assert_eq!((chunks[0].byte_index, chunks[0].mask, chunks[0].value_shift), (0, 0xF0, 0));
        assert_eq!((chunks[1].byte_index, chunks[1].mask, chunks[1].value_shift), (1, 0xFF, 4));
        assert_eq!((chunks[2].byte_index, chunks[2].mask, chunks[2].value_shift), (2, 0x3F, 12));
        assert_eq!(chunks.iter().map(|c| c.bits as u16).sum::<u16>(), 18);
    }

    #[test]
    fn test_big_endian_spanning() {
        // MSB at bit 4 (fifth bit of byte 0 counted from its MSB), 12 bits:
        // byte 0 low nibble carries the top 4 bits, byte 1 the low 8
        let chunks = plan(4, 12, ByteOrder::BigEndian);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].byte_index, chunks[0].mask, chunks[0].value_shift), (0, 0x0F, 8));
        assert_eq!((chunks[1].byte_index, chunks[1].mask, chunks[1].value_shift), (1, 0xFF, 0));
    }

    #[test]
    fn test_big_endian_partial_tail() {
        // 12 bits from the MSB of byte 0: full byte 0, top nibble of byte 1
        let chunks = plan(0, 12, ByteOrder::BigEndian);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].mask, chunks[0].shift, chunks[0].value_shift), (0xFF, 0, 4));
        assert_eq!((chunks[1].mask, chunks[1].shift, chunks[1].value_shift), (0xF0, 4, 0));
    }

    #[test]
    fn test_64_bit_signal() {
        let le = plan(0, 64, ByteOrder::LittleEndian);
        assert_eq!(le.len(), 8);
        assert!(le.iter().all(|c| c.mask == 0xFF));
        assert_eq!(le[7].value_shift, 56);

        let be = plan(0, 64, ByteOrder::BigEndian);
        assert_eq!(be.len(), 8);
        assert_eq!(be[0].value_shift, 56);
        assert_eq!(be[7].value_shift, 0);
    }

    #[test]
    fn test_chunk_bit_helpers() {
        let chunk = plan(4, 4, ByteOrder::LittleEndian)[0];
        assert_eq!(chunk.pack_bits(0xA), 0xA0);
        assert_eq!(chunk.unpack_bits(0xAF), 0xA);
    }

    #[test]
    fn test_required_bytes() {
        assert_eq!(required_bytes(&plan(4, 18, ByteOrder::LittleEndian)), 3);
        assert_eq!(required_bytes(&plan(60, 4, ByteOrder::BigEndian)), 8);
        assert_eq!(required_bytes(&[]), 0);
    }
}

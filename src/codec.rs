//! 2-bit sequence codec
//!
//! Reads are held in memory as numeric strings over 0(A), 1(C), 2(G), 3(T)
//! and stored on disk with four bases packed into each byte, most-significant
//! pair first. The packed form carries no length; callers keep the symbol
//! count (the read index does) and supply it on decode.

use crate::error::{CodecError, Result};

/// Number of bases packed into one stored byte
pub const BASES_PER_BYTE: usize = 4;

/// Number of bytes occupied by a packed sequence of `len` bases
#[must_use]
pub fn compressed_len(len: usize) -> usize {
    len.div_ceil(BASES_PER_BYTE)
}

/// Textual rendition of a read
///
/// Selects how a read is materialized in memory: as a numeric string over
/// {0,1,2,3} or as upper/lowercase ASCII.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alphabet {
    /// 0(A), 1(C), 2(G), 3(T)
    #[default]
    Numeric,
    /// ACGT
    Upper,
    /// acgt
    Lower,
}

const UPPER: [u8; 4] = *b"ACGT";
const LOWER: [u8; 4] = *b"acgt";

/// Packs a numeric sequence into 2-bit form, appending to `out`
///
/// # Errors
///
/// Returns [`CodecError::InvalidSymbol`] if any symbol is outside {0,1,2,3}.
pub fn encode_into(seq: &[u8], out: &mut Vec<u8>) -> Result<()> {
    if let Some(&sym) = seq.iter().find(|&&s| s > 3) {
        return Err(CodecError::InvalidSymbol(sym).into());
    }
    out.reserve(compressed_len(seq.len()));
    for chunk in seq.chunks(BASES_PER_BYTE) {
        let mut byte = 0u8;
        for (i, &sym) in chunk.iter().enumerate() {
            byte |= sym << (6 - 2 * i);
        }
        out.push(byte);
    }
    Ok(())
}

/// Packs a numeric sequence into a freshly allocated 2-bit buffer
pub fn encode(seq: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed_len(seq.len()));
    encode_into(seq, &mut out)?;
    Ok(out)
}

/// Unpacks `len` bases from 2-bit form, appending to `out`
///
/// The packed length alone cannot recover the symbol count, so the caller
/// supplies it exactly.
///
/// # Errors
///
/// Returns [`CodecError::TruncatedInput`] if `bytes` holds fewer than
/// `compressed_len(len)` bytes.
pub fn decode_into(bytes: &[u8], len: usize, out: &mut Vec<u8>) -> Result<()> {
    let need = compressed_len(len);
    if bytes.len() < need {
        return Err(CodecError::TruncatedInput(bytes.len(), need).into());
    }
    out.reserve(len);
    for i in 0..len {
        let byte = bytes[i / BASES_PER_BYTE];
        out.push((byte >> (6 - 2 * (i % BASES_PER_BYTE))) & 0x3);
    }
    Ok(())
}

/// Unpacks `len` bases from 2-bit form into a freshly allocated buffer
pub fn decode(bytes: &[u8], len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len);
    decode_into(bytes, len, &mut out)?;
    Ok(out)
}

/// Converts a read from numbers to uppercase letters (0-3 to ACGT) in place
///
/// # Panics
///
/// Panics if the read holds symbols outside {0,1,2,3}.
pub fn numeric_to_upper(seq: &mut [u8]) {
    for sym in seq {
        *sym = UPPER[*sym as usize];
    }
}

/// Converts a read from numbers to lowercase letters (0-3 to acgt) in place
///
/// # Panics
///
/// Panics if the read holds symbols outside {0,1,2,3}.
pub fn numeric_to_lower(seq: &mut [u8]) {
    for sym in seq {
        *sym = LOWER[*sym as usize];
    }
}

/// Converts a read from letters to numbers in place
///
/// Both cases are accepted. Any other byte is rejected rather than silently
/// mapped to a base.
///
/// # Errors
///
/// Returns [`CodecError::InvalidBase`] naming the first offending byte.
pub fn ascii_to_numeric(seq: &mut [u8]) -> Result<()> {
    for base in seq {
        *base = numeric_base(*base)?;
    }
    Ok(())
}

/// Maps a single ACGT/acgt byte to its numeric symbol
pub(crate) fn numeric_base(base: u8) -> Result<u8> {
    match base {
        b'A' | b'a' => Ok(0),
        b'C' | b'c' => Ok(1),
        b'G' | b'g' => Ok(2),
        b'T' | b't' => Ok(3),
        _ => Err(CodecError::InvalidBase(base).into()),
    }
}

/// Rewrites a numeric read into the requested alphabet in place
pub fn render(seq: &mut [u8], alphabet: Alphabet) {
    match alphabet {
        Alphabet::Numeric => {}
        Alphabet::Upper => numeric_to_upper(seq),
        Alphabet::Lower => numeric_to_lower(seq),
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::Error;
    use anyhow::Result;

    #[test]
    fn test_roundtrip_exact_multiple() -> Result<()> {
        let seq = vec![0, 1, 2, 3, 3, 2, 1, 0];
        let packed = encode(&seq)?;
        assert_eq!(packed.len(), 2);
        assert_eq!(decode(&packed, seq.len())?, seq);
        Ok(())
    }

    #[test]
    fn test_roundtrip_remainder() -> Result<()> {
        for len in 1..=9 {
            let seq: Vec<u8> = (0..len).map(|i| (i % 4) as u8).collect();
            let packed = encode(&seq)?;
            assert_eq!(packed.len(), compressed_len(len));
            assert_eq!(decode(&packed, len)?, seq);
        }
        Ok(())
    }

    #[test]
    fn test_msb_pair_first_layout() -> Result<()> {
        // 0,1,2,3 packs to 00 01 10 11 = 0x1B
        let packed = encode(&[0, 1, 2, 3])?;
        assert_eq!(packed, vec![0x1B]);
        // a trailing partial byte is left-aligned
        let packed = encode(&[3])?;
        assert_eq!(packed, vec![0xC0]);
        Ok(())
    }

    #[test]
    fn test_encode_rejects_invalid_symbol() {
        let err = encode(&[0, 1, 4, 3]).unwrap_err();
        assert!(matches!(err, Error::CodecError(CodecError::InvalidSymbol(4))));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let err = decode(&[0x1B], 5).unwrap_err();
        assert!(matches!(
            err,
            Error::CodecError(CodecError::TruncatedInput(1, 2))
        ));
    }

    #[test]
    fn test_empty_sequence() -> Result<()> {
        assert_eq!(encode(&[])?, Vec::<u8>::new());
        assert_eq!(decode(&[], 0)?, Vec::<u8>::new());
        assert_eq!(compressed_len(0), 0);
        Ok(())
    }

    #[test]
    fn test_alphabet_conversion() -> Result<()> {
        let mut seq = vec![0u8, 1, 2, 3];
        numeric_to_upper(&mut seq);
        assert_eq!(&seq, b"ACGT");
        ascii_to_numeric(&mut seq)?;
        assert_eq!(seq, vec![0, 1, 2, 3]);
        numeric_to_lower(&mut seq);
        assert_eq!(&seq, b"acgt");
        ascii_to_numeric(&mut seq)?;
        assert_eq!(seq, vec![0, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_ascii_rejects_unknown_base() {
        let mut seq = b"ACGN".to_vec();
        let err = ascii_to_numeric(&mut seq).unwrap_err();
        assert!(matches!(
            err,
            Error::CodecError(CodecError::InvalidBase(b'N'))
        ));
    }

    #[test]
    fn test_render() {
        let mut seq = vec![0u8, 3];
        render(&mut seq, Alphabet::Numeric);
        assert_eq!(seq, vec![0, 3]);
        render(&mut seq, Alphabet::Lower);
        assert_eq!(&seq, b"at");
    }
}

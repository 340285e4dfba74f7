//! Parameter encoder (C6): picks the shortest of the thirteen
//! addressing-mode encodings for a resolved operand.

use crate::ast::Reg;
use crate::bytes::ByteArray;
use crate::error::EvalError;

const MODE_NEXT_V8: u8 = 0x8A;
const MODE_NEXT_V16: u8 = 0x8B;
const MODE_ADDR_V8: u8 = 0x8C;
const MODE_ADDR_V8_WORD: u8 = 0x8D;
const MODE_ADDR_V16: u8 = 0x8E;
const MODE_ADDR_V16_WORD: u8 = 0x8F;
const MODE_REGISTER: u8 = 0x90;
const MODE_REG_ADDR: u8 = 0xA0;
const MODE_REG_ADDR_WORD: u8 = 0xB0;
const MODE_REG_ADDR_V8: u8 = 0xC0;
const MODE_REG_ADDR_V8_WORD: u8 = 0xD0;
const MODE_REG_ADDR_V16: u8 = 0xE0;
const MODE_REG_ADDR_V16_WORD: u8 = 0xF0;

/// An operand with all expressions resolved to concrete 32-bit
/// values, ready for addressing-mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Value(i64),
    Register(Reg),
    IndByte(i64),
    IndWord(i64),
    IndReg(Reg),
    IndRegWord(Reg),
    IndRegOffset(Reg, i64),
    IndRegOffsetWord(Reg, i64),
}

fn check_range(value: i64) -> Result<(), EvalError> {
    if (-0x8000..=0xFFFF).contains(&value) {
        Ok(())
    } else {
        Err(EvalError::ValueTooHigh(value))
    }
}

fn push_word_le(out: &mut ByteArray, value: i64) {
    let v = value as u32 as u16;
    out.push((v & 0xFF) as u8);
    out.push((v >> 8) as u8);
}

/// Encodes a bare immediate/literal operand (modes `0x00`..`0x8B`).
pub fn encode_value(value: i64, force_word: bool) -> Result<ByteArray, EvalError> {
    check_range(value)?;
    let mut out = ByteArray::new();
    if !force_word && (0..=0x3F).contains(&value) {
        out.push(value as u8);
        return Ok(out);
    }
    if !force_word && (-64..=-1).contains(&value) {
        out.push(0x40 | ((value as i64 & 0x3F) as u8));
        return Ok(out);
    }
    if !force_word && (-0x80..=0xFF).contains(&value) {
        out.push(MODE_NEXT_V8);
        out.push(value as u8);
        return Ok(out);
    }
    out.push(MODE_NEXT_V16);
    push_word_le(&mut out, value);
    Ok(out)
}

/// Encodes register-direct addressing (mode `0x90..0x9F`).
#[must_use]
pub fn encode_register(reg: Reg) -> ByteArray {
    let mut out = ByteArray::new();
    out.push(MODE_REGISTER | reg.id());
    out
}

/// Encodes `[reg]` / `^[reg]` addressing (modes `0xA0..0xBF`).
#[must_use]
pub fn encode_indirect_reg(reg: Reg, word: bool) -> ByteArray {
    let mut out = ByteArray::new();
    let base = if word { MODE_REG_ADDR_WORD } else { MODE_REG_ADDR };
    out.push(base | reg.id());
    out
}

/// Encodes `[addr]` / `^[addr]` addressing through a fixed absolute
/// address (modes `0x8C..0x8F`).
pub fn encode_indirect_addr(value: i64, word: bool, force_word: bool) -> Result<ByteArray, EvalError> {
    check_range(value)?;
    let mut out = ByteArray::new();
    if !force_word && (0..=0xFF).contains(&value) {
        out.push(if word { MODE_ADDR_V8_WORD } else { MODE_ADDR_V8 });
        out.push(value as u8);
        return Ok(out);
    }
    out.push(if word { MODE_ADDR_V16_WORD } else { MODE_ADDR_V16 });
    push_word_le(&mut out, value);
    Ok(out)
}

/// Encodes `[reg+off]` / `^[reg+off]` addressing (modes
/// `0xC0..0xFF`). The 1-byte form accepts signed displacements
/// `-0x80..0x7F`; wider displacements fall back to the 16-bit form.
pub fn encode_indirect_reg_offset(
    reg: Reg,
    offset: i64,
    word: bool,
    force_word: bool,
) -> Result<ByteArray, EvalError> {
    check_range(offset)?;
    let mut out = ByteArray::new();
    if !force_word && (-0x80..=0x7F).contains(&offset) {
        let base = if word {
            MODE_REG_ADDR_V8_WORD
        } else {
            MODE_REG_ADDR_V8
        };
        out.push(base | reg.id());
        out.push(offset as i8 as u8);
        return Ok(out);
    }
    let base = if word {
        MODE_REG_ADDR_V16_WORD
    } else {
        MODE_REG_ADDR_V16
    };
    out.push(base | reg.id());
    push_word_le(&mut out, offset);
    Ok(out)
}

/// Encodes any resolved operand, dispatching to the mode-specific
/// encoder above.
pub fn encode(resolved: &Resolved, force_word: bool) -> Result<ByteArray, EvalError> {
    match *resolved {
        Resolved::Value(v) => encode_value(v, force_word),
        Resolved::Register(r) => Ok(encode_register(r)),
        Resolved::IndByte(v) => encode_indirect_addr(v, false, force_word),
        Resolved::IndWord(v) => encode_indirect_addr(v, true, force_word),
        Resolved::IndReg(r) => Ok(encode_indirect_reg(r, false)),
        Resolved::IndRegWord(r) => Ok(encode_indirect_reg(r, true)),
        Resolved::IndRegOffset(r, off) => encode_indirect_reg_offset(r, off, false, force_word),
        Resolved::IndRegOffsetWord(r, off) => encode_indirect_reg_offset(r, off, true, force_word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_positive_literal_is_single_byte() {
        let ba = encode_value(32, false).unwrap();
        assert_eq!(ba.as_slice(), &[0x20]);
    }

    #[test]
    fn small_negative_literal_uses_six_bit_twos_complement() {
        let ba = encode_value(-2, false).unwrap();
        assert_eq!(ba.as_slice(), &[0x7E]);
    }

    #[test]
    fn byte_range_literal_uses_next_v8() {
        let ba = encode_value(128, false).unwrap();
        assert_eq!(ba.as_slice(), &[0x8A, 0x80]);
    }

    #[test]
    fn word_range_literal_uses_next_v16() {
        let ba = encode_value(0x1234, false).unwrap();
        assert_eq!(ba.as_slice(), &[0x8B, 0x34, 0x12]);
    }

    #[test]
    fn reg_offset_within_signed_byte() {
        let ba = encode_indirect_reg_offset(Reg::B, 12, false, false).unwrap();
        assert_eq!(ba.as_slice(), &[0xC1, 0x0C]);
    }

    #[test]
    fn out_of_range_is_error() {
        let err = encode_value(0x123456, false).unwrap_err();
        assert_eq!(err, EvalError::ValueTooHigh(0x123456));
    }

    #[test]
    fn forced_word_skips_narrow_encodings() {
        let ba = encode_value(5, true).unwrap();
        assert_eq!(ba.as_slice(), &[0x8B, 0x05, 0x00]);
    }
}

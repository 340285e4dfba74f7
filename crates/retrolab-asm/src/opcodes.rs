//! Mnemonic → (opcode byte, operand count) table.
//!
//! Carried in `retrolab-asm` rather than shared with `retrolab-vm`:
//! the assembler only needs the byte values and arities, not
//! execution semantics, and the two crates are not meant to depend on
//! each other.

#[must_use]
pub fn lookup(mnemonic: &str) -> Option<(u8, u8)> {
    let lower = mnemonic.to_ascii_lowercase();
    Some(match lower.as_str() {
        "nop" => (0x00, 0),
        "dbg" => (0x01, 0),
        "mov" => (0x02, 2),
        "or" => (0x10, 2),
        "and" => (0x11, 2),
        "xor" => (0x12, 2),
        "shl" => (0x13, 2),
        "shr" => (0x14, 2),
        "not" => (0x15, 1),
        "add" => (0x20, 2),
        "sub" => (0x22, 2),
        "mul" => (0x24, 2),
        "div" => (0x26, 2),
        "div$" => (0x27, 2),
        "mod" => (0x29, 2),
        "inc" => (0x2A, 1),
        "dec" => (0x2B, 1),
        "ifne" => (0x30, 2),
        "ifeq" => (0x31, 2),
        "ifgt" => (0x32, 2),
        "ifgt$" => (0x33, 2),
        "iflt" => (0x35, 2),
        "iflt$" => (0x36, 2),
        "ifge" => (0x38, 2),
        "ifge$" => (0x39, 2),
        "ifle" => (0x3C, 2),
        "ifle$" => (0x3D, 2),
        "pushb" => (0x50, 1),
        "pushw" => (0x51, 1),
        "popb" => (0x52, 1),
        "popw" => (0x53, 1),
        "pusha" => (0x54, 0),
        "popa" => (0x55, 0),
        "popn" => (0x56, 1),
        "jmp" => (0x60, 1),
        "jsr" => (0x61, 1),
        "ret" => (0x62, 0),
        "dev" => (0x70, 2),
        "ivec" => (0x71, 2),
        "int" => (0x72, 2),
        "iret" => (0x73, 0),
        "wait" => (0x74, 0),
        "ienab" => (0x75, 1),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_signed_variants() {
        assert_eq!(lookup("div$"), Some((0x27, 2)));
        assert_eq!(lookup("IFGT$"), Some((0x33, 2)));
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert_eq!(lookup("frobnicate"), None);
    }
}

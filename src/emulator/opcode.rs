/// A raw instruction word split into the fields instructions are built from.
///
/// Written in hexadecimal an opcode reads `CXYN`, with the following fields:
/// - `class`: the top nibble
/// - `x`, `y`: register identifiers in the second and third nibble
/// - `n`: the lowest nibble
/// - `nn`: the lowest byte
/// - `nnn`: the lowest twelve bits, usually an address
///
/// Every `u16` splits into a valid `Opcode`. Whether the word means anything
/// is decided when it is turned into an `Instruction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub word: u16,
    pub class: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl Opcode {
    pub fn from_u16(word: u16) -> Opcode {
        let (left, right) = split_u16(word);
        Opcode {
            word,
            class: left >> 4,
            x: left & 0x0F,
            y: right >> 4,
            n: right & 0x0F,
            nn: right,
            nnn: word & 0x0FFF,
        }
    }

    /// Join two bytes fetched from memory, the first being the most significant.
    pub fn from_two_u8(left: u8, right: u8) -> Opcode {
        Opcode::from_u16(((left as u16) << 8) | right as u16)
    }

    /// The four nibbles, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.class, self.x, self.y, self.n)
    }
}

fn split_u16(value: u16) -> (u8, u8) {
    let left = (value & 0xFF00) >> 8;
    let right = value & 0x00FF;
    (left as u8, right as u8)
}

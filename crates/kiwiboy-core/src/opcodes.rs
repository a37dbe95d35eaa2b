use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::BuildError;

/// First byte of a two-byte opcode encoding; the second byte selects from the
/// secondary 256-entry table.
pub const PREFIX: u8 = 0xCB;

/// Embedded opcode description, keyed by textual hex opcode values. Parsed
/// once at console construction into dense byte-indexed tables.
const OPCODE_DATA: &str = include_str!("opcodes.json");

#[derive(Deserialize)]
struct RawTables {
    unprefixed: BTreeMap<String, RawOpcode>,
    cbprefixed: BTreeMap<String, RawOpcode>,
}

#[derive(Deserialize)]
struct RawOpcode {
    mnemonic: String,
    operands: Vec<String>,
    bytes: u8,
    cycles: Vec<u8>,
    flags: RawFlags,
}

#[derive(Deserialize)]
struct RawFlags {
    z: String,
    n: String,
    h: String,
    c: String,
}

/// How an instruction affects one flag bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagEffect {
    /// Left as-is.
    Unmodified,
    /// Forced to 0.
    Cleared,
    /// Forced to 1.
    Set,
    /// Computed from the operation's result.
    Dependent,
}

impl FlagEffect {
    fn parse(opcode: u8, effect: &str) -> Result<Self, BuildError> {
        match effect {
            "-" => Ok(FlagEffect::Unmodified),
            "0" => Ok(FlagEffect::Cleared),
            "1" => Ok(FlagEffect::Set),
            "Z" | "N" | "H" | "C" => Ok(FlagEffect::Dependent),
            _ => Err(BuildError::OpcodeFlagEffect {
                opcode,
                effect: effect.to_string(),
            }),
        }
    }
}

/// Flag-effect annotations for one opcode, in ZNHC order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagEffects {
    pub zero: FlagEffect,
    pub subtract: FlagEffect,
    pub half_carry: FlagEffect,
    pub carry: FlagEffect,
}

/// One decoded-instruction descriptor. Immutable after table load; identity
/// is the `(prefixed, byte)` pair.
#[derive(Clone, Debug)]
pub struct Opcode {
    pub byte: u8,
    pub prefixed: bool,
    pub mnemonic: String,
    pub operands: Vec<String>,
    /// Encoded length in bytes, prefix included.
    pub bytes: u8,
    /// Cycle cost; for conditional control flow, the branch-taken cost.
    pub cycles: u8,
    /// Branch-not-taken cost, for opcodes that declare two costs.
    pub cycles_not_taken: Option<u8>,
    pub flags: FlagEffects,
}

/// A fetched instruction: the address it was decoded at plus its descriptor.
/// Created per step, discarded after execution.
#[derive(Clone, Copy)]
pub struct Instruction<'a> {
    pub addr: u16,
    pub opcode: &'a Opcode,
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}: {}", self.addr, self.opcode.mnemonic)?;
        if !self.opcode.operands.is_empty() {
            write!(f, " {}", self.opcode.operands.join(","))?;
        }
        Ok(())
    }
}

/// The two dense decode tables, indexed directly by the raw byte value.
/// Undefined/reserved encodings hold `None`.
pub struct OpcodeTable {
    unprefixed: [Option<Opcode>; 256],
    cbprefixed: [Option<Opcode>; 256],
}

impl OpcodeTable {
    /// Parse the embedded description. Failures here are construction-time
    /// errors; no stepping may begin without a table.
    pub fn load() -> Result<Self, BuildError> {
        Self::from_json(OPCODE_DATA)
    }

    fn from_json(data: &str) -> Result<Self, BuildError> {
        let raw: RawTables = serde_json::from_str(data)?;
        Ok(Self {
            unprefixed: Self::build_table(raw.unprefixed, false)?,
            cbprefixed: Self::build_table(raw.cbprefixed, true)?,
        })
    }

    fn build_table(
        raw: BTreeMap<String, RawOpcode>,
        prefixed: bool,
    ) -> Result<[Option<Opcode>; 256], BuildError> {
        let mut table: [Option<Opcode>; 256] = std::array::from_fn(|_| None);
        for (key, raw_op) in raw {
            let byte = key
                .strip_prefix("0x")
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| BuildError::OpcodeKey { key: key.clone() })?;

            let (cycles, cycles_not_taken) = match raw_op.cycles.as_slice() {
                &[taken] => (taken, None),
                &[taken, not_taken] => (taken, Some(not_taken)),
                other => {
                    return Err(BuildError::OpcodeCycles {
                        opcode: byte,
                        count: other.len(),
                    });
                }
            };

            table[byte as usize] = Some(Opcode {
                byte,
                prefixed,
                mnemonic: raw_op.mnemonic,
                operands: raw_op.operands,
                bytes: raw_op.bytes,
                cycles,
                cycles_not_taken,
                flags: FlagEffects {
                    zero: FlagEffect::parse(byte, &raw_op.flags.z)?,
                    subtract: FlagEffect::parse(byte, &raw_op.flags.n)?,
                    half_carry: FlagEffect::parse(byte, &raw_op.flags.h)?,
                    carry: FlagEffect::parse(byte, &raw_op.flags.c)?,
                },
            });
        }
        Ok(table)
    }

    /// O(1) descriptor lookup; `None` for undefined encodings.
    pub fn opcode(&self, byte: u8, prefixed: bool) -> Option<&Opcode> {
        if prefixed {
            self.cbprefixed[byte as usize].as_ref()
        } else {
            self.unprefixed[byte as usize].as_ref()
        }
    }

    /// Decode the byte fetched at `addr`. `None` means the byte has no
    /// defined meaning in the selected space; the caller must treat that as
    /// a fatal decode failure, not a no-op.
    pub fn instruction_from_byte(
        &self,
        addr: u16,
        byte: u8,
        prefixed: bool,
    ) -> Option<Instruction<'_>> {
        self.opcode(byte, prefixed)
            .map(|opcode| Instruction { addr, opcode })
    }
}

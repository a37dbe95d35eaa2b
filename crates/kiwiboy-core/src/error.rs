use thiserror::Error;

use crate::hardware::Model;

/// Errors raised while constructing a console, before any stepping begins.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("opcode table failed to parse: {0}")]
    OpcodeTable(#[from] serde_json::Error),

    #[error("opcode table key {key:?} is not a two-digit hex byte")]
    OpcodeKey { key: String },

    #[error("opcode {opcode:#04X} declares {count} cycle costs (expected 1 or 2)")]
    OpcodeCycles { opcode: u8, count: usize },

    #[error("opcode {opcode:#04X} declares flag effect {effect:?}")]
    OpcodeFlagEffect { opcode: u8, effect: String },

    #[error("double-speed requested but {model:?} does not support it")]
    UnsupportedFeature { model: Model },
}

/// Fatal conditions encountered while stepping the CPU.
///
/// These terminate the emulation session; the decision to exit the process
/// belongs to the host, never to the core.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("undefined opcode {opcode:#04X} (prefixed: {prefixed}) at {addr:#06X}")]
    UnknownOpcode {
        opcode: u8,
        prefixed: bool,
        addr: u16,
    },
}

use parse_display::Display;
use thiserror::Error;
use tracing::debug;

use crate::codec;
use crate::constants::INSTRUCTION_LENGTH;

use super::registers::{Reg, RegisterError};
use super::{Fault, Machine};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// A decoded instruction.
///
/// Operands are resolved once, at decode time: every operand is a
/// register reference except `SET`'s second one, which is a literal
/// half-word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// Load the byte addressed by the first register into the second
    #[display("LOAD {0}, {1}")]
    Load(Reg, Reg),

    /// Store the low byte of the first register at the address held by
    /// the second
    #[display("STORE {0}, {1}")]
    Store(Reg, Reg),

    /// Write a literal half-word into a register
    #[display("SET {0}, {1}")]
    Set(Reg, u16),

    /// Load the half-word addressed by the first register into the
    /// second
    #[display("LOADH {0}, {1}")]
    Loadh(Reg, Reg),

    /// Store the full half-word of the first register at the address
    /// held by the second
    #[display("STOREH {0}, {1}")]
    Storeh(Reg, Reg),

    /// Add the second register to the first, wrapping on overflow
    #[display("ADD {0}, {1}")]
    Add(Reg, Reg),

    /// Subtract the second register from the first, wrapping on
    /// underflow
    #[display("SUB {0}, {1}")]
    Sub(Reg, Reg),

    /// Jump to the address held by the first register if the second
    /// decodes to zero
    #[display("CJUMP {0}, {1}")]
    Cjump(Reg, Reg),

    /// Copy the first register into the second
    #[display("MOV {0}, {1}")]
    Mov(Reg, Reg),
}

impl Instruction {
    /// Decode a 5-byte window: opcode, operand1, operand2
    ///
    /// # Errors
    ///
    /// Fails on an opcode byte with no table entry, or on an operand
    /// that does not resolve to a register.
    pub fn decode(window: [u8; INSTRUCTION_LENGTH]) -> Result<Self, DecodeError> {
        let operand1 = codec::halfword(window[1], window[2]);
        let operand2 = codec::halfword(window[3], window[4]);

        let instruction = match window[0] {
            0x01 => Self::Load(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x02 => Self::Store(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x03 => Self::Set(Reg::from_code(operand1)?, operand2),
            0x04 => Self::Loadh(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x05 => Self::Storeh(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x06 => Self::Add(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x07 => Self::Sub(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x08 => Self::Cjump(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            0x09 => Self::Mov(Reg::from_code(operand1)?, Reg::from_code(operand2)?),
            other => return Err(DecodeError::UnknownOpcode(other)),
        };

        Ok(instruction)
    }

    /// Encode back into the 5-byte wire form
    #[must_use]
    pub fn encode(self) -> [u8; INSTRUCTION_LENGTH] {
        let (opcode, operand1, operand2) = match self {
            Self::Load(a, b) => (0x01, a.code(), b.code()),
            Self::Store(a, b) => (0x02, a.code(), b.code()),
            Self::Set(reg, value) => (0x03, reg.code(), value),
            Self::Loadh(a, b) => (0x04, a.code(), b.code()),
            Self::Storeh(a, b) => (0x05, a.code(), b.code()),
            Self::Add(a, b) => (0x06, a.code(), b.code()),
            Self::Sub(a, b) => (0x07, a.code(), b.code()),
            Self::Cjump(a, b) => (0x08, a.code(), b.code()),
            Self::Mov(a, b) => (0x09, a.code(), b.code()),
        };

        let (high1, low1) = codec::halfword_bytes(operand1);
        let (high2, low2) = codec::halfword_bytes(operand2);
        [opcode, high1, low1, high2, low2]
    }

    /// Execute the instruction.
    ///
    /// Every instruction advances `RPC` by one instruction length,
    /// except `CJUMP`: taken it replaces `RPC` outright, not taken it
    /// leaves `RPC` untouched.
    pub(crate) fn execute(self, machine: &mut Machine) -> Result<(), Fault> {
        use Instruction::{Add, Cjump, Load, Loadh, Mov, Set, Store, Storeh, Sub};

        match self {
            Set(reg, value) => {
                machine.registers.set(reg, value)?;
                machine.advance();
            }

            Mov(source, destination) => {
                let value = machine.registers.get(source);
                machine.registers.set(destination, value)?;
                machine.advance();
            }

            Load(address, destination) => {
                let address = u32::from(machine.registers.get(address));
                let value = machine.memory.get(address)?;
                machine.registers.set(destination, u16::from(value))?;
                machine.advance();
            }

            Store(source, address) => {
                let (_, low) = codec::halfword_bytes(machine.registers.get(source));
                let address = u32::from(machine.registers.get(address));
                machine.memory.set(address, low)?;
                machine.advance();
            }

            Loadh(address, destination) => {
                let address = u32::from(machine.registers.get(address));
                let value = machine.memory.get_halfword(address)?;
                machine.registers.set(destination, value)?;
                machine.advance();
            }

            Storeh(source, address) => {
                let value = machine.registers.get(source);
                let address = u32::from(machine.registers.get(address));
                machine.memory.set_halfword(address, value)?;
                machine.advance();
            }

            Add(a, b) => {
                let lhs = machine.registers.get(a);
                let rhs = machine.registers.get(b);
                let result = lhs.wrapping_add(rhs);
                debug!("{lhs} + {rhs} = {result}");
                machine.registers.set(a, result)?;
                machine.advance();
            }

            Sub(a, b) => {
                let lhs = machine.registers.get(a);
                let rhs = machine.registers.get(b);
                let result = lhs.wrapping_sub(rhs);
                debug!("{lhs} - {rhs} = {result}");
                machine.registers.set(a, result)?;
                machine.advance();
            }

            Cjump(target, test) => {
                if machine.registers.get(test) == 0 {
                    let address = machine.registers.get(target);
                    debug!("jumping to address {address}");
                    machine.registers.set_privileged(Reg::Rpc, address);
                }
                // Not taken: RPC stays put and the instruction
                // re-executes on the next cycle.
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_test() {
        // SET R00, 5
        let instruction = Instruction::decode([0x03, 0x00, 0x01, 0x00, 0x05]).unwrap();
        assert_eq!(instruction, Instruction::Set(Reg::R00, 5));

        // ADD R01, R02
        let instruction = Instruction::decode([0x06, 0x00, 0x02, 0x00, 0x03]).unwrap();
        assert_eq!(instruction, Instruction::Add(Reg::R01, Reg::R02));

        // CJUMP RPC, RSP decodes fine, both operands are register codes
        let instruction = Instruction::decode([0x08, 0x00, 0x0b, 0x00, 0x0c]).unwrap();
        assert_eq!(instruction, Instruction::Cjump(Reg::Rpc, Reg::Rsp));
    }

    #[test]
    fn decode_invalid_opcode_test() {
        assert_eq!(
            Instruction::decode([0x00, 0x00, 0x01, 0x00, 0x01]),
            Err(DecodeError::UnknownOpcode(0x00))
        );
        assert_eq!(
            Instruction::decode([0x0a, 0x00, 0x01, 0x00, 0x01]),
            Err(DecodeError::UnknownOpcode(0x0a))
        );
    }

    #[test]
    fn decode_invalid_register_test() {
        // MOV with an operand that is no register code
        assert_eq!(
            Instruction::decode([0x09, 0x00, 0x00, 0x00, 0x01]),
            Err(DecodeError::Register(RegisterError::Unknown(0)))
        );
        assert_eq!(
            Instruction::decode([0x09, 0x00, 0x01, 0xff, 0xff]),
            Err(DecodeError::Register(RegisterError::Unknown(0xffff)))
        );
    }

    #[test]
    fn encode_roundtrip_test() {
        let instructions = [
            Instruction::Load(Reg::R00, Reg::R01),
            Instruction::Store(Reg::R09, Reg::R02),
            Instruction::Set(Reg::R03, 0xffff),
            Instruction::Loadh(Reg::R04, Reg::R05),
            Instruction::Storeh(Reg::R06, Reg::R07),
            Instruction::Add(Reg::R08, Reg::R09),
            Instruction::Sub(Reg::R00, Reg::R00),
            Instruction::Cjump(Reg::R01, Reg::R02),
            Instruction::Mov(Reg::R03, Reg::R04),
        ];

        for instruction in instructions {
            assert_eq!(Instruction::decode(instruction.encode()), Ok(instruction));
        }
    }

    #[test]
    fn display_test() {
        assert_eq!(Instruction::Set(Reg::R00, 5).to_string(), "SET R00, 5");
        assert_eq!(
            Instruction::Cjump(Reg::R01, Reg::R02).to_string(),
            "CJUMP R01, R02"
        );
    }
}

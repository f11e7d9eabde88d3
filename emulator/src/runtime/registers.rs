use parse_display::Display;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("unknown register code {0:#06x}")]
    Unknown(u16),

    #[error("register {0} is read-only")]
    ReadOnly(Reg),
}

/// A register name.
///
/// Besides its name, every register carries a fixed half-word code used
/// when an instruction operand addresses it indirectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "UPPERCASE")]
pub enum Reg {
    /// Program counter
    Rpc,

    /// Length of the loaded program; doubles as the halt sentinel
    Rsp,

    /// General purpose
    R00,
    R01,
    R02,
    R03,
    R04,
    R05,
    R06,
    R07,
    R08,
    R09,
}

impl Reg {
    pub const ALL: [Reg; 12] = [
        Reg::Rpc,
        Reg::Rsp,
        Reg::R00,
        Reg::R01,
        Reg::R02,
        Reg::R03,
        Reg::R04,
        Reg::R05,
        Reg::R06,
        Reg::R07,
        Reg::R08,
        Reg::R09,
    ];

    /// The half-word code addressing this register in an operand
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Reg::R00 => 1,
            Reg::R01 => 2,
            Reg::R02 => 3,
            Reg::R03 => 4,
            Reg::R04 => 5,
            Reg::R05 => 6,
            Reg::R06 => 7,
            Reg::R07 => 8,
            Reg::R08 => 9,
            Reg::R09 => 10,
            Reg::Rpc => 11,
            Reg::Rsp => 12,
        }
    }

    /// Resolve a register code back to its name
    ///
    /// # Errors
    ///
    /// Fails if no register carries this code.
    pub const fn from_code(code: u16) -> Result<Self, RegisterError> {
        match code {
            1 => Ok(Reg::R00),
            2 => Ok(Reg::R01),
            3 => Ok(Reg::R02),
            4 => Ok(Reg::R03),
            5 => Ok(Reg::R04),
            6 => Ok(Reg::R05),
            7 => Ok(Reg::R06),
            8 => Ok(Reg::R07),
            9 => Ok(Reg::R08),
            10 => Ok(Reg::R09),
            11 => Ok(Reg::Rpc),
            12 => Ok(Reg::Rsp),
            other => Err(RegisterError::Unknown(other)),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// `RPC` and `RSP` only move through the privileged write path
    const fn is_protected(self) -> bool {
        matches!(self, Reg::Rpc | Reg::Rsp)
    }
}

#[derive(Error, Debug)]
#[error("could not parse register")]
pub struct RegisterParseError;

impl std::str::FromStr for Reg {
    type Err = RegisterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RPC" => Ok(Reg::Rpc),
            "RSP" => Ok(Reg::Rsp),
            "R00" => Ok(Reg::R00),
            "R01" => Ok(Reg::R01),
            "R02" => Ok(Reg::R02),
            "R03" => Ok(Reg::R03),
            "R04" => Ok(Reg::R04),
            "R05" => Ok(Reg::R05),
            "R06" => Ok(Reg::R06),
            "R07" => Ok(Reg::R07),
            "R08" => Ok(Reg::R08),
            "R09" => Ok(Reg::R09),
            _ => Err(RegisterParseError),
        }
    }
}

/// The register file: twelve half-word slots, all zero on startup
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    slots: [u16; 12],
}

impl Registers {
    #[must_use]
    pub fn get(&self, reg: Reg) -> u16 {
        self.slots[reg.index()]
    }

    /// Set a register value
    ///
    /// # Errors
    ///
    /// Fails on `RPC` and `RSP`: those are read-only for programs and
    /// only move through [`Registers::set_privileged`].
    pub fn set(&mut self, reg: Reg, value: u16) -> Result<(), RegisterError> {
        if reg.is_protected() {
            return Err(RegisterError::ReadOnly(reg));
        }
        self.slots[reg.index()] = value;
        Ok(())
    }

    /// Write a register, bypassing the read-only check.
    ///
    /// Reserved for program counter management: startup, the advance
    /// after each instruction, and a taken `CJUMP`.
    pub fn set_privileged(&mut self, reg: Reg, value: u16) {
        self.slots[reg.index()] = value;
    }

    /// Independent snapshot of all register values, for diagnostics
    #[must_use]
    pub fn dump(&self) -> Registers {
        *self
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, reg) in Reg::ALL.into_iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{} = {}", reg, self.get(reg))?;
        }
        Ok(())
    }
}

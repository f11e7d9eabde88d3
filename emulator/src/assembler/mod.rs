//! Assembly front-end for the fixed 5-byte instruction encoding.
//!
//! One instruction per line: a mnemonic and two comma separated
//! operands. Register operands are written by name (`R00`..`R09`,
//! `RPC`, `RSP`); `SET`'s second operand is a number literal. Blank
//! lines are skipped and `;` starts a comment. The parsing is handled
//! by the `nom` library.

use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt, rest};
use nom::sequence::preceded;
use nom::{Finish, IResult};
use thiserror::Error;

use crate::codec;
use crate::runtime::{Instruction, Reg};

mod literal;

use self::literal::parse_literal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("syntax error on line {line}")]
    Syntax { line: usize },

    #[error("unknown mnemonic {mnemonic:?} on line {line}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("bad operands for {mnemonic} on line {line}")]
    BadOperands { line: usize, mnemonic: String },
}

/// A parsed operand, before it is matched against the mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Register(Reg),
    Literal(u16),
}

fn parse_mnemonic(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic())(input)
}

/// Parse a register by name, case-insensitive
fn parse_register(input: &str) -> IResult<&str, Reg> {
    map_res(
        take_while1(|c: char| c.is_ascii_alphanumeric()),
        Reg::from_str,
    )(input)
}

fn parse_operand(input: &str) -> IResult<&str, Operand> {
    alt((
        map(parse_register, Operand::Register),
        map(parse_literal, Operand::Literal),
    ))(input)
}

/// Parse a full statement: mnemonic plus two operands
fn parse_statement(input: &str) -> IResult<&str, (&str, [Operand; 2])> {
    let (input, mnemonic) = parse_mnemonic(input)?;
    let (input, _) = space1(input)?;
    let (input, first) = parse_operand(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(',')(input)?;
    let (input, _) = space0(input)?;
    let (input, second) = parse_operand(input)?;
    Ok((input, (mnemonic, [first, second])))
}

/// Parse one line: optional statement, optional `;` comment
fn parse_line(input: &str) -> IResult<&str, Option<(&str, [Operand; 2])>> {
    let (input, _) = space0(input)?;
    let (input, statement) = opt(parse_statement)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = opt(preceded(char(';'), rest))(input)?;
    Ok((input, statement))
}

enum BuildProblem {
    UnknownMnemonic,
    BadOperands,
}

fn build(mnemonic: &str, operands: [Operand; 2]) -> Result<Instruction, BuildProblem> {
    use Operand::{Literal, Register};

    let instruction = match (mnemonic.to_ascii_uppercase().as_str(), operands) {
        ("LOAD", [Register(a), Register(b)]) => Instruction::Load(a, b),
        ("STORE", [Register(a), Register(b)]) => Instruction::Store(a, b),
        ("SET", [Register(reg), Literal(value)]) => Instruction::Set(reg, value),
        ("LOADH", [Register(a), Register(b)]) => Instruction::Loadh(a, b),
        ("STOREH", [Register(a), Register(b)]) => Instruction::Storeh(a, b),
        ("ADD", [Register(a), Register(b)]) => Instruction::Add(a, b),
        ("SUB", [Register(a), Register(b)]) => Instruction::Sub(a, b),
        ("CJUMP", [Register(a), Register(b)]) => Instruction::Cjump(a, b),
        ("MOV", [Register(a), Register(b)]) => Instruction::Mov(a, b),
        (
            "LOAD" | "STORE" | "SET" | "LOADH" | "STOREH" | "ADD" | "SUB" | "CJUMP" | "MOV",
            _,
        ) => return Err(BuildProblem::BadOperands),
        _ => return Err(BuildProblem::UnknownMnemonic),
    };

    Ok(instruction)
}

/// Assemble a textual program into its instruction list
///
/// # Errors
///
/// Fails on the first line that does not parse or does not match any
/// instruction shape, naming the line.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssembleError> {
    let mut program = Vec::new();

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let (_, statement) = all_consuming(parse_line)(text)
            .finish()
            .map_err(|_: nom::error::Error<&str>| AssembleError::Syntax { line })?;

        let Some((mnemonic, operands)) = statement else {
            continue;
        };

        let instruction = build(mnemonic, operands).map_err(|problem| match problem {
            BuildProblem::UnknownMnemonic => AssembleError::UnknownMnemonic {
                line,
                mnemonic: mnemonic.into(),
            },
            BuildProblem::BadOperands => AssembleError::BadOperands {
                line,
                mnemonic: mnemonic.to_ascii_uppercase(),
            },
        })?;
        program.push(instruction);
    }

    Ok(program)
}

/// Render an assembled program in the program image format
#[must_use]
pub fn to_image(program: &[Instruction]) -> String {
    let bytes: Vec<u8> = program
        .iter()
        .flat_map(|instruction| instruction.encode())
        .collect();
    codec::format_image(&bytes)
}

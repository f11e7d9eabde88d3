use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use tracing::info;

use hw16_emulator::codec;
use hw16_emulator::constants::INSTRUCTION_LENGTH;
use hw16_emulator::runtime::Instruction;

#[derive(Parser, Debug)]
pub struct DisasmOpt {
    /// Program image file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl DisasmOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program image");
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("could not read {}", self.input))?;

        let image = codec::parse_image(&source)?;

        let mut chunks = image.chunks_exact(INSTRUCTION_LENGTH);
        for (index, chunk) in chunks.by_ref().enumerate() {
            let address = index * INSTRUCTION_LENGTH;
            let mut window = [0_u8; INSTRUCTION_LENGTH];
            window.copy_from_slice(chunk);

            // Not everything in an image has to be code; dump what does
            // not decode as raw bytes
            match Instruction::decode(window) {
                Ok(instruction) => println!("{address:#06x}  {instruction}"),
                Err(_) => println!("{address:#06x}  {}", codec::format_image(chunk)),
            }
        }

        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            let address = image.len() - remainder.len();
            println!("{address:#06x}  {}", codec::format_image(remainder));
        }

        Ok(())
    }
}

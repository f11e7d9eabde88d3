use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use tracing::{debug, info};

use hw16_emulator::assembler;

#[derive(Parser, Debug)]
pub struct AssembleOpt {
    /// Input assembly file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Output image file. Prints to stdout when omitted.
    #[clap(short, long, value_parser, value_hint = ValueHint::FilePath)]
    output: Option<Utf8PathBuf>,
}

impl AssembleOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program");
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("could not read {}", self.input))?;

        debug!("Assembling program");
        let program = assembler::assemble(&source)?;
        let image = assembler::to_image(&program);
        info!(instructions = program.len(), "Program assembled");

        match self.output {
            Some(path) => {
                std::fs::write(&path, image + "\n")
                    .with_context(|| format!("could not write {path}"))?;
            }
            None => println!("{image}"),
        }

        Ok(())
    }
}

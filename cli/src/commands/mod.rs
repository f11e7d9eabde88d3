mod assemble;
mod completion;
mod disasm;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Load and run a program image
    Run(self::run::RunOpt),

    /// Assemble a textual program into a program image
    Assemble(self::assemble::AssembleOpt),

    /// Decode the instruction stream of a program image
    Disasm(self::disasm::DisasmOpt),

    /// Generate shell completion scripts
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Subcommand::Run(opt) => opt.exec(),
            Subcommand::Assemble(opt) => opt.exec(),
            Subcommand::Disasm(opt) => opt.exec(),
            Subcommand::Completion(opt) => opt.exec(),
        }
    }
}

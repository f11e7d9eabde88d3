use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use tracing::{debug, info};

use hw16_emulator::runtime::{Color, DisplaySink};
use hw16_emulator::{Machine, RunOptions};

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Program image file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Pause between cycles, in milliseconds
    #[clap(long, default_value_t = 0)]
    delay: u64,

    /// Skip the device bus adapter entirely
    #[clap(long, action = ArgAction::SetTrue)]
    no_device: bool,

    /// Collect and print per-cycle timing statistics
    #[clap(long, action = ArgAction::SetTrue)]
    timing: bool,
}

/// Display sink reporting device commands through tracing.
///
/// The actual window backend lives out of tree; this one makes device
/// activity observable on the terminal.
#[derive(Debug, Default)]
struct TraceSink {
    buffered: usize,
}

impl DisplaySink for TraceSink {
    fn set_pixel(&mut self, x: u16, y: u16, color: Color) {
        self.buffered += 1;
        debug!(target: "device", x, y, %color, "pixel buffered");
    }

    fn present(&mut self) {
        info!(target: "device", buffered = self.buffered, "frame presented");
        self.buffered = 0;
    }

    fn clear(&mut self) {
        info!(target: "device", "display cleared");
        self.buffered = 0;
    }
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program image");
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("could not read {}", self.input))?;

        let mut machine = Machine::load(&source)?;

        let options = RunOptions {
            delay: (self.delay > 0).then(|| Duration::from_millis(self.delay)),
            device_enabled: !self.no_device,
            collect_timing: self.timing,
        };

        info!("Running program");
        let mut sink = TraceSink::default();
        let report = machine.run(&mut sink, &options)?;

        info!(registers = %machine.registers.dump(), "End of program");

        if self.timing {
            println!("{report}");
        }
        if options.delay.is_some() && self.timing {
            info!("timing figures include the artificial inter-cycle delay");
        }

        Ok(())
    }
}

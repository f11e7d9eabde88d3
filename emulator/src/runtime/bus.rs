//! Memory-mapped device bus.
//!
//! The adapter is polled by the machine loop once per cycle, after the
//! instruction executed; no CPU opcode reaches it. It reads the byte at
//! [`DEVICE_BUS_POINTER`] as a device opcode, decodes the payload that
//! follows it, and forwards the resulting command to a [`DisplaySink`].
//! How the sink renders pixels is not this crate's business.

use thiserror::Error;
use tracing::debug;

use crate::constants::DEVICE_BUS_POINTER;

use super::memory::{Memory, MemoryError};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("invalid device opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// An RGB color unpacked from the packed 5/6/5 wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Unpack a half-word holding 5/6/5 red/green/blue bit-fields.
    ///
    /// Each field is scaled so that an all-ones field maps to exactly
    /// 255.
    #[must_use]
    pub fn unpack(packed: u16) -> Self {
        Self {
            red: scale(packed >> 11, 5),
            green: scale(packed >> 5, 6),
            blue: scale(packed, 5),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Scale the low `width` bits of `field` to the 0..=255 range
fn scale(field: u16, width: u32) -> u8 {
    let max = (1_u32 << width) - 1;
    let field = u32::from(field) & max;
    u8::try_from(field * 255 / max).unwrap_or(u8::MAX)
}

/// A command decoded from the device bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Buffer one pixel (device opcode 0)
    SetPixel { x: u16, y: u16, color: Color },

    /// Present the buffered frame (device opcode 1)
    Present,

    /// Clear the display (device opcode 2)
    Clear,
}

impl DeviceCommand {
    /// Decode the command currently on the bus.
    ///
    /// A set-pixel command carries three half-words of payload right
    /// after the opcode byte: x position, y position and packed color.
    ///
    /// # Errors
    ///
    /// Fails on a device opcode with no table entry, or if the payload
    /// would fall out of memory.
    pub fn decode(memory: &Memory) -> Result<Self, BusError> {
        let pointer = u32::from(DEVICE_BUS_POINTER);
        match memory.get(pointer)? {
            0x00 => {
                let x = memory.get_halfword(pointer + 1)?;
                let y = memory.get_halfword(pointer + 3)?;
                let color = Color::unpack(memory.get_halfword(pointer + 5)?);
                Ok(Self::SetPixel { x, y, color })
            }
            0x01 => Ok(Self::Present),
            0x02 => Ok(Self::Clear),
            other => Err(BusError::UnknownOpcode(other)),
        }
    }
}

/// Capability consumed by the device bus: an abstract display.
///
/// The machine core only emits commands; rasterization, windowing and
/// frame pacing live behind this trait, out of tree.
pub trait DisplaySink {
    fn set_pixel(&mut self, x: u16, y: u16, color: Color);
    fn present(&mut self);
    fn clear(&mut self);
}

/// A sink that drops every command, for device-less runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn set_pixel(&mut self, _x: u16, _y: u16, _color: Color) {}
    fn present(&mut self) {}
    fn clear(&mut self) {}
}

/// Run one bus cycle: decode the command on the bus and forward it
pub(crate) fn poll<S: DisplaySink>(memory: &Memory, sink: &mut S) -> Result<(), BusError> {
    match DeviceCommand::decode(memory)? {
        DeviceCommand::SetPixel { x, y, color } => {
            debug!(target: "device", x, y, color = %color, "set pixel");
            sink.set_pixel(x, y, color);
        }
        DeviceCommand::Present => {
            debug!(target: "device", "present");
            sink.present();
        }
        DeviceCommand::Clear => {
            debug!(target: "device", "clear");
            sink.clear();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct RecordingSink {
        pixels: Vec<(u16, u16, Color)>,
        presents: usize,
        clears: usize,
    }

    impl DisplaySink for RecordingSink {
        fn set_pixel(&mut self, x: u16, y: u16, color: Color) {
            self.pixels.push((x, y, color));
        }

        fn present(&mut self) {
            self.presents += 1;
        }

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    #[test]
    fn color_unpack_test() {
        // All ones unpacks to pure white
        assert_eq!(
            Color::unpack(0xffff),
            Color {
                red: 255,
                green: 255,
                blue: 255
            }
        );

        assert_eq!(
            Color::unpack(0x0000),
            Color {
                red: 0,
                green: 0,
                blue: 0
            }
        );

        // Lone fields
        assert_eq!(Color::unpack(0b11111_000000_00000).red, 255);
        assert_eq!(Color::unpack(0b00000_111111_00000).green, 255);
        assert_eq!(Color::unpack(0b00000_000000_11111).blue, 255);
        assert_eq!(Color::unpack(0b10000_000000_00000).red, 131); // 16 * 255 / 31
    }

    #[test]
    fn idle_bus_buffers_origin_pixel_test() {
        // A fresh memory holds opcode 0 on the bus: a black pixel at
        // the origin
        let memory = Memory::default();
        assert_eq!(
            DeviceCommand::decode(&memory),
            Ok(DeviceCommand::SetPixel {
                x: 0,
                y: 0,
                color: Color {
                    red: 0,
                    green: 0,
                    blue: 0
                }
            })
        );
    }

    #[test]
    fn decode_test() {
        let mut memory = Memory::default();
        let pointer = u32::from(DEVICE_BUS_POINTER);

        memory.set(pointer, 0x00).unwrap();
        memory.set_halfword(pointer + 1, 12).unwrap();
        memory.set_halfword(pointer + 3, 34).unwrap();
        memory.set_halfword(pointer + 5, 0xffff).unwrap();
        assert_eq!(
            DeviceCommand::decode(&memory),
            Ok(DeviceCommand::SetPixel {
                x: 12,
                y: 34,
                color: Color {
                    red: 255,
                    green: 255,
                    blue: 255
                }
            })
        );

        memory.set(pointer, 0x01).unwrap();
        assert_eq!(DeviceCommand::decode(&memory), Ok(DeviceCommand::Present));

        memory.set(pointer, 0x02).unwrap();
        assert_eq!(DeviceCommand::decode(&memory), Ok(DeviceCommand::Clear));

        memory.set(pointer, 0xff).unwrap();
        assert_eq!(
            DeviceCommand::decode(&memory),
            Err(BusError::UnknownOpcode(0xff))
        );
    }

    #[test]
    fn poll_forwards_commands_test() {
        let mut memory = Memory::default();
        let mut sink = RecordingSink::default();
        let pointer = u32::from(DEVICE_BUS_POINTER);

        memory.set_halfword(pointer + 1, 3).unwrap();
        memory.set_halfword(pointer + 3, 4).unwrap();
        memory.set_halfword(pointer + 5, 0xffff).unwrap();
        poll(&memory, &mut sink).unwrap();

        memory.set(pointer, 0x01).unwrap();
        poll(&memory, &mut sink).unwrap();

        memory.set(pointer, 0x02).unwrap();
        poll(&memory, &mut sink).unwrap();

        assert_eq!(
            sink,
            RecordingSink {
                pixels: vec![(
                    3,
                    4,
                    Color {
                        red: 255,
                        green: 255,
                        blue: 255
                    }
                )],
                presents: 1,
                clears: 1,
            }
        );
    }
}

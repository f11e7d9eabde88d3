/// Total size of the machine memory, in bytes
pub const MEMORY_SIZE: u32 = 1 << 16;

/// Every instruction is 5 bytes long: one opcode byte followed by two
/// big-endian half-word operands
pub const INSTRUCTION_LENGTH: usize = 5;

/// Address of the device opcode byte, polled by the device bus adapter
/// on every cycle. The command payload follows it in memory.
pub const DEVICE_BUS_POINTER: u16 = 0xFF00;

use thiserror::Error;

use crate::codec;
use crate::constants::MEMORY_SIZE;

/// Represents errors related to memory accesses
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address does not exist
    #[error("invalid address {0}")]
    OutOfBounds(u32),
}

/// Holds the memory cells of the machine.
///
/// It has 65536 byte-wide cells, all zero on startup. Addresses are
/// taken as `u32` because computed addresses (base + offset) may step
/// past the last cell and must then fail the access.
pub struct Memory {
    inner: Box<[u8; MEMORY_SIZE as usize]>,
}

// Implement clone without going through a stack-allocated array
impl Clone for Memory {
    fn clone(&self) -> Self {
        let mut new = Self::default();
        new.inner.copy_from_slice(&self.inner[..]);
        new
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: vec![0_u8; MEMORY_SIZE as usize]
                .into_boxed_slice()
                .try_into()
                .unwrap(),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ [...] }}")
    }
}

impl Memory {
    /// Read the byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: u32) -> Result<u8, MemoryError> {
        self.inner
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::OutOfBounds(address))
    }

    /// Overwrite the byte at an address.
    ///
    /// There are no protected regions: the cells holding the running
    /// instruction stream can be overwritten too.
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn set(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        let cell = self
            .inner
            .get_mut(address as usize)
            .ok_or(MemoryError::OutOfBounds(address))?;
        *cell = value;
        Ok(())
    }

    /// Read the big-endian half-word starting at an address
    ///
    /// # Errors
    ///
    /// It fails if either cell is out of bounds.
    pub fn get_halfword(&self, address: u32) -> Result<u16, MemoryError> {
        let high = self.get(address)?;
        let low = self.get(address + 1)?;
        Ok(codec::halfword(high, low))
    }

    /// Write a half-word to two consecutive cells, high byte first
    ///
    /// # Errors
    ///
    /// It fails if either cell is out of bounds.
    pub fn set_halfword(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        let (high, low) = codec::halfword_bytes(value);
        self.set(address, high)?;
        self.set(address + 1, low)
    }

    /// Copy a program image into memory, starting at address 0
    ///
    /// # Errors
    ///
    /// It fails if the image is larger than the memory.
    pub fn load(&mut self, image: &[u8]) -> Result<(), MemoryError> {
        let len = u32::try_from(image.len()).map_err(|_| MemoryError::OutOfBounds(u32::MAX))?;
        if len > MEMORY_SIZE {
            return Err(MemoryError::OutOfBounds(len));
        }
        self.inner[..image.len()].copy_from_slice(image);
        Ok(())
    }
}

use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::state::{State, LOAD_ADDRESS, STACK_SEGMENT_START};

/// Largest image which fits between the load address and the stack segment.
pub const IMAGE_LIMIT: usize = (STACK_SEGMENT_START - LOAD_ADDRESS) as usize - 1;

/// Read a raw program image from disk.
///
/// The size is checked by [`State::from_image`].
pub fn read_image(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    Ok(fs::read(path)?)
}

impl State {
    /// Fresh machine with `image` copied to [`LOAD_ADDRESS`], ready to run.
    ///
    /// The image must end strictly before the stack segment.
    pub fn from_image(image: &[u8]) -> Result<State, LoadError> {
        if image.len() > IMAGE_LIMIT {
            return Err(LoadError::ImageTooLarge {
                size: image.len(),
                limit: IMAGE_LIMIT,
            });
        }
        let mut state = State::new();
        state.write_bytes(LOAD_ADDRESS, image);
        state.set_pc(LOAD_ADDRESS);
        Ok(state)
    }
}

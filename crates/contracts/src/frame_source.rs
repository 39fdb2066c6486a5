//! FrameSource trait - frame producer abstraction
//!
//! Decouples the driver loop from concrete sources. The synthetic generator and
//! the directory reader implement the same interface; the driver never inspects
//! which one it holds.

use crate::{ContractError, Frame};

/// Frame source trait
///
/// # Outcomes of `next_frame`
///
/// - `Ok(Some(frame))`: a populated frame
/// - `Ok(None)`: end-of-stream, by design; repeated on every later call until
///   `reset()` or a reopen
/// - `Err(_)`: something went wrong
///
/// Looping is caller-driven: on end-of-stream the caller decides whether to
/// call `reset()`. Sources never wrap around on their own.
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn FrameSource> = make_source(&config);
/// source.open()?;
/// while let Some(frame) = source.next_frame()? {
///     println!("{} points", frame.len());
/// }
/// source.close();
/// ```
pub trait FrameSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Acquire resources and position at the first frame.
    fn open(&mut self) -> Result<(), ContractError>;

    /// Pull the next frame.
    fn next_frame(&mut self) -> Result<Option<Frame>, ContractError>;

    /// Rewind to the first frame.
    ///
    /// # Errors
    /// `Unsupported` unless the source implements rewinding.
    fn reset(&mut self) -> Result<(), ContractError> {
        Err(ContractError::unsupported(format!(
            "frame source '{}' does not support reset",
            self.name()
        )))
    }

    /// Release resources. Safe to call repeatedly.
    fn close(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<(), ContractError> {
        (**self).open()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        (**self).next_frame()
    }

    fn reset(&mut self) -> Result<(), ContractError> {
        (**self).reset()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

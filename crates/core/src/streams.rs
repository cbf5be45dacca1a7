//! Input, output and error handles attached to commands.
//!
//! A command without its own handle borrows its nearest ancestor's, falling
//! back to the process's stdin, stdout and stderr.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

pub type SharedWriter = Rc<RefCell<dyn Write>>;
pub type SharedReader = Rc<RefCell<dyn Read>>;

#[derive(Default, Clone)]
pub struct Streams {
    pub input: Option<SharedReader>,
    pub output: Option<SharedWriter>,
    pub error: Option<SharedWriter>,
}

pub(crate) fn stdin() -> SharedReader {
    Rc::new(RefCell::new(std::io::stdin()))
}

pub(crate) fn stdout() -> SharedWriter {
    Rc::new(RefCell::new(std::io::stdout()))
}

pub(crate) fn stderr() -> SharedWriter {
    Rc::new(RefCell::new(std::io::stderr()))
}

/// In-memory writer for capturing command output.
///
/// Clones share the same buffer, so one clone can be handed to a command
/// while another reads the result.
///
/// ```
/// use std::io::Write;
/// use cmdtree_core::streams::SharedBuffer;
///
/// let buffer = SharedBuffer::new();
/// let mut writer = buffer.clone();
/// write!(writer, "hello").unwrap();
/// assert_eq!(buffer.contents(), "hello");
/// ```
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

use enumflags2::{BitFlags, RawBitFlags};
use std::fmt;

pub struct BitFlagsDebug<T: RawBitFlags>(pub BitFlags<T>);

impl<T: RawBitFlags + fmt::Debug> fmt::Debug for BitFlagsDebug<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut it = self.0.iter().peekable();
        write!(f, "BitFlags(")?;
        while let Some(v) = it.next() {
            write!(f, "{:?}", v)?;
            if it.peek().is_some() {
                write!(f, " | ")?;
            }
        }
        write!(f, ")")
    }
}

/// Formats attribute values as `0a-1b-2c` for logging.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

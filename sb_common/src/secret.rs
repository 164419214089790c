use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A thin wrapper around credentials and tokens that redacts the value in
/// `Debug` and `Display` output, so that configuration structs can be logged
/// without leaking secrets.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone
{
    value: T,
}

impl<T: Clone> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns the wrapped value. Call sites should keep the revealed value short-lived.
    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

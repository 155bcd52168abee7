pub(crate) mod biff8;
pub(crate) mod bytes;
pub(crate) mod cfb;
pub(crate) mod encoding;
pub(crate) mod xml;
pub(crate) mod zip;

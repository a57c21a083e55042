use byteorder::{ByteOrder, LittleEndian};

use error::Result;

/// A fixed-width scalar kind that the [`crate::builder::Builder`] can write into a buffer
/// in little-endian form.
///
/// This is the write-side counterpart of [`crate::io::Read`]: where `Read` decodes a typed
/// scalar out of a buffer, `Primitive` encodes one into a buffer. Every native Rust scalar
/// kind the wire format supports (`bool`, `u8`/`i8`, `u16`/`i16`, `u32`/`i32`, `u64`/`i64`,
/// `f32`/`f64`) implements it, replacing the one-method-per-kind duplication of a
/// dynamically-typed source (`PrependInt32`, `PrependUint16`, ...) with a single generic
/// `Builder::prepend::<T>`.
pub trait Primitive: Copy + PartialOrd {
    /// Size of this kind's little-endian encoding, in bytes.
    const WIDTH: usize;

    /// Range-checks `self` before it is written.
    ///
    /// Every kind here is a native Rust scalar type, so its own range already matches the
    /// wire format's range exactly; this is a no-op for all of them. It stays part of the
    /// trait so a non-native scalar kind has somewhere to plug in a real check.
    fn validate(self) -> Result<()> {
        Ok(())
    }

    /// Writes the little-endian encoding of `self` at `buf[pos..pos + Self::WIDTH]`.
    fn write_le(self, buf: &mut [u8], pos: usize);
}

impl Primitive for bool {
    const WIDTH: usize = 1;

    fn write_le(self, buf: &mut [u8], pos: usize) {
        buf[pos] = self as u8;
    }
}

impl Primitive for u8 {
    const WIDTH: usize = 1;

    fn write_le(self, buf: &mut [u8], pos: usize) {
        buf[pos] = self;
    }
}

impl Primitive for i8 {
    const WIDTH: usize = 1;

    fn write_le(self, buf: &mut [u8], pos: usize) {
        // Two's-complement reinterpretation, same as the source's `PlaceInt8` masking with 0xff.
        buf[pos] = self as u8;
    }
}

macro_rules! impl_primitive_via_byteorder {
    ($ty:ident, $width:expr, $write:ident) => {
        impl Primitive for $ty {
            const WIDTH: usize = $width;

            fn write_le(self, buf: &mut [u8], pos: usize) {
                LittleEndian::$write(&mut buf[pos..pos + $width], self);
            }
        }
    };
}

impl_primitive_via_byteorder!(u16, 2, write_u16);
impl_primitive_via_byteorder!(i16, 2, write_i16);
impl_primitive_via_byteorder!(u32, 4, write_u32);
impl_primitive_via_byteorder!(i32, 4, write_i32);
impl_primitive_via_byteorder!(u64, 8, write_u64);
impl_primitive_via_byteorder!(i64, 8, write_i64);
impl_primitive_via_byteorder!(f32, 4, write_f32);
impl_primitive_via_byteorder!(f64, 8, write_f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_le() {
        let mut buf = [0u8; 4];
        42u16.write_le(&mut buf, 0);
        assert_eq!([42, 0, 0, 0], buf);

        let mut buf = [0u8; 4];
        (-1i32).write_le(&mut buf, 0);
        assert_eq!([0xff, 0xff, 0xff, 0xff], buf);
    }

    #[test]
    fn test_negative_i8_two_complement() {
        let mut buf = [0u8; 1];
        (-1i8).write_le(&mut buf, 0);
        assert_eq!([0xff], buf);
    }
}

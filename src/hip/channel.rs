//! Channel format descriptors (`hipChannelFormatDesc`)
//!
//! A descriptor tells the runtime how one array element is laid out: up to
//! four channels with individual bit widths, all sharing one numeric kind.
//! [`ChannelFormatDesc::of`] is the Rust spelling of the C++
//! `hipCreateChannelDesc<T>()` template.

use half::f16;
use serde::Serialize;

/// Numeric interpretation of every channel (`hipChannelFormatKind`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelFormatKind {
    Signed = 0,
    Unsigned = 1,
    Float = 2,
    None = 3,
}

/// Element layout handed to `hipMallocArray`
///
/// Field order and widths match the C struct exactly; the runtime reads it
/// through a pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelFormatDesc {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
    pub f: ChannelFormatKind,
}

impl ChannelFormatDesc {
    /// Explicit descriptor, equivalent to `hipCreateChannelDesc(x, y, z, w, f)`
    pub const fn new(x: i32, y: i32, z: i32, w: i32, f: ChannelFormatKind) -> Self {
        ChannelFormatDesc { x, y, z, w, f }
    }

    /// Descriptor for element type `T`
    pub fn of<T: ChannelElement>() -> Self {
        T::channel_desc()
    }

    /// Number of channels with a non-zero width
    pub fn channel_count(&self) -> usize {
        [self.x, self.y, self.z, self.w]
            .iter()
            .filter(|&&bits| bits > 0)
            .count()
    }

    /// Bytes occupied by one element, or `None` for a malformed descriptor
    ///
    /// Malformed means a negative channel width, a total that is not a whole
    /// number of bytes, or no channels at all.
    pub fn element_bytes(&self) -> Option<usize> {
        let channels = [self.x, self.y, self.z, self.w];
        if channels.iter().any(|&bits| bits < 0) {
            return None;
        }
        let bits: i64 = channels.iter().map(|&b| b as i64).sum();
        if bits == 0 || bits % 8 != 0 {
            return None;
        }
        Some((bits / 8) as usize)
    }

    /// Whether a runtime could allocate elements of this layout at all
    pub fn is_well_formed(&self) -> bool {
        self.f != ChannelFormatKind::None && self.element_bytes().is_some()
    }
}

/// Rust equivalent of `hipCreateChannelDesc<T>()`
pub fn create_channel_desc<T: ChannelElement>() -> ChannelFormatDesc {
    ChannelFormatDesc::of::<T>()
}

/// Element types that have a channel descriptor
pub trait ChannelElement {
    fn channel_desc() -> ChannelFormatDesc;
}

/// Scalars usable as a single channel or as the lanes of a vector element
pub trait ChannelScalar: Copy {
    const BITS: i32;
    const KIND: ChannelFormatKind;
}

macro_rules! channel_scalar {
    ($($ty:ty => $bits:expr, $kind:ident;)*) => {
        $(
            impl ChannelScalar for $ty {
                const BITS: i32 = $bits;
                const KIND: ChannelFormatKind = ChannelFormatKind::$kind;
            }

            impl ChannelElement for $ty {
                fn channel_desc() -> ChannelFormatDesc {
                    ChannelFormatDesc::new($bits, 0, 0, 0, ChannelFormatKind::$kind)
                }
            }
        )*
    };
}

channel_scalar! {
    i8 => 8, Signed;
    u8 => 8, Unsigned;
    i16 => 16, Signed;
    u16 => 16, Unsigned;
    i32 => 32, Signed;
    u32 => 32, Unsigned;
    f16 => 16, Float;
    f32 => 32, Float;
}

// Two- and four-lane vectors (char2, float4, ...). HIP has no 3-lane
// channel descriptors.
impl<T: ChannelScalar> ChannelElement for [T; 2] {
    fn channel_desc() -> ChannelFormatDesc {
        ChannelFormatDesc::new(T::BITS, T::BITS, 0, 0, T::KIND)
    }
}

impl<T: ChannelScalar> ChannelElement for [T; 4] {
    fn channel_desc() -> ChannelFormatDesc {
        ChannelFormatDesc::new(T::BITS, T::BITS, T::BITS, T::BITS, T::KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_descriptors() {
        assert_eq!(
            create_channel_desc::<i32>(),
            ChannelFormatDesc::new(32, 0, 0, 0, ChannelFormatKind::Signed)
        );
        assert_eq!(
            create_channel_desc::<u32>(),
            ChannelFormatDesc::new(32, 0, 0, 0, ChannelFormatKind::Unsigned)
        );
        assert_eq!(
            create_channel_desc::<f32>(),
            ChannelFormatDesc::new(32, 0, 0, 0, ChannelFormatKind::Float)
        );
        assert_eq!(ChannelFormatDesc::of::<f16>().element_bytes(), Some(2));
        assert_eq!(ChannelFormatDesc::of::<u8>().element_bytes(), Some(1));
    }

    #[test]
    fn test_vector_descriptors() {
        let float4 = ChannelFormatDesc::of::<[f32; 4]>();
        assert_eq!(float4.channel_count(), 4);
        assert_eq!(float4.element_bytes(), Some(16));
        assert_eq!(float4.f, ChannelFormatKind::Float);

        let short2 = ChannelFormatDesc::of::<[i16; 2]>();
        assert_eq!(short2, ChannelFormatDesc::new(16, 16, 0, 0, ChannelFormatKind::Signed));
    }

    #[test]
    fn test_malformed_descriptors() {
        assert!(!ChannelFormatDesc::new(0, 0, 0, 0, ChannelFormatKind::Float).is_well_formed());
        assert!(!ChannelFormatDesc::new(12, 0, 0, 0, ChannelFormatKind::Float).is_well_formed());
        assert!(!ChannelFormatDesc::new(-8, 16, 0, 0, ChannelFormatKind::Signed).is_well_formed());
        assert!(!ChannelFormatDesc::new(32, 0, 0, 0, ChannelFormatKind::None).is_well_formed());
        assert!(ChannelFormatDesc::of::<i8>().is_well_formed());
    }

    #[test]
    fn test_c_layout_size() {
        // Four ints plus a 4-byte enum
        assert_eq!(std::mem::size_of::<ChannelFormatDesc>(), 20);
    }
}

#[cfg(all(test, feature = "rocm", hip_channel_bindings))]
mod layout_verification {
    #![allow(non_camel_case_types, non_upper_case_globals, dead_code)]

    use super::ChannelFormatDesc;
    use memoffset::offset_of;

    include!(concat!(env!("OUT_DIR"), "/hip_channel_bindings.rs"));

    #[test]
    fn verify_channel_desc_layout() {
        assert_eq!(
            std::mem::size_of::<ChannelFormatDesc>(),
            std::mem::size_of::<hipChannelFormatDesc>(),
            "ChannelFormatDesc size mismatch with C struct - ROCm version may have changed"
        );
        assert_eq!(offset_of!(ChannelFormatDesc, x), offset_of!(hipChannelFormatDesc, x));
        assert_eq!(offset_of!(ChannelFormatDesc, w), offset_of!(hipChannelFormatDesc, w));
        assert_eq!(offset_of!(ChannelFormatDesc, f), offset_of!(hipChannelFormatDesc, f));
    }
}

//! Typed sample storage.

use ndarray::Array3;

// =============================================================================
// ElementType
// =============================================================================

/// Numeric type of a volume's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ElementType {
    /// Size of one sample in bytes.
    pub const fn size(&self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::UInt8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::UInt16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::UInt32 => "uint32",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
        }
    }
}

// =============================================================================
// Voxel
// =============================================================================

/// Scalar types a [`Samples`] buffer can hold.
pub trait Voxel: Copy + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn to_f32(self) -> f32;

    fn to_f64(self) -> f64;

    /// Decode one little-endian sample; `bytes.len()` equals the type size.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_voxel {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Voxel for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_voxel!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    f64 => Float64,
);

// =============================================================================
// Samples
// =============================================================================

/// A 3-D sample grid indexed `[x, y, z]`.
#[derive(Debug, Clone)]
pub enum Samples {
    Int8(Array3<i8>),
    UInt8(Array3<u8>),
    Int16(Array3<i16>),
    UInt16(Array3<u16>),
    Int32(Array3<i32>),
    UInt32(Array3<u32>),
    Float32(Array3<f32>),
    Float64(Array3<f64>),
}

/// Run `$body` with `$arr` bound to the typed array inside a [`Samples`].
macro_rules! with_array {
    ($samples:expr, $arr:ident => $body:expr) => {
        match $samples {
            $crate::volume::Samples::Int8($arr) => $body,
            $crate::volume::Samples::UInt8($arr) => $body,
            $crate::volume::Samples::Int16($arr) => $body,
            $crate::volume::Samples::UInt16($arr) => $body,
            $crate::volume::Samples::Int32($arr) => $body,
            $crate::volume::Samples::UInt32($arr) => $body,
            $crate::volume::Samples::Float32($arr) => $body,
            $crate::volume::Samples::Float64($arr) => $body,
        }
    };
}

pub(crate) use with_array;

impl Samples {
    /// Extents `[nx, ny, nz]`.
    pub fn dim(&self) -> [usize; 3] {
        let (nx, ny, nz) = with_array!(self, arr => arr.dim());
        [nx, ny, nz]
    }

    pub fn len(&self) -> usize {
        with_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Samples::Int8(_) => ElementType::Int8,
            Samples::UInt8(_) => ElementType::UInt8,
            Samples::Int16(_) => ElementType::Int16,
            Samples::UInt16(_) => ElementType::UInt16,
            Samples::Int32(_) => ElementType::Int32,
            Samples::UInt32(_) => ElementType::UInt32,
            Samples::Float32(_) => ElementType::Float32,
            Samples::Float64(_) => ElementType::Float64,
        }
    }

    /// Sample at `[x, y, z]` widened to `f64`.
    pub fn get_f64(&self, index: [usize; 3]) -> Option<f64> {
        with_array!(self, arr => arr.get(index).map(|v| v.to_f64()))
    }

    /// Minimum and maximum, skipping NaN. Returns `(NaN, NaN)` when no sample
    /// is comparable.
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = with_array!(self, arr => arr.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), v| {
                let v = v.to_f64();
                if v.is_nan() {
                    (min, max)
                } else {
                    (min.min(v), max.max(v))
                }
            },
        ));

        if min > max {
            (f64::NAN, f64::NAN)
        } else {
            (min, max)
        }
    }
}

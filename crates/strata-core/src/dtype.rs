use half::{bf16, f16};
use num_complex::Complex;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum DType {
    F16,
    BF16,
    #[default]
    F32,
    F64,
    I32,
    U32,
    C32, //Complex<f32>, interleaved (re, im)
    C64, //Complex<f64>
}

impl DType {
    /// Returns the size of the type in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::F16 => 2,
            DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
            DType::I32 => 4,
            DType::U32 => 4,
            DType::C32 => 8,
            DType::C64 => 16,
        }
    }

    pub fn align_of(self) -> usize {
        match self {
            DType::C32 => 4,
            DType::C64 => 8,
            dt => dt.size_of(),
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(self, DType::C32 | DType::C64)
    }

    /// The real component type of a complex type.
    pub fn real(self) -> Option<DType> {
        match self {
            DType::C32 => Some(DType::F32),
            DType::C64 => Some(DType::F64),
            _ => None,
        }
    }
}

pub trait TensorDType:
    Copy + std::fmt::Debug + PartialEq + 'static + num_traits::Zero + Send + Sync + bytemuck::Pod
{
    fn dt() -> DType;

    fn one() -> Self;
}

macro_rules! map_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn one() -> Self {
                1 as Self
            }
        }
    };
}

macro_rules! map_half_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn one() -> Self {
                Self::ONE
            }
        }
    };
}

macro_rules! map_complex_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for Complex<$t> {
            fn dt() -> DType {
                DType::$v
            }

            fn one() -> Self {
                Complex::new(1 as $t, 0 as $t)
            }
        }
    };
}

map_type!(f32, F32);
map_type!(f64, F64);
map_type!(i32, I32);
map_type!(u32, U32);
map_half_type!(f16, F16);
map_half_type!(bf16, BF16);
map_complex_type!(f32, C32);
map_complex_type!(f64, C64);

/// Complex element types that can be reinterpreted as pairs of their real part.
pub trait ComplexDType: TensorDType {
    type Real: TensorDType;
}

impl ComplexDType for Complex<f32> {
    type Real = f32;
}

impl ComplexDType for Complex<f64> {
    type Real = f64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn sizes_match_rust_types() {
        for dt in DType::iter() {
            let expected = match dt {
                DType::F16 => std::mem::size_of::<f16>(),
                DType::BF16 => std::mem::size_of::<bf16>(),
                DType::F32 => std::mem::size_of::<f32>(),
                DType::F64 => std::mem::size_of::<f64>(),
                DType::I32 => std::mem::size_of::<i32>(),
                DType::U32 => std::mem::size_of::<u32>(),
                DType::C32 => std::mem::size_of::<Complex<f32>>(),
                DType::C64 => std::mem::size_of::<Complex<f64>>(),
            };
            assert_eq!(dt.size_of(), expected, "{}", dt);
        }
    }

    #[test]
    fn alignments_cover_rust_types() {
        for (dt, rust) in [
            (DType::F16, std::mem::align_of::<f16>()),
            (DType::F64, std::mem::align_of::<f64>()),
            (DType::C32, std::mem::align_of::<Complex<f32>>()),
            (DType::C64, std::mem::align_of::<Complex<f64>>()),
        ] {
            assert_eq!(dt.align_of() % rust, 0, "{}", dt);
        }
    }

    #[test]
    fn complex_components() {
        assert_eq!(DType::C32.real(), Some(DType::F32));
        assert_eq!(DType::F32.real(), None);
        assert_eq!(<Complex<f64>>::dt(), DType::C64);
        assert_eq!(<Complex<f32>>::one(), Complex::new(1.0, 0.0));
    }
}

use strata::DType;

use crate::backend::{self, BuildFn, ExecFn};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum Domain {
    Real,
    Complex,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum Precision {
    F32,
    F64,
}

/// Selects one of the transform configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_new::new)]
pub struct FftKey {
    pub domain: Domain,
    pub precision: Precision,
}

/// Backend transform types, named after their input and output element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TransformKind {
    C2C,
    R2C,
    C2R,
    Z2Z,
    D2Z,
    Z2D,
}

/// Everything a plan needs to know about one [FftKey], resolved once at
/// plan construction.
pub struct FftConfig {
    key: FftKey,
    forward: TransformKind,
    inverse: TransformKind,
    input_dt: DType,
    output_dt: DType,
    pub(crate) build: BuildFn,
    pub(crate) exec_forward: ExecFn,
    pub(crate) exec_inverse: ExecFn,
}

impl FftConfig {
    pub fn key(&self) -> FftKey {
        self.key
    }

    pub fn forward_kind(&self) -> TransformKind {
        self.forward
    }

    pub fn inverse_kind(&self) -> TransformKind {
        self.inverse
    }

    /// Element type of the forward input, and of the inverse output.
    pub fn input_dt(&self) -> DType {
        self.input_dt
    }

    /// Element type of the forward output, and of the inverse input.
    pub fn output_dt(&self) -> DType {
        self.output_dt
    }
}

impl std::fmt::Debug for FftConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftConfig")
            .field("key", &self.key)
            .field("forward", &self.forward)
            .field("inverse", &self.inverse)
            .field("input_dt", &self.input_dt)
            .field("output_dt", &self.output_dt)
            .finish()
    }
}

static CONFIGS: [FftConfig; 4] = [
    FftConfig {
        key: FftKey {
            domain: Domain::Complex,
            precision: Precision::F32,
        },
        forward: TransformKind::C2C,
        inverse: TransformKind::C2C,
        input_dt: DType::C32,
        output_dt: DType::C32,
        build: backend::build_complex::<f32>,
        exec_forward: backend::c2c_forward::<f32>,
        exec_inverse: backend::c2c_inverse::<f32>,
    },
    FftConfig {
        key: FftKey {
            domain: Domain::Complex,
            precision: Precision::F64,
        },
        forward: TransformKind::Z2Z,
        inverse: TransformKind::Z2Z,
        input_dt: DType::C64,
        output_dt: DType::C64,
        build: backend::build_complex::<f64>,
        exec_forward: backend::c2c_forward::<f64>,
        exec_inverse: backend::c2c_inverse::<f64>,
    },
    FftConfig {
        key: FftKey {
            domain: Domain::Real,
            precision: Precision::F32,
        },
        forward: TransformKind::R2C,
        inverse: TransformKind::C2R,
        input_dt: DType::F32,
        output_dt: DType::C32,
        build: backend::build_real::<f32>,
        exec_forward: backend::r2c::<f32>,
        exec_inverse: backend::c2r::<f32>,
    },
    FftConfig {
        key: FftKey {
            domain: Domain::Real,
            precision: Precision::F64,
        },
        forward: TransformKind::D2Z,
        inverse: TransformKind::Z2D,
        input_dt: DType::F64,
        output_dt: DType::C64,
        build: backend::build_real::<f64>,
        exec_forward: backend::r2c::<f64>,
        exec_inverse: backend::c2r::<f64>,
    },
];

pub fn fft_config(key: FftKey) -> &'static FftConfig {
    let index = match (key.domain, key.precision) {
        (Domain::Complex, Precision::F32) => 0,
        (Domain::Complex, Precision::F64) => 1,
        (Domain::Real, Precision::F32) => 2,
        (Domain::Real, Precision::F64) => 3,
    };
    &CONFIGS[index]
}

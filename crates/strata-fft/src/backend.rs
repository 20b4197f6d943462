use std::sync::Arc;

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftNum, FftPlanner};
use strata::{DType, TensorDType};

use crate::{Domain, FftError};

/// Aborts the process if a backend call failed.
macro_rules! fft_check {
    ($what:expr) => {
        if let Err(err) = $what {
            $crate::backend::fatal(&err, file!(), line!())
        }
    };
}

pub(crate) fn fatal(err: &dyn std::fmt::Display, file: &str, line: u32) -> ! {
    log::error!("fft backend failure: {} at {}:{}", err, file, line);
    std::process::abort()
}

/// Placement of one side of a batched transform.
///
/// Element `j` (row-major, last axis fastest) of batch `b` lives at
/// `b * dist + j * stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub(crate) struct Embed {
    pub stride: usize,
    pub dist: usize,
}

impl Embed {
    /// Elements a buffer needs to hold `batch` transforms of `numel` elements.
    pub fn reach(&self, numel: usize, batch: usize) -> usize {
        (batch - 1) * self.dist + (numel - 1) * self.stride + 1
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Geometry {
    pub domain: Domain,
    pub lengths: Vec<usize>,
    /// Lengths on the complex side, the last one halved for real transforms.
    pub spectrum: Vec<usize>,
    pub input: Embed,
    pub output: Embed,
    pub batch: usize,
}

impl Geometry {
    pub fn new(
        domain: Domain,
        lengths: &[usize],
        input: Embed,
        output: Embed,
        batch: usize,
    ) -> Self {
        let mut spectrum = lengths.to_vec();
        if domain == Domain::Real {
            if let Some(last) = spectrum.last_mut() {
                *last = *last / 2 + 1;
            }
        }
        Self {
            domain,
            lengths: lengths.to_vec(),
            spectrum,
            input,
            output,
            batch,
        }
    }

    pub fn numel(&self) -> usize {
        self.lengths.iter().product()
    }

    pub fn spectrum_numel(&self) -> usize {
        self.spectrum.iter().product()
    }

    fn last_len(&self) -> usize {
        self.lengths[self.lengths.len() - 1]
    }

    /// Source and destination of a forward transform.
    pub fn forward_sides(&self) -> [(Embed, usize); 2] {
        [
            (self.input, self.numel()),
            (self.output, self.spectrum_numel()),
        ]
    }

    /// Source and destination of an inverse transform. Real plans read the
    /// spectrum through the output embed and write the signal through the
    /// input embed.
    pub fn inverse_sides(&self) -> [(Embed, usize); 2] {
        match self.domain {
            Domain::Complex => self.forward_sides(),
            Domain::Real => [
                (self.output, self.spectrum_numel()),
                (self.input, self.numel()),
            ],
        }
    }
}

pub(crate) struct ComplexPasses<T: FftNum> {
    forward: Vec<Arc<dyn Fft<T>>>,
    inverse: Vec<Arc<dyn Fft<T>>>,
}

pub(crate) struct RealPasses<T: FftNum> {
    /// Complex passes over every axis but the last.
    forward: Vec<Arc<dyn Fft<T>>>,
    inverse: Vec<Arc<dyn Fft<T>>>,
    r2c: Arc<dyn RealToComplex<T>>,
    c2r: Arc<dyn ComplexToReal<T>>,
}

/// Backend state owned by a plan.
pub(crate) enum Handles {
    C32(ComplexPasses<f32>),
    C64(ComplexPasses<f64>),
    R32(RealPasses<f32>),
    R64(RealPasses<f64>),
}

impl Handles {
    fn input_dt(&self) -> DType {
        match self {
            Handles::C32(_) => DType::C32,
            Handles::C64(_) => DType::C64,
            Handles::R32(_) => DType::F32,
            Handles::R64(_) => DType::F64,
        }
    }
}

pub(crate) trait Precise: FftNum + TensorDType {
    fn complex(handles: &Handles) -> Option<&ComplexPasses<Self>>;
    fn real(handles: &Handles) -> Option<&RealPasses<Self>>;
    fn wrap_complex(passes: ComplexPasses<Self>) -> Handles;
    fn wrap_real(passes: RealPasses<Self>) -> Handles;
}

macro_rules! precise {
    ($t:ty, $c:ident, $r:ident) => {
        impl Precise for $t {
            fn complex(handles: &Handles) -> Option<&ComplexPasses<Self>> {
                match handles {
                    Handles::$c(passes) => Some(passes),
                    _ => None,
                }
            }

            fn real(handles: &Handles) -> Option<&RealPasses<Self>> {
                match handles {
                    Handles::$r(passes) => Some(passes),
                    _ => None,
                }
            }

            fn wrap_complex(passes: ComplexPasses<Self>) -> Handles {
                Handles::$c(passes)
            }

            fn wrap_real(passes: RealPasses<Self>) -> Handles {
                Handles::$r(passes)
            }
        }
    };
}

precise!(f32, C32, R32);
precise!(f64, C64, R64);

pub(crate) type BuildFn = fn(&Geometry) -> Handles;
pub(crate) type ExecFn = fn(&Handles, &Geometry, &[u8], &mut [u8]) -> Result<(), FftError>;

pub(crate) fn build_complex<T: Precise>(geometry: &Geometry) -> Handles {
    let mut planner = FftPlanner::<T>::new();
    T::wrap_complex(ComplexPasses {
        forward: geometry
            .lengths
            .iter()
            .map(|&n| planner.plan_fft_forward(n))
            .collect(),
        inverse: geometry
            .lengths
            .iter()
            .map(|&n| planner.plan_fft_inverse(n))
            .collect(),
    })
}

pub(crate) fn build_real<T: Precise>(geometry: &Geometry) -> Handles {
    let outer = &geometry.spectrum[..geometry.spectrum.len() - 1];
    let last = geometry.last_len();
    let mut planner = FftPlanner::<T>::new();
    let mut real = RealFftPlanner::<T>::new();
    T::wrap_real(RealPasses {
        forward: outer.iter().map(|&n| planner.plan_fft_forward(n)).collect(),
        inverse: outer.iter().map(|&n| planner.plan_fft_inverse(n)).collect(),
        r2c: real.plan_fft_forward(last),
        c2r: real.plan_fft_inverse(last),
    })
}

fn view<T: bytemuck::Pod>(bytes: &[u8]) -> Result<&[T], FftError> {
    bytemuck::try_cast_slice(bytes).map_err(FftError::Layout)
}

fn view_mut<T: bytemuck::Pod>(bytes: &mut [u8]) -> Result<&mut [T], FftError> {
    bytemuck::try_cast_slice_mut(bytes).map_err(FftError::Layout)
}

fn complex_passes<T: Precise>(handles: &Handles) -> Result<&ComplexPasses<T>, FftError> {
    T::complex(handles).ok_or(FftError::DTypeMismatch {
        expected: handles.input_dt(),
        actual: T::dt(),
    })
}

fn real_passes<T: Precise>(handles: &Handles) -> Result<&RealPasses<T>, FftError> {
    T::real(handles).ok_or(FftError::DTypeMismatch {
        expected: handles.input_dt(),
        actual: T::dt(),
    })
}

fn gather<E: Copy>(src: &[E], embed: Embed, batch: usize, dst: &mut [E]) {
    let base = batch * embed.dist;
    for (j, d) in dst.iter_mut().enumerate() {
        *d = src[base + j * embed.stride];
    }
}

fn scatter<E: Copy>(src: &[E], dst: &mut [E], embed: Embed, batch: usize) {
    let base = batch * embed.dist;
    for (j, s) in src.iter().enumerate() {
        dst[base + j * embed.stride] = *s;
    }
}

/// In-place 1-D passes over the leading `axes.len()` axes of a row-major
/// buffer shaped `lengths`.
fn transform_axes<T: FftNum>(
    axes: &[Arc<dyn Fft<T>>],
    lengths: &[usize],
    work: &mut [Complex<T>],
    lines: &mut [Complex<T>],
) {
    for (axis, fft) in axes.iter().enumerate() {
        let n = lengths[axis];
        let inner: usize = lengths[axis + 1..].iter().product();
        if inner == 1 {
            fft.process(work);
            continue;
        }
        let outer = work.len() / (n * inner);
        for o in 0..outer {
            for i in 0..inner {
                let line = (o * inner + i) * n;
                for k in 0..n {
                    lines[line + k] = work[(o * n + k) * inner + i];
                }
            }
        }
        fft.process(lines);
        for o in 0..outer {
            for i in 0..inner {
                let line = (o * inner + i) * n;
                for k in 0..n {
                    work[(o * n + k) * inner + i] = lines[line + k];
                }
            }
        }
    }
}

fn run_c2c<T: FftNum>(
    axes: &[Arc<dyn Fft<T>>],
    geometry: &Geometry,
    [(src, _), (dst, _)]: [(Embed, usize); 2],
    input: &[Complex<T>],
    output: &mut [Complex<T>],
) {
    let mut work = vec![Complex::new(T::zero(), T::zero()); geometry.numel()];
    let mut lines = work.clone();
    for b in 0..geometry.batch {
        gather(input, src, b, &mut work);
        transform_axes(axes, &geometry.lengths, &mut work, &mut lines);
        scatter(&work, output, dst, b);
    }
}

pub(crate) fn c2c_forward<T: Precise>(
    handles: &Handles,
    geometry: &Geometry,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), FftError> {
    let passes = complex_passes::<T>(handles)?;
    run_c2c(
        &passes.forward,
        geometry,
        geometry.forward_sides(),
        view(input)?,
        view_mut(output)?,
    );
    Ok(())
}

pub(crate) fn c2c_inverse<T: Precise>(
    handles: &Handles,
    geometry: &Geometry,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), FftError> {
    let passes = complex_passes::<T>(handles)?;
    run_c2c(
        &passes.inverse,
        geometry,
        geometry.inverse_sides(),
        view(input)?,
        view_mut(output)?,
    );
    Ok(())
}

/// Real rows along the last axis, then complex passes over the rest.
pub(crate) fn r2c<T: Precise>(
    handles: &Handles,
    geometry: &Geometry,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), FftError> {
    let passes = real_passes::<T>(handles)?;
    let input: &[T] = view(input)?;
    let output: &mut [Complex<T>] = view_mut(output)?;
    let [(src, _), (dst, _)] = geometry.forward_sides();
    let n = geometry.last_len();
    let half = n / 2 + 1;

    let mut signal = vec![T::zero(); geometry.numel()];
    let mut spectrum = vec![Complex::new(T::zero(), T::zero()); geometry.spectrum_numel()];
    let mut lines = spectrum.clone();
    let mut scratch = passes.r2c.make_scratch_vec();
    for b in 0..geometry.batch {
        gather(input, src, b, &mut signal);
        for (row, bins) in signal
            .chunks_exact_mut(n)
            .zip(spectrum.chunks_exact_mut(half))
        {
            fft_check!(passes.r2c.process_with_scratch(row, bins, &mut scratch));
        }
        transform_axes(&passes.forward, &geometry.spectrum, &mut spectrum, &mut lines);
        scatter(&spectrum, output, dst, b);
    }
    Ok(())
}

/// Complex passes over every axis but the last, then real rows.
pub(crate) fn c2r<T: Precise>(
    handles: &Handles,
    geometry: &Geometry,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), FftError> {
    let passes = real_passes::<T>(handles)?;
    let input: &[Complex<T>] = view(input)?;
    let output: &mut [T] = view_mut(output)?;
    let [(src, _), (dst, _)] = geometry.inverse_sides();
    let n = geometry.last_len();
    let half = n / 2 + 1;

    let mut spectrum = vec![Complex::new(T::zero(), T::zero()); geometry.spectrum_numel()];
    let mut lines = spectrum.clone();
    let mut signal = vec![T::zero(); geometry.numel()];
    let mut scratch = passes.c2r.make_scratch_vec();
    for b in 0..geometry.batch {
        gather(input, src, b, &mut spectrum);
        transform_axes(&passes.inverse, &geometry.spectrum, &mut spectrum, &mut lines);
        for (bins, row) in spectrum
            .chunks_exact_mut(half)
            .zip(signal.chunks_exact_mut(n))
        {
            // DC and Nyquist bins of a real signal carry no imaginary part.
            bins[0].im = T::zero();
            if n % 2 == 0 {
                bins[half - 1].im = T::zero();
            }
            fft_check!(passes.c2r.process_with_scratch(bins, row, &mut scratch));
        }
        scatter(&signal, output, dst, b);
    }
    Ok(())
}

use strata::{Device, Expression, Tensor, TensorDType};

use crate::backend::{Embed, Geometry, Handles};
use crate::{fft_config, Domain, FftConfig, FftError, FftKey};

/// Highest number of transform dimensions a plan accepts.
pub const MAX_FFT_RANK: usize = 3;

/// # FftPlanMany
///
/// A batch of identical multi-dimensional transforms over strided buffers.
///
/// Plans are move-only: the backend handles are created once in the
/// constructor and released when the plan is dropped.
pub struct FftPlanMany {
    config: &'static FftConfig,
    geometry: Geometry,
    handles: Handles,
}

impl std::fmt::Debug for FftPlanMany {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftPlanMany")
            .field("key", &self.config.key())
            .field("lengths", &self.geometry.lengths)
            .field("input", &self.geometry.input)
            .field("output", &self.geometry.output)
            .field("batch", &self.geometry.batch)
            .finish()
    }
}

impl FftPlanMany {
    /// A plan over densely packed batches.
    ///
    /// Complex plans place consecutive batches `Π lengths` elements apart on
    /// both sides. Real plans do so on the real side, and pack the spectrum
    /// with the last length halved to `n / 2 + 1`.
    pub fn new(key: FftKey, lengths: &[usize], batch: usize) -> Result<Self, FftError> {
        check_lengths(lengths, batch)?;
        let idist: usize = lengths.iter().product();
        let odist = match key.domain {
            Domain::Complex => idist,
            Domain::Real => {
                let last = lengths[lengths.len() - 1];
                idist / last * (last / 2 + 1)
            }
        };
        Self::with_layout(key, lengths, 1, idist, 1, odist, batch)
    }

    /// A plan with explicit strides and batch distances.
    ///
    /// `istride`/`idist` place the forward input and `ostride`/`odist` the
    /// forward output. The inverse of a real plan reads through the output
    /// layout and writes through the input layout.
    pub fn with_layout(
        key: FftKey,
        lengths: &[usize],
        istride: usize,
        idist: usize,
        ostride: usize,
        odist: usize,
        batch: usize,
    ) -> Result<Self, FftError> {
        check_lengths(lengths, batch)?;
        if istride == 0 || ostride == 0 {
            return Err(FftError::InvalidLengths {
                lengths: lengths.to_vec(),
                reason: "strides must be positive",
            });
        }
        let config = fft_config(key);
        let geometry = Geometry::new(
            key.domain,
            lengths,
            Embed::new(istride, idist),
            Embed::new(ostride, odist),
            batch,
        );
        let handles = (config.build)(&geometry);
        log::debug!(
            "Planned {:?} x{} ({}, {}) over {:?}",
            geometry.lengths,
            batch,
            config.forward_kind(),
            config.inverse_kind(),
            key
        );
        Ok(Self {
            config,
            geometry,
            handles,
        })
    }

    pub fn key(&self) -> FftKey {
        self.config.key()
    }

    pub fn config(&self) -> &'static FftConfig {
        self.config
    }

    pub fn lengths(&self) -> &[usize] {
        &self.geometry.lengths
    }

    pub fn batch(&self) -> usize {
        self.geometry.batch
    }

    /// Elements a forward input buffer must hold.
    pub fn input_len(&self) -> usize {
        let [(embed, numel), _] = self.geometry.forward_sides();
        embed.reach(numel, self.geometry.batch)
    }

    /// Elements a forward output buffer must hold.
    pub fn output_len(&self) -> usize {
        let [_, (embed, numel)] = self.geometry.forward_sides();
        embed.reach(numel, self.geometry.batch)
    }

    /// Forward transform, `e^{-2πi jk/n}` kernel, unnormalised.
    pub fn forward<I: TensorDType, O: TensorDType>(
        &self,
        input: &[I],
        output: &mut [O],
    ) -> Result<(), FftError> {
        let [src, dst] = self.geometry.forward_sides();
        check_buffer(input, self.config.input_dt(), src, self.geometry.batch)?;
        check_buffer(output, self.config.output_dt(), dst, self.geometry.batch)?;
        (self.config.exec_forward)(
            &self.handles,
            &self.geometry,
            bytemuck::cast_slice(input),
            bytemuck::cast_slice_mut(output),
        )
    }

    /// Inverse transform, `e^{+2πi jk/n}` kernel, unnormalised.
    pub fn inverse<I: TensorDType, O: TensorDType>(
        &self,
        input: &[I],
        output: &mut [O],
    ) -> Result<(), FftError> {
        let [src, dst] = self.geometry.inverse_sides();
        check_buffer(input, self.config.output_dt(), src, self.geometry.batch)?;
        check_buffer(output, self.config.input_dt(), dst, self.geometry.batch)?;
        (self.config.exec_inverse)(
            &self.handles,
            &self.geometry,
            bytemuck::cast_slice(input),
            bytemuck::cast_slice_mut(output),
        )
    }

    /// [FftPlanMany::forward] between the flat buffers of two tensors, on any
    /// device. Elements of `output` outside the layout are left untouched.
    pub fn forward_tensor<I: TensorDType, O: TensorDType>(
        &self,
        input: &Tensor<I>,
        output: &Tensor<O>,
    ) -> Result<(), FftError> {
        let mut result = output.to_vec()?;
        self.forward(&input.to_vec()?, &mut result)?;
        write_back(result, output)
    }

    pub fn inverse_tensor<I: TensorDType, O: TensorDType>(
        &self,
        input: &Tensor<I>,
        output: &Tensor<O>,
    ) -> Result<(), FftError> {
        let mut result = output.to_vec()?;
        self.inverse(&input.to_vec()?, &mut result)?;
        write_back(result, output)
    }
}

impl Drop for FftPlanMany {
    fn drop(&mut self) {
        log::debug!(
            "Destroying {:?} plan over {:?} x{}",
            self.config.key(),
            self.geometry.lengths,
            self.geometry.batch
        );
    }
}

fn check_lengths(lengths: &[usize], batch: usize) -> Result<(), FftError> {
    let reason = if lengths.is_empty() || lengths.len() > MAX_FFT_RANK {
        "between one and three lengths are supported"
    } else if lengths.contains(&0) {
        "lengths must be positive"
    } else if batch == 0 {
        "batch must be positive"
    } else {
        return Ok(());
    };
    Err(FftError::InvalidLengths {
        lengths: lengths.to_vec(),
        reason,
    })
}

fn check_buffer<T: TensorDType>(
    buffer: &[T],
    expected: strata::DType,
    (embed, numel): (Embed, usize),
    batch: usize,
) -> Result<(), FftError> {
    if T::dt() != expected {
        return Err(FftError::DTypeMismatch {
            expected,
            actual: T::dt(),
        });
    }
    let required = embed.reach(numel, batch);
    if buffer.len() < required {
        return Err(FftError::BufferTooSmall {
            required,
            actual: buffer.len(),
        });
    }
    Ok(())
}

fn write_back<O: TensorDType>(result: Vec<O>, output: &Tensor<O>) -> Result<(), FftError> {
    let staged = Tensor::from_data(result, output.shape().clone(), Device::CPU)?;
    output.assign(&staged.to(output.device())?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Precision;
    use num_complex::Complex;

    fn key(domain: Domain) -> FftKey {
        FftKey::new(domain, Precision::F32)
    }

    #[test]
    fn default_distances() -> anyhow::Result<()> {
        let real = FftPlanMany::new(key(Domain::Real), &[4, 6], 3)?;
        assert_eq!(real.input_len(), 3 * 24);
        assert_eq!(real.output_len(), 3 * 16);

        let complex = FftPlanMany::new(key(Domain::Complex), &[5], 2)?;
        assert_eq!((complex.input_len(), complex.output_len()), (10, 10));
        Ok(())
    }

    #[test]
    fn invalid_lengths() {
        for (lengths, batch) in [
            (vec![], 1),
            (vec![4, 0], 1),
            (vec![2, 2, 2, 2], 1),
            (vec![8], 0),
        ] {
            assert!(matches!(
                FftPlanMany::new(key(Domain::Complex), &lengths, batch),
                Err(FftError::InvalidLengths { .. })
            ));
        }
        assert!(FftPlanMany::with_layout(key(Domain::Real), &[8], 0, 8, 1, 5, 1).is_err());
    }

    #[test]
    fn buffers_are_checked_before_execution() -> anyhow::Result<()> {
        let plan = FftPlanMany::new(key(Domain::Real), &[8], 2)?;
        let input = vec![0f32; 16];
        let mut short = vec![Complex::<f32>::default(); 9];
        assert!(matches!(
            plan.forward(&input, &mut short),
            Err(FftError::BufferTooSmall {
                required: 10,
                actual: 9
            })
        ));

        let mut wrong = vec![0f64; 10];
        assert!(matches!(
            plan.forward(&input, &mut wrong),
            Err(FftError::DTypeMismatch { .. })
        ));

        // the inverse reads the spectrum and writes the signal
        let spectrum = vec![Complex::<f32>::default(); 10];
        let mut signal = vec![0f32; 16];
        plan.inverse(&spectrum, &mut signal)?;
        assert!(plan.inverse(&input, &mut signal).is_err());
        Ok(())
    }
}

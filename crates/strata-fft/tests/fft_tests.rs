#[cfg(test)]
mod tests {
    use num_complex::Complex;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use strata::{shape, ContextConfig, Device, ExecutionContext, Expression, Tensor};
    use strata_fft::{Domain, FftError, FftKey, FftPlanMany, Precision};
    use test_strategy::{proptest, Arbitrary};

    type C64 = Complex<f64>;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Row-major multi-dimensional DFT, `sign = -1` forward.
    fn naive_dft(x: &[C64], lengths: &[usize], sign: f64) -> Vec<C64> {
        let n: usize = lengths.iter().product();
        let unravel = |mut flat: usize| {
            let mut index = vec![0; lengths.len()];
            for (d, &len) in lengths.iter().enumerate().rev() {
                index[d] = flat % len;
                flat /= len;
            }
            index
        };
        (0..n)
            .map(|k| {
                let k = unravel(k);
                (0..n)
                    .map(|j| {
                        let phase: f64 = unravel(j)
                            .iter()
                            .zip(&k)
                            .zip(lengths)
                            .map(|((&j, &k), &len)| (j * k) as f64 / len as f64)
                            .sum();
                        x[j] * C64::from_polar(1.0, sign * 2.0 * std::f64::consts::PI * phase)
                    })
                    .sum()
            })
            .collect()
    }

    /// Keeps the first `n / 2 + 1` bins of the last axis.
    fn truncate_spectrum(full: &[C64], lengths: &[usize]) -> Vec<C64> {
        let last = lengths[lengths.len() - 1];
        full.chunks_exact(last)
            .flat_map(|row| row[..last / 2 + 1].to_vec())
            .collect()
    }

    fn random_complex(rng: &mut StdRng, n: usize) -> Vec<C64> {
        (0..n)
            .map(|_| C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    fn assert_close(got: &[C64], expected: &[C64]) {
        assert_eq!(got.len(), expected.len());
        for (i, (g, e)) in got.iter().zip(expected).enumerate() {
            assert!((g - e).norm() < 1e-9, "bin {}: {} != {}", i, g, e);
        }
    }

    fn assert_close32(got: &[f32], expected: &[f32]) {
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < 1e-5, "{:?} != {:?}", got, expected);
        }
    }

    #[derive(Arbitrary, Debug)]
    struct TransformProblem {
        #[strategy(proptest::collection::vec(1usize..7, 1..=3))]
        lengths: Vec<usize>,
        #[strategy(1usize..4)]
        batch: usize,
        seed: u64,
    }

    fn run_complex_trial(prob: TransformProblem) -> anyhow::Result<()> {
        let TransformProblem {
            lengths,
            batch,
            seed,
        } = prob;
        let mut rng = StdRng::seed_from_u64(seed);
        let n: usize = lengths.iter().product();
        let input = random_complex(&mut rng, n * batch);

        let plan = FftPlanMany::new(FftKey::new(Domain::Complex, Precision::F64), &lengths, batch)?;
        let mut spectrum = vec![C64::default(); n * batch];
        plan.forward(&input, &mut spectrum)?;
        for b in 0..batch {
            let expected = naive_dft(&input[b * n..(b + 1) * n], &lengths, -1.0);
            assert_close(&spectrum[b * n..(b + 1) * n], &expected);
        }

        let mut back = vec![C64::default(); n * batch];
        plan.inverse(&spectrum, &mut back)?;
        let scaled = input.iter().map(|x| x * n as f64).collect::<Vec<_>>();
        assert_close(&back, &scaled);
        Ok(())
    }

    #[proptest(cases = 24)]
    fn test_complex_against_naive(prob: TransformProblem) {
        init();
        run_complex_trial(prob).unwrap();
    }

    fn run_real_trial(prob: TransformProblem) -> anyhow::Result<()> {
        let TransformProblem {
            lengths,
            batch,
            seed,
        } = prob;
        let mut rng = StdRng::seed_from_u64(seed);
        let n: usize = lengths.iter().product();
        let last = lengths[lengths.len() - 1];
        let m = n / last * (last / 2 + 1);
        let input = (0..n * batch)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect::<Vec<f64>>();

        let plan = FftPlanMany::new(FftKey::new(Domain::Real, Precision::F64), &lengths, batch)?;
        let mut spectrum = vec![C64::default(); m * batch];
        plan.forward(&input, &mut spectrum)?;
        for b in 0..batch {
            let signal = input[b * n..(b + 1) * n]
                .iter()
                .map(|&x| C64::new(x, 0.0))
                .collect::<Vec<_>>();
            let expected = truncate_spectrum(&naive_dft(&signal, &lengths, -1.0), &lengths);
            assert_close(&spectrum[b * m..(b + 1) * m], &expected);
        }

        let mut back = vec![0f64; n * batch];
        plan.inverse(&spectrum, &mut back)?;
        for (got, x) in back.iter().zip(&input) {
            assert!((got - x * n as f64).abs() < 1e-9);
        }
        Ok(())
    }

    #[proptest(cases = 24)]
    fn test_real_against_naive(prob: TransformProblem) {
        init();
        run_real_trial(prob).unwrap();
    }

    #[test]
    fn strided_batches_leave_gaps_untouched() -> anyhow::Result<()> {
        init();
        // two interleaved length-4 transforms: batch b, element j at b + 2j
        let plan = FftPlanMany::with_layout(
            FftKey::new(Domain::Complex, Precision::F64),
            &[4],
            2,
            1,
            3,
            1,
            2,
        )?;
        let input = (0..8).map(|i| C64::new(i as f64, 0.0)).collect::<Vec<_>>();
        let sentinel = C64::new(-7.0, 7.0);
        let mut output = vec![sentinel; plan.output_len()];
        assert_eq!(output.len(), 11);
        plan.forward(&input, &mut output)?;

        for b in 0..2 {
            let batch = (0..4).map(|j| input[b + 2 * j]).collect::<Vec<_>>();
            let expected = naive_dft(&batch, &[4], -1.0);
            let got = (0..4).map(|k| output[b + 3 * k]).collect::<Vec<_>>();
            assert_close(&got, &expected);
        }
        for gap in [2, 5, 8] {
            assert_eq!(output[gap], sentinel);
        }
        Ok(())
    }

    #[test]
    fn real_inverse_reads_the_output_layout() -> anyhow::Result<()> {
        init();
        // signal packed with stride 1, spectrum padded to 8 bins per batch
        let plan = FftPlanMany::with_layout(
            FftKey::new(Domain::Real, Precision::F32),
            &[6],
            1,
            6,
            1,
            8,
            2,
        )?;
        let signal = (0..12).map(|i| (i % 5) as f32).collect::<Vec<_>>();
        let mut spectrum = vec![Complex::<f32>::default(); plan.output_len()];
        assert_eq!(spectrum.len(), 12);
        plan.forward(&signal, &mut spectrum)?;

        let mut back = vec![0f32; 12];
        plan.inverse(&spectrum, &mut back)?;
        for (got, x) in back.iter().zip(&signal) {
            assert!((got - 6.0 * x).abs() < 1e-4);
        }
        Ok(())
    }

    #[test]
    fn tensor_transforms_on_every_device() -> anyhow::Result<()> {
        init();
        let ctx = ExecutionContext::new(ContextConfig::default());
        let plan = FftPlanMany::new(FftKey::new(Domain::Real, Precision::F32), &[4], 1)?;
        for device in [Device::CPU, ctx.device(0)?] {
            let signal = Tensor::from_data([1f32, 0.0, -1.0, 0.0], shape![4], device.clone())?;
            let spectrum = Tensor::<Complex<f32>>::zeros(shape![3], device.clone())?;
            plan.forward_tensor(&signal, &spectrum)?;
            // interleaved (re, im) pairs of the spectrum
            let pairs = spectrum.view_as_real()?;
            assert_eq!(pairs.shape(), &shape![2, 3]);
            assert_close32(&pairs.to_vec()?, &[0.0, 0.0, 2.0, 0.0, 0.0, 0.0]);

            let restored = Tensor::<f32>::zeros(shape![4], device)?;
            plan.inverse_tensor(&spectrum, &restored)?;
            assert_close32(&restored.to_vec()?, &[4.0, 0.0, -4.0, 0.0]);
        }
        Ok(())
    }

    #[test]
    fn tensor_dtypes_are_checked() -> anyhow::Result<()> {
        let plan = FftPlanMany::new(FftKey::new(Domain::Complex, Precision::F32), &[4], 1)?;
        let real = Tensor::<f32>::zeros(shape![4], Device::CPU)?;
        let out = Tensor::<Complex<f32>>::zeros(shape![4], Device::CPU)?;
        assert!(matches!(
            plan.forward_tensor(&real, &out),
            Err(FftError::DTypeMismatch { .. })
        ));
        Ok(())
    }
}

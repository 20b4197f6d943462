#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata::{
        launch, prelude::*, ContextConfig, Elementwise, KernelExpression, KernelStore, Shape,
    };
    use test_strategy::{proptest, Arbitrary};

    fn context() -> Arc<ExecutionContext> {
        let _ = env_logger::builder().is_test(true).try_init();
        Arc::new(ExecutionContext::new(
            ContextConfig::default()
                .with_device_count(2)
                .with_threads_per_device(4),
        ))
    }

    fn doubled(device: &Device, shape: Shape) -> anyhow::Result<()> {
        let a = Tensor::<f32>::randn(shape.clone(), Device::CPU)?;
        let expected = a.to_vec()?.iter().map(|x| x + x).collect::<Vec<_>>();

        let a = a.to(device)?;
        let out = Tensor::<f32>::zeros(shape, device.clone())?;
        let (k_a, k_out) = (a.to_kernel(), out.to_kernel_mut());
        launch(device, out.shape(), |index| unsafe {
            k_out.store(index, k_a.at(index) + k_a.at(index))
        });
        assert_eq!(out.to_vec()?, expected);
        Ok(())
    }

    #[test]
    fn launch_ranks_one_two_five() -> anyhow::Result<()> {
        let ctx = context();
        for device in [Device::CPU, ctx.device(0)?] {
            doubled(&device, shape![1000])?;
            doubled(&device, shape![17, 33])?;
            doubled(&device, shape![2, 3, 4, 5, 6])?;
        }
        Ok(())
    }

    #[derive(Arbitrary, Debug)]
    struct LaunchProblem {
        #[strategy(proptest::collection::vec(1usize..6, 1..=4))]
        dims: Vec<usize>,
    }

    #[proptest(cases = 8)]
    fn test_launch_on_accelerator(prob: LaunchProblem) {
        let ctx = context();
        doubled(&ctx.device(1).unwrap(), Shape::from(prob.dims)).unwrap();
    }

    #[test]
    fn assign_and_fill_on_accelerator() -> anyhow::Result<()> {
        let ctx = context();
        let device = ctx.request_device(DeviceRequest::Accelerator)?;
        let src = Tensor::from_data([1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], shape![2, 3], Device::CPU)?
            .to(&device)?;
        let dst = Tensor::<f64>::zeros(shape![3, 2], device.clone())?;

        dst.assign(&(&src).swapaxes(0, 1)?)?;
        assert_eq!(dst.to_vec()?, vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);

        (&dst).view(&s![.., 0isize])?.fill(0.5)?;
        assert_eq!(dst.to_vec()?, vec![0.5, 0.5, 0.5, 2.0, 4.0, 6.0]);
        Ok(())
    }

    #[test]
    fn devices_must_agree() -> anyhow::Result<()> {
        let ctx = context();
        let a = Tensor::<f32>::zeros(shape![4], ctx.device(0)?)?;
        let b = Tensor::<f32>::zeros(shape![4], ctx.device(1)?)?;
        assert!(a.assign(&b).is_err());
        assert!((&a).add(&b).is_err());

        // same ordinal on a separate queue is still the same device
        let other_queue = ctx.device(0)?.try_accelerator()?.with_queue(ctx.new_queue(0)?);
        let c = Tensor::from_data([1.0f32; 4], shape![4], Device::Accelerator(other_queue))?;
        a.assign(&c)?;
        assert_eq!(a.to_vec()?, vec![1.0; 4]);
        Ok(())
    }

    #[test]
    fn aliasing_expressions_are_evaluated_first() -> anyhow::Result<()> {
        let ctx = context();
        let device = ctx.device(0)?;
        let t = Tensor::from_data([1i32, 2, 3, 4, 5, 6], shape![6], device)?;
        let reversed = (&t).view(&s![Slice::step(-1)])?;
        let sum = (&t).add(&reversed)?;
        t.assign(&sum)?;
        assert_eq!(t.to_vec()?, vec![7; 6]);
        Ok(())
    }

    #[test]
    fn transfers_round_trip() -> anyhow::Result<()> {
        let ctx = context();
        let host = Tensor::from_data([3u32, 1, 4, 1, 5], shape![5], Device::CPU)?;
        let on_device = host.to(&ctx.device(1)?)?;
        assert!(on_device.device().is_accelerator());
        assert_ne!(on_device.storage_id(), host.storage_id());
        let back = on_device.to(&Device::CPU)?;
        assert_eq!(back.to_vec()?, host.to_vec()?);
        Ok(())
    }
}

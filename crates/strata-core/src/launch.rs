use rayon::prelude::*;

use crate::{
    is_injective, rvec, unravel_into, Assignable, Device, DeviceError, Enforcer, Expression,
    KernelExpression, KernelStore, RVec, Shape, Strides, TensorError,
};

/// Calls `f` once per index of `shape` on the calling thread, first axis
/// fastest.
pub fn launch_host<F: FnMut(&[usize])>(shape: &Shape, mut f: F) {
    let numel = shape.numel();
    if numel == 0 {
        return;
    }
    let strides = Strides::dense(shape);
    let mut index: RVec<usize> = rvec![0; shape.rank()];
    for i in 0..numel {
        unravel_into(i, strides.as_slice(), &mut index);
        f(&index);
    }
}

/// Calls `f` once per index of `shape` on `device`, returning once every call
/// has completed.
///
/// Accelerator launches run on the device queue in no particular order. A
/// panic in `f` is re-raised here.
pub fn launch<F>(device: &Device, shape: &Shape, f: F)
where
    F: Fn(&[usize]) + Send + Sync,
{
    let accelerator = match device {
        Device::CPU => return launch_host(shape, f),
        Device::Accelerator(accelerator) => accelerator,
    };
    let numel = shape.numel();
    let rank = shape.rank();
    let strides = Strides::dense(shape);
    log::trace!(
        "launch {:?} ({} items) on ACC:{}",
        shape,
        numel,
        accelerator.ordinal()
    );
    accelerator.queue().install(|| {
        (0..numel).into_par_iter().for_each_init(
            || -> RVec<usize> { rvec![0; rank] },
            |index, i| {
                unravel_into(i, strides.as_slice(), index);
                f(index);
            },
        )
    });
}

fn check_devices(dst: &Device, src: &Device) -> Result<(), TensorError> {
    if dst != src {
        return Err(DeviceError::DeviceMismatch(dst.label(), src.label()).into());
    }
    Ok(())
}

/// Evaluates `src` into every element of `dst`.
///
/// If `src` reads from the storage `dst` writes to, it is evaluated into a
/// temporary first.
pub fn assign<D, S>(dst: &D, src: &S) -> Result<(), TensorError>
where
    D: Assignable,
    S: Expression<Elem = D::Elem>,
{
    Enforcer::check_shapes_match(dst.shape(), src.shape())?;
    check_devices(dst.device(), src.device())?;
    if src.aliases(dst.storage_id()) {
        log::debug!(
            "assign source reads {:?}, evaluating into a temporary",
            dst.storage_id()
        );
        let tmp = src.materialize()?;
        store_all(dst, &tmp);
    } else {
        store_all(dst, src);
    }
    Ok(())
}

/// Writes `value` into every element of `dst`.
pub fn fill<D: Assignable>(dst: &D, value: D::Elem) -> Result<(), TensorError> {
    let out = dst.to_kernel_mut();
    let write = |index: &[usize]| {
        // SAFETY: see `store_all`.
        unsafe { out.store(index, value) }
    };
    if is_injective(dst.shape(), dst.strides()) {
        launch(dst.device(), dst.shape(), write);
    } else {
        launch_host(dst.shape(), write);
    }
    Ok(())
}

fn store_all<D, S>(dst: &D, src: &S)
where
    D: Assignable,
    S: Expression<Elem = D::Elem>,
{
    let out = dst.to_kernel_mut();
    let input = src.to_kernel();
    let write = |index: &[usize]| {
        // SAFETY: `src` does not read dst storage, and each index is written
        // once. Layouts that map two indices onto one element only ever run
        // on the host thread.
        unsafe { out.store(index, input.at(index)) }
    };
    if is_injective(dst.shape(), dst.strides()) {
        launch(dst.device(), dst.shape(), write);
    } else {
        log::debug!(
            "{:?} with strides {:?} overlaps itself, writing sequentially",
            dst.shape(),
            dst.strides()
        );
        launch_host(dst.shape(), write);
    }
}

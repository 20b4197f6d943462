use num_traits::NumOps;

use crate::{
    Device, DeviceError, Enforcer, Expression, KernelBinary, Shape, StorageId, TensorError,
};
#[cfg(test)]
use test_strategy::Arbitrary;

#[cfg_attr(test, derive(Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[inline]
    pub fn apply<T: NumOps>(self, lhs: T, rhs: T) -> T {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }
}

/// Lazy elementwise `lhs op rhs` over two expressions of the same shape.
#[derive(Debug, Clone)]
pub struct Binary<L, R> {
    lhs: L,
    rhs: R,
    op: BinaryOp,
}

impl<L, R> Binary<L, R>
where
    L: Expression,
    R: Expression<Elem = L::Elem>,
{
    pub fn new(lhs: L, rhs: R, op: BinaryOp) -> Result<Self, TensorError> {
        Enforcer::check_shapes_match(lhs.shape(), rhs.shape())?;
        if lhs.device() != rhs.device() {
            return Err(DeviceError::DeviceMismatch(lhs.device().label(), rhs.device().label()).into());
        }
        Ok(Self { lhs, rhs, op })
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }
}

impl<L, R> Expression for Binary<L, R>
where
    L: Expression,
    R: Expression<Elem = L::Elem>,
    L::Elem: NumOps,
{
    type Elem = L::Elem;
    type Kernel<'a> = KernelBinary<L::Kernel<'a>, R::Kernel<'a>> where Self: 'a;

    fn shape(&self) -> &Shape {
        self.lhs.shape()
    }

    fn device(&self) -> &Device {
        self.lhs.device()
    }

    fn to_kernel(&self) -> Self::Kernel<'_> {
        KernelBinary::new(self.lhs.to_kernel(), self.rhs.to_kernel(), self.op)
    }

    fn aliases(&self, id: StorageId) -> bool {
        self.lhs.aliases(id) || self.rhs.aliases(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shape, Tensor, Viewable};
    use test_strategy::proptest;

    #[derive(Arbitrary, Debug)]
    struct BinaryProblem {
        op: BinaryOp,
        #[any(vec![1..4, 1..4, 1..3])]
        shape: crate::Shape,
    }

    fn ground_truth(a: &[f32], b: &[f32], op: BinaryOp) -> Vec<f32> {
        a.iter().zip(b).map(|(&x, &y)| op.apply(x, y)).collect()
    }

    fn run_binary_trial(prob: BinaryProblem) -> anyhow::Result<()> {
        let BinaryProblem { op, shape } = prob;
        let a = Tensor::<f32>::randn(shape.clone(), Device::CPU)?;
        let b = Tensor::<f32>::randn(shape, Device::CPU)?;
        let ground = ground_truth(&a.to_vec()?, &b.to_vec()?, op);
        let got = Binary::new(&a, &b, op)?.to_vec()?;
        assert_eq!(got, ground);
        Ok(())
    }

    #[proptest(cases = 16)]
    fn test_binary(prob: BinaryProblem) {
        run_binary_trial(prob).unwrap();
    }

    #[test]
    fn shapes_must_match() {
        let a = Tensor::<f32>::zeros(shape![2, 3], Device::CPU).unwrap();
        let b = Tensor::<f32>::zeros(shape![3, 2], Device::CPU).unwrap();
        assert!(matches!(
            Binary::new(&a, &b, BinaryOp::Add),
            Err(TensorError::InvariantError(_))
        ));
    }

    #[test]
    fn binary_views_go_through_the_adaptor() -> anyhow::Result<()> {
        let a = Tensor::from_data([1i32, 2, 3, 4, 5, 6], shape![3, 2], Device::CPU)?;
        let sum = Binary::new(&a, &a, BinaryOp::Add)?;
        // column 1 of the doubled tensor
        let column = sum.view(&crate::s![.., 1isize])?;
        assert_eq!(column.to_vec()?, vec![8, 10, 12]);
        Ok(())
    }
}

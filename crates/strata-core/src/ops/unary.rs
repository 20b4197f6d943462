use num_traits::NumOps;

use crate::{Device, Expression, KernelUnary, Shape, StorageId, TensorDType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp<T> {
    Neg,
    Scale(T),
    Shift(T),
}

impl<T: TensorDType + NumOps> UnaryOp<T> {
    /// `Neg` is computed as `0 - x`, so unsigned elements wrap.
    #[inline]
    pub fn apply(self, x: T) -> T {
        match self {
            UnaryOp::Neg => T::zero() - x,
            UnaryOp::Scale(k) => x * k,
            UnaryOp::Shift(k) => x + k,
        }
    }
}

#[derive(Debug, Clone, derive_new::new)]
pub struct Unary<E, T> {
    src: E,
    op: UnaryOp<T>,
}

impl<E, T: Copy> Unary<E, T> {
    pub fn op(&self) -> UnaryOp<T> {
        self.op
    }

    pub fn input(&self) -> &E {
        &self.src
    }
}

impl<E> Expression for Unary<E, E::Elem>
where
    E: Expression,
    E::Elem: NumOps,
{
    type Elem = E::Elem;
    type Kernel<'a> = KernelUnary<E::Kernel<'a>, E::Elem> where Self: 'a;

    fn shape(&self) -> &Shape {
        self.src.shape()
    }

    fn device(&self) -> &Device {
        self.src.device()
    }

    fn to_kernel(&self) -> Self::Kernel<'_> {
        KernelUnary::new(self.src.to_kernel(), self.op)
    }

    fn aliases(&self, id: StorageId) -> bool {
        self.src.aliases(id)
    }
}

/// Builders for lazy elementwise expressions.
pub trait Elementwise: Expression + Sized
where
    Self::Elem: NumOps,
{
    fn add<R: Expression<Elem = Self::Elem>>(
        self,
        rhs: R,
    ) -> Result<crate::Binary<Self, R>, crate::TensorError> {
        crate::Binary::new(self, rhs, crate::BinaryOp::Add)
    }

    fn sub<R: Expression<Elem = Self::Elem>>(
        self,
        rhs: R,
    ) -> Result<crate::Binary<Self, R>, crate::TensorError> {
        crate::Binary::new(self, rhs, crate::BinaryOp::Sub)
    }

    fn mul<R: Expression<Elem = Self::Elem>>(
        self,
        rhs: R,
    ) -> Result<crate::Binary<Self, R>, crate::TensorError> {
        crate::Binary::new(self, rhs, crate::BinaryOp::Mul)
    }

    fn div<R: Expression<Elem = Self::Elem>>(
        self,
        rhs: R,
    ) -> Result<crate::Binary<Self, R>, crate::TensorError> {
        crate::Binary::new(self, rhs, crate::BinaryOp::Div)
    }

    fn neg(self) -> Unary<Self, Self::Elem> {
        Unary::new(self, UnaryOp::Neg)
    }

    fn scale(self, k: Self::Elem) -> Unary<Self, Self::Elem> {
        Unary::new(self, UnaryOp::Scale(k))
    }

    fn shift(self, k: Self::Elem) -> Unary<Self, Self::Elem> {
        Unary::new(self, UnaryOp::Shift(k))
    }
}

impl<E> Elementwise for E
where
    E: Expression,
    E::Elem: NumOps,
{
}

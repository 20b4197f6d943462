mod context;
mod device;
mod dtype;
mod enforcer;
mod expression;
mod kernel;
mod launch;
mod layout;
mod ops;
mod shape;
mod slice;
mod storage;
mod strides;
mod tensor;
mod tensor_id;
mod view;

pub use context::*;
pub use device::*;
pub use dtype::*;
pub use enforcer::*;
pub use expression::*;
pub use kernel::*;
pub use launch::*;
pub use layout::*;
pub use ops::*;
pub use shape::*;
pub use slice::*;
pub use storage::*;
pub use strides::*;
pub use tensor::*;
pub use tensor_id::*;
pub use view::*;

use smallvec::SmallVec;
pub type RVec<T> = SmallVec<[T; 4]>;

/// Highest rank a tensor or view may have.
///
/// Kernel descriptors store their layout inline, so the bound is fixed.
pub const MAX_RANK: usize = 8;

//https://github.com/sonos/tract/blob/main/data/src/macros.rs#L2
#[macro_export]
macro_rules! rvec {
    (@one $x:expr) => (1usize);
    ($elem:expr; $n:expr) => ({
        $crate::RVec::from_elem($elem, $n)
    });
    ($($x:expr),*$(,)*) => ({
        let count = 0usize $(+ rvec![@one $x])*;
        #[allow(unused_mut)]
        let mut vec = $crate::RVec::new();
        if count <= vec.inline_size() {
            $(vec.push($x);)*
            vec
        } else {
            $crate::RVec::from_vec(vec![$($x,)*])
        }
    });
}

#[macro_export]
macro_rules! shape {
    ($($x:expr),*$(,)*) => ({
        use $crate::rvec;
        $crate::Shape::new(rvec![$($x,)*])
    });
}

/// Builds a list of [SliceDesc] from anything convertible into one.
///
/// ```
/// use strata::{s, SliceDesc};
/// let descs = s![SliceDesc::all(), SliceDesc::value(1)];
/// assert_eq!(descs.len(), 2);
/// ```
#[macro_export]
macro_rules! s {
    ($($x:expr),*$(,)*) => ({
        vec![$($crate::SliceDesc::from($x),)*]
    });
}

pub mod prelude {
    pub use crate::{
        rvec, s, shape, Assignable, Device, DeviceRequest, Elementwise, ExecutionContext, Expression,
        Slice, SliceDesc, Strided, Tensor, Viewable,
    };
}

mod binary;
mod permute;
mod reshape;
mod unary;
mod view;

pub use binary::*;
pub use permute::*;
pub use reshape::*;
pub use unary::*;
pub use view::*;

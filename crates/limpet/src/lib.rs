#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use limpet_image as image;

#[doc(inline)]
pub use limpet_imgproc as imgproc;

#[doc(inline)]
pub use limpet_tracking as tracking;

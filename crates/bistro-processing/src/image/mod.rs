//! Image decode/resize/encode capability and dimension math.

pub mod codec;
pub mod dimensions;

pub use codec::{DecodedImage, ImageCodec, NativeImageCodec};
pub use dimensions::bounded_dimensions;

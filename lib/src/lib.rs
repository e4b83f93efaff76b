mod codec;
mod downsampler;
mod lttb;
mod sample;

pub use codec::*;
pub use downsampler::*;
pub use lttb::*;
pub use sample::*;

mod capture;
mod preview;

pub use capture::CaptureBuffer;
pub use preview::preview;

//! Traffic allocation infrastructure

mod allocator;
mod bucketing;

pub use allocator::TrafficAllocator;
pub use bucketing::{BUCKET_RESOLUTION, SessionBucketer};

// Segment / annotation data model shared by the store, poller and backend.

mod annotation;
mod segment;

pub use annotation::Annotation;
pub use segment::Segment;

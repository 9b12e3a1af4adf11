mod segmentation;

pub use segmentation::SegmentationLevel;

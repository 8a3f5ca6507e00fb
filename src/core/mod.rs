pub mod frame;
pub mod source;

pub use frame::{Frame, IncomingFrame, ENTRY_SUFFIX};
pub use source::{ChannelSource, DirectorySource, FrameSource};

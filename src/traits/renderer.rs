use crate::cache::Frame;
use crate::error::Result;
use crate::types::Uniforms;

/// Output side of the compositor
///
/// `frame` is the frame at the playback cursor, borrowed from the cache;
/// `None` while nothing is loaded.
pub trait FrameRenderer {
    /// Composite and present one displayed tick
    fn render(&mut self, frame: Option<&Frame>, uniforms: &Uniforms) -> Result<()>;

    /// Output size changed
    fn resize(&mut self, _width: u32, _height: u32) {}
}

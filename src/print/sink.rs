use crate::raster::PixelBuffer;

/// Destination for composed print pages.
pub trait PageSink {
    /// Accept page `index` (0-based, in order).
    fn commit(&mut self, index: usize, page: &PixelBuffer) -> crate::error::Result<()>;
}

/// Keeps composed pages in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub pages: Vec<PixelBuffer>,
}

impl PageSink for MemorySink {
    fn commit(&mut self, _index: usize, page: &PixelBuffer) -> crate::error::Result<()> {
        self.pages.push(page.clone());
        Ok(())
    }
}

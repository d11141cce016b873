pub mod page;
pub mod paginator;
pub mod selector;
pub mod sink;

pub use page::{Margins, POINTS_PER_INCH, PageDescription, compose_pages, flatten_for_print};
pub use paginator::{Orientation, Page, paginate, preferred_orientation};
pub use selector::{PrintSelection, PrintSelector};
pub use sink::{MemorySink, PageSink};

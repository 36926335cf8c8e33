pub mod orders;
pub mod selection;

pub use orders::{OrderService, SubmitOrderInput, SubmitOrderReceipt};
pub use selection::{CatalogScope, SelectionRow, SelectionService, SelectionView};

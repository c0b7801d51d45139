pub mod record;
pub mod summary;

pub use record::{date_bounds, load_dataset, RentalRecord, RentalRecordVec};
pub use summary::{RangeFilter, RentalFrame, Totals};

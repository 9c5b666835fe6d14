mod cash_count;
mod customer;
mod entry;
mod entry_form;
mod money;

pub use cash_count::*;
pub use customer::*;
pub use entry::*;
pub use entry_form::*;
pub use money::*;

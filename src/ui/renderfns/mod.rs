pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{invoice_status_color, job_status_color, query_badge, truncate};

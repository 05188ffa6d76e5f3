pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, Status};
pub use header::draw_header;
pub use utils::{overlay_rect, status_color, truncate};

pub mod clist;
pub mod contest;
pub mod platform;

pub use contest::{aggregate, shift_to_ist, Contest, IST_OFFSET_MINUTES};
pub use platform::{classify, Platform, PlatformFilter};

pub mod icons;
pub mod popup;

pub use popup::{Pending, PopupUI};

pub mod catalog;
pub mod dispatch;
pub mod range;
pub mod request;

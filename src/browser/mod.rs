pub mod driver;
pub mod locator;
pub mod notification;
pub mod session;

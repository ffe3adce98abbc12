pub mod user;

pub use user::{DeviceRefreshMap, NewUser, User};

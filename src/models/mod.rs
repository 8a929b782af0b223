pub mod account;
pub mod attendance;
pub mod complaint;
pub mod fee;
pub mod message;
pub mod request;
pub mod room;
pub mod tenant;

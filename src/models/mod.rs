pub mod aggregate;
pub mod event;
pub mod event_type;
pub mod raw_event;
pub mod session;
pub mod totem;
pub mod touch_type;

mod email;
mod message;

pub use email::{DeliveryPolicy, DeliveryReport, Notifier};

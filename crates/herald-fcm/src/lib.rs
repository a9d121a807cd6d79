// FCM push transport for Herald
//
// Implements the herald-core Notifier trait against the FCM HTTP send API.

pub mod client;

pub use client::FcmNotifier;

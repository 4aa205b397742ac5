//! Bundled site implementations. Real deployments register their own
//! variants on a [`crate::site::SiteRegistry`] the same way.

pub mod checkin;

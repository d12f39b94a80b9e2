//! Terminal client for the weather proxy.
//!
//! The client keeps one [`session::ViewState`] for the currently displayed
//! query and changes it only through [`session::Session`] operations. Data
//! arrives already converted from the proxy and is rendered as-is.

pub mod location;
pub mod proxy;
pub mod render;
pub mod session;
pub mod theme;

pub use location::{FixedLocation, Geolocator, LocationError};
pub use proxy::{ClientError, ProxyApi, ProxyClient};
pub use session::{ForecastWindow, RequestTicket, Session, ViewState};

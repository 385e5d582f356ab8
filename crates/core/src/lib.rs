//! Visual-regression interception layer for browser-automation drivers.
//!
//! argus wraps a driver's element lookups in transparent proxies that
//! report clicks and key entry to the test session before they reach the
//! browser, normalizes and stitches screenshots, and threads every check
//! through the driver's sequential command order.
//!
//! Typical use:
//!
//! ```ignore
//! let mut session = Session::new(SessionConfig::new(), lifecycle);
//! session.open(driver, "shop", "smoke", Some(RectangleSize::new(1024, 768))).await?;
//!
//! let login = session.element(Locator::css("#login"))?;
//! login.send_keys("user@example.com").await?;
//! login.find(Locator::css("button[type=submit]")).click().await?;
//!
//! session.check_window("after login", None).await?;
//! session.close(true).await?;
//! ```

pub mod capture;
pub mod element;
pub mod session;

pub use capture::{Screenshot, ScreenshotKind, normalization_factor};
pub use element::{
	ElementCollection, ElementFinder, InteractionEvent, InteractionSink, RemoteElement,
};
pub use session::{Session, SessionLifecycle, SessionState};

// The seam types callers implement or construct directly.
pub use argus_protocol::{
	FailureReport, Location, MatchResult, RectangleSize, Region, SessionConfig, SessionStartInfo,
	StitchMode, TestResults,
};
pub use argus_runtime::{
	Capabilities, ControlFlow, Driver, Element, Error, Locator, Orientation, Result,
};

//! nse-filings-rs: resilient client for NSE India corporate disclosure
//! announcements.
//!
//! The exchange site defends against automated access, so retrieval is a
//! two-layer affair: a stealth headless browser visits the filings landing
//! page to earn a cookie session, and a plain HTTP call then hits the data
//! endpoint presenting those cookies together with the same browser
//! fingerprint. Sessions are cached with a conservative TTL and acquired
//! single-flight; fetches are windowed to the last seven days, cached per
//! symbol, and retried with exponential backoff.
//!
//! The usual entry point is [`AcquisitionEngine`]:
//!
//! ```no_run
//! use nse_filings_rs::{AcquisitionEngine, AcquisitionRequest};
//!
//! # async fn demo() -> Result<(), nse_filings_rs::NseError> {
//! let engine = AcquisitionEngine::builder().build()?;
//! let result = engine.run(AcquisitionRequest::new("RELIANCE")).await?;
//! for a in &result.announcements {
//!     println!("{} {}", a.broadcast_timestamp, a.subject);
//! }
//! # Ok(())
//! # }
//! ```

pub mod announcements;
pub mod core;
pub mod engine;
pub mod fingerprint;
pub mod resolve;
pub mod session;

pub use announcements::{AnnouncementClient, AnnouncementRecord, CacheMode};
pub use self::core::{ErrorKind, NseError, RetryConfig};
pub use engine::{AcquisitionEngine, AcquisitionRequest, AcquisitionResult};
pub use fingerprint::FingerprintProfile;
pub use resolve::{
    BrowserSymbolResolver, ResolveInteractive, SymbolCandidate, SymbolQuery, SymbolResolver,
};
pub use session::{
    AcquireSession, AcquirerConfig, BrowserSessionAcquirer, Session, SessionCache, SessionCookie,
    SessionMetadata,
};

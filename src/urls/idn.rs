// src/urls/idn.rs
// =============================================================================
// Internationalized host name support.
//
// Converting `кц.рф` to `xn--j1ay.xn--p1ai` is a capability, not a given:
// builds without the `idn` feature get PassthroughEncoder, which leaves
// hosts untouched. The choice is made once, when a Canonicalizer is built,
// and injected from there.
// =============================================================================

use std::sync::Arc;

/// Turns a non-ASCII host into its ASCII-compatible form.
pub trait HostEncoder: Send + Sync {
    /// `None` means "no conversion available"; the caller keeps the original.
    fn to_ascii(&self, host: &str) -> Option<String>;
}

/// Degraded mode: never converts anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEncoder;

impl HostEncoder for PassthroughEncoder {
    fn to_ascii(&self, _host: &str) -> Option<String> {
        None
    }
}

/// UTS-46 conversion backed by the `idna` crate.
#[cfg(feature = "idn")]
#[derive(Debug, Default, Clone, Copy)]
pub struct IdnaEncoder;

#[cfg(feature = "idn")]
impl HostEncoder for IdnaEncoder {
    fn to_ascii(&self, host: &str) -> Option<String> {
        match idna::domain_to_ascii(host) {
            Ok(ascii) if !ascii.is_empty() => Some(ascii),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(host, error = ?e, "host is not convertible to ASCII");
                None
            }
        }
    }
}

/// The best encoder this build offers.
pub fn system_host_encoder() -> Arc<dyn HostEncoder> {
    #[cfg(feature = "idn")]
    {
        Arc::new(IdnaEncoder)
    }
    #[cfg(not(feature = "idn"))]
    {
        Arc::new(PassthroughEncoder)
    }
}

//! Failure isolation around individual provider calls.
//!
//! Both `Err` returns and panics are converted into a [`ProviderFailure`] and handed to
//! the failure sink; nothing unwinds into the client's caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::error::{FailureKind, ProviderError, ProviderFailure};
use crate::provider::{ProviderId, TelemetryProvider};
use crate::report::FailureSink;

/// Run one provider call, catching panics.
pub(crate) fn guard<F>(call: F) -> Result<(), ProviderError>
where
    F: FnOnce() -> Result<(), ProviderError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(ProviderError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Run one provider call and report its failure, if any. Returns true on success.
pub(crate) fn isolate<F>(
    sink: &dyn FailureSink,
    kind: FailureKind,
    provider_id: ProviderId,
    provider_name: &str,
    call: F,
) -> bool
where
    F: FnOnce() -> Result<(), ProviderError>,
{
    match guard(call) {
        Ok(()) => true,
        Err(error) => {
            sink.report(&ProviderFailure {
                kind,
                provider_id,
                provider_name: provider_name.to_string(),
                error,
            });
            false
        }
    }
}

/// Read a provider's name under the guard. A panicking `name()` yields the id instead.
pub(crate) fn provider_name(provider: &dyn TelemetryProvider, id: ProviderId) -> String {
    let mut name = String::new();
    match guard(|| {
        name = provider.name().to_string();
        Ok(())
    }) {
        Ok(()) => name,
        Err(error) => {
            warn!(provider_id = %id, error = %error, "provider name unavailable");
            id.to_string()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

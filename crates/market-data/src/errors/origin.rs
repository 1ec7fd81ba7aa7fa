/// Where an error came from, as seen by a caller of the gateway.
///
/// Lets callers separate their own mistakes from exchange trouble without
/// matching on every variant.
///
/// # Behavior Summary
///
/// | Origin | Reached the provider? | Retrying the same request helps? |
/// |--------|-----------------------|----------------------------------|
/// | `Request` | No | Never |
/// | `NotFound` | Yes | No, until the exchange lists the pair |
/// | `Upstream` | Yes | Possibly, on a later call |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    /// The request was malformed and was rejected locally.
    Request,

    /// The exchange answered, but does not know the requested pair.
    NotFound,

    /// The exchange could not be reached, failed, or was too slow.
    Upstream,
}

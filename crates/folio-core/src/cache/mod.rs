//! Read tracking, cache invalidation and fragment tokens

pub mod fragment;
pub mod invalidation;
pub mod recorder;

pub use fragment::{
    compute_token, verify_token, FragmentCache, FragmentKeys, FragmentMode, TOKEN_PARAM,
};
pub use invalidation::{CacheAdapter, FlushFailurePolicy, InvalidationService};
pub use recorder::{CacheKeys, IdentityRegistry, Recorder};

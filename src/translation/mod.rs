/*!
 * Translator invocation.
 *
 * - `dispatch`: timeout, alternate-strategy retry and passthrough fallback
 * - `cache`: in-memory cache of delivered engine translations
 */

pub use self::cache::TranslationCache;
pub use self::dispatch::{DispatchOutcome, Dispatcher};

pub mod cache;
pub mod dispatch;

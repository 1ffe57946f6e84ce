//! The selector-inheritance engine behind `@extend`.
//!
//! The evaluator registers every style rule's selector list as it compiles
//! ([`Extender::add_selector`]) and forwards each `@extend`
//! ([`Extender::add_extension`]). The engine keeps a reverse index from
//! simple selectors to the rules containing them, propagates extensions
//! incrementally (including through other extensions, closing loops), and
//! mutates the registered selector lists in place through the shared
//! [`SelectorStore`]. [`Extender::finalize`] reports unsatisfied and
//! cross-media extends.

pub mod error;
pub mod extender;
pub mod extension;
pub mod store;

pub use error::{ExtendError, ExtendResult};
pub use extender::{ExtendMode, Extender, ExtensionMap};
pub use extension::{Extension, ExtensionState, MediaContext};
pub use store::{ListId, SelectorStore};

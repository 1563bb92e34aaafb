//! Session registry and template store for Livequiz.
//!
//! The registry is the entry point from the server layer: it turns a
//! template name into a running [`QuizSession`](livequiz_session::QuizSession)
//! with a fresh code, and resolves codes back to sessions.
//!
//! ```text
//! TemplateStore ──load──▶ TemplateCatalog ──create──▶ SessionRegistry
//!  (directory of .json)    (immutable, Arc'd)           code -> SessionRef
//! ```

mod error;
mod registry;
mod store;

pub use error::{RegistryError, TemplateError};
pub use registry::SessionRegistry;
pub use store::{DirTemplateStore, TemplateCatalog, TemplateStore};

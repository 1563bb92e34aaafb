//! The set of live sessions, keyed by code.

use std::collections::HashMap;
use std::sync::Arc;

use livequiz_broadcast::{Broadcaster, DEFAULT_LISTENER_CAPACITY};
use livequiz_protocol::SessionCode;
use livequiz_session::{QuizSession, SessionRef, generate_session_code};
use parking_lot::RwLock;

use crate::{RegistryError, TemplateCatalog};

/// Creates sessions from templates and finds them by code.
///
/// An explicit object rather than process-wide state, so tests (and
/// embedders) can run as many independent registries as they like.
///
/// Lookups take a read lock; creation takes the write lock and holds it
/// across code generation and insertion, so two concurrent creates can
/// never hand out the same code.
pub struct SessionRegistry {
    catalog: RwLock<Arc<TemplateCatalog>>,
    sessions: RwLock<HashMap<SessionCode, SessionRef>>,
    listener_capacity: usize,
}

impl SessionRegistry {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self::with_listener_capacity(catalog, DEFAULT_LISTENER_CAPACITY)
    }

    /// Like [`new`](Self::new), with a custom per-listener buffer size for
    /// every session this registry creates.
    pub fn with_listener_capacity(catalog: TemplateCatalog, listener_capacity: usize) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            sessions: RwLock::new(HashMap::new()),
            listener_capacity,
        }
    }

    /// Starts a new session from the named template.
    pub fn create(&self, template_name: &str) -> Result<(SessionCode, SessionRef), RegistryError> {
        let template = self
            .catalog
            .read()
            .get(template_name)
            .ok_or_else(|| RegistryError::UnknownTemplate(template_name.to_string()))?;

        let mut sessions = self.sessions.write();
        let code = generate_session_code(|c| sessions.contains_key(c))?;
        let broadcaster = Broadcaster::new(code.as_str(), self.listener_capacity);
        let session = Arc::new(QuizSession::from_template(
            code.clone(),
            &template,
            broadcaster,
        ));
        sessions.insert(code.clone(), Arc::clone(&session));
        let live = sessions.len();
        drop(sessions);

        tracing::info!(
            %code,
            template = template_name,
            questions = session.question_count(),
            sessions = live,
            "session created"
        );
        Ok((code, session))
    }

    /// Finds a live session. A miss is not an error here.
    pub fn lookup(&self, code: &str) -> Option<SessionRef> {
        self.sessions.read().get(code).cloned()
    }

    /// Like [`lookup`](Self::lookup), but a miss is
    /// [`RegistryError::UnknownSession`].
    pub fn get(&self, code: &str) -> Result<SessionRef, RegistryError> {
        self.lookup(code)
            .ok_or_else(|| RegistryError::UnknownSession(SessionCode::from(code)))
    }

    /// Tears a session down. Its listeners see their streams end; anyone
    /// still holding the [`SessionRef`] can keep reading it.
    pub fn remove(&self, code: &str) -> Option<SessionRef> {
        let session = self.sessions.write().remove(code)?;
        session.close();
        tracing::info!(code = %session.code(), "session removed");
        Some(session)
    }

    /// Template names available to [`create`](Self::create).
    pub fn template_names(&self) -> Vec<String> {
        self.catalog.read().names()
    }

    /// Swaps in a new template catalog. Running sessions keep the
    /// questions they were created with.
    pub fn replace_catalog(&self, catalog: TemplateCatalog) {
        let templates = catalog.len();
        *self.catalog.write() = Arc::new(catalog);
        tracing::info!(templates, "template catalog replaced");
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Codes of every live session, sorted.
    pub fn codes(&self) -> Vec<SessionCode> {
        let mut codes: Vec<SessionCode> = self.sessions.read().keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .field("listener_capacity", &self.listener_capacity)
            .finish_non_exhaustive()
    }
}

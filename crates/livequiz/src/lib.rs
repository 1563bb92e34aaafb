//! # Livequiz
//!
//! Live, synchronous quiz sessions. A host starts a quiz from a template,
//! players join with a short session code, and every connected screen is
//! told the moment the host advances.
//!
//! This meta crate ties the layers into a WebSocket server:
//!
//! ```text
//! livequiz-transport   WebSocket text frames
//! livequiz-protocol    Envelope<ClientMessage> / Envelope<ServerMessage>
//! livequiz-registry    template name -> session, code -> session
//! livequiz-session     join / submit_answer / advance
//! livequiz-broadcast   "roster" / "update" to every watcher
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livequiz::prelude::*;
//!
//! # async fn run() -> Result<(), LiveQuizError> {
//! let config = ServerConfig::from_env()?;
//! livequiz::logging::init(&config.log_level, config.log_format)?;
//!
//! let catalog = TemplateCatalog::load(&DirTemplateStore::new(&config.templates_dir));
//! let server = LiveQuizServerBuilder::from_config(&config).build(catalog).await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use error::LiveQuizError;
pub use server::{LiveQuizServer, LiveQuizServerBuilder};

/// Everything needed to run a server or drive one from a client.
pub mod prelude {
    pub use crate::config::{ConfigError, LogFormat, ServerConfig};
    pub use crate::{LiveQuizError, LiveQuizServer, LiveQuizServerBuilder};

    pub use livequiz_broadcast::{Broadcaster, Listener};
    pub use livequiz_protocol::{
        Answer, ClientMessage, Codec, Envelope, JsonCodec, PlayerHandle, PlayerView,
        QuestionTemplate, QuestionView, QuizState, ServerMessage, SessionCode, SessionTemplate,
        SessionView,
    };
    pub use livequiz_registry::{
        DirTemplateStore, RegistryError, SessionRegistry, TemplateCatalog, TemplateError,
        TemplateStore,
    };
    pub use livequiz_session::{AdvanceOutcome, JoinedPlayer, QuizSession, SessionError, SessionRef};
}

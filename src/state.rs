use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
    mailer::{Mailer, ResendMailer},
    translate::{self, Translator},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub mailer: Arc<dyn Mailer>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    /// State with outbound integrations configured from `config`.
    pub fn from_config(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            orm: create_orm_conn(&pool),
            pool,
            mailer: Arc::new(ResendMailer::new(config.email.clone())),
            translator: translate::from_config(config.translate.clone()),
        }
    }

    /// State for tests and tools: no email provider and no translation.
    pub fn new(pool: DbPool) -> Self {
        Self {
            orm: create_orm_conn(&pool),
            pool,
            mailer: Arc::new(ResendMailer::unconfigured()),
            translator: translate::from_config(None),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }
}
